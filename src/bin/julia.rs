use std::str::FromStr;

use clap::{App, Arg, ArgMatches};
use failure::format_err;
use num::Complex;
use tracing::info;
use tracing_subscriber::EnvFilter;

use julia::config::DEFAULT_WORKERS;
use julia::viewer::caption;
use julia::{Pixel, RenderConfig, Renderer};

fn parse_pair<T>(s: &str, separator: char) -> Option<(T, T)>
where
    T: FromStr,
{
    match s.find(separator) {
        None => None,
        Some(index) => match (T::from_str(&s[..index]), T::from_str(&s[index + 1..])) {
            (Ok(l), Ok(r)) => Some((l, r)),
            _ => None,
        },
    }
}

fn parse_complex(s: &str) -> Option<Complex<f64>> {
    match parse_pair(s, ',') {
        Some((re, im)) => Some(Complex { re, im }),
        None => None,
    }
}

fn validate_pair<T: FromStr>(s: &str, separator: char, err: &str) -> Result<(), String> {
    match parse_pair::<T>(s, separator) {
        Some(_) => Ok(()),
        None => Err(err.to_string()),
    }
}

fn validate_complex(s: &str) -> Result<(), String> {
    match parse_complex(s) {
        Some(c) if c.re.is_finite() && c.im.is_finite() => Ok(()),
        _ => Err("Could not parse complex parameter".to_string()),
    }
}

fn validate_range<T: FromStr + Ord>(
    s: &str,
    low: T,
    high: T,
    isnotanumber_err: &str,
    isnotinrange_err: &str,
) -> Result<(), String> {
    match T::from_str(s) {
        Ok(i) => {
            if i >= low && i <= high {
                Ok(())
            } else {
                Err(isnotinrange_err.to_string())
            }
        }
        Err(_) => Err(isnotanumber_err.to_string()),
    }
}

const OUTPUT: &str = "output";
const SIZE: &str = "size";
const PARAMETER: &str = "param";
const PICK: &str = "pick";
const THREADS: &str = "threads";
const ITERATIONS: &str = "iterations";
const PALETTE_SIZE: &str = "palette-size";

fn args<'a>() -> ArgMatches<'a> {
    let max_threads = num_cpus::get().max(DEFAULT_WORKERS);

    App::new("julia")
        .version("0.1.0")
        .author("Elf M. Sternberg <elf.sternberg@gmail.com>")
        .about("Julia set renderer")
        .arg(
            Arg::with_name(OUTPUT)
                .required(true)
                .long(OUTPUT)
                .short("o")
                .takes_value(true)
                .help("Output file; the extension picks the format"),
        )
        .arg(
            Arg::with_name(SIZE)
                .required(false)
                .long(SIZE)
                .short("s")
                .takes_value(true)
                .default_value("640x480")
                .validator(|s| validate_pair::<u32>(&s, 'x', "Could not parse output image size"))
                .help("Size of output image"),
        )
        .arg(
            Arg::with_name(PARAMETER)
                .required(false)
                .long(PARAMETER)
                .short("c")
                .takes_value(true)
                .allow_hyphen_values(true)
                .default_value("-0.756,-0.245")
                .validator(|s| validate_complex(&s))
                .help("The parameter c of z² + c, as RE,IM"),
        )
        .arg(
            Arg::with_name(PICK)
                .required(false)
                .long(PICK)
                .short("p")
                .takes_value(true)
                .validator(|s| validate_pair::<u32>(&s, ',', "Could not parse pick pixel"))
                .help("Take c from this pixel of the image, as X,Y; overrides --param"),
        )
        .arg(
            Arg::with_name(THREADS)
                .required(false)
                .long(THREADS)
                .short("t")
                .takes_value(true)
                .default_value("4")
                .validator(move |s| {
                    validate_range(
                        &s,
                        1,
                        max_threads,
                        "Could not parse thread count",
                        &format!("Thread count must be between 1 and {}", max_threads),
                    )
                })
                .help("Number of threads to use in solver"),
        )
        .arg(
            Arg::with_name(ITERATIONS)
                .required(false)
                .long(ITERATIONS)
                .short("i")
                .takes_value(true)
                .default_value("256")
                .validator(move |s| {
                    validate_range(
                        &s,
                        1,
                        100_000,
                        "Could not parse iteration count",
                        "Iteration count must be between 1 and 100000",
                    )
                })
                .help("Maximum iterations per pixel"),
        )
        .arg(
            Arg::with_name(PALETTE_SIZE)
                .required(false)
                .long(PALETTE_SIZE)
                .takes_value(true)
                .default_value("1024")
                .validator(move |s| {
                    validate_range(
                        &s,
                        1,
                        1 << 20,
                        "Could not parse palette size",
                        "Palette size must be between 1 and 1048576",
                    )
                })
                .help("Number of colors in the palette"),
        )
        .get_matches()
}

fn run(matches: &ArgMatches) -> Result<(), failure::Error> {
    let (width, height) = matches
        .value_of(SIZE)
        .and_then(|s| parse_pair::<u32>(s, 'x'))
        .ok_or_else(|| format_err!("Error parsing image dimensions"))?;
    let config = RenderConfig {
        workers: usize::from_str(matches.value_of(THREADS).unwrap_or_default())?,
        max_iterations: usize::from_str(matches.value_of(ITERATIONS).unwrap_or_default())?,
        palette_size: usize::from_str(matches.value_of(PALETTE_SIZE).unwrap_or_default())?,
        ..RenderConfig::default()
    };
    let renderer = Renderer::new(config)?;
    let mapper = renderer.mapper(width, height)?;

    let c = match matches.value_of(PICK).and_then(|s| parse_pair::<u32>(s, ',')) {
        Some((x, y)) => mapper.pixel_to_point(&Pixel(x as usize, y as usize)),
        None => matches
            .value_of(PARAMETER)
            .and_then(parse_complex)
            .ok_or_else(|| format_err!("Error parsing parameter"))?,
    };

    info!(width, height, workers = config.workers, "{}", caption(c));
    let (lower, upper) = mapper.bounds();
    info!(
        "visible region re {:.3}..{:.3}, im {:.3}..{:.3}",
        lower.re, upper.re, lower.im, upper.im
    );
    let image = renderer.render(width, height, c.re, c.im)?;

    let output = matches
        .value_of(OUTPUT)
        .ok_or_else(|| format_err!("No output file"))?;
    image.save(output)?;
    info!(output, "wrote image");
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let matches = args();
    if let Err(e) = run(&matches) {
        eprintln!("Render failure: {}", e);
        std::process::exit(1);
    }
}
