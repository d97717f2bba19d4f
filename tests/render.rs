use image::Rgb;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use julia::{JuliaError, RenderConfig, Renderer};

fn renderer(max_iterations: usize) -> Renderer {
    Renderer::new(RenderConfig {
        max_iterations,
        ..RenderConfig::default()
    })
    .unwrap()
}

#[test]
fn images_have_the_requested_size_and_palette_colors() {
    let r = renderer(32);
    let palette = r.palette().colors();
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for _ in 0..12 {
        let width = rng.gen_range(2, 24);
        let height = rng.gen_range(2, 24);
        let cx = rng.gen_range(-1.5, 1.5);
        let cy = rng.gen_range(-1.5, 1.5);
        let image = r.render(width, height, cx, cy).unwrap();
        assert_eq!(image.dimensions(), (width, height));
        assert_eq!(image.pixels().count(), (width * height) as usize);
        assert!(image.pixels().all(|p| palette.contains(p)));
    }
}

#[test]
fn grids_are_point_symmetric_before_normalization() {
    let r = renderer(64);
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..8 {
        let width: u32 = rng.gen_range(2, 17);
        let height: u32 = rng.gen_range(2, 17);
        let scores = r
            .scores(width, height, rng.gen_range(-1.0, 1.0), rng.gen_range(-1.0, 1.0))
            .unwrap();
        let grid = scores.grid();
        let (w, h) = (width as usize, height as usize);
        for i in 0..w {
            for j in 0..h {
                assert_eq!(grid.get(i, j), grid.get(w - 1 - i, h - 1 - j));
            }
        }
    }
}

#[test]
fn rendering_is_a_pure_function_of_its_inputs() {
    let r = renderer(128);
    let a = r.render(31, 17, -0.756, -0.245).unwrap();
    let b = r.render(31, 17, -0.756, -0.245).unwrap();
    assert_eq!(a.into_raw(), b.into_raw());
}

#[test]
fn origin_scores_the_full_iteration_count_when_c_is_zero() {
    let r = renderer(256);
    let scores = r.scores(5, 5, 0.0, 0.0).unwrap();
    assert_eq!(scores.grid().get(2, 2), 256.0);

    let scores = r.scores(4, 4, 0.0, 0.0).unwrap();
    assert_eq!(scores.grid().get(1, 1), scores.grid().get(2, 2));
}

#[test]
fn far_parameters_escape_quickly_everywhere() {
    let r = renderer(256);
    let scores = r.scores(16, 12, 2.0, 2.0).unwrap();
    let cells = scores.grid().cells();
    // Every orbit is gone within a handful of steps, each adding < 1.
    assert!(cells.iter().all(|&s| s > 0.0 && s < 3.0));

    // With c = 0 the unit disk is captive and scores near the maximum.
    let slow = r.scores(16, 12, 0.0, 0.0).unwrap();
    let slow_max = slow.grid().cells().iter().cloned().fold(0.0, f64::max);
    let fast_max = cells.iter().cloned().fold(0.0, f64::max);
    assert!(fast_max * 10.0 < slow_max);
}

#[test]
fn normalized_scores_are_non_negative() {
    let r = renderer(64);
    let normalized = r.scores(20, 10, 0.285, 0.01).unwrap().normalize(15.0);
    assert!(normalized.grid().cells().iter().all(|&v| v >= 0.0 && v.is_finite()));
}

#[test]
fn huge_parameters_still_render() {
    let r = renderer(16);
    let image = r.render(8, 8, 1e300, -1e300).unwrap();
    let first = r.palette_lookup(0.0);
    assert!(image.pixels().all(|p| *p == first));
}

#[test]
fn invalid_requests_are_rejected() {
    let r = renderer(16);
    match r.render(1, 1, 0.0, 0.0) {
        Err(JuliaError::InvalidInput(_)) => (),
        other => panic!("unexpected {:?}", other.map(|i| i.dimensions())),
    }
    assert!(r.render(0, 10, 0.0, 0.0).is_err());
    assert!(r.render(10, 10, 0.0, std::f64::NAN).is_err());
}

#[test]
fn palette_lookup_is_exposed() {
    let r = renderer(16);
    assert_eq!(r.palette_lookup(0.0), Rgb([0, 7, 100]));
    assert_eq!(r.palette_lookup(-0.5), r.palette_lookup(0.5));
}
