// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The state behind an interactive window, without the window.
//!
//! A windowing layer forwards its events here: resizes, clicks that
//! pick a new parameter, and mouse motion that previews one.  Renders
//! run on one long-lived background thread fed through a single-slot
//! request queue: a new request replaces one that has not started yet.
//! Each request gets a generation number and only the newest
//! generation's result is ever shown; a render already under way
//! finishes and is dropped.  A failed render leaves the last good image
//! on screen.

use std::sync::Arc;
use std::thread;

use crossbeam::channel::{self, Receiver, Sender};
use image::RgbImage;
use num::Complex;
use tracing::{debug, warn};

use crate::error::JuliaError;
use crate::planes::Pixel;
use crate::render::Renderer;

/// The parameter the viewer opens with.
pub const DEFAULT_PARAMETER: Complex<f64> = Complex {
    re: -0.756,
    im: -0.245,
};

/// Neither side of the frame shrinks below this.
pub const MIN_FRAME: u32 = 320;

/// The frame sizing policy: a frame is never narrower than it is tall
/// nor smaller than [`MIN_FRAME`] on a side.
pub fn frame_size(width: u32, height: u32) -> (u32, u32) {
    let height = height.max(MIN_FRAME);
    (width.max(height), height)
}

/// The text shown over the image for a parameter.
pub fn caption(c: Complex<f64>) -> String {
    format!("c = {:.3} + {:.3}i", c.re, c.im)
}

struct Request {
    generation: u64,
    size: (u32, u32),
    c: Complex<f64>,
}

struct Finished {
    generation: u64,
    result: Result<RgbImage, JuliaError>,
}

/// Viewer state: the viewport, the chosen and previewed parameters,
/// and the image currently on display.
pub struct Viewer {
    renderer: Arc<Renderer>,
    size: (u32, u32),
    selected: Complex<f64>,
    preview: Complex<f64>,
    image: Option<RgbImage>,
    generation: u64,
    shown: u64,
    last_error: Option<JuliaError>,
    delivered: u64,
    requests: Sender<Request>,
    queued: Receiver<Request>,
    results: Receiver<Finished>,
}

// Serves requests until the viewer goes away.  Anything newer waiting
// in the slot replaces the request just taken.
fn render_loop(renderer: Arc<Renderer>, requests: Receiver<Request>, results: Sender<Finished>) {
    for mut request in requests.iter() {
        while let Ok(newer) = requests.try_recv() {
            request = newer;
        }
        let (width, height) = request.size;
        let result = renderer.render(width, height, request.c.re, request.c.im);
        let finished = Finished {
            generation: request.generation,
            result,
        };
        if results.send(finished).is_err() {
            break;
        }
    }
}

impl Viewer {
    /// A viewer with nothing rendered yet.  Starts the render thread,
    /// which exits when the viewer is dropped.
    pub fn new(renderer: Arc<Renderer>, size: (u32, u32), c: Complex<f64>) -> Self {
        let (requests, queued) = channel::bounded(1);
        let (finished, results) = channel::bounded(1);
        let shared = Arc::clone(&renderer);
        let pending = queued.clone();
        thread::spawn(move || render_loop(shared, pending, finished));
        Viewer {
            renderer,
            size,
            selected: c,
            preview: c,
            image: None,
            generation: 0,
            shown: 0,
            last_error: None,
            delivered: 0,
            requests,
            queued,
            results,
        }
    }

    /// The viewport size in pixels.
    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    /// The parameter being rendered.
    pub fn selected(&self) -> Complex<f64> {
        self.selected
    }

    /// The parameter under the mouse, or the selected one.
    pub fn preview(&self) -> Complex<f64> {
        self.preview
    }

    /// The caption for the preview parameter.
    pub fn caption(&self) -> String {
        caption(self.preview)
    }

    /// The image on display, if any render has succeeded.
    pub fn image(&self) -> Option<&RgbImage> {
        self.image.as_ref()
    }

    /// The error from the most recent render, cleared by a success.
    pub fn last_error(&self) -> Option<&JuliaError> {
        self.last_error.as_ref()
    }

    /// The newest generation requested.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// True while the newest request has not come back.
    pub fn is_pending(&self) -> bool {
        self.shown < self.generation
    }

    fn to_point(&self, x: u32, y: u32) -> Result<Complex<f64>, JuliaError> {
        let mapper = self.renderer.mapper(self.size.0, self.size.1)?;
        Ok(mapper.pixel_to_point(&Pixel(x as usize, y as usize)))
    }

    /// The viewport changed size; everything is recomputed.
    pub fn resize(&mut self, width: u32, height: u32) -> u64 {
        self.size = (width, height);
        self.request_render()
    }

    /// Chooses the parameter under pixel (x, y) and starts a render.
    pub fn pick(&mut self, x: u32, y: u32) -> Result<u64, JuliaError> {
        self.selected = self.to_point(x, y)?;
        Ok(self.request_render())
    }

    /// Previews the parameter under pixel (x, y).  Nothing is rendered.
    pub fn hover(&mut self, x: u32, y: u32) -> Result<(), JuliaError> {
        self.preview = self.to_point(x, y)?;
        Ok(())
    }

    /// The mouse left the window; the preview falls back to the
    /// selected parameter.
    pub fn leave(&mut self) {
        self.preview = self.selected;
    }

    /// A drag both previews and picks.
    pub fn drag(&mut self, x: u32, y: u32) -> Result<u64, JuliaError> {
        self.hover(x, y)?;
        self.pick(x, y)
    }

    // Empties the request slot; returns how many requests never started.
    fn drop_queued(&self) -> usize {
        self.queued.try_iter().count()
    }

    /// Queues a background render of the current size and parameter,
    /// returning its generation.  A request still waiting in the queue
    /// is replaced.
    pub fn request_render(&mut self) -> u64 {
        self.generation += 1;
        let generation = self.generation;
        let (width, height) = self.size;
        let replaced = self.drop_queued();
        let request = Request {
            generation,
            size: self.size,
            c: self.selected,
        };
        // We are the only sender and the slot was just emptied.
        if self.requests.try_send(request).is_err() {
            self.accept(Finished {
                generation,
                result: Err(JuliaError::invariant("render request slot unavailable")),
            });
        }
        debug!(generation, width, height, replaced, "render requested");
        generation
    }

    fn accept(&mut self, finished: Finished) {
        self.delivered += 1;
        if finished.generation != self.generation {
            debug!(
                generation = finished.generation,
                newest = self.generation,
                delivered = self.delivered,
                "discarding superseded render"
            );
            return;
        }
        self.shown = finished.generation;
        match finished.result {
            Ok(image) => {
                self.image = Some(image);
                self.last_error = None;
            }
            Err(e) => {
                warn!(generation = finished.generation, error = %e, "render failed, keeping previous image");
                self.last_error = Some(e);
            }
        }
    }

    /// Applies whatever renders have finished.  Returns true when the
    /// newest request has landed, successfully or not.
    pub fn poll(&mut self) -> bool {
        while let Ok(finished) = self.results.try_recv() {
            self.accept(finished);
        }
        !self.is_pending()
    }

    /// Blocks until the newest request has landed.  Returns its error
    /// if it failed; the previous image stays in place.
    pub fn wait(&mut self) -> Result<(), JuliaError> {
        while self.is_pending() {
            match self.results.recv() {
                Ok(finished) => self.accept(finished),
                Err(_) => return Err(JuliaError::invariant("render thread is gone")),
            }
        }
        match &self.last_error {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }

    /// Renders the current size and parameter on this thread.  Any
    /// background render still in flight is superseded and any queued
    /// one is dropped.
    pub fn refresh(&mut self) -> Result<(), JuliaError> {
        self.drop_queued();
        self.generation += 1;
        let generation = self.generation;
        let (width, height) = self.size;
        let result = self
            .renderer
            .render(width, height, self.selected.re, self.selected.im);
        let outcome = result.as_ref().map(|_| ()).map_err(|e| e.clone());
        self.accept(Finished { generation, result });
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RenderConfig;

    fn viewer(size: (u32, u32)) -> Viewer {
        let renderer = Renderer::new(RenderConfig {
            max_iterations: 8,
            ..RenderConfig::default()
        })
        .unwrap();
        Viewer::new(Arc::new(renderer), size, DEFAULT_PARAMETER)
    }

    #[test]
    fn frame_policy_widens_and_enforces_minimum() {
        assert_eq!(frame_size(640, 480), (640, 480));
        assert_eq!(frame_size(400, 600), (600, 600));
        assert_eq!(frame_size(100, 100), (320, 320));
        assert_eq!(frame_size(1000, 10), (1000, 320));
    }

    #[test]
    fn caption_shows_three_decimals() {
        assert_eq!(caption(DEFAULT_PARAMETER), "c = -0.756 + -0.245i");
        assert_eq!(caption(Complex::new(0.25, 1.0)), "c = 0.250 + 1.000i");
    }

    #[test]
    fn hover_previews_and_leave_restores() {
        let mut v = viewer((5, 5));
        v.hover(0, 0).unwrap();
        assert_eq!(v.preview(), Complex::new(-1.5, 1.5));
        assert_eq!(v.selected(), DEFAULT_PARAMETER);
        v.leave();
        assert_eq!(v.preview(), DEFAULT_PARAMETER);
        assert_eq!(v.generation(), 0);
    }

    #[test]
    fn pick_selects_and_renders() {
        let mut v = viewer((5, 5));
        v.pick(4, 4).unwrap();
        assert_eq!(v.selected(), Complex::new(1.5, -1.5));
        v.wait().unwrap();
        assert_eq!(v.image().unwrap().dimensions(), (5, 5));
    }

    #[test]
    fn drag_moves_both_parameters() {
        let mut v = viewer((5, 5));
        v.drag(2, 2).unwrap();
        assert_eq!(v.preview(), v.selected());
        v.wait().unwrap();
    }

    #[test]
    fn newest_render_wins() {
        let mut v = viewer((6, 4));
        v.request_render();
        v.resize(9, 7);
        let newest = v.resize(8, 3);
        v.wait().unwrap();
        assert!(!v.is_pending());
        assert_eq!(v.generation(), newest);
        assert_eq!(v.image().unwrap().dimensions(), (8, 3));
        // Stragglers arriving later are dropped.
        thread::sleep(std::time::Duration::from_millis(20));
        assert!(v.poll());
        assert_eq!(v.image().unwrap().dimensions(), (8, 3));
    }

    #[test]
    fn bursts_of_requests_collapse_to_the_newest() {
        let mut v = viewer((6, 4));
        let mut newest = 0;
        for k in 0..200u32 {
            newest = v.resize(6 + k % 5, 4 + k % 3);
        }
        v.wait().unwrap();
        assert_eq!(v.generation(), newest);
        assert_eq!(v.image().unwrap().dimensions(), (6 + 199 % 5, 4 + 199 % 3));
        // One result waiting, one blocked behind it, then the newest.
        assert!(v.delivered <= 3, "{} renders came back", v.delivered);
    }

    #[test]
    fn refresh_drops_a_queued_request() {
        let mut v = viewer((6, 4));
        v.request_render();
        v.resize(9, 7);
        v.refresh().unwrap();
        assert!(!v.is_pending());
        assert_eq!(v.image().unwrap().dimensions(), (9, 7));
        thread::sleep(std::time::Duration::from_millis(20));
        assert!(v.poll());
        assert_eq!(v.image().unwrap().dimensions(), (9, 7));
    }

    #[test]
    fn failed_render_keeps_previous_image() {
        let mut v = viewer((6, 4));
        v.refresh().unwrap();
        v.resize(1, 1);
        assert!(v.wait().is_err());
        assert!(v.last_error().is_some());
        assert_eq!(v.image().unwrap().dimensions(), (6, 4));
        v.resize(6, 4);
        v.wait().unwrap();
        assert!(v.last_error().is_none());
    }

    #[test]
    fn pick_on_degenerate_viewport_fails_without_rendering() {
        let mut v = viewer((1, 3));
        assert!(v.pick(0, 0).is_err());
        assert_eq!(v.generation(), 0);
        assert_eq!(v.selected(), DEFAULT_PARAMETER);
    }
}
