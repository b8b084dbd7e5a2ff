//! Pan and zoom of the canvas.
//!
//! The viewport maps screen points to canvas space:
//! `screen = canvas * zoom + pan`. Only the canvas coordinator holds one;
//! primitives see canvas-space points and never know about the transform.

use agent_factory_core::Point;

#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    pan: Point,
    zoom: f64,
    min_zoom: f64,
    max_zoom: f64,
}

impl Viewport {
    /// An identity viewport with the given zoom limits.
    #[must_use]
    pub fn new(min_zoom: f64, max_zoom: f64) -> Self {
        Self {
            pan: Point::default(),
            zoom: 1.0,
            min_zoom,
            max_zoom,
        }
    }

    #[must_use]
    pub fn pan(&self) -> Point {
        self.pan
    }

    #[must_use]
    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Shifts the canvas by a screen-space delta.
    pub fn pan_by(&mut self, delta: Point) {
        self.pan = self.pan + delta;
    }

    /// Multiplies the zoom by `factor`, keeping `screen_point` fixed.
    ///
    /// The resulting zoom is clamped to the configured limits. Non-finite or
    /// non-positive factors are ignored.
    pub fn zoom_at(&mut self, screen_point: Point, factor: f64) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        let old_zoom = self.zoom;
        self.zoom = (self.zoom * factor).clamp(self.min_zoom, self.max_zoom);
        let ratio = self.zoom / old_zoom;
        self.pan = Point::new(
            screen_point.x + (self.pan.x - screen_point.x) * ratio,
            screen_point.y + (self.pan.y - screen_point.y) * ratio,
        );
    }

    #[must_use]
    pub fn screen_to_canvas(&self, screen: Point) -> Point {
        Point::new(
            (screen.x - self.pan.x) / self.zoom,
            (screen.y - self.pan.y) / self.zoom,
        )
    }

    #[must_use]
    pub fn canvas_to_screen(&self, canvas: Point) -> Point {
        Point::new(
            canvas.x * self.zoom + self.pan.x,
            canvas.y * self.zoom + self.pan.y,
        )
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(0.25, 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_by_default() {
        let viewport = Viewport::default();
        let p = Point::new(12.0, -7.5);
        assert_eq!(viewport.screen_to_canvas(p), p);
    }

    #[test]
    fn pan_and_zoom_round_trip() {
        let mut viewport = Viewport::default();
        viewport.pan_by(Point::new(40.0, 20.0));
        viewport.zoom_at(Point::new(0.0, 0.0), 2.0);
        let canvas = Point::new(10.0, 10.0);
        let screen = viewport.canvas_to_screen(canvas);
        assert_eq!(screen, Point::new(100.0, 60.0));
        assert_eq!(viewport.screen_to_canvas(screen), canvas);
    }

    #[test]
    fn zoom_keeps_anchor_fixed() {
        let mut viewport = Viewport::default();
        let anchor = Point::new(200.0, 100.0);
        let before = viewport.screen_to_canvas(anchor);
        viewport.zoom_at(anchor, 1.5);
        assert_eq!(viewport.screen_to_canvas(anchor), before);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut viewport = Viewport::new(0.5, 2.0);
        viewport.zoom_at(Point::default(), 10.0);
        assert_eq!(viewport.zoom(), 2.0);
        viewport.zoom_at(Point::default(), 0.01);
        assert_eq!(viewport.zoom(), 0.5);
        viewport.zoom_at(Point::default(), f64::NAN);
        assert_eq!(viewport.zoom(), 0.5);
    }
}
