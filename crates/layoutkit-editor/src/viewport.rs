//! Viewport and coordinate transformation for canvas rendering.
//!
//! The visible area is a rectangle in document coordinates. Both document and
//! pixel space have their origin at the top-left with y growing downwards, so
//! the mapping is a plain scale and translation. A fit mode, when set,
//! recomputes the rectangle from the container's aspect ratio whenever the
//! container or the content changes; a manual pan or zoom clears it.

use std::fmt;

use layoutkit_core::Point2D;
use layoutkit_settings::{FitMode, ViewportSettings};

/// Zoom step used by [`Viewport::zoom_in_at`] and [`Viewport::zoom_out_at`].
const ZOOM_STEP: f64 = 1.2;

/// Axis-aligned rectangle in document coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ViewRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ViewRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center(&self) -> Point2D {
        Point2D::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Represents the viewport state: visible rectangle, container and content size.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    view: ViewRect,
    container_width: f64,
    container_height: f64,
    content_width: f64,
    content_height: f64,
    fit: FitMode,
    min_zoom: f64,
    max_zoom: f64,
}

impl Viewport {
    /// Creates a viewport showing the document at 1:1 from the origin.
    pub fn new(container_width: f64, container_height: f64) -> Self {
        let defaults = ViewportSettings::default();
        Self {
            view: ViewRect::new(0.0, 0.0, container_width, container_height),
            container_width,
            container_height,
            content_width: 0.0,
            content_height: 0.0,
            fit: FitMode::None,
            min_zoom: defaults.min_zoom,
            max_zoom: defaults.max_zoom,
        }
    }

    /// Creates a viewport using the configured zoom limits and initial fit.
    pub fn with_settings(settings: &ViewportSettings) -> Self {
        let mut viewport = Self::default();
        viewport.min_zoom = settings.min_zoom;
        viewport.max_zoom = settings.max_zoom;
        viewport.fit = settings.default_fit;
        viewport
    }

    pub fn view(&self) -> ViewRect {
        self.view
    }

    pub fn fit(&self) -> FitMode {
        self.fit
    }

    pub fn container_size(&self) -> (f64, f64) {
        (self.container_width, self.container_height)
    }

    pub fn content_size(&self) -> (f64, f64) {
        (self.content_width, self.content_height)
    }

    /// Current zoom level (1.0 = one document unit per pixel).
    pub fn zoom(&self) -> f64 {
        if self.view.width > 0.0 {
            self.container_width / self.view.width
        } else {
            1.0
        }
    }

    /// Sets the container dimensions (typically called when the window resizes).
    pub fn set_container_size(&mut self, width: f64, height: f64) {
        let zoom = self.zoom();
        self.container_width = width;
        self.container_height = height;
        self.view.width = width / zoom;
        self.view.height = height / zoom;
        self.apply_fit();
    }

    /// Sets the extent of the laid-out page content.
    pub fn set_content_size(&mut self, width: f64, height: f64) {
        self.content_width = width;
        self.content_height = height;
        self.apply_fit();
    }

    /// Selects a fit mode and recomputes the view rectangle.
    pub fn set_fit(&mut self, fit: FitMode) {
        self.fit = fit;
        self.apply_fit();
    }

    fn apply_fit(&mut self) {
        let (cw, ch) = (self.container_width, self.container_height);
        let (w, h) = (self.content_width, self.content_height);
        if cw <= 0.0 || ch <= 0.0 || w <= 0.0 || h <= 0.0 {
            return;
        }
        let fit = match self.fit {
            FitMode::None => return,
            FitMode::Page if w / h > cw / ch => FitMode::Width,
            FitMode::Page => FitMode::Height,
            other => other,
        };
        match fit {
            FitMode::Width => {
                let view_height = w * ch / cw;
                let y = if self.fit == FitMode::Page {
                    (h - view_height) / 2.0
                } else {
                    0.0
                };
                self.view = ViewRect::new(0.0, y, w, view_height);
            }
            _ => {
                let view_width = h * cw / ch;
                self.view = ViewRect::new((w - view_width) / 2.0, 0.0, view_width, h);
            }
        }
    }

    /// Sets the zoom level around the view center, clamped to the configured range.
    pub fn set_zoom(&mut self, zoom: f64) {
        let center = self.view.center();
        self.zoom_to_point(center, zoom);
    }

    /// Zooms so that `world_point` keeps its screen position.
    pub fn zoom_to_point(&mut self, world_point: Point2D, new_zoom: f64) {
        if !new_zoom.is_finite() || new_zoom <= 0.0 {
            return;
        }
        let new_zoom = new_zoom.clamp(self.min_zoom, self.max_zoom);
        let (px, py) = self.world_to_pixel(world_point);
        self.view.width = self.container_width / new_zoom;
        self.view.height = self.container_height / new_zoom;
        self.view.x = world_point.x - px / new_zoom;
        self.view.y = world_point.y - py / new_zoom;
        self.fit = FitMode::None;
    }

    /// Zooms in at a specific world point (maintaining cursor position).
    pub fn zoom_in_at(&mut self, world_point: Point2D) {
        self.zoom_to_point(world_point, self.zoom() * ZOOM_STEP);
    }

    /// Zooms out at a specific world point (maintaining cursor position).
    pub fn zoom_out_at(&mut self, world_point: Point2D) {
        self.zoom_to_point(world_point, self.zoom() / ZOOM_STEP);
    }

    /// Pans by a delta in pixels.
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        let zoom = self.zoom();
        self.view.x -= dx / zoom;
        self.view.y -= dy / zoom;
        self.fit = FitMode::None;
    }

    /// Moves the view so its top-left corner is at `(x, y)` in document coordinates.
    pub fn pan_to(&mut self, x: f64, y: f64) {
        self.view.x = x;
        self.view.y = y;
        self.fit = FitMode::None;
    }

    /// Centers the viewport on a world coordinate.
    pub fn center_on(&mut self, point: Point2D) {
        self.pan_to(
            point.x - self.view.width / 2.0,
            point.y - self.view.height / 2.0,
        );
    }

    /// Converts pixel coordinates to world coordinates.
    pub fn pixel_to_world(&self, pixel_x: f64, pixel_y: f64) -> Point2D {
        let zoom = self.zoom();
        Point2D::new(self.view.x + pixel_x / zoom, self.view.y + pixel_y / zoom)
    }

    /// Converts world coordinates to pixel coordinates.
    pub fn world_to_pixel(&self, point: Point2D) -> (f64, f64) {
        let zoom = self.zoom();
        ((point.x - self.view.x) * zoom, (point.y - self.view.y) * zoom)
    }

    /// Converts a screen distance to document units at the current zoom.
    pub fn pixels_to_world_distance(&self, pixels: f64) -> f64 {
        pixels / self.zoom()
    }
}

impl fmt::Display for Viewport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Zoom: {:.2}x | View: ({:.1}, {:.1}) {:.1}x{:.1} | Fit: {}",
            self.zoom(),
            self.view.x,
            self.view.y,
            self.view.width,
            self.view.height,
            self.fit
        )
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1200.0, 800.0)
    }
}
