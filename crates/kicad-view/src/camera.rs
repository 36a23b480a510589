//! World-to-screen camera.

use kicad_parse::types::{BBox, Vec2};
use serde::Deserialize;

use crate::math::Transform;

/// Tunables a host can override before constructing the camera.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CameraOptions {
    /// Fraction of the viewport left around a fitted document.
    pub fit_margin: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
}

impl Default for CameraOptions {
    fn default() -> Self {
        Self {
            fit_margin: 0.01,
            min_zoom: 0.05,
            max_zoom: 400.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Camera {
    options: CameraOptions,
    viewport: Vec2,
    center: Vec2,
    zoom: f64,
    rotation_deg: f64,
}

impl Camera {
    pub fn new(options: CameraOptions) -> Self {
        Self {
            options,
            viewport: Vec2::new(800.0, 600.0),
            center: Vec2::new(0.0, 0.0),
            zoom: 1.0,
            rotation_deg: 0.0,
        }
    }

    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    pub fn set_viewport(&mut self, width: f64, height: f64) {
        self.viewport = Vec2::new(width.max(1.0), height.max(1.0));
    }

    pub fn center(&self) -> Vec2 {
        self.center
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom.clamp(self.options.min_zoom, self.options.max_zoom);
    }

    pub fn rotation(&self) -> f64 {
        self.rotation_deg
    }

    /// View rotation about the camera center, degrees.
    pub fn set_rotation(&mut self, degrees: f64) {
        self.rotation_deg = degrees.rem_euclid(360.0);
    }

    pub fn pan(&mut self, delta_screen: Vec2) {
        let origin = self.screen_to_world(Vec2::new(0.0, 0.0));
        let moved = self.screen_to_world(delta_screen);
        self.center.x -= moved.x - origin.x;
        self.center.y -= moved.y - origin.y;
    }

    /// Zoom about a fixed screen point so the world position under the
    /// cursor stays put.
    pub fn zoom_at(&mut self, screen: Vec2, factor: f64) {
        let anchor = self.screen_to_world(screen);
        self.set_zoom(self.zoom * factor);
        let after = self.screen_to_world(screen);
        self.center.x += anchor.x - after.x;
        self.center.y += anchor.y - after.y;
    }

    /// Center and zoom so `bbox` fills the viewport, minus the margin.
    /// Degenerate boxes only recenter; a near-zero computed scale falls
    /// back to 1.0.
    pub fn fit_to_bbox(&mut self, bbox: &BBox) {
        if !bbox.is_valid() {
            return;
        }
        self.center = bbox.center();
        if bbox.width() <= 0.0 || bbox.height() <= 0.0 {
            return;
        }
        let usable = 1.0 - 2.0 * self.options.fit_margin;
        let scale_x = self.viewport.x * usable / bbox.width();
        let scale_y = self.viewport.y * usable / bbox.height();
        let mut scale = scale_x.min(scale_y);
        if scale < 0.1 {
            scale = 1.0;
        }
        self.set_zoom(scale);
    }

    /// World-to-screen transform handed to the layer compositor.
    pub fn matrix(&self) -> Transform {
        Transform::translation(Vec2::new(self.viewport.x / 2.0, self.viewport.y / 2.0))
            .multiply(&Transform::rotation_deg(self.rotation_deg))
            .multiply(&Transform::scale(self.zoom))
            .multiply(&Transform::translation(Vec2::new(
                -self.center.x,
                -self.center.y,
            )))
    }

    pub fn world_to_screen(&self, world: Vec2) -> Vec2 {
        self.matrix().apply(world)
    }

    pub fn screen_to_world(&self, screen: Vec2) -> Vec2 {
        match self.matrix().inverse() {
            Some(inv) => inv.apply(screen),
            // Zoom is clamped away from zero, so this is unreachable in
            // practice.
            None => self.center,
        }
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(CameraOptions::default())
    }
}
