//! Rendering backend abstraction.
//!
//! A [`Renderer`] builds named retained layers out of geometric primitives
//! and later composites them in an arbitrary order with a transform and an
//! alpha. The [`RecordingRenderer`] backend keeps everything as inspectable
//! data, which is what the tests (and any headless consumer) use.

use kicad_parse::types::Vec2;

use crate::math::Transform;

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);
}

/// Open polyline stroked with a round-capped pen.
#[derive(Debug, Clone, PartialEq)]
pub struct Polyline {
    pub points: Vec<Vec2>,
    pub width: f64,
    pub color: Color,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub center: Vec2,
    pub radius: f64,
    /// Stroke width; ignored when `fill` is set.
    pub width: f64,
    pub fill: bool,
    pub color: Color,
}

/// Circular arc described by center, radius and start/end angles in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arc {
    pub center: Vec2,
    pub radius: f64,
    pub start_angle: f64,
    pub end_angle: f64,
    pub width: f64,
    pub color: Color,
}

/// Filled polygon. The outline is implicitly closed.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub points: Vec<Vec2>,
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Line(Polyline),
    Circle(Circle),
    Arc(Arc),
    Polygon(Polygon),
}

/// Opaque handle to a finished renderer layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderLayerHandle(pub usize);

pub trait Renderer {
    /// Drop all retained layers and reset the output surface.
    fn clear_canvas(&mut self);

    fn update_viewport(&mut self, width: f64, height: f64);

    /// Begin recording primitives into a new layer. `depth` orders layers
    /// when the backend composites in a single pass.
    fn start_layer(&mut self, name: &str, depth: f64);

    /// Finish the layer opened by [`Renderer::start_layer`].
    fn end_layer(&mut self) -> RenderLayerHandle;

    fn line(&mut self, line: Polyline);
    fn circle(&mut self, circle: Circle);
    fn arc(&mut self, arc: Arc);
    fn polygon(&mut self, polygon: Polygon);

    /// Composite a finished layer onto the output surface.
    fn draw_layer(&mut self, handle: RenderLayerHandle, matrix: &Transform, alpha: f64);

    /// Release a layer's resources. The handle must not be used afterwards.
    fn dispose_layer(&mut self, handle: RenderLayerHandle);
}

#[derive(Debug, Clone)]
pub struct RecordedLayer {
    pub name: String,
    pub depth: f64,
    pub primitives: Vec<Primitive>,
    pub disposed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub handle: RenderLayerHandle,
    pub matrix: Transform,
    pub alpha: f64,
}

/// Backend that records layers and composite calls as plain data.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    layers: Vec<RecordedLayer>,
    open: Option<RecordedLayer>,
    draw_calls: Vec<DrawCall>,
    viewport: Option<(f64, f64)>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn layer(&self, handle: RenderLayerHandle) -> &RecordedLayer {
        &self.layers[handle.0]
    }

    /// Live (not disposed) layers, in creation order.
    pub fn live_layers(&self) -> impl Iterator<Item = &RecordedLayer> {
        self.layers.iter().filter(|l| !l.disposed)
    }

    /// Composite calls since the last [`RecordingRenderer::reset_draw_log`].
    pub fn draw_log(&self) -> &[DrawCall] {
        &self.draw_calls
    }

    pub fn reset_draw_log(&mut self) {
        self.draw_calls.clear();
    }

    pub fn viewport(&self) -> Option<(f64, f64)> {
        self.viewport
    }

    fn record(&mut self, primitive: Primitive) {
        if let Some(layer) = self.open.as_mut() {
            layer.primitives.push(primitive);
        } else {
            log::warn!("primitive emitted outside start_layer/end_layer, dropped");
        }
    }
}

impl Renderer for RecordingRenderer {
    fn clear_canvas(&mut self) {
        self.layers.clear();
        self.open = None;
        self.draw_calls.clear();
    }

    fn update_viewport(&mut self, width: f64, height: f64) {
        self.viewport = Some((width, height));
    }

    fn start_layer(&mut self, name: &str, depth: f64) {
        if self.open.is_some() {
            log::warn!("start_layer while a layer is open, previous layer dropped");
        }
        self.open = Some(RecordedLayer {
            name: name.to_string(),
            depth,
            primitives: Vec::new(),
            disposed: false,
        });
    }

    fn end_layer(&mut self) -> RenderLayerHandle {
        let layer = self.open.take().unwrap_or_else(|| RecordedLayer {
            name: String::new(),
            depth: 0.0,
            primitives: Vec::new(),
            disposed: false,
        });
        self.layers.push(layer);
        RenderLayerHandle(self.layers.len() - 1)
    }

    fn line(&mut self, line: Polyline) {
        self.record(Primitive::Line(line));
    }

    fn circle(&mut self, circle: Circle) {
        self.record(Primitive::Circle(circle));
    }

    fn arc(&mut self, arc: Arc) {
        self.record(Primitive::Arc(arc));
    }

    fn polygon(&mut self, polygon: Polygon) {
        self.record(Primitive::Polygon(polygon));
    }

    fn draw_layer(&mut self, handle: RenderLayerHandle, matrix: &Transform, alpha: f64) {
        self.draw_calls.push(DrawCall {
            handle,
            matrix: *matrix,
            alpha,
        });
    }

    fn dispose_layer(&mut self, handle: RenderLayerHandle) {
        if let Some(layer) = self.layers.get_mut(handle.0) {
            layer.disposed = true;
            layer.primitives.clear();
        }
    }
}
