//! Stateful document viewer.
//!
//! Ties a parsed document, its painted layer set, the camera and a
//! renderer together, and exposes selection, highlighting and redraw
//! scheduling to a host event loop. Event listeners are invoked
//! synchronously from the mutating call.

use kicad_parse::board::Board;
use kicad_parse::types::{BBox, Vec2};
use kicad_parse::{parse_document, Document};

use crate::camera::Camera;
use crate::error::ViewerError;
use crate::layers::{ItemId, ViewLayerSet, OVERLAY_NAME};
use crate::math::{point_segment_distance, Transform};
use crate::painter::{BoardPainter, PaintContext, SchematicPainter, SELECTION_COLOR};
use crate::renderer::Renderer;

const OVERLAY_DEPTH: f64 = 1000.0;
const SELECTION_MARGIN: f64 = 0.5;
const SELECTION_STROKE: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerState {
    Unloaded,
    Loaded,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewerEvent {
    LoadComplete,
    SelectionChanged {
        item: Option<ItemId>,
        previous: Option<ItemId>,
        /// Set when the same item was selected again.
        reselected: bool,
    },
    NetHighlightChanged {
        net: Option<String>,
    },
}

type Listener = Box<dyn FnMut(&ViewerEvent)>;

pub struct Viewer<R: Renderer> {
    renderer: R,
    pub camera: Camera,
    document: Option<Document>,
    layers: Option<ViewLayerSet>,
    selection: Option<ItemId>,
    highlighted_net: Option<String>,
    draw_pending: bool,
    listeners: Vec<Listener>,
}

impl<R: Renderer> Viewer<R> {
    pub fn new(renderer: R) -> Self {
        Self {
            renderer,
            camera: Camera::default(),
            document: None,
            layers: None,
            selection: None,
            highlighted_net: None,
            draw_pending: false,
            listeners: Vec::new(),
        }
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn state(&self) -> ViewerState {
        if self.document.is_some() {
            ViewerState::Loaded
        } else {
            ViewerState::Unloaded
        }
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    pub fn layers(&self) -> Option<&ViewLayerSet> {
        self.layers.as_ref()
    }

    pub fn on_event(&mut self, listener: impl FnMut(&ViewerEvent) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    fn emit(&mut self, event: ViewerEvent) {
        // Listeners may call back into the viewer's accessors, so they
        // are detached for the duration of the dispatch.
        let mut listeners = std::mem::take(&mut self.listeners);
        for listener in listeners.iter_mut() {
            listener(&event);
        }
        listeners.append(&mut self.listeners);
        self.listeners = listeners;
    }

    /// Parse and display a document. Parsing happens before any state is
    /// touched, so a failed load leaves the previous document intact.
    pub fn load(&mut self, text: &str) -> Result<(), ViewerError> {
        let document = parse_document(text)?;

        if let Some(mut old) = self.layers.take() {
            old.dispose(&mut self.renderer);
        }
        self.renderer.clear_canvas();

        let layers = match &document {
            Document::Board(board) => BoardPainter::paint(board, &mut self.renderer),
            Document::Schematic(schematic) => {
                SchematicPainter::paint(schematic, &mut self.renderer)
            }
        };

        let mut bbox = layers.bbox();
        if !bbox.is_valid() {
            bbox = match &document {
                Document::Board(board) => board.edges_bbox(),
                Document::Schematic(schematic) => schematic.content_bbox(),
            };
        }
        self.camera.fit_to_bbox(&bbox);

        self.document = Some(document);
        self.layers = Some(layers);
        self.selection = None;
        self.highlighted_net = None;
        self.emit(ViewerEvent::LoadComplete);
        self.draw();
        Ok(())
    }

    pub fn set_viewport(&mut self, width: f64, height: f64) {
        self.camera.set_viewport(width, height);
        self.renderer.update_viewport(width, height);
        self.draw_soon();
    }

    // ── Selection ────────────────────────────────────────────────────

    pub fn selection(&self) -> Option<ItemId> {
        self.selection
    }

    pub fn selection_bbox(&self) -> Option<BBox> {
        let layers = self.layers.as_ref()?;
        self.selection.and_then(|item| layers.bbox_for(item))
    }

    /// Select an item (or clear with `None`). Selecting the already
    /// selected item signals a re-selection rather than a no-op, so
    /// hosts can implement focus-on-second-click.
    pub fn select_item(&mut self, item: Option<ItemId>) {
        let previous = self.selection;
        let reselected = item.is_some() && item == previous;
        self.selection = item;
        self.update_overlay();
        self.emit(ViewerEvent::SelectionChanged {
            item,
            previous,
            reselected,
        });
        self.draw_soon();
    }

    /// Select a footprint or symbol by reference designator. An unknown
    /// reference clears the selection.
    pub fn select_reference(&mut self, reference: &str) {
        let item = match &self.document {
            Some(Document::Board(board)) => board
                .find_footprint(reference)
                .map(|(i, _)| ItemId::Footprint(i)),
            Some(Document::Schematic(schematic)) => schematic
                .find_symbol(reference)
                .map(|(i, _)| ItemId::Symbol(i)),
            None => None,
        };
        if item.is_none() {
            log::debug!("no item with reference {reference:?}");
        }
        self.select_item(item);
    }

    /// Select the front-most interactive item at a world position.
    pub fn select_at(&mut self, world: Vec2) {
        let hit = self
            .layers
            .as_ref()
            .and_then(|layers| layers.query_point(world).next().map(|(_, id, _)| id));
        self.select_item(hit);
    }

    // ── Highlighting ─────────────────────────────────────────────────

    pub fn highlight_layer(&mut self, name: Option<&str>) {
        if let Some(layers) = self.layers.as_mut() {
            match name {
                Some(name) => layers.highlight(Some(&[name])),
                None => layers.highlight(None),
            }
        }
        self.draw_soon();
    }

    pub fn highlighted_net(&self) -> Option<&str> {
        self.highlighted_net.as_deref()
    }

    /// Highlight all copper belonging to a named net. Boards only; on a
    /// schematic the highlight is cleared.
    pub fn highlight_net(&mut self, net: Option<&str>) {
        self.highlighted_net = match (&self.document, net) {
            (Some(Document::Board(board)), Some(name)) => {
                let known = board.net_by_name(name).map(|n| n.name.clone());
                if known.is_none() {
                    log::debug!("no net named {name:?}");
                }
                known
            }
            _ => None,
        };
        self.update_overlay();
        self.emit(ViewerEvent::NetHighlightChanged {
            net: self.highlighted_net.clone(),
        });
        self.draw_soon();
    }

    /// Net under a world position, scanning tracks, vias and pads.
    pub fn net_at(&self, world: Vec2) -> Option<String> {
        let Some(Document::Board(board)) = &self.document else {
            return None;
        };
        let number = board_net_at(board, world)?;
        board.net_name(number).map(|s| s.to_string())
    }

    // ── Drawing ──────────────────────────────────────────────────────

    /// Composite all layers through the camera now.
    pub fn draw(&mut self) {
        if let Some(layers) = self.layers.as_ref() {
            layers.render(&mut self.renderer, &self.camera.matrix());
        }
        self.draw_pending = false;
    }

    /// Request a redraw on the next [`Viewer::frame`]. Repeated requests
    /// coalesce into a single draw.
    pub fn draw_soon(&mut self) {
        self.draw_pending = true;
    }

    /// Host tick; draws if a redraw was requested.
    pub fn frame(&mut self) {
        if self.draw_pending {
            self.draw();
        }
    }

    /// Rebuild the overlay layer from the current selection and net
    /// highlight.
    fn update_overlay(&mut self) {
        let selection_bbox = self.selection_bbox();
        let Some(layers) = self.layers.as_mut() else {
            return;
        };
        if let Some(old) = layers.overlay.graphics.take() {
            self.renderer.dispose_layer(old);
        }

        self.renderer.start_layer(OVERLAY_NAME, OVERLAY_DEPTH);
        {
            let mut ctx = PaintContext::new(&mut self.renderer);
            if let Some(bbox) = selection_bbox {
                let b = bbox.grow(SELECTION_MARGIN);
                ctx.stroke_line(
                    &[
                        Vec2::new(b.minx, b.miny),
                        Vec2::new(b.maxx, b.miny),
                        Vec2::new(b.maxx, b.maxy),
                        Vec2::new(b.minx, b.maxy),
                        Vec2::new(b.minx, b.miny),
                    ],
                    SELECTION_STROKE,
                    SELECTION_COLOR,
                );
            }
            if let (Some(Document::Board(board)), Some(net)) =
                (&self.document, &self.highlighted_net)
            {
                if let Some(net) = board.net_by_name(net) {
                    BoardPainter::paint_net(board, net.number, &mut ctx);
                }
            }
        }
        layers.overlay.graphics = Some(self.renderer.end_layer());
    }
}

fn board_net_at(board: &Board, world: Vec2) -> Option<u32> {
    for s in &board.segments {
        if s.net != 0 && point_segment_distance(world, s.start, s.end) <= s.width / 2.0 {
            return Some(s.net);
        }
    }
    for v in &board.vias {
        if v.net != 0 && world.distance(&v.at) <= v.size / 2.0 {
            return Some(v.net);
        }
    }
    for f in &board.footprints {
        let placement = Transform::placement(f.at.position(), f.at.rotation);
        for pad in &f.pads {
            let Some(net) = &pad.net else {
                continue;
            };
            let pad_placement = placement.multiply(&Transform::placement(
                pad.at.position(),
                pad.at.rotation - f.at.rotation,
            ));
            let Some(inverse) = pad_placement.inverse() else {
                continue;
            };
            let local = inverse.apply(world);
            if local.x.abs() <= pad.size.x / 2.0 && local.y.abs() <= pad.size.y / 2.0 {
                return Some(net.number);
            }
        }
    }
    None
}
