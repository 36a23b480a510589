//! Document view layers.
//!
//! A [`ViewLayer`] ties a retained renderer layer to visibility and
//! interactivity flags plus the bounding boxes of the items painted onto
//! it. [`ViewLayerSet`] owns the layers in front-to-back add order and
//! derives the back-to-front display order from it, with highlighted
//! layers pulled above the rest and a dedicated overlay always on top.

use std::collections::HashMap;

use kicad_parse::types::{BBox, Vec2};

use crate::math::Transform;
use crate::renderer::{Color, RenderLayerHandle, Renderer};

/// Name reserved for the overlay layer.
pub const OVERLAY_NAME: &str = ":Overlay";

/// Alpha applied to non-highlighted layers while any layer is highlighted.
const DIM_ALPHA: f64 = 0.25;

/// Stable identity of a document item, an index into the document's own
/// collections rather than a borrow of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemId {
    Drawing(usize),
    Footprint(usize),
    Segment(usize),
    ArcTrack(usize),
    Via(usize),
    Zone(usize),
    Symbol(usize),
    Wire(usize),
    Junction(usize),
    Label(usize),
    NoConnect(usize),
}

#[derive(Debug)]
pub struct ViewLayer {
    pub name: String,
    pub color: Color,
    pub visible: bool,
    /// Whether the layer participates in point queries.
    pub interactive: bool,
    pub highlighted: bool,
    pub graphics: Option<RenderLayerHandle>,
    bboxes: Vec<(ItemId, BBox)>,
}

impl ViewLayer {
    pub fn new(name: impl Into<String>, color: Color, visible: bool, interactive: bool) -> Self {
        Self {
            name: name.into(),
            color,
            visible,
            interactive,
            highlighted: false,
            graphics: None,
            bboxes: Vec::new(),
        }
    }

    /// Record the bbox an item occupies on this layer, replacing any
    /// earlier record for the same item.
    pub fn set_item_bbox(&mut self, item: ItemId, bbox: BBox) {
        if let Some(slot) = self.bboxes.iter_mut().find(|(id, _)| *id == item) {
            slot.1 = bbox;
        } else {
            self.bboxes.push((item, bbox));
        }
    }

    pub fn item_bbox(&self, item: ItemId) -> Option<&BBox> {
        self.bboxes
            .iter()
            .find(|(id, _)| *id == item)
            .map(|(_, b)| b)
    }

    pub fn items(&self) -> impl Iterator<Item = (ItemId, &BBox)> {
        self.bboxes.iter().map(|(id, b)| (*id, b))
    }

    /// Union of all item bboxes on this layer.
    pub fn bbox(&self) -> BBox {
        let mut out = BBox::empty();
        for (_, b) in &self.bboxes {
            out = out.union(b);
        }
        out
    }
}

#[derive(Debug)]
pub struct ViewLayerSet {
    layers: Vec<ViewLayer>,
    by_name: HashMap<String, usize>,
    pub overlay: ViewLayer,
}

impl ViewLayerSet {
    pub fn new() -> Self {
        Self {
            layers: Vec::new(),
            by_name: HashMap::new(),
            overlay: ViewLayer::new(OVERLAY_NAME, Color::WHITE, true, false),
        }
    }

    /// Append a layer. Add order is front-to-back: earlier layers win
    /// point queries and draw above later ones.
    pub fn add(&mut self, layer: ViewLayer) {
        self.by_name.insert(layer.name.clone(), self.layers.len());
        self.layers.push(layer);
    }

    pub fn by_name(&self, name: &str) -> Option<&ViewLayer> {
        self.by_name.get(name).map(|&i| &self.layers[i])
    }

    pub fn by_name_mut(&mut self, name: &str) -> Option<&mut ViewLayer> {
        self.by_name.get(name).map(|&i| &mut self.layers[i])
    }

    /// Layers in add order, overlay excluded.
    pub fn in_order(&self) -> impl Iterator<Item = &ViewLayer> {
        self.layers.iter()
    }

    pub fn in_order_mut(&mut self) -> impl Iterator<Item = &mut ViewLayer> {
        self.layers.iter_mut()
    }

    /// Back-to-front paint order: non-highlighted layers reversed, then
    /// highlighted layers reversed, then the overlay.
    pub fn in_display_order(&self) -> impl Iterator<Item = &ViewLayer> {
        self.layers
            .iter()
            .rev()
            .filter(|l| !l.highlighted)
            .chain(self.layers.iter().rev().filter(|l| l.highlighted))
            .chain(std::iter::once(&self.overlay))
    }

    /// Highlight exactly the named layers; `None` clears all highlights.
    pub fn highlight(&mut self, names: Option<&[&str]>) {
        for layer in &mut self.layers {
            layer.highlighted = match names {
                Some(names) => names.contains(&layer.name.as_str()),
                None => false,
            };
        }
    }

    pub fn is_any_highlighted(&self) -> bool {
        self.layers.iter().any(|l| l.highlighted)
    }

    /// Composite all visible layers through the renderer. While any layer
    /// is highlighted, the others are dimmed.
    pub fn render(&self, renderer: &mut dyn Renderer, matrix: &Transform) {
        let dim = self.is_any_highlighted();
        for layer in self.in_display_order() {
            if !layer.visible {
                continue;
            }
            let Some(handle) = layer.graphics else {
                continue;
            };
            let alpha = if dim && !layer.highlighted && layer.name != OVERLAY_NAME {
                DIM_ALPHA
            } else {
                1.0
            };
            renderer.draw_layer(handle, matrix, alpha);
        }
    }

    /// Items whose bbox contains `point`, front-most first. Only visible
    /// interactive layers participate.
    pub fn query_point(&self, point: Vec2) -> impl Iterator<Item = (&ViewLayer, ItemId, BBox)> {
        self.layers
            .iter()
            .filter(|l| l.visible && l.interactive)
            .flat_map(move |layer| {
                layer
                    .items()
                    .filter(move |(_, b)| b.is_valid() && b.contains(point))
                    .map(move |(id, b)| (layer, id, *b))
            })
    }

    /// Union of the bboxes recorded for an item across all layers, or
    /// `None` when no layer knows the item.
    pub fn bbox_for(&self, item: ItemId) -> Option<BBox> {
        let mut out: Option<BBox> = None;
        for layer in &self.layers {
            if let Some(b) = layer.item_bbox(item) {
                out = Some(match out {
                    Some(acc) => acc.union(b),
                    None => *b,
                });
            }
        }
        out
    }

    /// Union bbox of all layer content.
    pub fn bbox(&self) -> BBox {
        let mut out = BBox::empty();
        for layer in &self.layers {
            out = out.union(&layer.bbox());
        }
        out
    }

    /// Release every retained renderer layer.
    pub fn dispose(&mut self, renderer: &mut dyn Renderer) {
        for layer in &mut self.layers {
            if let Some(handle) = layer.graphics.take() {
                renderer.dispose_layer(handle);
            }
        }
        if let Some(handle) = self.overlay.graphics.take() {
            renderer.dispose_layer(handle);
        }
    }
}

impl Default for ViewLayerSet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::RecordingRenderer;

    fn layer(name: &str) -> ViewLayer {
        ViewLayer::new(name, Color::WHITE, true, true)
    }

    fn set_abc() -> ViewLayerSet {
        let mut set = ViewLayerSet::new();
        set.add(layer("A"));
        set.add(layer("B"));
        set.add(layer("C"));
        set
    }

    #[test]
    fn test_display_order_reverses_add_order() {
        let set = set_abc();
        let names: Vec<&str> = set.in_display_order().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["C", "B", "A", OVERLAY_NAME]);
    }

    #[test]
    fn test_highlighted_layer_moves_above_the_rest() {
        let mut set = set_abc();
        set.highlight(Some(&["B"]));
        let names: Vec<&str> = set.in_display_order().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["C", "A", "B", OVERLAY_NAME]);
    }

    #[test]
    fn test_highlight_none_clears() {
        let mut set = set_abc();
        set.highlight(Some(&["A"]));
        assert!(set.is_any_highlighted());
        set.highlight(None);
        assert!(!set.is_any_highlighted());
    }

    #[test]
    fn test_render_dims_non_highlighted_layers() {
        let mut renderer = RecordingRenderer::new();
        let mut set = set_abc();
        for layer in set.in_order_mut() {
            renderer.start_layer(&layer.name, 0.0);
            layer.graphics = Some(renderer.end_layer());
        }
        set.highlight(Some(&["B"]));
        set.render(&mut renderer, &Transform::identity());

        let log = renderer.draw_log();
        assert_eq!(log.len(), 3);
        // C and A dimmed, B full strength and on top.
        assert_eq!(log[0].alpha, 0.25);
        assert_eq!(log[1].alpha, 0.25);
        assert_eq!(log[2].alpha, 1.0);
    }

    #[test]
    fn test_set_item_bbox_replaces() {
        let mut l = layer("A");
        l.set_item_bbox(ItemId::Footprint(0), BBox::new(0.0, 0.0, 1.0, 1.0));
        l.set_item_bbox(ItemId::Footprint(0), BBox::new(0.0, 0.0, 2.0, 2.0));
        assert_eq!(l.items().count(), 1);
        assert_eq!(l.item_bbox(ItemId::Footprint(0)).unwrap().maxx, 2.0);
    }

    #[test]
    fn test_bbox_union_across_layers() {
        let mut set = set_abc();
        set.by_name_mut("A")
            .unwrap()
            .set_item_bbox(ItemId::Segment(0), BBox::new(0.0, 0.0, 5.0, 5.0));
        set.by_name_mut("C")
            .unwrap()
            .set_item_bbox(ItemId::Via(0), BBox::new(-2.0, 1.0, 1.0, 8.0));
        let bbox = set.bbox();
        assert_eq!(bbox.minx, -2.0);
        assert_eq!(bbox.miny, 0.0);
        assert_eq!(bbox.maxx, 5.0);
        assert_eq!(bbox.maxy, 8.0);
    }

    #[test]
    fn test_query_point_front_most_first() {
        let mut set = set_abc();
        set.by_name_mut("A")
            .unwrap()
            .set_item_bbox(ItemId::Footprint(0), BBox::new(0.0, 0.0, 10.0, 10.0));
        set.by_name_mut("B")
            .unwrap()
            .set_item_bbox(ItemId::Segment(3), BBox::new(4.0, 4.0, 6.0, 6.0));
        set.by_name_mut("C")
            .unwrap()
            .set_item_bbox(ItemId::Via(1), BBox::new(20.0, 20.0, 21.0, 21.0));

        let hits: Vec<ItemId> = set
            .query_point(Vec2::new(5.0, 5.0))
            .map(|(_, id, _)| id)
            .collect();
        assert_eq!(hits, vec![ItemId::Footprint(0), ItemId::Segment(3)]);
    }

    #[test]
    fn test_query_point_skips_hidden_and_passive_layers() {
        let mut set = set_abc();
        set.by_name_mut("A")
            .unwrap()
            .set_item_bbox(ItemId::Footprint(0), BBox::new(0.0, 0.0, 10.0, 10.0));
        set.by_name_mut("A").unwrap().visible = false;
        set.by_name_mut("B")
            .unwrap()
            .set_item_bbox(ItemId::Wire(0), BBox::new(0.0, 0.0, 10.0, 10.0));
        set.by_name_mut("B").unwrap().interactive = false;
        assert_eq!(set.query_point(Vec2::new(5.0, 5.0)).count(), 0);
    }
}
