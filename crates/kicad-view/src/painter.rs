//! Document painters.
//!
//! The painters walk a parsed document once per view layer and emit
//! primitives through a [`PaintContext`], which applies the transform
//! stack and accumulates the per-item bounding box that the layer set
//! uses for hit-testing.

use kicad_parse::board::{
    rotate_deg, ArcTrack, Board, Footprint, Pad, PadShape, Segment, Via, Zone,
};
use kicad_parse::schematic::{Schematic, SchematicSymbol, SymbolGraphic};
use kicad_parse::types::{BBox, Graphic, Vec2};

use crate::layers::{ItemId, ViewLayer, ViewLayerSet};
use crate::math::{arc_from_three_points, Transform};
use crate::renderer::{Arc, Circle, Color, Polygon, Polyline, Renderer};

/// Synthetic layer holding through-hole and via drills.
pub const DRILL_LAYER: &str = ":Drills";
/// Synthetic schematic layer carrying symbol hit boxes only.
pub const INTERACTIVE_LAYER: &str = ":Interactive";

pub const HIGHLIGHT_COLOR: Color = Color::rgba(0.2, 0.9, 0.9, 0.9);
pub const SELECTION_COLOR: Color = Color::rgba(1.0, 1.0, 0.4, 0.9);

const BACKGROUND: Color = Color::rgb(0.05, 0.05, 0.08);

/// Display color for a board or schematic layer.
pub fn layer_color(name: &str) -> Color {
    match name {
        "F.Cu" => Color::rgb(0.78, 0.35, 0.25),
        "B.Cu" => Color::rgb(0.3, 0.45, 0.75),
        "F.SilkS" | "B.SilkS" => Color::rgb(0.9, 0.9, 0.85),
        "F.Fab" | "B.Fab" => Color::rgb(0.55, 0.55, 0.58),
        "F.Mask" | "B.Mask" => Color::rgba(0.55, 0.2, 0.55, 0.6),
        "Edge.Cuts" => Color::rgb(0.85, 0.8, 0.5),
        DRILL_LAYER => BACKGROUND,
        "Wires" => Color::rgb(0.2, 0.6, 0.2),
        "Symbols" => Color::rgb(0.65, 0.15, 0.15),
        "Junctions" => Color::rgb(0.2, 0.6, 0.2),
        "Labels" => Color::rgb(0.75, 0.65, 0.2),
        _ => Color::rgb(0.6, 0.6, 0.6),
    }
}

// ─── Paint context ───────────────────────────────────────────────────

pub struct PaintContext<'r> {
    renderer: &'r mut dyn Renderer,
    stack: Vec<Transform>,
    item_bbox: BBox,
}

impl<'r> PaintContext<'r> {
    pub fn new(renderer: &'r mut dyn Renderer) -> Self {
        Self {
            renderer,
            stack: Vec::new(),
            item_bbox: BBox::empty(),
        }
    }

    pub fn transform(&self) -> Transform {
        self.stack.last().copied().unwrap_or_default()
    }

    /// Push a transform composed onto the current one.
    pub fn push(&mut self, t: Transform) {
        let top = self.transform();
        self.stack.push(top.multiply(&t));
    }

    pub fn pop(&mut self) {
        self.stack.pop();
    }

    pub fn begin_item(&mut self) {
        self.item_bbox = BBox::empty();
    }

    pub fn take_item_bbox(&mut self) -> BBox {
        std::mem::replace(&mut self.item_bbox, BBox::empty())
    }

    fn map(&mut self, p: Vec2) -> Vec2 {
        let out = self.transform().apply(p);
        self.item_bbox.expand_vec(out);
        out
    }

    pub fn stroke_line(&mut self, points: &[Vec2], width: f64, color: Color) {
        let mapped: Vec<Vec2> = points.iter().map(|p| self.map(*p)).collect();
        let width = width * self.transform().scale_factor();
        self.renderer.line(Polyline {
            points: mapped,
            width,
            color,
        });
    }

    pub fn circle(&mut self, center: Vec2, radius: f64, width: f64, fill: bool, color: Color) {
        let scale = self.transform().scale_factor();
        let center = self.map(center);
        let radius = radius * scale;
        self.item_bbox.expand_point(center.x - radius, center.y - radius);
        self.item_bbox.expand_point(center.x + radius, center.y + radius);
        self.renderer.circle(Circle {
            center,
            radius,
            width: width * scale,
            fill,
            color,
        });
    }

    pub fn arc(
        &mut self,
        center: Vec2,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
        width: f64,
        color: Color,
    ) {
        let t = self.transform();
        let scale = t.scale_factor();
        let rot = t.b.atan2(t.a).to_degrees();
        let center = self.map(center);
        let radius = radius * scale;
        self.item_bbox.expand_point(center.x - radius, center.y - radius);
        self.item_bbox.expand_point(center.x + radius, center.y + radius);
        self.renderer.arc(Arc {
            center,
            radius,
            start_angle: start_angle + rot,
            end_angle: end_angle + rot,
            width: width * scale,
            color,
        });
    }

    pub fn fill_polygon(&mut self, points: &[Vec2], color: Color) {
        let mapped: Vec<Vec2> = points.iter().map(|p| self.map(*p)).collect();
        self.renderer.polygon(Polygon {
            points: mapped,
            color,
        });
    }
}

// ─── Shared graphic painting ─────────────────────────────────────────

/// Paint a board/footprint graphic item in layer color.
fn paint_graphic(ctx: &mut PaintContext<'_>, g: &Graphic, color: Color) {
    match g {
        Graphic::Line {
            start, end, width, ..
        } => ctx.stroke_line(&[*start, *end], *width, color),
        Graphic::Rect {
            start,
            end,
            width,
            fill,
            ..
        } => {
            let corners = [
                *start,
                Vec2::new(end.x, start.y),
                *end,
                Vec2::new(start.x, end.y),
            ];
            if *fill {
                ctx.fill_polygon(&corners, color);
            } else {
                let mut outline = corners.to_vec();
                outline.push(*start);
                ctx.stroke_line(&outline, *width, color);
            }
        }
        Graphic::Circle {
            center,
            end,
            width,
            fill,
            ..
        } => ctx.circle(*center, center.distance(end), *width, *fill, color),
        Graphic::Arc {
            start,
            mid,
            end,
            angle,
            width,
            ..
        } => paint_board_arc(ctx, *start, *mid, *end, *angle, *width, color),
        Graphic::Poly {
            pts, width, fill, ..
        } => {
            if *fill {
                ctx.fill_polygon(pts, color);
            } else if !pts.is_empty() {
                let mut outline = pts.clone();
                outline.push(pts[0]);
                ctx.stroke_line(&outline, *width, color);
            }
        }
        Graphic::Text { at, hidden, .. } => {
            // No glyph shaping; reserve space at the anchor so the text
            // still participates in bounds and hit-testing.
            if !*hidden {
                let _ = ctx.map(at.position());
            }
        }
    }
}

/// Modern arcs carry a midpoint, legacy ones a center (`start`) and a
/// sweep angle.
fn paint_board_arc(
    ctx: &mut PaintContext<'_>,
    start: Vec2,
    mid: Option<Vec2>,
    end: Vec2,
    angle: Option<f64>,
    width: f64,
    color: Color,
) {
    if let Some(mid) = mid {
        match arc_from_three_points(start, mid, end) {
            Some((center, radius, a0, a1)) => ctx.arc(center, radius, a0, a1, width, color),
            None => ctx.stroke_line(&[start, end], width, color),
        }
    } else if let Some(angle) = angle {
        let center = start;
        let radius = center.distance(&end);
        let a0 = (end.y - center.y).atan2(end.x - center.x).to_degrees();
        ctx.arc(center, radius, a0, a0 + angle, width, color);
    } else {
        ctx.stroke_line(&[start, end], width, color);
    }
}

// ─── Board painter ───────────────────────────────────────────────────

/// Copper and silk layers the painter always creates, front to back.
const BOARD_LAYER_ORDER: &[&str] = &[
    "Edge.Cuts",
    "F.SilkS",
    "F.Fab",
    DRILL_LAYER,
    "F.Cu",
    "B.Cu",
    "B.Fab",
    "B.SilkS",
];

enum BoardItem<'a> {
    Drawing(&'a Graphic),
    Footprint(&'a Footprint),
    Segment(&'a Segment),
    ArcTrack(&'a ArcTrack),
    Via(&'a Via),
    Zone(&'a Zone),
}

impl BoardItem<'_> {
    fn layers(&self) -> Vec<String> {
        match self {
            BoardItem::Drawing(g) => vec![g.layer().to_string()],
            BoardItem::Footprint(f) => footprint_layers(f),
            BoardItem::Segment(s) => vec![s.layer.clone()],
            BoardItem::ArcTrack(a) => vec![a.layer.clone()],
            BoardItem::Via(v) => {
                let mut out: Vec<String> =
                    v.layers.iter().flat_map(|l| expand_copper(l)).collect();
                out.push(DRILL_LAYER.to_string());
                out
            }
            BoardItem::Zone(z) => z
                .filled_polygons
                .iter()
                .map(|p| p.layer.clone())
                .collect(),
        }
    }

    fn paint(&self, ctx: &mut PaintContext<'_>, layer: &str, color: Color) {
        match self {
            BoardItem::Drawing(g) => paint_graphic(ctx, g, color),
            BoardItem::Footprint(f) => paint_footprint(ctx, f, layer, color),
            BoardItem::Segment(s) => ctx.stroke_line(&[s.start, s.end], s.width, color),
            BoardItem::ArcTrack(a) => {
                match arc_from_three_points(a.start, a.mid, a.end) {
                    Some((center, radius, a0, a1)) => {
                        ctx.arc(center, radius, a0, a1, a.width, color)
                    }
                    None => ctx.stroke_line(&[a.start, a.end], a.width, color),
                }
            }
            BoardItem::Via(v) => {
                if layer == DRILL_LAYER {
                    ctx.circle(v.at, v.drill / 2.0, 0.0, true, color);
                } else {
                    ctx.circle(v.at, v.size / 2.0, 0.0, true, color);
                }
            }
            BoardItem::Zone(z) => {
                for poly in &z.filled_polygons {
                    if poly.layer == layer {
                        ctx.fill_polygon(&poly.pts, color);
                    }
                }
            }
        }
    }
}

fn expand_copper(layer: &str) -> Vec<String> {
    if layer == "*.Cu" {
        vec!["F.Cu".to_string(), "B.Cu".to_string()]
    } else {
        vec![layer.to_string()]
    }
}

fn footprint_layers(f: &Footprint) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut push = |name: String| {
        if !out.contains(&name) {
            out.push(name);
        }
    };
    for pad in &f.pads {
        for layer in &pad.layers {
            for name in expand_copper(layer) {
                push(name);
            }
        }
        if pad.drill.is_some() {
            push(DRILL_LAYER.to_string());
        }
    }
    for g in &f.drawings {
        push(g.layer().to_string());
    }
    for t in &f.texts {
        push(t.layer.clone());
    }
    out
}

fn paint_footprint(ctx: &mut PaintContext<'_>, f: &Footprint, layer: &str, color: Color) {
    ctx.push(Transform::placement(f.at.position(), f.at.rotation));
    for pad in &f.pads {
        if layer == DRILL_LAYER {
            if pad.drill.is_some() {
                paint_pad(ctx, pad, f.at.rotation, true, BACKGROUND);
            }
        } else if pad.on_layer(layer) {
            paint_pad(ctx, pad, f.at.rotation, false, color);
        }
    }
    for g in &f.drawings {
        if g.layer() == layer {
            paint_graphic(ctx, g, color);
        }
    }
    for t in &f.texts {
        if t.layer == layer && !t.hidden {
            let _ = ctx.map(t.at.position());
        }
    }
    ctx.pop();
}

/// Pad rotation in the file is absolute and already includes the parent
/// footprint angle, while the context carries that angle too, so only
/// the residual is pushed here.
fn paint_pad(
    ctx: &mut PaintContext<'_>,
    pad: &Pad,
    footprint_rotation: f64,
    drill_pass: bool,
    color: Color,
) {
    ctx.push(Transform::placement(
        pad.at.position(),
        pad.at.rotation - footprint_rotation,
    ));
    if drill_pass {
        if let Some(drill) = &pad.drill {
            let offset = drill.offset.unwrap_or(Vec2::new(0.0, 0.0));
            if drill.oval {
                paint_stadium(ctx, offset, Vec2::new(drill.width, drill.height), color);
            } else {
                ctx.circle(offset, drill.width / 2.0, 0.0, true, color);
            }
        }
    } else {
        match pad.shape {
            PadShape::Circle => ctx.circle(Vec2::new(0.0, 0.0), pad.size.x / 2.0, 0.0, true, color),
            PadShape::Oval => paint_stadium(ctx, Vec2::new(0.0, 0.0), pad.size, color),
            // Rounded corners collapse to the plain outline.
            PadShape::Rect | PadShape::RoundRect | PadShape::Trapezoid | PadShape::Custom => {
                let hx = pad.size.x / 2.0;
                let hy = pad.size.y / 2.0;
                ctx.fill_polygon(
                    &[
                        Vec2::new(-hx, -hy),
                        Vec2::new(hx, -hy),
                        Vec2::new(hx, hy),
                        Vec2::new(-hx, hy),
                    ],
                    color,
                );
            }
        }
    }
    ctx.pop();
}

/// Oval pads and slots render as a thick round-capped line.
fn paint_stadium(ctx: &mut PaintContext<'_>, center: Vec2, size: Vec2, color: Color) {
    let (half, width) = if size.x >= size.y {
        (Vec2::new((size.x - size.y) / 2.0, 0.0), size.y)
    } else {
        (Vec2::new(0.0, (size.y - size.x) / 2.0), size.x)
    };
    ctx.stroke_line(
        &[
            Vec2::new(center.x - half.x, center.y - half.y),
            Vec2::new(center.x + half.x, center.y + half.y),
        ],
        width,
        color,
    );
}

pub struct BoardPainter;

impl BoardPainter {
    /// Paint every board item into per-layer retained graphics and
    /// return the populated layer set.
    pub fn paint(board: &Board, renderer: &mut dyn Renderer) -> ViewLayerSet {
        let mut items: Vec<(ItemId, BoardItem<'_>)> = Vec::new();
        for (i, g) in board.drawings.iter().enumerate() {
            items.push((ItemId::Drawing(i), BoardItem::Drawing(g)));
        }
        for (i, f) in board.footprints.iter().enumerate() {
            items.push((ItemId::Footprint(i), BoardItem::Footprint(f)));
        }
        for (i, s) in board.segments.iter().enumerate() {
            items.push((ItemId::Segment(i), BoardItem::Segment(s)));
        }
        for (i, a) in board.arcs.iter().enumerate() {
            items.push((ItemId::ArcTrack(i), BoardItem::ArcTrack(a)));
        }
        for (i, v) in board.vias.iter().enumerate() {
            items.push((ItemId::Via(i), BoardItem::Via(v)));
        }
        for (i, z) in board.zones.iter().enumerate() {
            items.push((ItemId::Zone(i), BoardItem::Zone(z)));
        }

        // Canonical layers first, then any extra layers items mention in
        // first-seen order.
        let mut names: Vec<String> = BOARD_LAYER_ORDER.iter().map(|s| s.to_string()).collect();
        for (_, item) in &items {
            for name in item.layers() {
                if !name.is_empty() && !names.contains(&name) {
                    names.push(name);
                }
            }
        }

        let mut set = ViewLayerSet::new();
        for (depth, name) in names.iter().enumerate() {
            let mut layer = ViewLayer::new(name.clone(), layer_color(name), true, true);
            renderer.start_layer(name, depth as f64);
            let mut ctx = PaintContext::new(renderer);
            for (id, item) in &items {
                if !item.layers().iter().any(|l| l == name) {
                    continue;
                }
                ctx.begin_item();
                item.paint(&mut ctx, name, layer.color);
                let bbox = ctx.take_item_bbox();
                if bbox.is_valid() {
                    layer.set_item_bbox(*id, bbox);
                }
            }
            layer.graphics = Some(renderer.end_layer());
            set.add(layer);
        }
        set
    }

    /// Paint all copper connected to a net, for the highlight overlay.
    pub fn paint_net(board: &Board, net: u32, ctx: &mut PaintContext<'_>) {
        for s in &board.segments {
            if s.net == net {
                ctx.stroke_line(&[s.start, s.end], s.width, HIGHLIGHT_COLOR);
            }
        }
        for a in &board.arcs {
            if a.net == net {
                match arc_from_three_points(a.start, a.mid, a.end) {
                    Some((center, radius, a0, a1)) => {
                        ctx.arc(center, radius, a0, a1, a.width, HIGHLIGHT_COLOR)
                    }
                    None => ctx.stroke_line(&[a.start, a.end], a.width, HIGHLIGHT_COLOR),
                }
            }
        }
        for v in &board.vias {
            if v.net == net {
                ctx.circle(v.at, v.size / 2.0, 0.0, true, HIGHLIGHT_COLOR);
            }
        }
        for f in &board.footprints {
            ctx.push(Transform::placement(f.at.position(), f.at.rotation));
            for pad in &f.pads {
                if pad.net.as_ref().is_some_and(|n| n.number == net) {
                    paint_pad(ctx, pad, f.at.rotation, false, HIGHLIGHT_COLOR);
                }
            }
            ctx.pop();
        }
        for z in &board.zones {
            if z.net == net {
                for poly in &z.filled_polygons {
                    ctx.fill_polygon(&poly.pts, HIGHLIGHT_COLOR.with_alpha(0.4));
                }
            }
        }
    }
}

// ─── Schematic painter ───────────────────────────────────────────────

const WIRE_WIDTH: f64 = 0.1524;
const JUNCTION_DIAMETER: f64 = 0.9144;
const NO_CONNECT_SIZE: f64 = 0.635;
const LABEL_MARK: f64 = 0.635;

fn paint_symbol_graphic(ctx: &mut PaintContext<'_>, g: &SymbolGraphic, color: Color) {
    match g {
        SymbolGraphic::Polyline { pts, width, fill } => {
            if *fill {
                ctx.fill_polygon(pts, color.with_alpha(0.3));
            }
            ctx.stroke_line(pts, *width, color);
        }
        SymbolGraphic::Rectangle {
            start,
            end,
            width,
            fill,
        } => {
            let corners = [
                *start,
                Vec2::new(end.x, start.y),
                *end,
                Vec2::new(start.x, end.y),
            ];
            if *fill {
                ctx.fill_polygon(&corners, color.with_alpha(0.3));
            }
            let mut outline = corners.to_vec();
            outline.push(*start);
            ctx.stroke_line(&outline, *width, color);
        }
        SymbolGraphic::Circle {
            center,
            radius,
            width,
            fill,
        } => ctx.circle(*center, *radius, *width, *fill, color),
        SymbolGraphic::Arc {
            start,
            mid,
            end,
            width,
        } => match arc_from_three_points(*start, *mid, *end) {
            Some((center, radius, a0, a1)) => ctx.arc(center, radius, a0, a1, *width, color),
            None => ctx.stroke_line(&[*start, *end], *width, color),
        },
        SymbolGraphic::Text { at, .. } => {
            let _ = ctx.map(at.position());
        }
    }
}

fn paint_symbol(
    ctx: &mut PaintContext<'_>,
    schematic: &Schematic,
    symbol: &SchematicSymbol,
    color: Color,
) {
    let mut placement = Transform::placement(symbol.at.position(), symbol.at.rotation);
    // `(mirror x)` flips about the x axis, `(mirror y)` about the y axis.
    match symbol.mirror.as_deref() {
        Some("x") => placement = placement.multiply(&Transform::flip_y()),
        Some("y") => placement = placement.multiply(&Transform::flip_x()),
        _ => {}
    }
    ctx.push(placement.multiply(&Transform::flip_y()));
    if let Some(lib) = schematic.resolve_symbol(&symbol.lib_id) {
        // Unit names drop the library prefix: "Device:R" owns "R_0_1".
        let base = lib.name.rsplit(':').next().unwrap_or(lib.name.as_str());
        let common = format!("{base}_0_1");
        let unit = format!("{base}_{}_1", symbol.unit);
        for u in &lib.units {
            if u.name != common && u.name != unit {
                continue;
            }
            for g in &u.drawings {
                paint_symbol_graphic(ctx, g, color);
            }
            for pin in &u.pins {
                if pin.hidden {
                    continue;
                }
                let start = pin.at.position();
                let dir = rotate_deg(Vec2::new(pin.length, 0.0), -pin.at.rotation);
                let end = Vec2::new(start.x + dir.x, start.y + dir.y);
                ctx.stroke_line(&[start, end], WIRE_WIDTH, color);
            }
        }
    } else {
        log::warn!("symbol references unknown lib_id {:?}", symbol.lib_id);
        let _ = ctx.map(symbol.at.position());
    }
    ctx.pop();
}

pub struct SchematicPainter;

impl SchematicPainter {
    pub fn paint(schematic: &Schematic, renderer: &mut dyn Renderer) -> ViewLayerSet {
        let mut set = ViewLayerSet::new();

        // Hit-testing is restricted to symbols, via a dedicated front
        // layer that carries bboxes but no graphics.
        let mut interactive = ViewLayer::new(
            INTERACTIVE_LAYER,
            Color::TRANSPARENT,
            true,
            true,
        );

        let mut labels = ViewLayer::new("Labels", layer_color("Labels"), true, false);
        renderer.start_layer("Labels", 1.0);
        {
            let mut ctx = PaintContext::new(renderer);
            for (i, label) in schematic.labels.iter().enumerate() {
                ctx.begin_item();
                let p = label.at.position();
                ctx.stroke_line(
                    &[
                        Vec2::new(p.x - LABEL_MARK, p.y),
                        Vec2::new(p.x + LABEL_MARK, p.y),
                    ],
                    WIRE_WIDTH,
                    labels.color,
                );
                labels.set_item_bbox(ItemId::Label(i), ctx.take_item_bbox());
            }
            for (i, nc) in schematic.no_connects.iter().enumerate() {
                ctx.begin_item();
                let p = nc.at.position();
                let s = NO_CONNECT_SIZE / 2.0;
                ctx.stroke_line(
                    &[Vec2::new(p.x - s, p.y - s), Vec2::new(p.x + s, p.y + s)],
                    WIRE_WIDTH,
                    labels.color,
                );
                ctx.stroke_line(
                    &[Vec2::new(p.x - s, p.y + s), Vec2::new(p.x + s, p.y - s)],
                    WIRE_WIDTH,
                    labels.color,
                );
                labels.set_item_bbox(ItemId::NoConnect(i), ctx.take_item_bbox());
            }
        }
        labels.graphics = Some(renderer.end_layer());

        let mut junctions = ViewLayer::new("Junctions", layer_color("Junctions"), true, false);
        renderer.start_layer("Junctions", 2.0);
        {
            let mut ctx = PaintContext::new(renderer);
            for (i, j) in schematic.junctions.iter().enumerate() {
                ctx.begin_item();
                let d = if j.diameter > 0.0 {
                    j.diameter
                } else {
                    JUNCTION_DIAMETER
                };
                ctx.circle(j.at.position(), d / 2.0, 0.0, true, junctions.color);
                junctions.set_item_bbox(ItemId::Junction(i), ctx.take_item_bbox());
            }
        }
        junctions.graphics = Some(renderer.end_layer());

        let mut symbols = ViewLayer::new("Symbols", layer_color("Symbols"), true, false);
        renderer.start_layer("Symbols", 3.0);
        {
            let mut ctx = PaintContext::new(renderer);
            for (i, symbol) in schematic.symbols.iter().enumerate() {
                ctx.begin_item();
                paint_symbol(&mut ctx, schematic, symbol, symbols.color);
                let bbox = ctx.take_item_bbox();
                symbols.set_item_bbox(ItemId::Symbol(i), bbox);
                interactive.set_item_bbox(ItemId::Symbol(i), bbox);
            }
        }
        symbols.graphics = Some(renderer.end_layer());

        let mut wires = ViewLayer::new("Wires", layer_color("Wires"), true, false);
        renderer.start_layer("Wires", 4.0);
        {
            let mut ctx = PaintContext::new(renderer);
            for (i, wire) in schematic.wires.iter().enumerate() {
                ctx.begin_item();
                let width = if wire.stroke.width > 0.0 {
                    wire.stroke.width
                } else {
                    WIRE_WIDTH
                };
                ctx.stroke_line(&wire.pts, width, wires.color);
                wires.set_item_bbox(ItemId::Wire(i), ctx.take_item_bbox());
            }
        }
        wires.graphics = Some(renderer.end_layer());

        set.add(interactive);
        set.add(labels);
        set.add(junctions);
        set.add(symbols);
        set.add(wires);
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::{Primitive, RecordingRenderer};
    use kicad_parse::Document;

    const BOARD: &str = r#"(kicad_pcb (version 20211014) (generator pcbnew)
      (net 0 "") (net 1 "GND")
      (gr_line (start 0 0) (end 100 0) (width 0.1) (layer "Edge.Cuts"))
      (footprint "R_0402" (layer "F.Cu") (at 20 30 90)
        (fp_text reference "R1" (at 0 -1) (layer "F.SilkS"))
        (pad "1" smd rect (at -0.5 0 90) (size 0.6 0.5) (layers "F.Cu") (net 1 "GND"))
        (pad "2" smd rect (at 0.5 0 90) (size 0.6 0.5) (layers "F.Cu")))
      (segment (start 20 30) (end 40 30) (width 0.25) (layer "F.Cu") (net 1))
      (via (at 40 30) (size 0.8) (drill 0.4) (layers "F.Cu" "B.Cu") (net 1)))"#;

    fn parse_board(text: &str) -> kicad_parse::board::Board {
        match kicad_parse::parse_document(text).unwrap() {
            Document::Board(b) => b,
            _ => panic!("expected a board"),
        }
    }

    #[test]
    fn test_board_layers_created_in_order() {
        let board = parse_board(BOARD);
        let mut renderer = RecordingRenderer::new();
        let set = BoardPainter::paint(&board, &mut renderer);
        let names: Vec<&str> = set.in_order().map(|l| l.name.as_str()).collect();
        assert_eq!(names[..4], ["Edge.Cuts", "F.SilkS", "F.Fab", DRILL_LAYER]);
        assert!(names.contains(&"F.Cu"));
    }

    #[test]
    fn test_footprint_bbox_lands_at_placement() {
        let board = parse_board(BOARD);
        let mut renderer = RecordingRenderer::new();
        let set = BoardPainter::paint(&board, &mut renderer);
        let bbox = set
            .by_name("F.Cu")
            .unwrap()
            .item_bbox(ItemId::Footprint(0))
            .unwrap();
        // Pads straddle the footprint anchor at (20, 30).
        assert!(bbox.contains(Vec2::new(20.0, 30.0)));
        assert!(bbox.width() < 5.0 && bbox.height() < 5.0);
    }

    #[test]
    fn test_segment_painted_on_copper() {
        let board = parse_board(BOARD);
        let mut renderer = RecordingRenderer::new();
        let set = BoardPainter::paint(&board, &mut renderer);
        let handle = set.by_name("F.Cu").unwrap().graphics.unwrap();
        let lines: Vec<&Polyline> = renderer
            .layer(handle)
            .primitives
            .iter()
            .filter_map(|p| match p {
                Primitive::Line(l) => Some(l),
                _ => None,
            })
            .collect();
        assert!(lines
            .iter()
            .any(|l| l.points == vec![Vec2::new(20.0, 30.0), Vec2::new(40.0, 30.0)]));
    }

    #[test]
    fn test_via_gets_drill_hole() {
        let board = parse_board(BOARD);
        let mut renderer = RecordingRenderer::new();
        let set = BoardPainter::paint(&board, &mut renderer);
        let handle = set.by_name(DRILL_LAYER).unwrap().graphics.unwrap();
        let drills = &renderer.layer(handle).primitives;
        assert!(drills.iter().any(|p| matches!(
            p,
            Primitive::Circle(c) if c.fill && (c.radius - 0.2).abs() < 1e-9
        )));
    }

    #[test]
    fn test_net_overlay_collects_connected_copper() {
        let board = parse_board(BOARD);
        let mut renderer = RecordingRenderer::new();
        renderer.start_layer(":Overlay", 0.0);
        {
            let mut ctx = PaintContext::new(&mut renderer);
            BoardPainter::paint_net(&board, 1, &mut ctx);
        }
        let handle = renderer.end_layer();
        // Segment + via + one pad on net 1.
        assert_eq!(renderer.layer(handle).primitives.len(), 3);
    }

    const SHEET: &str = r#"(kicad_sch (version 20230121) (generator eeschema)
      (lib_symbols
        (symbol "Device:R" (in_bom yes)
          (property "Reference" "R" (at 0 0 0))
          (symbol "R_0_1"
            (rectangle (start -1.016 -2.54) (end 1.016 2.54)
              (stroke (width 0.254)) (fill (type none))))
          (symbol "R_1_1"
            (pin passive line (at 0 3.81 270) (length 1.27)
              (name "~" (effects (font (size 1.27 1.27))))
              (number "1" (effects (font (size 1.27 1.27))))))))
      (wire (pts (xy 0 0) (xy 10 0)) (stroke (width 0)))
      (junction (at 10 0) (diameter 0))
      (symbol (lib_id "Device:R") (at 30 40 0) (unit 1)
        (property "Reference" "R1" (at 30 36 0))))"#;

    fn parse_schematic(text: &str) -> kicad_parse::schematic::Schematic {
        match kicad_parse::parse_document(text).unwrap() {
            Document::Schematic(s) => s,
            _ => panic!("expected a schematic"),
        }
    }

    #[test]
    fn test_schematic_interactivity_is_symbols_only() {
        let schematic = parse_schematic(SHEET);
        let mut renderer = RecordingRenderer::new();
        let set = SchematicPainter::paint(&schematic, &mut renderer);

        let interactive: Vec<&str> = set
            .in_order()
            .filter(|l| l.interactive)
            .map(|l| l.name.as_str())
            .collect();
        assert_eq!(interactive, vec![INTERACTIVE_LAYER]);

        let hits: Vec<ItemId> = set
            .query_point(Vec2::new(30.0, 40.0))
            .map(|(_, id, _)| id)
            .collect();
        assert_eq!(hits, vec![ItemId::Symbol(0)]);
    }

    #[test]
    fn test_symbol_body_painted_around_anchor() {
        let schematic = parse_schematic(SHEET);
        let mut renderer = RecordingRenderer::new();
        let set = SchematicPainter::paint(&schematic, &mut renderer);
        let bbox = set.bbox_for(ItemId::Symbol(0)).unwrap();
        assert!(bbox.contains(Vec2::new(30.0, 40.0)));
        // Rectangle alone spans 5.08mm; the pin must stretch that to 6.35.
        assert!(bbox.height() > 6.0 && bbox.height() < 12.0);
    }

    #[test]
    fn test_mirrored_symbol_flips_about_anchor() {
        let mirrored = SHEET.replace("(at 30 40 0)", "(at 30 40 0) (mirror x)");
        let schematic = parse_schematic(&mirrored);
        let mut renderer = RecordingRenderer::new();
        let set = SchematicPainter::paint(&schematic, &mut renderer);
        let bbox = set.bbox_for(ItemId::Symbol(0)).unwrap();
        // The pin sits above the anchor unmirrored (y down to 36.19); with
        // `(mirror x)` it lands below instead (y up to 43.81).
        assert!(bbox.maxy > 43.0);
        assert!(bbox.miny > 37.0);
    }

    #[test]
    fn test_wires_are_not_interactive() {
        let schematic = parse_schematic(SHEET);
        let mut renderer = RecordingRenderer::new();
        let set = SchematicPainter::paint(&schematic, &mut renderer);
        let hits = set.query_point(Vec2::new(5.0, 0.0)).count();
        assert_eq!(hits, 0);
    }
}
