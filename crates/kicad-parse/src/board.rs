//! Typed document model for `.kicad_pcb` files, built through the schema
//! binding layer in one pass over the s-expression tree.

use std::collections::HashMap;
use std::f64::consts::PI;

use serde::Serialize;

use crate::cursor::Cursor;
use crate::error::ParseError;
use crate::schema::{ExprParser, FromSExpr};
use crate::sexpr::{self, Node};
use crate::types::{expect_point, layer_name, point, point_list};
use crate::types::{At, BBox, Graphic, Paper, TitleBlock, Vec2};

#[derive(Debug, Clone, Serialize)]
pub struct Board {
    pub version: u64,
    pub generator: String,
    pub generator_version: Option<String>,
    pub paper: Option<Paper>,
    pub title_block: Option<TitleBlock>,
    pub layers: Vec<BoardLayer>,
    pub nets: Vec<Net>,
    pub properties: HashMap<String, String>,
    pub drawings: Vec<Graphic>,
    pub footprints: Vec<Footprint>,
    pub segments: Vec<Segment>,
    pub arcs: Vec<ArcTrack>,
    pub vias: Vec<Via>,
    pub zones: Vec<Zone>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BoardLayer {
    pub ordinal: i32,
    pub name: String,
    pub kind: String,
    pub user_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Net {
    pub number: u32,
    pub name: String,
}

impl FromSExpr for Net {
    fn from_expr(mut p: ExprParser<'_>) -> Result<Self, ParseError> {
        p.start("net")?;
        let number = p.positional("net number")?;
        let name = p.maybe_positional().unwrap_or_default();
        Ok(Net { number, name })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Property {
    pub key: String,
    pub value: String,
    pub at: Option<At>,
    pub layer: String,
    pub hidden: bool,
}

impl FromSExpr for Property {
    fn from_expr(mut p: ExprParser<'_>) -> Result<Self, ParseError> {
        p.start("property")?;
        let key = p.positional("property name")?;
        let value = p.maybe_positional().unwrap_or_default();
        let out = Property {
            key,
            value,
            at: p.object("at")?,
            layer: layer_name(&mut p)?,
            hidden: p.flag("hide") || p.pair("hide")?.unwrap_or(false),
        };
        p.ignore(&["uuid", "tstamp", "effects", "unlocked"]);
        p.finish();
        Ok(out)
    }
}

// ─── Tracks ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct Segment {
    pub start: Vec2,
    pub end: Vec2,
    pub width: f64,
    pub layer: String,
    pub net: u32,
}

impl FromSExpr for Segment {
    fn from_expr(mut p: ExprParser<'_>) -> Result<Self, ParseError> {
        p.start("segment")?;
        let out = Segment {
            start: expect_point(&mut p, "start")?,
            end: expect_point(&mut p, "end")?,
            width: p.pair_or("width", 0.25)?,
            layer: layer_name(&mut p)?,
            net: p.pair_or("net", 0)?,
        };
        p.ignore(&["uuid", "tstamp", "locked"]);
        p.finish();
        Ok(out)
    }
}

/// Curved track (KiCad 7+), kept as its three defining points.
#[derive(Debug, Clone, Serialize)]
pub struct ArcTrack {
    pub start: Vec2,
    pub mid: Vec2,
    pub end: Vec2,
    pub width: f64,
    pub layer: String,
    pub net: u32,
}

impl FromSExpr for ArcTrack {
    fn from_expr(mut p: ExprParser<'_>) -> Result<Self, ParseError> {
        p.start("arc")?;
        let out = ArcTrack {
            start: expect_point(&mut p, "start")?,
            mid: expect_point(&mut p, "mid")?,
            end: expect_point(&mut p, "end")?,
            width: p.pair_or("width", 0.25)?,
            layer: layer_name(&mut p)?,
            net: p.pair_or("net", 0)?,
        };
        p.ignore(&["uuid", "tstamp", "locked"]);
        p.finish();
        Ok(out)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Via {
    pub at: Vec2,
    pub size: f64,
    pub drill: f64,
    pub layers: Vec<String>,
    pub net: u32,
}

impl FromSExpr for Via {
    fn from_expr(mut p: ExprParser<'_>) -> Result<Self, ParseError> {
        p.start("via")?;
        let out = Via {
            at: expect_point(&mut p, "at")?,
            size: p.pair_or("size", 0.6)?,
            drill: p.pair_or("drill", 0.3)?,
            layers: p.list_of("layers")?,
            net: p.pair_or("net", 0)?,
        };
        p.ignore(&["uuid", "tstamp", "free", "locked", "remove_unused_layers"]);
        p.finish();
        Ok(out)
    }
}

// ─── Zones ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct Zone {
    pub net: u32,
    pub net_name: String,
    pub layers: Vec<String>,
    pub filled_polygons: Vec<FilledPolygon>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FilledPolygon {
    pub layer: String,
    pub pts: Vec<Vec2>,
}

impl FromSExpr for FilledPolygon {
    fn from_expr(mut p: ExprParser<'_>) -> Result<Self, ParseError> {
        p.start("filled_polygon")?;
        let out = FilledPolygon {
            layer: layer_name(&mut p)?,
            pts: point_list(&mut p)?,
        };
        p.ignore(&["island"]);
        p.finish();
        Ok(out)
    }
}

impl FromSExpr for Zone {
    fn from_expr(mut p: ExprParser<'_>) -> Result<Self, ParseError> {
        p.start("zone")?;
        let mut layers: Vec<String> = p.list_of("layers")?;
        if layers.is_empty() {
            if let Some(single) = p.pair::<String>("layer")? {
                layers.push(single);
            }
        }
        let out = Zone {
            net: p.pair_or("net", 0)?,
            net_name: p.pair_or("net_name", String::new())?,
            layers,
            filled_polygons: p.collection("filled_polygon")?,
        };
        p.ignore(&[
            "uuid",
            "tstamp",
            "name",
            "hatch",
            "priority",
            "connect_pads",
            "min_thickness",
            "filled_areas_thickness",
            "keepout",
            "fill",
            "polygon",
            "filled_segments",
        ]);
        p.finish();
        Ok(out)
    }
}

// ─── Footprints ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct Footprint {
    pub library_link: String,
    pub layer: String,
    pub at: At,
    pub locked: bool,
    pub descr: Option<String>,
    pub properties: HashMap<String, Property>,
    pub texts: Vec<FpText>,
    pub pads: Vec<Pad>,
    pub drawings: Vec<Graphic>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FpText {
    pub kind: String,
    pub text: String,
    pub at: At,
    pub layer: String,
    pub hidden: bool,
}

impl FromSExpr for FpText {
    fn from_expr(mut p: ExprParser<'_>) -> Result<Self, ParseError> {
        p.start("fp_text")?;
        let out = FpText {
            kind: p.positional("text type")?,
            text: p.maybe_positional().unwrap_or_default(),
            at: p.object("at")?.unwrap_or_default(),
            layer: layer_name(&mut p)?,
            hidden: p.flag("hide") || p.pair("hide")?.unwrap_or(false),
        };
        p.ignore(&["uuid", "tstamp", "effects", "unlocked"]);
        p.finish();
        Ok(out)
    }
}

impl FromSExpr for Footprint {
    fn from_expr(mut p: ExprParser<'_>) -> Result<Self, ParseError> {
        // `module` is the pre-KiCad-6 spelling.
        p.start_any(&["footprint", "module"])?;
        let out = Footprint {
            library_link: p.maybe_positional().unwrap_or_default(),
            locked: p.flag("locked"),
            layer: layer_name(&mut p)?,
            at: p.object("at")?.unwrap_or_default(),
            descr: p.pair("descr")?,
            properties: p.dict("property", |prop: &Property| prop.key.clone())?,
            texts: p.collection("fp_text")?,
            pads: p.collection("pad")?,
            drawings: p
                .collection_map(Graphic::FOOTPRINT_TAGS, Graphic::from_tagged)?,
        };
        p.ignore(&[
            "uuid",
            "tstamp",
            "path",
            "tags",
            "attr",
            "sheetname",
            "sheetfile",
            "clearance",
            "solder_mask_margin",
            "solder_paste_margin",
            "solder_paste_ratio",
            "zone_connect",
            "autoplace_cost90",
            "autoplace_cost180",
            "model",
            "fp_text_box",
            "zone",
            "group",
            "embedded_fonts",
            "placed",
        ]);
        p.finish();
        Ok(out)
    }
}

impl Footprint {
    /// Reference designator, from either the KiCad 8 `property` form or the
    /// legacy `fp_text reference` child.
    pub fn reference(&self) -> &str {
        self.text_field("Reference", "reference")
    }

    pub fn value(&self) -> &str {
        self.text_field("Value", "value")
    }

    fn text_field(&self, property: &str, fp_text_kind: &str) -> &str {
        if let Some(prop) = self.properties.get(property) {
            return &prop.value;
        }
        self.texts
            .iter()
            .find(|t| t.kind == fp_text_kind)
            .map(|t| t.text.as_str())
            .unwrap_or("")
    }

    /// Bounding box in board coordinates, derived from pads and drawings.
    /// Footprints with neither get a nominal 1mm box around their anchor.
    pub fn bbox(&self) -> BBox {
        let mut bbox = BBox::empty();
        for pad in &self.pads {
            let center = self.to_board(pad.at.position());
            let half = Vec2::new(pad.size.x / 2.0, pad.size.y / 2.0);
            let reach = half.x.hypot(half.y);
            bbox.expand_point(center.x - reach, center.y - reach);
            bbox.expand_point(center.x + reach, center.y + reach);
        }
        for drawing in &self.drawings {
            let local = drawing.bbox();
            if local.is_valid() {
                bbox.expand_vec(self.to_board(Vec2::new(local.minx, local.miny)));
                bbox.expand_vec(self.to_board(Vec2::new(local.maxx, local.maxy)));
                bbox.expand_vec(self.to_board(Vec2::new(local.minx, local.maxy)));
                bbox.expand_vec(self.to_board(Vec2::new(local.maxx, local.miny)));
            }
        }
        if !bbox.is_valid() {
            bbox = BBox::new(
                self.at.x - 0.5,
                self.at.y - 0.5,
                self.at.x + 0.5,
                self.at.y + 0.5,
            );
        }
        bbox
    }

    /// Footprint-local point to board coordinates.
    pub fn to_board(&self, local: Vec2) -> Vec2 {
        let rotated = rotate_deg(local, self.at.rotation);
        Vec2::new(rotated.x + self.at.x, rotated.y + self.at.y)
    }
}

/// Rotate by KiCad degrees (counter-clockwise in a y-down plane).
pub fn rotate_deg(v: Vec2, angle_deg: f64) -> Vec2 {
    if angle_deg == 0.0 {
        return v;
    }
    let rad = -angle_deg * PI / 180.0;
    Vec2::new(
        v.x * rad.cos() - v.y * rad.sin(),
        v.x * rad.sin() + v.y * rad.cos(),
    )
}

// ─── Pads ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PadType {
    Smd,
    ThruHole,
    NpThruHole,
    Connect,
}

impl PadType {
    fn from_atom(s: &str) -> Self {
        match s {
            "thru_hole" => PadType::ThruHole,
            "np_thru_hole" => PadType::NpThruHole,
            "connect" => PadType::Connect,
            _ => PadType::Smd,
        }
    }

    pub fn is_through_hole(&self) -> bool {
        matches!(self, PadType::ThruHole | PadType::NpThruHole)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PadShape {
    Circle,
    Rect,
    Oval,
    Trapezoid,
    RoundRect,
    Custom,
}

impl PadShape {
    fn from_atom(s: &str) -> Self {
        match s {
            "circle" => PadShape::Circle,
            "oval" => PadShape::Oval,
            "trapezoid" => PadShape::Trapezoid,
            "roundrect" => PadShape::RoundRect,
            "custom" => PadShape::Custom,
            _ => PadShape::Rect,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Drill {
    pub oval: bool,
    pub width: f64,
    pub height: f64,
    pub offset: Option<Vec2>,
}

impl FromSExpr for Drill {
    fn from_expr(mut p: ExprParser<'_>) -> Result<Self, ParseError> {
        p.start("drill")?;
        let oval = p.flag("oval");
        let width = p.maybe_positional().unwrap_or(0.0);
        let height = p.maybe_positional().unwrap_or(width);
        let offset = point(&mut p, "offset")?;
        Ok(Drill {
            oval,
            width,
            height,
            offset,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Pad {
    pub number: String,
    pub pad_type: PadType,
    pub shape: PadShape,
    pub at: At,
    pub size: Vec2,
    pub drill: Option<Drill>,
    pub layers: Vec<String>,
    pub net: Option<Net>,
    pub roundrect_rratio: Option<f64>,
}

impl FromSExpr for Pad {
    fn from_expr(mut p: ExprParser<'_>) -> Result<Self, ParseError> {
        p.start("pad")?;
        let number: String = p.positional("pad number")?;
        let pad_type: String = p.positional("pad type")?;
        let shape: String = p.positional("pad shape")?;
        let out = Pad {
            number,
            pad_type: PadType::from_atom(&pad_type),
            shape: PadShape::from_atom(&shape),
            at: p.object("at")?.unwrap_or_default(),
            size: point(&mut p, "size")?.unwrap_or_default(),
            drill: p.object("drill")?,
            layers: p.list_of("layers")?,
            net: p.object("net")?,
            roundrect_rratio: p.pair("roundrect_rratio")?,
        };
        p.ignore(&[
            "uuid",
            "tstamp",
            "pinfunction",
            "pintype",
            "pin1",
            "locked",
            "die_length",
            "solder_mask_margin",
            "solder_paste_margin",
            "solder_paste_margin_ratio",
            "clearance",
            "zone_connect",
            "thermal_bridge_width",
            "thermal_gap",
            "chamfer_ratio",
            "chamfer",
            "options",
            "primitives",
            "remove_unused_layers",
            "keep_end_layers",
            "property",
        ]);
        p.finish();
        Ok(out)
    }
}

impl Pad {
    /// True when the pad sits on the given copper layer, honoring the
    /// `*.Cu` wildcard used by through-hole pads.
    pub fn on_layer(&self, layer: &str) -> bool {
        self.layers
            .iter()
            .any(|l| l == layer || (l == "*.Cu" && layer.ends_with(".Cu")))
    }
}

// ─── Board root ──────────────────────────────────────────────────────

impl Board {
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let root = sexpr::parse(text)?;
        Self::from_sexpr(&root)
    }

    pub fn from_sexpr(root: &Node) -> Result<Self, ParseError> {
        if root.tag() != Some("kicad_pcb") {
            return Err(ParseError::WrongDocumentType {
                expected: "kicad_pcb".to_string(),
                found: root.tag().unwrap_or("?").to_string(),
            });
        }
        let mut p = ExprParser::new(root)?;
        p.start("kicad_pcb")?;
        let board = Board {
            version: p.expect_pair("version")?,
            generator: p.pair_or("generator", String::new())?,
            generator_version: p.pair("generator_version")?,
            paper: p.object("paper")?,
            title_block: p.object("title_block")?,
            layers: p
                .object_with("layers", parse_layer_table)?
                .unwrap_or_default(),
            nets: p.collection("net")?,
            properties: p
                .dict("property", |prop: &Property| prop.key.clone())?
                .into_iter()
                .map(|(k, v)| (k, v.value))
                .collect(),
            drawings: p.collection_map(Graphic::BOARD_TAGS, Graphic::from_tagged)?,
            footprints: p.collection_map(&["footprint", "module"], |_, sub| {
                Footprint::from_expr(sub)
            })?,
            segments: p.collection("segment")?,
            arcs: p.collection("arc")?,
            vias: p.collection("via")?,
            zones: p.collection("zone")?,
        };
        p.ignore(&[
            "general",
            "setup",
            "page",
            "host",
            "net_class",
            "gr_curve",
            "gr_text_box",
            "dimension",
            "target",
            "group",
            "image",
            "embedded_fonts",
        ]);
        p.finish();
        Ok(board)
    }

    pub fn find_footprint(&self, reference: &str) -> Option<(usize, &Footprint)> {
        self.footprints
            .iter()
            .enumerate()
            .find(|(_, fp)| fp.reference() == reference)
    }

    pub fn net_by_name(&self, name: &str) -> Option<&Net> {
        self.nets.iter().find(|n| n.name == name)
    }

    pub fn net_name(&self, number: u32) -> Option<&str> {
        self.nets
            .iter()
            .find(|n| n.number == number)
            .map(|n| n.name.as_str())
            .filter(|n| !n.is_empty())
    }

    /// Bounding box of the board outline. Falls back to the union of all
    /// content, then to a nominal 100mm box, so camera fitting never sees
    /// NaN.
    pub fn edges_bbox(&self) -> BBox {
        let mut bbox = BBox::empty();
        for drawing in &self.drawings {
            if drawing.layer() == "Edge.Cuts" {
                bbox = bbox.union(&drawing.bbox());
            }
        }
        if !bbox.is_valid() {
            for drawing in &self.drawings {
                bbox = bbox.union(&drawing.bbox());
            }
            for fp in &self.footprints {
                bbox = bbox.union(&fp.bbox());
            }
        }
        if !bbox.is_valid() {
            bbox = BBox::new(0.0, 0.0, 100.0, 100.0);
        }
        bbox
    }
}

/// The layer table rows are untagged lists (`(0 "F.Cu" signal)`), parsed
/// with a plain cursor.
fn parse_layer_table(mut p: ExprParser<'_>) -> Result<Vec<BoardLayer>, ParseError> {
    p.start("layers")?;
    let mut out = Vec::new();
    for node in p.remaining() {
        if !node.is_list() {
            continue;
        }
        let mut c = Cursor::new(node);
        let ordinal = c.expect_number("layers")? as i32;
        let name = match c.maybe_string() {
            Some(s) => s.to_string(),
            None => c.expect_atom("layers", None)?.to_string(),
        };
        let kind = c.expect_atom("layers", None)?.to_string();
        let user_name = c
            .maybe_string()
            .map(str::to_string)
            .or_else(|| c.maybe_atom(None).map(str::to_string));
        out.push(BoardLayer {
            ordinal,
            name,
            kind,
            user_name,
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const MINIMAL: &str =
        "(kicad_pcb (version 20211014) (generator pcbnew) (paper \"A4\"))";

    #[test]
    fn test_minimal_board() {
        let board = Board::parse(MINIMAL).unwrap();
        assert_eq!(board.version, 20211014);
        assert_eq!(board.generator, "pcbnew");
        assert_eq!(board.paper.unwrap().size, "A4");
    }

    #[test]
    fn test_wrong_root_tag() {
        assert!(matches!(
            Board::parse("(kicad_sch (version 1))"),
            Err(ParseError::WrongDocumentType { .. })
        ));
    }

    #[test]
    fn test_layer_table() {
        let board = Board::parse(
            "(kicad_pcb (version 20211014) (layers \
                (0 \"F.Cu\" signal) \
                (31 \"B.Cu\" signal) \
                (44 \"Edge.Cuts\" user)))",
        )
        .unwrap();
        assert_eq!(board.layers.len(), 3);
        assert_eq!(board.layers[1].ordinal, 31);
        assert_eq!(board.layers[2].name, "Edge.Cuts");
        assert_eq!(board.layers[0].kind, "signal");
    }

    #[test]
    fn test_net_table_and_lookup() {
        let board = Board::parse(
            "(kicad_pcb (version 1) (net 0 \"\") (net 1 \"GND\") (net 2 \"VCC\"))",
        )
        .unwrap();
        assert_eq!(board.nets.len(), 3);
        assert_eq!(board.net_by_name("GND").unwrap().number, 1);
        assert_eq!(board.net_name(2), Some("VCC"));
        // The unnamed net 0 resolves to no name.
        assert_eq!(board.net_name(0), None);
    }

    #[test]
    fn test_footprint_drawings_preserve_order() {
        let board = Board::parse(
            "(kicad_pcb (version 1) (footprint \"R_0402\" (layer \"F.Cu\") (at 10 20) \
                (fp_line (start -1 0) (end 1 0) (width 0.12) (layer \"F.SilkS\")) \
                (fp_line (start -1 1) (end 1 1) (width 0.12) (layer \"F.SilkS\")) \
                (fp_circle (center 0 0) (end 0.5 0) (width 0.1) (layer \"F.Fab\"))))",
        )
        .unwrap();
        let fp = &board.footprints[0];
        assert_eq!(fp.drawings.len(), 3);
        assert!(matches!(fp.drawings[0], Graphic::Line { .. }));
        assert!(matches!(fp.drawings[1], Graphic::Line { .. }));
        assert!(matches!(fp.drawings[2], Graphic::Circle { .. }));
    }

    #[test]
    fn test_footprint_reference_from_fp_text_and_property() {
        let legacy = Board::parse(
            "(kicad_pcb (version 1) (module \"R\" (layer F.Cu) (at 0 0) \
                (fp_text reference \"R1\" (at 0 0) (layer \"F.SilkS\"))))",
        )
        .unwrap();
        assert_eq!(legacy.footprints[0].reference(), "R1");

        let modern = Board::parse(
            "(kicad_pcb (version 1) (footprint \"R\" (layer \"F.Cu\") (at 0 0) \
                (property \"Reference\" \"R2\" (at 0 0) (layer \"F.SilkS\")) \
                (property \"Value\" \"10k\" (at 0 0) (layer \"F.Fab\"))))",
        )
        .unwrap();
        assert_eq!(modern.footprints[0].reference(), "R2");
        assert_eq!(modern.footprints[0].value(), "10k");
    }

    #[test]
    fn test_pad_fields() {
        let board = Board::parse(
            "(kicad_pcb (version 1) (net 1 \"GND\") \
                (footprint \"C\" (layer \"F.Cu\") (at 5 5 90) \
                (pad \"1\" smd roundrect (at -0.5 0) (size 0.6 0.7) \
                    (layers \"F.Cu\" \"F.Paste\" \"F.Mask\") \
                    (roundrect_rratio 0.25) (net 1 \"GND\")) \
                (pad \"2\" thru_hole circle (at 0.5 0 90) (size 1 1) \
                    (drill 0.4) (layers \"*.Cu\" \"*.Mask\"))))",
        )
        .unwrap();
        let fp = &board.footprints[0];
        assert_eq!(fp.pads.len(), 2);
        let p1 = &fp.pads[0];
        assert_eq!(p1.shape, PadShape::RoundRect);
        assert_eq!(p1.net.as_ref().unwrap().name, "GND");
        assert_relative_eq!(p1.roundrect_rratio.unwrap(), 0.25);
        assert!(p1.on_layer("F.Cu"));
        assert!(!p1.on_layer("B.Cu"));
        let p2 = &fp.pads[1];
        assert!(p2.pad_type.is_through_hole());
        assert_relative_eq!(p2.drill.as_ref().unwrap().width, 0.4);
        assert!(p2.on_layer("F.Cu"));
        assert!(p2.on_layer("B.Cu"));
    }

    #[test]
    fn test_footprint_transform() {
        let board = Board::parse(
            "(kicad_pcb (version 1) (footprint \"R\" (layer \"F.Cu\") (at 10 10 90) \
                (pad \"1\" smd rect (at 2 0) (size 1 1) (layers \"F.Cu\"))))",
        )
        .unwrap();
        let fp = &board.footprints[0];
        // 90 degrees CCW in a y-down plane moves +x to -y.
        let p = fp.to_board(Vec2::new(2.0, 0.0));
        assert_relative_eq!(p.x, 10.0, epsilon = 1e-9);
        assert_relative_eq!(p.y, 8.0, epsilon = 1e-9);
    }

    #[test]
    fn test_tracks_and_zones() {
        let board = Board::parse(
            "(kicad_pcb (version 1) (net 1 \"GND\") \
                (segment (start 0 0) (end 10 0) (width 0.25) (layer \"F.Cu\") (net 1)) \
                (arc (start 10 0) (mid 12 2) (end 10 4) (width 0.25) (layer \"F.Cu\") (net 1)) \
                (via (at 10 0) (size 0.6) (drill 0.3) (layers \"F.Cu\" \"B.Cu\") (net 1)) \
                (zone (net 1) (net_name \"GND\") (layer \"B.Cu\") \
                    (filled_polygon (layer \"B.Cu\") (pts (xy 0 0) (xy 5 0) (xy 5 5)))))",
        )
        .unwrap();
        assert_eq!(board.segments.len(), 1);
        assert_eq!(board.arcs.len(), 1);
        assert_eq!(board.vias.len(), 1);
        assert_eq!(board.zones[0].filled_polygons[0].pts.len(), 3);
        assert_eq!(board.zones[0].layers, vec!["B.Cu"]);
    }

    #[test]
    fn test_unknown_forms_are_skipped() {
        let board = Board::parse(
            "(kicad_pcb (version 1) (some_future_form (a 1) (b 2)) (net 1 \"GND\"))",
        )
        .unwrap();
        assert_eq!(board.nets.len(), 1);
    }

    #[test]
    fn test_edges_bbox() {
        let board = Board::parse(
            "(kicad_pcb (version 1) \
                (gr_line (start 0 0) (end 50 0) (width 0.1) (layer \"Edge.Cuts\")) \
                (gr_line (start 50 0) (end 50 30) (width 0.1) (layer \"Edge.Cuts\")))",
        )
        .unwrap();
        let bbox = board.edges_bbox();
        assert_relative_eq!(bbox.width(), 50.0);
        assert_relative_eq!(bbox.height(), 30.0);
    }

    #[test]
    fn test_empty_board_bbox_fallback() {
        let board = Board::parse("(kicad_pcb (version 1))").unwrap();
        assert!(board.edges_bbox().is_valid());
    }

    #[test]
    fn test_property_dict_last_wins() {
        let board = Board::parse(
            "(kicad_pcb (version 1) \
                (property \"note\" \"first\") (property \"note\" \"second\"))",
        )
        .unwrap();
        assert_eq!(board.properties["note"], "second");
    }
}
