//! Typed document model for `.kicad_sch` files.

use std::collections::HashMap;

use serde::Serialize;

use crate::error::ParseError;
use crate::schema::{ExprParser, FromSExpr};
use crate::sexpr::{self, Node};
use crate::types::{expect_point, point_list};
use crate::types::{At, BBox, Paper, Stroke, TitleBlock, Vec2};

#[derive(Debug, Clone, Serialize)]
pub struct Schematic {
    pub version: u64,
    pub generator: String,
    pub generator_version: Option<String>,
    pub uuid: Option<String>,
    pub paper: Option<Paper>,
    pub title_block: Option<TitleBlock>,
    pub lib_symbols: HashMap<String, LibrarySymbol>,
    pub symbols: Vec<SchematicSymbol>,
    pub wires: Vec<Wire>,
    pub junctions: Vec<Junction>,
    pub labels: Vec<Label>,
    pub no_connects: Vec<NoConnect>,
}

// ─── Library symbols ─────────────────────────────────────────────────

/// A symbol definition from the embedded `lib_symbols` section. Graphics
/// and pins live on per-unit child symbols (`R_0_1` style names).
#[derive(Debug, Clone, Serialize)]
pub struct LibrarySymbol {
    pub name: String,
    pub power: bool,
    pub properties: HashMap<String, String>,
    pub units: Vec<SymbolUnit>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SymbolUnit {
    pub name: String,
    pub drawings: Vec<SymbolGraphic>,
    pub pins: Vec<Pin>,
}

impl LibrarySymbol {
    pub fn pins(&self) -> impl Iterator<Item = &Pin> {
        self.units.iter().flat_map(|u| u.pins.iter())
    }

    /// Symbol-local bounding box over all units.
    pub fn bbox(&self) -> BBox {
        let mut bbox = BBox::empty();
        for unit in &self.units {
            for drawing in &unit.drawings {
                bbox = bbox.union(&drawing.bbox());
            }
            for pin in &unit.pins {
                bbox.expand_point(pin.at.x, pin.at.y);
            }
        }
        bbox
    }
}

impl FromSExpr for LibrarySymbol {
    fn from_expr(mut p: ExprParser<'_>) -> Result<Self, ParseError> {
        p.start("symbol")?;
        let name: String = p.positional("symbol name")?;
        let power = p.object_with("power", |_| Ok(()))?.is_some();
        let properties = p
            .dict("property", |prop: &SchProperty| prop.key.clone())?
            .into_iter()
            .map(|(k, v)| (k, v.value))
            .collect();
        let units = p.collection("symbol")?;
        p.ignore(&[
            "pin_numbers",
            "pin_names",
            "exclude_from_sim",
            "in_bom",
            "on_board",
            "embedded_fonts",
        ]);
        p.finish();
        Ok(LibrarySymbol {
            name,
            power,
            properties,
            units,
        })
    }
}

impl FromSExpr for SymbolUnit {
    fn from_expr(mut p: ExprParser<'_>) -> Result<Self, ParseError> {
        p.start("symbol")?;
        let name: String = p.positional("unit name")?;
        let drawings = p.collection_map(
            &["polyline", "rectangle", "circle", "arc", "text"],
            SymbolGraphic::from_tagged,
        )?;
        let pins = p.collection("pin")?;
        p.ignore(&["unit_name"]);
        p.finish();
        Ok(SymbolUnit {
            name,
            drawings,
            pins,
        })
    }
}

/// Symbol body geometry. Tags differ from the board graphic vocabulary
/// (`polyline`/`rectangle` instead of `gr_poly`/`gr_rect`).
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SymbolGraphic {
    Polyline {
        pts: Vec<Vec2>,
        width: f64,
        fill: bool,
    },
    Rectangle {
        start: Vec2,
        end: Vec2,
        width: f64,
        fill: bool,
    },
    Circle {
        center: Vec2,
        radius: f64,
        width: f64,
        fill: bool,
    },
    Arc {
        start: Vec2,
        mid: Vec2,
        end: Vec2,
        width: f64,
    },
    Text {
        text: String,
        at: At,
    },
}

impl SymbolGraphic {
    fn from_tagged(tag: &str, mut p: ExprParser<'_>) -> Result<Self, ParseError> {
        p.start(tag)?;
        let graphic = match tag {
            "polyline" => SymbolGraphic::Polyline {
                pts: point_list(&mut p)?,
                width: stroke_width(&mut p)?,
                fill: symbol_fill(&mut p)?,
            },
            "rectangle" => SymbolGraphic::Rectangle {
                start: expect_point(&mut p, "start")?,
                end: expect_point(&mut p, "end")?,
                width: stroke_width(&mut p)?,
                fill: symbol_fill(&mut p)?,
            },
            "circle" => SymbolGraphic::Circle {
                center: expect_point(&mut p, "center")?,
                radius: p.pair_or("radius", 0.0)?,
                width: stroke_width(&mut p)?,
                fill: symbol_fill(&mut p)?,
            },
            "arc" => SymbolGraphic::Arc {
                start: expect_point(&mut p, "start")?,
                mid: expect_point(&mut p, "mid")?,
                end: expect_point(&mut p, "end")?,
                width: stroke_width(&mut p)?,
            },
            "text" => SymbolGraphic::Text {
                text: p.positional("text")?,
                at: p.expect_object("at")?,
            },
            other => {
                return Err(ParseError::Expected {
                    context: other.to_string(),
                    expected: "symbol graphic tag".to_string(),
                    found: other.to_string(),
                })
            }
        };
        p.ignore(&["fill", "stroke", "effects", "uuid"]);
        p.finish();
        Ok(graphic)
    }

    pub fn bbox(&self) -> BBox {
        let mut bbox = BBox::empty();
        match self {
            SymbolGraphic::Polyline { pts, .. } => {
                for pt in pts {
                    bbox.expand_vec(*pt);
                }
            }
            SymbolGraphic::Rectangle { start, end, .. } => {
                bbox.expand_vec(*start);
                bbox.expand_vec(*end);
            }
            SymbolGraphic::Circle { center, radius, .. } => {
                bbox.expand_point(center.x - radius, center.y - radius);
                bbox.expand_point(center.x + radius, center.y + radius);
            }
            SymbolGraphic::Arc {
                start, mid, end, ..
            } => {
                bbox.expand_vec(*start);
                bbox.expand_vec(*mid);
                bbox.expand_vec(*end);
            }
            SymbolGraphic::Text { at, .. } => bbox.expand_point(at.x, at.y),
        }
        bbox
    }
}

fn stroke_width(p: &mut ExprParser<'_>) -> Result<f64, ParseError> {
    Ok(p.object::<Stroke>("stroke")?.map_or(0.0, |s| s.width))
}

fn symbol_fill(p: &mut ExprParser<'_>) -> Result<bool, ParseError> {
    let fill = p.object_with("fill", |mut f| {
        f.start("fill")?;
        Ok(matches!(
            f.pair::<String>("type")?.as_deref(),
            Some("background") | Some("outline")
        ))
    })?;
    Ok(fill.unwrap_or(false))
}

#[derive(Debug, Clone, Serialize)]
pub struct Pin {
    pub electrical: String,
    pub shape: String,
    pub at: At,
    pub length: f64,
    pub name: String,
    pub number: String,
    pub hidden: bool,
}

impl FromSExpr for Pin {
    fn from_expr(mut p: ExprParser<'_>) -> Result<Self, ParseError> {
        p.start("pin")?;
        let electrical = p.maybe_positional().unwrap_or_default();
        let shape = p.maybe_positional().unwrap_or_default();
        let hidden = p.flag("hide");
        let at = p.object("at")?.unwrap_or_default();
        let length = p.pair_or("length", 0.0)?;
        let name = p
            .object_with("name", |mut n| {
                n.start("name")?;
                n.positional("pin name")
            })?
            .unwrap_or_default();
        let number = p
            .object_with("number", |mut n| {
                n.start("number")?;
                n.positional("pin number")
            })?
            .unwrap_or_default();
        p.ignore(&["uuid", "alternate", "hide"]);
        p.finish();
        Ok(Pin {
            electrical,
            shape,
            at,
            length,
            name,
            number,
            hidden,
        })
    }
}

// ─── Sheet content ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct SchProperty {
    pub key: String,
    pub value: String,
    pub hidden: bool,
}

impl FromSExpr for SchProperty {
    fn from_expr(mut p: ExprParser<'_>) -> Result<Self, ParseError> {
        p.start("property")?;
        let key = p.positional("property name")?;
        let value = p.maybe_positional().unwrap_or_default();
        let hidden = p.flag("hide");
        p.ignore(&["at", "effects", "id", "show_name", "do_not_autoplace"]);
        p.finish();
        Ok(SchProperty { key, value, hidden })
    }
}

/// A placed symbol instance referencing a library symbol by `lib_id`.
#[derive(Debug, Clone, Serialize)]
pub struct SchematicSymbol {
    pub lib_id: String,
    pub at: At,
    pub unit: u32,
    pub mirror: Option<String>,
    pub uuid: Option<String>,
    pub properties: HashMap<String, String>,
}

impl FromSExpr for SchematicSymbol {
    fn from_expr(mut p: ExprParser<'_>) -> Result<Self, ParseError> {
        p.start("symbol")?;
        let out = SchematicSymbol {
            lib_id: p.expect_pair("lib_id")?,
            at: p.object("at")?.unwrap_or_default(),
            unit: p.pair_or("unit", 1)?,
            mirror: p.pair("mirror")?,
            uuid: p.pair("uuid")?,
            properties: p
                .dict("property", |prop: &SchProperty| prop.key.clone())?
                .into_iter()
                .map(|(k, v)| (k, v.value))
                .collect(),
        };
        p.ignore(&[
            "exclude_from_sim",
            "in_bom",
            "on_board",
            "dnp",
            "fields_autoplaced",
            "pin",
            "instances",
            "convert",
        ]);
        p.finish();
        Ok(out)
    }
}

impl SchematicSymbol {
    pub fn reference(&self) -> &str {
        self.properties
            .get("Reference")
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn value(&self) -> &str {
        self.properties
            .get("Value")
            .map(String::as_str)
            .unwrap_or("")
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Wire {
    pub pts: Vec<Vec2>,
    pub stroke: Stroke,
}

impl FromSExpr for Wire {
    fn from_expr(mut p: ExprParser<'_>) -> Result<Self, ParseError> {
        p.start("wire")?;
        let out = Wire {
            pts: point_list(&mut p)?,
            stroke: p.object("stroke")?.unwrap_or_default(),
        };
        p.ignore(&["uuid"]);
        p.finish();
        Ok(out)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Junction {
    pub at: At,
    pub diameter: f64,
}

impl FromSExpr for Junction {
    fn from_expr(mut p: ExprParser<'_>) -> Result<Self, ParseError> {
        p.start("junction")?;
        let out = Junction {
            at: p.object("at")?.unwrap_or_default(),
            diameter: p.pair_or("diameter", 0.0)?,
        };
        p.ignore(&["uuid", "color"]);
        p.finish();
        Ok(out)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelKind {
    Local,
    Global,
    Hierarchical,
}

#[derive(Debug, Clone, Serialize)]
pub struct Label {
    pub kind: LabelKind,
    pub text: String,
    pub at: At,
}

impl Label {
    fn from_tagged(tag: &str, mut p: ExprParser<'_>) -> Result<Self, ParseError> {
        p.start(tag)?;
        let kind = match tag {
            "global_label" => LabelKind::Global,
            "hierarchical_label" => LabelKind::Hierarchical,
            _ => LabelKind::Local,
        };
        let out = Label {
            kind,
            text: p.positional("label text")?,
            at: p.object("at")?.unwrap_or_default(),
        };
        p.ignore(&[
            "uuid",
            "effects",
            "shape",
            "fields_autoplaced",
            "property",
        ]);
        p.finish();
        Ok(out)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NoConnect {
    pub at: At,
}

impl FromSExpr for NoConnect {
    fn from_expr(mut p: ExprParser<'_>) -> Result<Self, ParseError> {
        p.start("no_connect")?;
        let out = NoConnect {
            at: p.object("at")?.unwrap_or_default(),
        };
        p.ignore(&["uuid"]);
        p.finish();
        Ok(out)
    }
}

// ─── Schematic root ──────────────────────────────────────────────────

impl Schematic {
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let root = sexpr::parse(text)?;
        Self::from_sexpr(&root)
    }

    pub fn from_sexpr(root: &Node) -> Result<Self, ParseError> {
        if root.tag() != Some("kicad_sch") {
            return Err(ParseError::WrongDocumentType {
                expected: "kicad_sch".to_string(),
                found: root.tag().unwrap_or("?").to_string(),
            });
        }
        let mut p = ExprParser::new(root)?;
        p.start("kicad_sch")?;
        let schematic = Schematic {
            version: p.expect_pair("version")?,
            generator: p.pair_or("generator", String::new())?,
            generator_version: p.pair("generator_version")?,
            uuid: p.pair("uuid")?,
            paper: p.object("paper")?,
            title_block: p.object("title_block")?,
            lib_symbols: p
                .object_with("lib_symbols", |mut lp| {
                    lp.start("lib_symbols")?;
                    let map =
                        lp.dict("symbol", |sym: &LibrarySymbol| sym.name.clone())?;
                    lp.finish();
                    Ok(map)
                })?
                .unwrap_or_default(),
            symbols: p.collection("symbol")?,
            wires: p.collection("wire")?,
            junctions: p.collection("junction")?,
            labels: p.collection_map(
                &["label", "global_label", "hierarchical_label"],
                Label::from_tagged,
            )?,
            no_connects: p.collection("no_connect")?,
        };
        p.ignore(&[
            "bus",
            "bus_entry",
            "polyline",
            "text",
            "text_box",
            "sheet",
            "sheet_instances",
            "symbol_instances",
            "image",
            "embedded_fonts",
        ]);
        p.finish();
        Ok(schematic)
    }

    /// Resolve a placed symbol's `lib_id` to its library definition.
    pub fn resolve_symbol(&self, lib_id: &str) -> Option<&LibrarySymbol> {
        self.lib_symbols.get(lib_id)
    }

    pub fn find_symbol(&self, reference: &str) -> Option<(usize, &SchematicSymbol)> {
        self.symbols
            .iter()
            .enumerate()
            .find(|(_, s)| s.reference() == reference)
    }

    /// Union of all sheet content, for camera fitting.
    pub fn content_bbox(&self) -> BBox {
        let mut bbox = BBox::empty();
        for wire in &self.wires {
            for pt in &wire.pts {
                bbox.expand_vec(*pt);
            }
        }
        for junction in &self.junctions {
            bbox.expand_point(junction.at.x, junction.at.y);
        }
        for label in &self.labels {
            bbox.expand_point(label.at.x, label.at.y);
        }
        for symbol in &self.symbols {
            let reach = self
                .resolve_symbol(&symbol.lib_id)
                .map(|lib| lib.bbox())
                .filter(BBox::is_valid)
                .map(|b| b.width().max(b.height()) / 2.0)
                .unwrap_or(2.54);
            bbox.expand_point(symbol.at.x - reach, symbol.at.y - reach);
            bbox.expand_point(symbol.at.x + reach, symbol.at.y + reach);
        }
        if !bbox.is_valid() {
            bbox = BBox::new(0.0, 0.0, 297.0, 210.0);
        }
        bbox
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const SHEET: &str = "(kicad_sch (version 20230121) (generator eeschema) \
        (paper \"A4\") \
        (lib_symbols \
            (symbol \"Device:R\" \
                (property \"Reference\" \"R\") \
                (property \"Value\" \"R\") \
                (symbol \"R_0_1\" \
                    (rectangle (start -1.016 -2.54) (end 1.016 2.54) \
                        (stroke (width 0.254)) (fill (type none)))) \
                (symbol \"R_1_1\" \
                    (pin passive line (at 0 3.81 270) (length 1.27) \
                        (name \"~\") (number \"1\")) \
                    (pin passive line (at 0 -3.81 90) (length 1.27) \
                        (name \"~\") (number \"2\"))))) \
        (junction (at 95.25 73.66) (diameter 0.9144)) \
        (wire (pts (xy 91.44 73.66) (xy 95.25 73.66)) (stroke (width 0))) \
        (wire (pts (xy 95.25 73.66) (xy 95.25 80.01)) (stroke (width 0))) \
        (label \"OUT\" (at 95.25 73.66 0)) \
        (symbol (lib_id \"Device:R\") (at 95.25 85.09 0) (unit 1) \
            (property \"Reference\" \"R1\") \
            (property \"Value\" \"10k\")))";

    #[test]
    fn test_sheet_parses() {
        let sch = Schematic::parse(SHEET).unwrap();
        assert_eq!(sch.version, 20230121);
        assert_eq!(sch.wires.len(), 2);
        assert_eq!(sch.junctions.len(), 1);
        assert_eq!(sch.labels.len(), 1);
        assert_eq!(sch.symbols.len(), 1);
    }

    #[test]
    fn test_lib_symbol_resolution() {
        let sch = Schematic::parse(SHEET).unwrap();
        let symbol = &sch.symbols[0];
        assert_eq!(symbol.reference(), "R1");
        let lib = sch.resolve_symbol(&symbol.lib_id).unwrap();
        assert_eq!(lib.name, "Device:R");
        assert_eq!(lib.units.len(), 2);
        assert_eq!(lib.pins().count(), 2);
        assert!(sch.resolve_symbol("Device:C").is_none());
    }

    #[test]
    fn test_pin_fields() {
        let sch = Schematic::parse(SHEET).unwrap();
        let lib = sch.resolve_symbol("Device:R").unwrap();
        let pin = lib.pins().next().unwrap();
        assert_eq!(pin.electrical, "passive");
        assert_eq!(pin.number, "1");
        assert_relative_eq!(pin.length, 1.27);
        assert_relative_eq!(pin.at.rotation, 270.0);
    }

    #[test]
    fn test_find_symbol_by_reference() {
        let sch = Schematic::parse(SHEET).unwrap();
        assert!(sch.find_symbol("R1").is_some());
        assert!(sch.find_symbol("C7").is_none());
    }

    #[test]
    fn test_content_bbox_covers_wires() {
        let sch = Schematic::parse(SHEET).unwrap();
        let bbox = sch.content_bbox();
        assert!(bbox.contains(Vec2::new(93.0, 75.0)));
    }

    #[test]
    fn test_wrong_root_tag() {
        assert!(matches!(
            Schematic::parse("(kicad_pcb (version 1))"),
            Err(ParseError::WrongDocumentType { .. })
        ));
    }

    #[test]
    fn test_duplicate_lib_symbol_last_wins() {
        let sch = Schematic::parse(
            "(kicad_sch (version 1) (lib_symbols \
                (symbol \"Device:R\" (property \"Value\" \"first\")) \
                (symbol \"Device:R\" (property \"Value\" \"second\"))))",
        )
        .unwrap();
        assert_eq!(sch.lib_symbols.len(), 1);
        assert_eq!(
            sch.lib_symbols["Device:R"].properties["Value"],
            "second"
        );
    }
}
