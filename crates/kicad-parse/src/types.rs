//! Geometry leaves and document fragments shared by the board and
//! schematic models.

use serde::Serialize;

use crate::error::ParseError;
use crate::schema::{ExprParser, FromSExpr};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Vec2) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Reads a two-number point from a tagged form such as `(start 1 2)` or
/// `(xy 1 2)`. Returns `None` when the form is absent.
pub fn point(p: &mut ExprParser<'_>, tag: &str) -> Result<Option<Vec2>, ParseError> {
    p.object_with(tag, |mut sub| {
        sub.start(tag)?;
        let x = sub.positional("x")?;
        let y = sub.positional("y")?;
        Ok(Vec2 { x, y })
    })
}

pub fn expect_point(p: &mut ExprParser<'_>, tag: &str) -> Result<Vec2, ParseError> {
    point(p, tag)?.ok_or_else(|| ParseError::MissingForm {
        context: p.context().to_string(),
        tag: tag.to_string(),
    })
}

/// Position plus optional rotation: `(at x y [angle])`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct At {
    pub x: f64,
    pub y: f64,
    pub rotation: f64,
}

impl At {
    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

impl FromSExpr for At {
    fn from_expr(mut p: ExprParser<'_>) -> Result<Self, ParseError> {
        p.start("at")?;
        let x = p.positional("x")?;
        let y = p.positional("y")?;
        let rotation = p.maybe_positional().unwrap_or(0.0);
        Ok(At { x, y, rotation })
    }
}

/// KiCad 7+ stroke definition: `(stroke (width 0.12) (type solid))`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Stroke {
    pub width: f64,
    pub style: Option<String>,
}

impl FromSExpr for Stroke {
    fn from_expr(mut p: ExprParser<'_>) -> Result<Self, ParseError> {
        p.start("stroke")?;
        let width = p.pair_or("width", 0.0)?;
        let style = p.pair("type")?;
        p.ignore(&["color"]);
        Ok(Stroke { width, style })
    }
}

/// Line width for a graphic item: legacy `(width N)` with the KiCad 7
/// `(stroke (width N))` fallback.
pub fn line_width(p: &mut ExprParser<'_>) -> Result<f64, ParseError> {
    if let Some(width) = p.pair("width")? {
        return Ok(width);
    }
    Ok(p.object::<Stroke>("stroke")?.map_or(0.0, |s| s.width))
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Paper {
    pub size: String,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub portrait: bool,
}

impl FromSExpr for Paper {
    fn from_expr(mut p: ExprParser<'_>) -> Result<Self, ParseError> {
        p.start("paper")?;
        let size = p.positional("paper size")?;
        let width = p.maybe_positional();
        let height = p.maybe_positional();
        let portrait = p.flag("portrait");
        Ok(Paper {
            size,
            width,
            height,
            portrait,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TitleBlock {
    pub title: String,
    pub date: String,
    pub rev: String,
    pub company: String,
}

impl FromSExpr for TitleBlock {
    fn from_expr(mut p: ExprParser<'_>) -> Result<Self, ParseError> {
        p.start("title_block")?;
        let out = TitleBlock {
            title: p.pair_or("title", String::new())?,
            date: p.pair_or("date", String::new())?,
            rev: p.pair_or("rev", String::new())?,
            company: p.pair_or("company", String::new())?,
        };
        p.ignore(&["comment"]);
        p.finish();
        Ok(out)
    }
}

// ─── Bounding box ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BBox {
    pub minx: f64,
    pub miny: f64,
    pub maxx: f64,
    pub maxy: f64,
}

impl BBox {
    pub fn empty() -> Self {
        Self {
            minx: f64::INFINITY,
            miny: f64::INFINITY,
            maxx: f64::NEG_INFINITY,
            maxy: f64::NEG_INFINITY,
        }
    }

    pub fn new(minx: f64, miny: f64, maxx: f64, maxy: f64) -> Self {
        Self {
            minx,
            miny,
            maxx,
            maxy,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.minx <= self.maxx && self.miny <= self.maxy
    }

    pub fn width(&self) -> f64 {
        self.maxx - self.minx
    }

    pub fn height(&self) -> f64 {
        self.maxy - self.miny
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new((self.minx + self.maxx) / 2.0, (self.miny + self.maxy) / 2.0)
    }

    pub fn expand_point(&mut self, x: f64, y: f64) {
        self.minx = self.minx.min(x);
        self.miny = self.miny.min(y);
        self.maxx = self.maxx.max(x);
        self.maxy = self.maxy.max(y);
    }

    pub fn expand_vec(&mut self, v: Vec2) {
        self.expand_point(v.x, v.y);
    }

    pub fn union(&self, other: &BBox) -> BBox {
        let mut out = *self;
        if other.is_valid() {
            out.expand_point(other.minx, other.miny);
            out.expand_point(other.maxx, other.maxy);
        }
        out
    }

    pub fn grow(&self, amount: f64) -> BBox {
        BBox::new(
            self.minx - amount,
            self.miny - amount,
            self.maxx + amount,
            self.maxy + amount,
        )
    }

    pub fn contains(&self, p: Vec2) -> bool {
        self.is_valid()
            && p.x >= self.minx
            && p.x <= self.maxx
            && p.y >= self.miny
            && p.y <= self.maxy
    }
}

impl Default for BBox {
    fn default() -> Self {
        Self::empty()
    }
}

// ─── Graphic items ───────────────────────────────────────────────────

/// A board or footprint drawing. Coordinates are as written in the file;
/// footprint children stay in footprint-local space.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Graphic {
    Line {
        start: Vec2,
        end: Vec2,
        width: f64,
        layer: String,
    },
    Rect {
        start: Vec2,
        end: Vec2,
        width: f64,
        fill: bool,
        layer: String,
    },
    Circle {
        center: Vec2,
        end: Vec2,
        width: f64,
        fill: bool,
        layer: String,
    },
    Arc {
        start: Vec2,
        mid: Option<Vec2>,
        end: Vec2,
        angle: Option<f64>,
        width: f64,
        layer: String,
    },
    Poly {
        pts: Vec<Vec2>,
        width: f64,
        fill: bool,
        layer: String,
    },
    Text {
        text: String,
        at: At,
        layer: String,
        hidden: bool,
    },
}

impl Graphic {
    pub fn layer(&self) -> &str {
        match self {
            Graphic::Line { layer, .. }
            | Graphic::Rect { layer, .. }
            | Graphic::Circle { layer, .. }
            | Graphic::Arc { layer, .. }
            | Graphic::Poly { layer, .. }
            | Graphic::Text { layer, .. } => layer,
        }
    }

    /// Tags understood at the board root and inside footprints.
    pub const BOARD_TAGS: &'static [&'static str] = &[
        "gr_line", "gr_rect", "gr_circle", "gr_arc", "gr_poly", "gr_text",
    ];
    pub const FOOTPRINT_TAGS: &'static [&'static str] =
        &["fp_line", "fp_rect", "fp_circle", "fp_arc", "fp_poly"];

    pub fn from_tagged(tag: &str, mut p: ExprParser<'_>) -> Result<Self, ParseError> {
        p.start(tag)?;
        let graphic = match tag {
            "gr_line" | "fp_line" => Graphic::Line {
                start: expect_point(&mut p, "start")?,
                end: expect_point(&mut p, "end")?,
                width: line_width(&mut p)?,
                layer: layer_name(&mut p)?,
            },
            "gr_rect" | "fp_rect" => Graphic::Rect {
                start: expect_point(&mut p, "start")?,
                end: expect_point(&mut p, "end")?,
                width: line_width(&mut p)?,
                fill: fill_solid(&mut p)?,
                layer: layer_name(&mut p)?,
            },
            "gr_circle" | "fp_circle" => {
                // KiCad 5 wrote the center as `start`.
                let center = match point(&mut p, "center")? {
                    Some(c) => c,
                    None => expect_point(&mut p, "start")?,
                };
                Graphic::Circle {
                    center,
                    end: expect_point(&mut p, "end")?,
                    width: line_width(&mut p)?,
                    fill: fill_solid(&mut p)?,
                    layer: layer_name(&mut p)?,
                }
            }
            "gr_arc" | "fp_arc" => Graphic::Arc {
                start: expect_point(&mut p, "start")?,
                mid: point(&mut p, "mid")?,
                end: expect_point(&mut p, "end")?,
                angle: p.pair("angle")?,
                width: line_width(&mut p)?,
                layer: layer_name(&mut p)?,
            },
            "gr_poly" | "fp_poly" => Graphic::Poly {
                pts: point_list(&mut p)?,
                width: line_width(&mut p)?,
                fill: fill_solid(&mut p)?,
                layer: layer_name(&mut p)?,
            },
            "gr_text" => {
                let text = p.positional("text")?;
                Graphic::Text {
                    text,
                    at: p.expect_object("at")?,
                    layer: layer_name(&mut p)?,
                    hidden: p.flag("hide"),
                }
            }
            other => {
                return Err(ParseError::Expected {
                    context: other.to_string(),
                    expected: "graphic item tag".to_string(),
                    found: other.to_string(),
                })
            }
        };
        p.ignore(&["uuid", "tstamp", "effects", "locked"]);
        p.finish();
        Ok(graphic)
    }

    /// Bounding box of the raw geometry, ignoring stroke width.
    pub fn bbox(&self) -> BBox {
        let mut bbox = BBox::empty();
        match self {
            Graphic::Line { start, end, .. } | Graphic::Rect { start, end, .. } => {
                bbox.expand_vec(*start);
                bbox.expand_vec(*end);
            }
            Graphic::Circle { center, end, .. } => {
                let r = center.distance(end);
                bbox.expand_point(center.x - r, center.y - r);
                bbox.expand_point(center.x + r, center.y + r);
            }
            Graphic::Arc {
                start, mid, end, ..
            } => {
                bbox.expand_vec(*start);
                bbox.expand_vec(*end);
                if let Some(m) = mid {
                    bbox.expand_vec(*m);
                }
            }
            Graphic::Poly { pts, .. } => {
                for pt in pts {
                    bbox.expand_vec(*pt);
                }
            }
            Graphic::Text { at, .. } => {
                bbox.expand_point(at.x, at.y);
            }
        }
        bbox
    }
}

/// `(layer "F.Cu")` on a graphic, empty when missing.
pub fn layer_name(p: &mut ExprParser<'_>) -> Result<String, ParseError> {
    Ok(p.pair("layer")?.unwrap_or_default())
}

/// `(fill (type solid))` or the KiCad 8 shorthand `(fill yes)`.
fn fill_solid(p: &mut ExprParser<'_>) -> Result<bool, ParseError> {
    let fill = p.object_with("fill", |mut f| {
        f.start("fill")?;
        if let Some(solid) = f.maybe_positional::<bool>() {
            return Ok(solid);
        }
        Ok(f.pair::<String>("type")?.as_deref() == Some("solid"))
    })?;
    Ok(fill.unwrap_or(false))
}

/// `(pts (xy ..) (xy ..) ...)` point list.
pub fn point_list(p: &mut ExprParser<'_>) -> Result<Vec<Vec2>, ParseError> {
    let pts = p.object_with("pts", |mut pts| {
        pts.start("pts")?;
        pts.collection_map(&["xy"], |_, mut xy| {
            xy.start("xy")?;
            let x = xy.positional("x")?;
            let y = xy.positional("y")?;
            Ok(Vec2 { x, y })
        })
    })?;
    Ok(pts.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sexpr::parse;
    use approx::assert_relative_eq;

    fn parser(src: &str) -> crate::sexpr::Node {
        parse(src).unwrap()
    }

    #[test]
    fn test_at_with_and_without_rotation() {
        let node = parser("(at 100.5 50.3 90)");
        let at = At::from_expr(ExprParser::new(&node).unwrap()).unwrap();
        assert_relative_eq!(at.x, 100.5);
        assert_relative_eq!(at.rotation, 90.0);

        let node = parser("(at 1 2)");
        let at = At::from_expr(ExprParser::new(&node).unwrap()).unwrap();
        assert_relative_eq!(at.rotation, 0.0);
    }

    #[test]
    fn test_stroke_width_fallback() {
        let node = parser("(gr_line (start 0 0) (end 1 0) (stroke (width 0.25) (type solid)) (layer Edge.Cuts))");
        let g = Graphic::from_tagged("gr_line", ExprParser::new(&node).unwrap()).unwrap();
        match g {
            Graphic::Line { width, layer, .. } => {
                assert_relative_eq!(width, 0.25);
                assert_eq!(layer, "Edge.Cuts");
            }
            other => panic!("expected line, got {other:?}"),
        }
    }

    #[test]
    fn test_circle_legacy_center() {
        let node = parser("(fp_circle (start 0 0) (end 3 4) (width 0.1) (layer F.SilkS))");
        let g = Graphic::from_tagged("fp_circle", ExprParser::new(&node).unwrap()).unwrap();
        let bbox = g.bbox();
        assert_relative_eq!(bbox.maxx, 5.0);
        assert_relative_eq!(bbox.miny, -5.0);
    }

    #[test]
    fn test_poly_points() {
        let node = parser("(gr_poly (pts (xy 0 0) (xy 10 0) (xy 10 10)) (width 0.1) (fill (type solid)) (layer F.Cu))");
        let g = Graphic::from_tagged("gr_poly", ExprParser::new(&node).unwrap()).unwrap();
        match g {
            Graphic::Poly { pts, fill, .. } => {
                assert_eq!(pts.len(), 3);
                assert!(fill);
            }
            other => panic!("expected poly, got {other:?}"),
        }
    }

    #[test]
    fn test_bbox_union() {
        let a = BBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BBox::new(5.0, 5.0, 15.0, 15.0);
        assert_eq!(a.union(&b), BBox::new(0.0, 0.0, 15.0, 15.0));
        // Union with an empty box is a no-op.
        assert_eq!(a.union(&BBox::empty()), a);
    }

    #[test]
    fn test_empty_bbox_is_degenerate() {
        let bbox = BBox::empty();
        assert!(!bbox.is_valid());
        assert!(!bbox.contains(Vec2::new(0.0, 0.0)));
    }

    #[test]
    fn test_paper() {
        let node = parser("(paper \"A4\")");
        let paper = Paper::from_expr(ExprParser::new(&node).unwrap()).unwrap();
        assert_eq!(paper.size, "A4");
        assert!(!paper.portrait);
    }
}
