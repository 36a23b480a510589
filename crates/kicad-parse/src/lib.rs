pub mod board;
pub mod cursor;
pub mod error;
pub mod schema;
pub mod schematic;
pub mod sexpr;
pub mod tokenizer;
pub mod types;

use std::path::Path;

use serde::Serialize;

use board::Board;
use error::ParseError;
use schematic::Schematic;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocFormat {
    BoardFile,
    SchematicFile,
}

/// A parsed KiCad document of either kind.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Document {
    Board(Board),
    Schematic(Schematic),
}

/// Detect format from file extension.
pub fn detect_format(path: &Path) -> Option<DocFormat> {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .as_deref()
    {
        Some("kicad_pcb") => Some(DocFormat::BoardFile),
        Some("kicad_sch") => Some(DocFormat::SchematicFile),
        _ => None,
    }
}

/// Parse source text, deciding board vs schematic from the root tag.
pub fn parse_document(text: &str) -> Result<Document, ParseError> {
    let root = sexpr::parse(text)?;
    match root.tag() {
        Some("kicad_pcb") => Ok(Document::Board(Board::from_sexpr(&root)?)),
        Some("kicad_sch") => Ok(Document::Schematic(Schematic::from_sexpr(&root)?)),
        other => Err(ParseError::UnsupportedFormat(
            other.unwrap_or("?").to_string(),
        )),
    }
}

pub fn load_board(path: &Path) -> Result<Board, ParseError> {
    let text = std::fs::read_to_string(path)?;
    Board::parse(&text)
}

pub fn load_schematic(path: &Path) -> Result<Schematic, ParseError> {
    let text = std::fs::read_to_string(path)?;
    Schematic::parse(&text)
}

/// Read and parse a file, with the format taken from its extension.
pub fn load_file(path: &Path) -> Result<Document, ParseError> {
    let format = detect_format(path).ok_or_else(|| {
        ParseError::UnsupportedFormat(
            path.extension()
                .and_then(|e| e.to_str())
                .unwrap_or("(none)")
                .to_string(),
        )
    })?;
    let text = std::fs::read_to_string(path)?;
    match format {
        DocFormat::BoardFile => Ok(Document::Board(Board::parse(&text)?)),
        DocFormat::SchematicFile => Ok(Document::Schematic(Schematic::parse(&text)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_detect_format() {
        assert_eq!(
            detect_format(&PathBuf::from("x/demo.kicad_pcb")),
            Some(DocFormat::BoardFile)
        );
        assert_eq!(
            detect_format(&PathBuf::from("demo.KICAD_SCH")),
            Some(DocFormat::SchematicFile)
        );
        assert_eq!(detect_format(&PathBuf::from("demo.brd")), None);
    }

    #[test]
    fn test_parse_document_by_root_tag() {
        match parse_document("(kicad_pcb (version 1))").unwrap() {
            Document::Board(b) => assert_eq!(b.version, 1),
            other => panic!("expected board, got {other:?}"),
        }
        match parse_document("(kicad_sch (version 2))").unwrap() {
            Document::Schematic(s) => assert_eq!(s.version, 2),
            other => panic!("expected schematic, got {other:?}"),
        }
        assert!(matches!(
            parse_document("(kicad_wks (version 3))"),
            Err(ParseError::UnsupportedFormat(_))
        ));
    }
}
