use thiserror::Error;

use kicad_parse::error::ParseError;

#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("no document is loaded")]
    NotLoaded,

    #[error(transparent)]
    Parse(#[from] ParseError),
}
