use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("unterminated string starting at byte {0}")]
    UnterminatedString(usize),

    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEof { expected: String },

    #[error("unexpected token {found}, expected {expected}")]
    UnexpectedToken { expected: String, found: String },

    #[error("expected {expected} in ({context} ...), found {found}")]
    Expected {
        context: String,
        expected: String,
        found: String,
    },

    #[error("missing required form ({tag} ...) in ({context} ...)")]
    MissingForm { context: String, tag: String },

    #[error("not a {expected} document (root tag is {found})")]
    WrongDocumentType { expected: String, found: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
