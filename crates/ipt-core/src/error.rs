use thiserror::Error;

/// What was wrong with a single line of save output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    /// Chain declaration without exactly `:name POLICY [p:b]`
    #[error("expected 3 fields")]
    FieldCount,

    /// Missing, malformed or overflowing counter annotation
    #[error("expected [packets:bytes]")]
    Counters,

    /// Rule line without an `-A`/`--append` directive
    #[error("expected -A chain ...")]
    MissingChain,

    #[error("unhandled line")]
    Unhandled,
}

/// A parse failure tagged with its 1-based line number and the trimmed line text
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at line {line}: {text:?}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub line: usize,
    pub text: String,
}

/// Failure of a whole parse over a line source
#[derive(Debug, Error)]
pub enum SaveError {
    /// Reading the line source failed; takes priority over parse errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, line: usize, text: &str) -> Self {
        Self {
            kind,
            line,
            text: text.to_string(),
        }
    }
}
