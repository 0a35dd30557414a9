//! Error handling for tplexpand.
//! Defines the error taxonomy raised while scanning, parsing, resolving and
//! filtering placeholders, plus the ambient I/O and configuration errors.

use std::fmt;
use std::io;
use thiserror::Error;

/// Location of a problem inside a template.
///
/// `offset` is a byte offset into the template text, `line` and `column`
/// are 1-based and counted in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl Position {
    /// Computes line and column for `offset` within `source`.
    ///
    /// Offsets past the end of `source` are clamped to its length.
    pub fn locate(source: &str, offset: usize) -> Self {
        let offset = offset.min(source.len());
        let before = &source.as_bytes()[..offset];
        let line = before.iter().filter(|&&b| b == b'\n').count() + 1;
        let line_start = before.iter().rposition(|&b| b == b'\n').map_or(0, |i| i + 1);
        let column = String::from_utf8_lossy(&before[line_start..]).chars().count() + 1;
        Self { offset, line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {} (offset {})", self.line, self.column, self.offset)
    }
}

/// Custom error types for tplexpand operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Represents errors that occur during file system operations
    #[error("IO error: {0}.")]
    IoError(#[from] io::Error),

    /// A `{{` without a matching `}}`
    #[error("Unterminated placeholder at {position}: '{snippet}'.")]
    UnterminatedPlaceholder { position: Position, snippet: String },

    /// The placeholder does not start with `var.<name>` or `env.<name>`
    #[error("Invalid placeholder head '{head}' at {position}, expected 'var.<name>' or 'env.<name>'.")]
    InvalidHead { position: Position, head: String },

    /// Anything other than `|` between pipeline stages
    #[error("Unexpected token '{token}' at {position}, expected '|'.")]
    UnexpectedToken { position: Position, token: String },

    #[error("Missing filter name after '|' at {position}.")]
    MissingFilterName { position: Position },

    #[error("Empty argument for filter '{filter}' at {position}.")]
    EmptyFilterArgument { position: Position, filter: String },

    #[error("Unterminated quoted argument for filter '{filter}' at {position}: '{snippet}'.")]
    UnterminatedArgument { position: Position, filter: String, snippet: String },

    #[error("Undefined variable '{name}' at {position}.")]
    UndefinedVariable { position: Position, name: String },

    #[error("Undefined environment variable '{name}' at {position}.")]
    UndefinedEnvironmentVariable { position: Position, name: String },

    #[error("Unknown filter '{filter}' at {position}.")]
    UnknownFilter { position: Position, filter: String },

    /// Wrong arity, malformed argument, malformed input or wrong value kind
    #[error("Filter '{filter}' failed at {position}: {reason}.")]
    FilterError { position: Position, filter: String, reason: String },

    /// The pipeline finished while still holding bytes
    #[error("Placeholder '{snippet}' at {position} ended with binary data, apply a text-producing filter such as 'utf8' or 'base64'.")]
    BinaryOutput { position: Position, snippet: String },

    /// Represents errors that occur during configuration parsing or processing
    #[error("Configuration error: {0}.")]
    ConfigError(String),

    #[error("Output file '{path}' already exists, use --force to overwrite.")]
    OutputExistsError { path: String },

    #[error("{failed} of {total} templates failed to expand.")]
    BatchError { failed: usize, total: usize },
}

impl Error {
    /// The template position the error points at, if it has one.
    pub fn position(&self) -> Option<Position> {
        match self {
            Error::UnterminatedPlaceholder { position, .. }
            | Error::InvalidHead { position, .. }
            | Error::UnexpectedToken { position, .. }
            | Error::MissingFilterName { position }
            | Error::EmptyFilterArgument { position, .. }
            | Error::UnterminatedArgument { position, .. }
            | Error::UndefinedVariable { position, .. }
            | Error::UndefinedEnvironmentVariable { position, .. }
            | Error::UnknownFilter { position, .. }
            | Error::FilterError { position, .. }
            | Error::BinaryOutput { position, .. } => Some(*position),
            _ => None,
        }
    }
}

/// Convenience type alias for Results with tplexpand's Error as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Default error handler that prints the error and exits the program.
///
/// # Arguments
/// * `err` - The Error to handle
///
/// # Behavior
/// Prints the error message to stderr and exits with status code 1
pub fn default_error_handler(err: Error) {
    eprintln!("{}", err);
    std::process::exit(1);
}
