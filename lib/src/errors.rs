use std::fmt::{Display, Formatter};
use std::io;
use std::ops::Range;

use thiserror::Error;

/// Errors returned while parsing or compiling a pattern.
#[derive(Error, Debug, Eq, PartialEq)]
pub enum Error {
    /// The pattern text is not a valid regular expression.
    #[error(transparent)]
    SyntaxError(#[from] SyntaxError),

    /// The compiled program exceeds the limits of the VM, either because it
    /// has too many split instructions or because some jump can't be
    /// represented.
    #[error("pattern too large")]
    TooLarge,
}

/// A pattern could not be parsed.
///
/// The span contains the byte offsets within the pattern text where the
/// problem was found.
#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub struct SyntaxError {
    msg: String,
    span: Range<usize>,
}

impl SyntaxError {
    pub(crate) fn new<M: Into<String>>(msg: M, span: Range<usize>) -> Self {
        Self { msg: msg.into(), span }
    }

    /// Description of the problem, without position information.
    pub fn msg(&self) -> &str {
        self.msg.as_str()
    }

    /// Byte range within the pattern text where the error was found.
    pub fn span(&self) -> Range<usize> {
        self.span.clone()
    }
}

impl Display for SyntaxError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at offset {}", self.msg, self.span.start)
    }
}

/// Errors returned while serializing/deserializing compiled programs.
#[derive(Error, Debug)]
pub enum SerializationError {
    /// The data doesn't start with the expected magic header.
    #[error("not a compiled regexercise program")]
    InvalidFormat,

    /// The header is correct, but the code is not a valid program.
    #[error("malformed program code")]
    InvalidProgram,

    /// The data could not be decoded.
    #[error("invalid compiled program encoding")]
    InvalidEncoding(#[from] bincode::Error),

    /// I/O error while reading or writing the program.
    #[error(transparent)]
    IoError(#[from] io::Error),
}
