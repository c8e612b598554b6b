use std::fmt::{Display, Formatter};
use std::ops::Range;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::Error;
use crate::nfa::Nfa;
use crate::parser::Parser;
use crate::pattern::Pattern;
use crate::thompson::{compile_pattern, Program};

/// A match found in a character stream.
///
/// Offsets are measured in characters, relative to the position the stream
/// had when the search started. `end` is also the number of characters that
/// the search consumed from the stream.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct Match {
    start: usize,
    end: usize,
}

impl Match {
    pub(crate) fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }

    /// Offset of the first character in the match.
    #[inline]
    pub fn start(&self) -> usize {
        self.start
    }

    /// Offset that follows the last character in the match.
    #[inline]
    pub fn end(&self) -> usize {
        self.end
    }

    /// Range covered by the match.
    #[inline]
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Number of characters in the match.
    #[inline]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// True if the match is a zero-length one.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl Display for Match {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Types that can search for a pattern in a stream of characters.
///
/// The stream is consumed one character at a time and only as far as
/// needed: when the search finds a match the stream is left positioned
/// right after the match's last character, when there's no match the
/// stream is exhausted. Pass the stream by mutable reference (for example
/// with [`Iterator::by_ref`]) for retaining access to the remaining
/// characters.
pub trait Searcher {
    /// Searches for the leftmost match that ends earliest, returning its
    /// offsets.
    fn find<I: Iterator<Item = char>>(&self, stream: I) -> Option<Match>;

    /// Returns true if the stream contains a match.
    fn search<I: Iterator<Item = char>>(&self, stream: I) -> bool {
        self.find(stream).is_some()
    }
}

/// Execution backends supported by [`Engine`].
#[derive(
    Debug, Clone, Copy, Default, Eq, PartialEq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Simulates the pattern tree directly, see [`Nfa`].
    Nfa,
    /// Compiles the pattern to a program for the Pike VM, see [`Program`].
    #[default]
    Vm,
}

impl Backend {
    /// All the available backends.
    pub const ALL: [Backend; 2] = [Backend::Nfa, Backend::Vm];

    /// The name of the backend, as accepted by [`Backend::from_str`].
    pub fn name(&self) -> &'static str {
        match self {
            Backend::Nfa => "nfa",
            Backend::Vm => "vm",
        }
    }
}

impl Display for Backend {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nfa" => Ok(Backend::Nfa),
            "vm" => Ok(Backend::Vm),
            _ => Err(format!("unknown engine `{}`", s)),
        }
    }
}

/// A pattern prepared for searching with one of the backends.
#[derive(Debug, Clone)]
pub enum Compiled {
    /// Pattern prepared for the tree-walking NFA.
    Nfa(Nfa),
    /// Pattern compiled to a program for the Pike VM.
    Vm(Program),
}

impl Searcher for Compiled {
    fn find<I: Iterator<Item = char>>(&self, stream: I) -> Option<Match> {
        match self {
            Compiled::Nfa(nfa) => nfa.find(stream),
            Compiled::Vm(program) => program.find(stream),
        }
    }
}

/// Groups the parse, compile and search operations for a given backend.
///
/// ```
/// use regexercise::{Backend, Engine};
///
/// let engine = Engine::new(Backend::Nfa);
/// let pattern = engine.parse("rat|cat").unwrap();
/// let mut stream = "a cat is fat".chars();
///
/// assert!(engine.search(&pattern, &mut stream).unwrap());
/// assert_eq!(stream.as_str(), " is fat");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Engine {
    backend: Backend,
}

impl Engine {
    /// Creates an engine that uses the given backend.
    pub fn new(backend: Backend) -> Self {
        Self { backend }
    }

    /// The backend used by this engine.
    #[inline]
    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// Parses a regular expression.
    pub fn parse(&self, text: &str) -> Result<Pattern, Error> {
        Parser::new().parse(text)
    }

    /// Prepares a pattern for searching with the engine's backend.
    pub fn compile(&self, pattern: &Pattern) -> Result<Compiled, Error> {
        Ok(match self.backend {
            Backend::Nfa => Compiled::Nfa(Nfa::new(pattern)),
            Backend::Vm => Compiled::Vm(compile_pattern(pattern)?),
        })
    }

    /// Searches for `pattern` in `stream`, returning the match if found.
    pub fn find<I: Iterator<Item = char>>(
        &self,
        pattern: &Pattern,
        stream: I,
    ) -> Result<Option<Match>, Error> {
        Ok(self.compile(pattern)?.find(stream))
    }

    /// Returns true if `stream` contains a match for `pattern`.
    pub fn search<I: Iterator<Item = char>>(
        &self,
        pattern: &Pattern,
        stream: I,
    ) -> Result<bool, Error> {
        Ok(self.find(pattern, stream)?.is_some())
    }
}
