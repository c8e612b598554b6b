/*! A regular expression engine for forward-only character streams.

The central operation is a streaming search: given a pattern and an iterator
of characters, find the leftmost match and stop reading right after the
match ends. Characters are pulled from the stream one at a time and never
read twice, the caller keeps the iterator and can inspect what was left.

Patterns are represented by [`Pattern`], which can be built with the
combinator functions it provides, or parsed from text with [`parse`]. There
are two execution backends that behave exactly in the same way:

* [`Nfa`], which simulates the pattern tree directly.
* [`Program`], produced by [`compile_pattern`], which is executed by a Pike
  [`Vm`] created with [`load_program`]. Programs can be serialized.

Both backends implement the [`Searcher`] trait, and [`Engine`] bundles the
parsing, compilation and search operations for a chosen [`Backend`].

# Example

```rust
use regexercise::{compile_pattern, load_program, parse, search};

let pattern = parse("a[bc]+d").unwrap();

// Search with the NFA backend.
let mut stream = "my abdomen".chars();
assert!(search(&pattern, &mut stream));
assert_eq!(stream.as_str(), "omen");

// Search with the VM backend.
let program = compile_pattern(&pattern).unwrap();
let mut stream = "my abdomen".chars();
assert!(load_program(&program, &mut stream).run());
assert_eq!(stream.as_str(), "omen");
```
*/

#![deny(missing_docs)]

pub use engine::Backend;
pub use engine::Compiled;
pub use engine::Engine;
pub use engine::Match;
pub use engine::Searcher;

pub use errors::Error;
pub use errors::SerializationError;
pub use errors::SyntaxError;

pub use nfa::search;
pub use nfa::Nfa;

pub use parser::parse;
pub use parser::Parser;

pub use pattern::CharClass;
pub use pattern::Pattern;

pub use thompson::compile_pattern;
pub use thompson::load_program;
pub use thompson::Program;
pub use thompson::Vm;

mod bitmapset;
mod engine;
mod errors;
mod nfa;
mod parser;
mod pattern;
mod thompson;

#[cfg(test)]
mod tests;
