/*! Abstract representation of regular expressions.

A [`Pattern`] is an immutable tree built either with the combinator functions
provided here, or by parsing a regular expression with [`crate::parse`]. Both
execution backends ([`crate::Nfa`] and [`crate::Program`]) consume the same
tree.
*/

use std::convert::Infallible;
use std::fmt::{Display, Formatter, Write};
use std::mem;

/// A set of characters, represented as a sorted list of non-overlapping,
/// non-adjacent inclusive ranges.
///
/// A class with a single character is how plain literals are represented.
/// The empty class doesn't match any character, a [`Pattern::Literal`] with
/// an empty class never matches.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct CharClass {
    ranges: Vec<(char, char)>,
}

impl CharClass {
    /// Creates a class that doesn't contain any character.
    pub fn empty() -> Self {
        Self { ranges: Vec::new() }
    }

    /// Creates a class that contains a single character.
    pub fn single(c: char) -> Self {
        Self { ranges: vec![(c, c)] }
    }

    /// Creates a class from a list of inclusive ranges. Ranges can be given
    /// in any order and can overlap, they are normalized. Ranges where the
    /// start is greater than the end are ignored.
    pub fn from_ranges<I>(ranges: I) -> Self
    where
        I: IntoIterator<Item = (char, char)>,
    {
        let mut ranges: Vec<(char, char)> =
            ranges.into_iter().filter(|(start, end)| start <= end).collect();

        ranges.sort_unstable();

        let mut normalized: Vec<(char, char)> =
            Vec::with_capacity(ranges.len());

        for (start, end) in ranges {
            match normalized.last_mut() {
                Some(last) if start as u32 <= last.1 as u32 + 1 => {
                    if end > last.1 {
                        last.1 = end;
                    }
                }
                _ => normalized.push((start, end)),
            }
        }

        Self { ranges: normalized }
    }

    /// Creates a class that contains every character in `chars`.
    pub fn from_chars<I>(chars: I) -> Self
    where
        I: IntoIterator<Item = char>,
    {
        Self::from_ranges(chars.into_iter().map(|c| (c, c)))
    }

    /// Returns true if the class contains the given character.
    #[inline]
    pub fn contains(&self, c: char) -> bool {
        self.ranges
            .binary_search_by(|(start, end)| {
                if *end < c {
                    std::cmp::Ordering::Less
                } else if *start > c {
                    std::cmp::Ordering::Greater
                } else {
                    std::cmp::Ordering::Equal
                }
            })
            .is_ok()
    }

    /// Ranges in the class, sorted in ascending order.
    #[inline]
    pub fn ranges(&self) -> &[(char, char)] {
        self.ranges.as_slice()
    }

    /// Returns true if the class doesn't contain any character.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// If the class contains exactly one character, returns it.
    pub fn as_char(&self) -> Option<char> {
        match self.ranges.as_slice() {
            [(start, end)] if start == end => Some(*start),
            _ => None,
        }
    }
}

impl From<char> for CharClass {
    fn from(c: char) -> Self {
        Self::single(c)
    }
}

/// A regular expression.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum Pattern {
    /// Matches the empty string.
    Empty,
    /// Matches a single character that belongs to the class.
    Literal(CharClass),
    /// Matches the first pattern followed by the second one.
    Chain(Box<Pattern>, Box<Pattern>),
    /// Matches either the first pattern or the second one. The first one
    /// has priority.
    Either(Box<Pattern>, Box<Pattern>),
    /// Zero or more repetitions.
    Star(Box<Pattern>),
    /// One or more repetitions.
    Plus(Box<Pattern>),
}

impl Pattern {
    /// A pattern that matches only the empty string.
    pub fn empty() -> Self {
        Self::Empty
    }

    /// A pattern that matches the character `c`.
    pub fn literal(c: char) -> Self {
        Self::Literal(CharClass::single(c))
    }

    /// A pattern that matches any character in `class`.
    pub fn class(class: CharClass) -> Self {
        Self::Literal(class)
    }

    /// A pattern that doesn't match anything, not even the empty string.
    pub fn never() -> Self {
        Self::Literal(CharClass::empty())
    }

    /// `first` followed by `second`.
    pub fn chain(first: Pattern, second: Pattern) -> Self {
        Self::Chain(Box::new(first), Box::new(second))
    }

    /// `first` or `second`, preferring `first`.
    pub fn either(first: Pattern, second: Pattern) -> Self {
        Self::Either(Box::new(first), Box::new(second))
    }

    /// Zero or more repetitions of `pattern`, as many as possible.
    pub fn star(pattern: Pattern) -> Self {
        Self::Star(Box::new(pattern))
    }

    /// One or more repetitions of `pattern`, as many as possible.
    pub fn plus(pattern: Pattern) -> Self {
        Self::Plus(Box::new(pattern))
    }

    /// Zero or one occurrences of `pattern`, preferring one.
    pub fn optional(pattern: Pattern) -> Self {
        Self::either(pattern, Self::Empty)
    }

    /// Matches the given string literally. The empty string produces
    /// [`Pattern::Empty`].
    pub fn string(s: &str) -> Self {
        Self::chain_all(s.chars().map(Self::literal))
    }

    /// Matches any of the given strings, in order of preference. If no
    /// strings are given the result never matches.
    pub fn one_of<'a, I>(strings: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let alternatives: Vec<Pattern> =
            strings.into_iter().map(Self::string).collect();

        Self::either_all(alternatives).unwrap_or_else(Self::never)
    }

    /// Chains all the patterns together, left to right. Returns
    /// [`Pattern::Empty`] if the iterator is empty.
    pub fn chain_all<I>(patterns: I) -> Self
    where
        I: IntoIterator<Item = Pattern>,
        I::IntoIter: DoubleEndedIterator,
    {
        patterns
            .into_iter()
            .rev()
            .reduce(|tail, head| Self::chain(head, tail))
            .unwrap_or(Self::Empty)
    }

    /// Alternation of all the patterns, the first one having the highest
    /// priority. Returns [`None`] if the iterator is empty.
    pub fn either_all<I>(patterns: I) -> Option<Self>
    where
        I: IntoIterator<Item = Pattern>,
        I::IntoIter: DoubleEndedIterator,
    {
        patterns
            .into_iter()
            .rev()
            .reduce(|tail, head| Self::either(head, tail))
    }

    /// Returns true if the pattern matches the empty string.
    pub fn is_nullable(&self) -> bool {
        match visit(self, Nullable::default()) {
            Ok(nullable) => nullable,
            Err(never) => match never {},
        }
    }

    // Operator precedence used by the `Display` implementation.
    const PREC_EITHER: u8 = 0;
    const PREC_CHAIN: u8 = 1;
    const PREC_REPEAT: u8 = 2;
    const PREC_ATOM: u8 = 3;

    /// Returns true if the pattern has no nested patterns.
    fn is_leaf(&self) -> bool {
        matches!(self, Pattern::Empty | Pattern::Literal(_))
    }
}

/// Patterns are dropped using a heap-allocated stack, the default drop
/// glue would recurse once per level of nesting.
impl Drop for Pattern {
    fn drop(&mut self) {
        match self {
            Pattern::Empty | Pattern::Literal(_) => return,
            Pattern::Chain(first, second) | Pattern::Either(first, second)
                if first.is_leaf() && second.is_leaf() =>
            {
                return
            }
            Pattern::Star(body) | Pattern::Plus(body) if body.is_leaf() => {
                return
            }
            _ => {}
        }

        let mut stack = vec![mem::replace(self, Pattern::Empty)];

        while let Some(mut pattern) = stack.pop() {
            match &mut pattern {
                Pattern::Empty | Pattern::Literal(_) => {}
                Pattern::Chain(first, second)
                | Pattern::Either(first, second) => {
                    stack.push(mem::replace(&mut **first, Pattern::Empty));
                    stack.push(mem::replace(&mut **second, Pattern::Empty));
                }
                Pattern::Star(body) | Pattern::Plus(body) => {
                    stack.push(mem::replace(&mut **body, Pattern::Empty));
                }
            }
            // `pattern` is dropped here, its children are all empty.
        }
    }
}

/// Pieces of output pending to be written by the `Display` implementation.
enum Token<'a> {
    /// A pattern written with the given precedence.
    Pattern(&'a Pattern, u8),
    /// The operand of `*` or `+`.
    Repeated(&'a Pattern),
    Text(&'static str),
}

/// Writes the pattern in the syntax accepted by [`crate::parse`].
///
/// Parsing the resulting text produces a pattern that matches exactly the
/// same strings. Classes without characters, which the parser doesn't
/// accept, are written as `[]`.
impl Display for Pattern {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut stack = vec![Token::Pattern(self, Self::PREC_EITHER)];

        while let Some(token) = stack.pop() {
            match token {
                Token::Text(text) => f.write_str(text)?,
                // Anything but a literal goes inside parenthesis, so that
                // `(a*)*` is not written as `a**`.
                Token::Repeated(pattern) => match pattern {
                    Pattern::Literal(_) => stack
                        .push(Token::Pattern(pattern, Self::PREC_ATOM)),
                    Pattern::Empty => f.write_str("()")?,
                    _ => {
                        f.write_char('(')?;
                        stack.push(Token::Text(")"));
                        stack.push(Token::Pattern(
                            pattern,
                            Self::PREC_EITHER,
                        ));
                    }
                },
                Token::Pattern(pattern, prec) => {
                    let inner = match pattern {
                        Pattern::Empty => {
                            if prec > Self::PREC_EITHER {
                                f.write_str("()")?;
                            }
                            continue;
                        }
                        Pattern::Literal(class) => {
                            match class.as_char() {
                                Some(c) => write_char(f, c)?,
                                None => write_class(f, class)?,
                            }
                            continue;
                        }
                        Pattern::Chain(..) => Self::PREC_CHAIN,
                        Pattern::Either(..) => Self::PREC_EITHER,
                        Pattern::Star(_) | Pattern::Plus(_) => {
                            Self::PREC_REPEAT
                        }
                    };

                    if prec > inner {
                        f.write_char('(')?;
                        stack.push(Token::Text(")"));
                    }

                    // Tokens are pushed in reverse order.
                    match pattern {
                        Pattern::Chain(first, second) => {
                            stack.push(Token::Pattern(second, inner));
                            stack.push(Token::Pattern(first, inner));
                        }
                        Pattern::Either(first, second) => {
                            stack.push(Token::Pattern(second, inner));
                            stack.push(Token::Text("|"));
                            stack.push(Token::Pattern(first, inner));
                        }
                        Pattern::Star(body) => {
                            stack.push(Token::Text("*"));
                            stack.push(Token::Repeated(body));
                        }
                        Pattern::Plus(body) => {
                            stack.push(Token::Text("+"));
                            stack.push(Token::Repeated(body));
                        }
                        Pattern::Empty | Pattern::Literal(_) => {}
                    }
                }
            }
        }

        Ok(())
    }
}

/// Computes [`Pattern::is_nullable`]. The stack holds the result for the
/// patterns whose parent hasn't been visited yet.
#[derive(Default)]
struct Nullable {
    stack: Vec<bool>,
}

impl Nullable {
    fn pop(&mut self) -> bool {
        self.stack.pop().unwrap_or_else(|| unreachable!())
    }
}

impl Visitor for Nullable {
    type Output = bool;
    type Err = Infallible;

    fn finish(mut self) -> Result<Self::Output, Self::Err> {
        Ok(self.pop())
    }

    fn visit_post(&mut self, pattern: &Pattern) -> Result<(), Self::Err> {
        let nullable = match pattern {
            Pattern::Empty => true,
            Pattern::Literal(_) => false,
            Pattern::Chain(..) => {
                let second = self.pop();
                self.pop() && second
            }
            Pattern::Either(..) => {
                let second = self.pop();
                self.pop() || second
            }
            Pattern::Star(_) => {
                self.pop();
                true
            }
            Pattern::Plus(_) => self.pop(),
        };
        self.stack.push(nullable);
        Ok(())
    }
}

/// A trait for visiting a [`Pattern`] in depth-first order.
///
/// The traversal is performed by [`visit`] using a heap-allocated stack
/// instead of recursion, so deeply nested patterns like the ones produced
/// by [`Pattern::string`] with long strings don't exhaust the call stack.
pub(crate) trait Visitor {
    /// The result of the visit.
    type Output;
    /// An error that can stop the visit.
    type Err;

    /// Called once the whole pattern has been visited.
    fn finish(self) -> Result<Self::Output, Self::Err>;

    /// Called before visiting the children of a node.
    fn visit_pre(&mut self, _pattern: &Pattern) -> Result<(), Self::Err> {
        Ok(())
    }

    /// Called after visiting the children of a node.
    fn visit_post(&mut self, _pattern: &Pattern) -> Result<(), Self::Err> {
        Ok(())
    }

    /// Called between the two operands of [`Pattern::Either`].
    fn visit_either_in(&mut self) -> Result<(), Self::Err> {
        Ok(())
    }
}

/// Visits every node in `pattern`, calling the corresponding methods of
/// `visitor`.
pub(crate) fn visit<V: Visitor>(
    pattern: &Pattern,
    mut visitor: V,
) -> Result<V::Output, V::Err> {
    enum Frame<'a> {
        Pre(&'a Pattern),
        EitherIn,
        Post(&'a Pattern),
    }

    let mut stack = vec![Frame::Pre(pattern)];

    while let Some(frame) = stack.pop() {
        match frame {
            Frame::Pre(pattern) => {
                visitor.visit_pre(pattern)?;
                stack.push(Frame::Post(pattern));
                match pattern {
                    Pattern::Empty | Pattern::Literal(_) => {}
                    Pattern::Chain(first, second) => {
                        stack.push(Frame::Pre(second));
                        stack.push(Frame::Pre(first));
                    }
                    Pattern::Either(first, second) => {
                        stack.push(Frame::Pre(second));
                        stack.push(Frame::EitherIn);
                        stack.push(Frame::Pre(first));
                    }
                    Pattern::Star(body) | Pattern::Plus(body) => {
                        stack.push(Frame::Pre(body));
                    }
                }
            }
            Frame::EitherIn => visitor.visit_either_in()?,
            Frame::Post(pattern) => visitor.visit_post(pattern)?,
        }
    }

    visitor.finish()
}

fn write_char(f: &mut Formatter<'_>, c: char) -> std::fmt::Result {
    if regex_syntax::is_meta_character(c) {
        f.write_char('\\')?;
    }
    f.write_char(c)
}

fn write_class(f: &mut Formatter<'_>, class: &CharClass) -> std::fmt::Result {
    f.write_char('[')?;
    for (start, end) in class.ranges() {
        write_char(f, *start)?;
        if start != end {
            f.write_char('-')?;
            write_char(f, *end)?;
        }
    }
    f.write_char(']')
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{CharClass, Pattern};

    #[test]
    fn class_normalization() {
        let class = CharClass::from_ranges([
            ('x', 'z'),
            ('a', 'c'),
            ('b', 'd'),
            ('e', 'e'),
            ('z', 'a'),
        ]);

        assert_eq!(class.ranges(), &[('a', 'e'), ('x', 'z')]);
        assert!(class.contains('a'));
        assert!(class.contains('e'));
        assert!(class.contains('y'));
        assert!(!class.contains('f'));
        assert!(!class.contains('w'));
        assert_eq!(class.as_char(), None);

        assert_eq!(
            CharClass::from_chars("bcb".chars()).ranges(),
            &[('b', 'c')]
        );
        assert_eq!(CharClass::from_chars(['q']).as_char(), Some('q'));
        assert!(CharClass::empty().is_empty());
        assert!(!CharClass::empty().contains('a'));
    }

    #[test]
    fn combinators() {
        assert_eq!(Pattern::string(""), Pattern::Empty);
        assert_eq!(
            Pattern::string("ab"),
            Pattern::chain(Pattern::literal('a'), Pattern::literal('b'))
        );
        assert_eq!(Pattern::one_of([]), Pattern::never());
        assert_eq!(
            Pattern::one_of(["a", "", "bc"]),
            Pattern::either(
                Pattern::literal('a'),
                Pattern::either(Pattern::Empty, Pattern::string("bc"))
            )
        );
    }

    #[test]
    fn nullable() {
        assert!(Pattern::Empty.is_nullable());
        assert!(Pattern::star(Pattern::literal('a')).is_nullable());
        assert!(!Pattern::plus(Pattern::literal('a')).is_nullable());
        assert!(
            Pattern::plus(Pattern::star(Pattern::literal('a'))).is_nullable()
        );
        assert!(Pattern::one_of(["a", ""]).is_nullable());
        assert!(!Pattern::never().is_nullable());
    }

    #[test]
    fn deep_nesting() {
        let long = "x".repeat(100_000);
        let pattern = Pattern::string(&long);
        assert!(!pattern.is_nullable());
        assert_eq!(pattern.to_string(), long);
        drop(pattern);

        let pattern = (0..100_000)
            .fold(Pattern::literal('a'), |body, _| Pattern::star(body));
        assert!(pattern.is_nullable());
        assert_eq!(
            pattern.to_string(),
            format!("{}a*{}", "(".repeat(99_999), ")*".repeat(99_999))
        );
        drop(pattern);

        let pattern = (0..100_000).fold(Pattern::never(), |tail, _| {
            Pattern::either(Pattern::never(), Pattern::plus(tail))
        });
        assert!(!pattern.is_nullable());
    }

    #[test]
    fn display() {
        let p = Pattern::chain(
            Pattern::literal('a'),
            Pattern::chain(
                Pattern::star(Pattern::star(Pattern::literal('b'))),
                Pattern::literal('d'),
            ),
        );
        assert_eq!(p.to_string(), "a(b*)*d");

        let p = Pattern::plus(Pattern::either(
            Pattern::string("cat"),
            Pattern::string("dog"),
        ));
        assert_eq!(p.to_string(), "(cat|dog)+");

        let p = Pattern::chain(
            Pattern::class(CharClass::from_chars(['b', 'c'])),
            Pattern::literal('*'),
        );
        assert_eq!(p.to_string(), r"[b-c]\*");

        assert_eq!(Pattern::optional(Pattern::literal('x')).to_string(), "x|");
        assert_eq!(
            Pattern::chain(Pattern::Empty, Pattern::star(Pattern::Empty))
                .to_string(),
            "()()*"
        );
    }
}
