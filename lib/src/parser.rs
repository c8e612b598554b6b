/*! Parses regular expressions into [`Pattern`] trees.

The text is first parsed into an abstract syntax tree by `regex-syntax`, and
then translated into a [`Pattern`]. The translation rejects every construct
that can't be expressed with the six [`Pattern`] variants, like anchors,
dots, named classes, counted repetitions or lazy quantifiers.
*/

use regex_syntax::ast;
use regex_syntax::ast::{Ast, ClassSet, ClassSetItem, RepetitionKind, Span};

use crate::errors::{Error, SyntaxError};
use crate::pattern::{CharClass, Pattern};

/// A regular expression parser.
pub struct Parser {
    nest_limit: u32,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    /// Creates a new parser with the default nesting limit.
    pub fn new() -> Self {
        Self { nest_limit: 250 }
    }

    /// Maximum nesting depth allowed in the regular expression. Each group,
    /// repetition, alternation or class adds one level. Patterns exceeding
    /// this limit produce a syntax error. The default value is 250.
    pub fn nest_limit(mut self, limit: u32) -> Self {
        self.nest_limit = limit;
        self
    }

    /// Parses the regular expression and returns its corresponding
    /// [`Pattern`].
    pub fn parse(&self, text: &str) -> Result<Pattern, Error> {
        let mut parser = ast::parse::ParserBuilder::new()
            .nest_limit(self.nest_limit)
            .build();

        let ast = parser.parse(text).map_err(|err| {
            SyntaxError::new(err.kind().to_string(), to_range(err.span()))
        })?;

        Ok(ast::visit(&ast, Translator::new())?)
    }
}

/// Parses a regular expression with the default settings.
///
/// ```
/// use regexercise::{parse, Pattern};
///
/// assert_eq!(
///     parse("ab|c").unwrap(),
///     Pattern::either(Pattern::string("ab"), Pattern::literal('c'))
/// );
/// ```
pub fn parse(text: &str) -> Result<Pattern, Error> {
    Parser::new().parse(text)
}

fn to_range(span: &Span) -> std::ops::Range<usize> {
    span.start.offset..span.end.offset
}

fn unsupported<M: Into<String>>(msg: M, span: &Span) -> SyntaxError {
    SyntaxError::new(msg, to_range(span))
}

/// Translates an [`Ast`] into a [`Pattern`].
///
/// Patterns for the nodes visited so far are kept in a stack. When a node
/// is finished, the patterns for its children are at the top of the stack,
/// they are popped and replaced by the pattern for the node.
struct Translator {
    stack: Vec<Pattern>,
}

impl Translator {
    fn new() -> Self {
        Self { stack: Vec::new() }
    }

    fn pop(&mut self) -> Pattern {
        self.stack.pop().unwrap_or_else(|| unreachable!())
    }

    fn pop_n(&mut self, n: usize) -> Vec<Pattern> {
        assert!(n <= self.stack.len());
        self.stack.split_off(self.stack.len() - n)
    }
}

impl ast::Visitor for Translator {
    type Output = Pattern;
    type Err = SyntaxError;

    fn finish(mut self) -> Result<Self::Output, Self::Err> {
        assert_eq!(self.stack.len(), 1);
        Ok(self.pop())
    }

    fn visit_pre(&mut self, ast: &Ast) -> Result<(), Self::Err> {
        match ast {
            Ast::Flags(flags) => {
                Err(unsupported("inline flags are not supported", &flags.span))
            }
            Ast::Dot(span) => {
                Err(unsupported("`.` is not supported", span))
            }
            Ast::Assertion(assertion) => Err(unsupported(
                "anchors and word boundaries are not supported",
                &assertion.span,
            )),
            Ast::ClassUnicode(class) => Err(unsupported(
                "unicode classes are not supported",
                &class.span,
            )),
            Ast::ClassPerl(class) => Err(unsupported(
                "perl classes are not supported",
                &class.span,
            )),
            Ast::Repetition(rep) => {
                if !rep.greedy {
                    return Err(unsupported(
                        "lazy quantifiers are not supported",
                        &rep.op.span,
                    ));
                }
                if let RepetitionKind::Range(_) = rep.op.kind {
                    return Err(unsupported(
                        "counted repetitions are not supported",
                        &rep.op.span,
                    ));
                }
                Ok(())
            }
            Ast::Group(group) => match group.kind {
                ast::GroupKind::CaptureIndex(_) => Ok(()),
                _ => Err(unsupported(
                    "only plain groups are supported",
                    &group.span,
                )),
            },
            Ast::ClassBracketed(class) if class.negated => Err(unsupported(
                "negated classes are not supported",
                &class.span,
            )),
            _ => Ok(()),
        }
    }

    fn visit_post(&mut self, ast: &Ast) -> Result<(), Self::Err> {
        let pattern = match ast {
            Ast::Empty(_) => Pattern::Empty,
            Ast::Literal(literal) => Pattern::literal(literal.c),
            Ast::ClassBracketed(class) => {
                let mut ranges = Vec::new();
                class_set_ranges(&class.kind, &mut ranges)?;
                Pattern::class(CharClass::from_ranges(ranges))
            }
            Ast::Repetition(rep) => {
                let body = self.pop();
                match rep.op.kind {
                    RepetitionKind::ZeroOrMore => Pattern::star(body),
                    RepetitionKind::OneOrMore => Pattern::plus(body),
                    RepetitionKind::ZeroOrOne => Pattern::optional(body),
                    RepetitionKind::Range(_) => unreachable!(),
                }
            }
            // The group's content is already at the top of the stack.
            Ast::Group(_) => return Ok(()),
            Ast::Alternation(alternation) => {
                let alternatives = self.pop_n(alternation.asts.len());
                Pattern::either_all(alternatives)
                    .unwrap_or_else(Pattern::empty)
            }
            Ast::Concat(concat) => {
                let items = self.pop_n(concat.asts.len());
                Pattern::chain_all(items)
            }
            Ast::Flags(_)
            | Ast::Dot(_)
            | Ast::Assertion(_)
            | Ast::ClassUnicode(_)
            | Ast::ClassPerl(_) => unreachable!(),
        };

        self.stack.push(pattern);
        Ok(())
    }
}

fn class_set_ranges(
    set: &ClassSet,
    ranges: &mut Vec<(char, char)>,
) -> Result<(), SyntaxError> {
    match set {
        ClassSet::Item(item) => class_item_ranges(item, ranges),
        ClassSet::BinaryOp(op) => Err(unsupported(
            "class set operations are not supported",
            &op.span,
        )),
    }
}

fn class_item_ranges(
    item: &ClassSetItem,
    ranges: &mut Vec<(char, char)>,
) -> Result<(), SyntaxError> {
    match item {
        ClassSetItem::Empty(_) => {}
        ClassSetItem::Literal(literal) => ranges.push((literal.c, literal.c)),
        ClassSetItem::Range(range) => {
            ranges.push((range.start.c, range.end.c))
        }
        ClassSetItem::Ascii(class) => {
            return Err(unsupported(
                "ascii classes are not supported",
                &class.span,
            ))
        }
        ClassSetItem::Unicode(class) => {
            return Err(unsupported(
                "unicode classes are not supported",
                &class.span,
            ))
        }
        ClassSetItem::Perl(class) => {
            return Err(unsupported(
                "perl classes are not supported",
                &class.span,
            ))
        }
        ClassSetItem::Bracketed(class) => {
            if class.negated {
                return Err(unsupported(
                    "negated classes are not supported",
                    &class.span,
                ));
            }
            class_set_ranges(&class.kind, ranges)?
        }
        ClassSetItem::Union(union) => {
            for item in &union.items {
                class_item_ranges(item, ranges)?;
            }
        }
    }
    Ok(())
}
