/*! End-to-end tests. */
use std::collections::BTreeSet;

use itertools::Itertools;
use pretty_assertions::assert_eq;

use crate::{
    compile_pattern, load_program, parse, search, Backend, CharClass,
    Engine, Match, Pattern, Searcher,
};

/// Searches `pattern` in `input` with every backend, and checks that the
/// search succeeds leaving exactly `leftover` in the stream.
macro_rules! search_ok {
    ($pattern:expr, $input:expr, $leftover:expr) => {{
        for backend in Backend::ALL {
            let engine = Engine::new(backend);
            let pattern = ToPattern::to_pattern(&$pattern);
            let mut stream = $input.chars();

            assert!(
                engine.search(&pattern, &mut stream).unwrap(),
                "\n\n`{}` should match {:?} with the {} backend",
                pattern,
                $input,
                backend
            );

            assert_eq!(
                stream.as_str(),
                $leftover,
                "\n\nwrong leftover for `{}` in {:?} with the {} backend",
                pattern,
                $input,
                backend
            );
        }
    }};
}

/// Searches `pattern` in `input` with every backend, and checks that the
/// search fails and consumes the whole input.
macro_rules! search_fails {
    ($pattern:expr, $input:expr) => {{
        for backend in Backend::ALL {
            let engine = Engine::new(backend);
            let pattern = ToPattern::to_pattern(&$pattern);
            let mut stream = $input.chars();

            assert!(
                !engine.search(&pattern, &mut stream).unwrap(),
                "\n\n`{}` should not match {:?} with the {} backend",
                pattern,
                $input,
                backend
            );

            assert_eq!(stream.as_str(), "", "stream not drained");
        }
    }};
}

/// Patterns can be given as text or as already built [`Pattern`]s.
trait ToPattern {
    fn to_pattern(&self) -> Pattern;
}

impl ToPattern for &str {
    fn to_pattern(&self) -> Pattern {
        parse(self).unwrap()
    }
}

impl ToPattern for Pattern {
    fn to_pattern(&self) -> Pattern {
        self.clone()
    }
}

/// `pattern` repeated `n` times, as text.
fn repeat(pattern: &str, n: usize) -> String {
    pattern.repeat(n)
}

#[test]
fn literal_sets() {
    search_fails!(Pattern::one_of([]), "");
    search_fails!(Pattern::one_of([]), "wheee");
    search_ok!(Pattern::one_of([""]), "wheee", "wheee");
    search_ok!(Pattern::one_of(["hallo", "a"]), "hallo", "llo");
    search_ok!(Pattern::one_of(["rat", "cat"]), "a cat is fat", " is fat");
    search_fails!(Pattern::one_of(["rat", "cat"]), "a dog is fat");
}

#[test]
fn base() {
    search_fails!("X", "wheee");
    search_ok!("X", "X", "");
    search_ok!("X", "wheXXXee", "XXee");
    search_ok!("X", "yX", "");
    search_ok!("X|X", "yX", "");
    search_ok!("X|YY", "YX", "");
    search_ok!("hallo|a", "hallo", "llo");
    search_ok!("ab", "aab", "");
    search_ok!("rat|cat", "a cat is fat", " is fat");
    search_fails!("XXX", "XX");
    search_ok!("XXXY", "r u XXXish or XXXY?", "?");
    search_ok!("bababy", "aababababyish", "ish");
    search_ok!("bababy", "aabababababyish", "ish");
    search_fails!("bababy", "aabababababish");
}

/// Expands a loop-free pattern made of single characters into the set
/// of strings it matches, in order of preference.
fn expand(pattern: &Pattern) -> Vec<String> {
    match pattern {
        Pattern::Empty => vec![String::new()],
        Pattern::Literal(class) => {
            class.as_char().map(String::from).into_iter().collect()
        }
        Pattern::Chain(first, second) => expand(first)
            .iter()
            .cartesian_product(expand(second).iter())
            .map(|(a, b)| format!("{}{}", a, b))
            .collect(),
        Pattern::Either(first, second) => {
            let mut strings = expand(first);
            strings.extend(expand(second));
            strings
        }
        Pattern::Star(_) | Pattern::Plus(_) => unreachable!(),
    }
}

/// Builds the same pattern as [`Pattern::one_of`] over its expansion.
fn literal_set(text: &str) -> Pattern {
    let strings = expand(&parse(text).unwrap());
    Pattern::one_of(strings.iter().map(String::as_str))
}

#[test]
fn literal_sets_base() {
    let check_ok = |text: &str, input: &str, leftover: &str| {
        search_ok!(literal_set(text), input, leftover);
    };
    let check_fails = |text: &str, input: &str| {
        search_fails!(literal_set(text), input);
    };

    check_fails("X", "wheee");
    check_ok("X", "X", "");
    check_ok("X", "wheXXXee", "XXee");
    check_ok("X", "yX", "");
    check_ok("X|X", "yX", "");
    check_ok("X|YY", "YX", "");
    check_ok("hallo|a", "hallo", "llo");
    check_ok("ab", "aab", "");
    check_ok("rat|cat", "a cat is fat", " is fat");
    check_fails("XXX", "XX");
    check_ok("XXXY", "r u XXXish or XXXY?", "?");
    check_ok("bababy", "aababababyish", "ish");
    check_ok("bababy", "aabababababyish", "ish");
    check_fails("bababy", "aabababababish");
}

#[test]
fn finite() {
    let bits = repeat("(0|1)", 20);

    search_ok!(
        bits.as_str(),
        "hello 01100011000110001100 how are you?",
        " how are you?"
    );
    search_fails!(bits.as_str(), "hello 0110001100011000110 how are you?");

    search_ok!(repeat("(aa|a)", 2).as_str(), "aaa b", "a b");

    let forty = repeat("(aa|a)", 40);

    let long = format!("a {} b", "a".repeat(45));
    let short = format!("a {} b", "a".repeat(39));

    search_ok!(forty.as_str(), long.as_str(), "aaaaa b");
    search_fails!(forty.as_str(), short.as_str());
}

#[test]
fn plus() {
    search_ok!("A+", "A", "");
    search_ok!("A+", "Rating AAA+, would do again.", "AA+, would do again.");
    search_ok!("a[bc]+d", "my abdomen", "omen");
    search_ok!("a[bc]+d", "abcbdcb", "cb");
    search_fails!("a[bc]+d", "my addomen");
    search_ok!(
        "(cat|dog)+like",
        "dogcatcatdogcatdogdogcatdogcatcatdogcatdogdogcatlikely",
        "ly"
    );
}

#[test]
fn star() {
    search_ok!("a*", "", "");
    search_fails!("ba*", "");
    search_ok!("ba*", "abc", "c");
    search_ok!("ab*c", "an abba abcd", "d");
    search_fails!("ab*c", "an abba abd");
    search_ok!("yo(ab|c*a)*ba", "a yoaabcaccaabbaba", "ba");
    search_ok!("()*", "", "");
    search_ok!("(()())*", "", "");
    search_ok!("a(b*)*d", "an ad attacks", " attacks");
    search_ok!("a(b*)*d", "an abdomen", "omen");
}

#[test]
fn optional() {
    search_ok!("colou?r", "the color red", " red");
    search_ok!("colou?r", "the colour red", " red");
    search_fails!("colou?r", "the colouur red");
}

#[test]
fn compiled() {
    let cases = [
        ("A+", "Rating AAA+, would do again.", Some("AA+, would do again.")),
        ("a[bc]+d", "abcbdcb", Some("cb")),
        ("(cat|dog)+like", "catdoglikes", Some("s")),
        ("a(b*)*d", "an abdomen", Some("omen")),
        ("ab*c", "an abba abd", None),
        ("hallo|a", "hallo", Some("llo")),
    ];

    for (pattern, input, leftover) in cases {
        let program = compile_pattern(&parse(pattern).unwrap()).unwrap();
        let mut stream = input.chars();
        let found = load_program(&program, &mut stream).run();

        assert_eq!(found, leftover.is_some(), "{}", pattern);
        assert_eq!(stream.as_str(), leftover.unwrap_or(""), "{}", pattern);

        // Programs survive serialization.
        let program =
            crate::Program::deserialize(program.serialize().unwrap())
                .unwrap();
        let mut stream = input.chars();

        assert_eq!(load_program(&program, &mut stream).run(), found);
        assert_eq!(stream.as_str(), leftover.unwrap_or(""));
    }
}

#[test]
fn match_offsets() {
    let cases = [
        ("X", "wheXXXee", Some(Match::new(3, 4))),
        ("", "abc", Some(Match::new(0, 0))),
        ("hallo|a", "hallo", Some(Match::new(1, 2))),
        ("(aa|a)(aa|a)", "aaa b", Some(Match::new(0, 2))),
        ("yo(ab|c*a)*ba", "a yoaabcaccaabbaba", Some(Match::new(2, 16))),
        ("b+", "aaa", None),
    ];

    for backend in Backend::ALL {
        let engine = Engine::new(backend);
        for (pattern, input, expected) in cases {
            let pattern = engine.parse(pattern).unwrap();
            assert_eq!(
                engine.find(&pattern, input.chars()).unwrap(),
                expected,
                "`{}` in {:?} with {}",
                pattern,
                input,
                backend
            );
        }
    }
}

/// Computes the offsets where a match for `pattern` starting at `start`
/// can end, by brute force.
fn match_ends(
    pattern: &Pattern,
    input: &[char],
    start: usize,
) -> BTreeSet<usize> {
    let repeat_from = |body: &Pattern, mut reached: BTreeSet<usize>| {
        let mut pending: Vec<usize> = reached.iter().copied().collect();
        while let Some(pos) = pending.pop() {
            for end in match_ends(body, input, pos) {
                if reached.insert(end) {
                    pending.push(end);
                }
            }
        }
        reached
    };

    match pattern {
        Pattern::Empty => BTreeSet::from([start]),
        Pattern::Literal(class) => match input.get(start) {
            Some(c) if class.contains(*c) => BTreeSet::from([start + 1]),
            _ => BTreeSet::new(),
        },
        Pattern::Chain(first, second) => match_ends(first, input, start)
            .into_iter()
            .flat_map(|pos| match_ends(second, input, pos))
            .collect(),
        Pattern::Either(first, second) => {
            let mut ends = match_ends(first, input, start);
            ends.extend(match_ends(second, input, start));
            ends
        }
        Pattern::Star(body) => repeat_from(body, BTreeSet::from([start])),
        Pattern::Plus(body) => {
            repeat_from(body, match_ends(body, input, start))
        }
    }
}

/// The match that ends first and, among those, starts first.
fn reference_find(pattern: &Pattern, input: &[char]) -> Option<Match> {
    (0..=input.len()).find_map(|end| {
        (0..=end)
            .find(|start| match_ends(pattern, input, *start).contains(&end))
            .map(|start| Match::new(start, end))
    })
}

#[test]
fn backends_are_equivalent() {
    let patterns = [
        "a",
        "ab|b",
        "b|ab",
        "a*b",
        "(a|b)*c",
        "(ab|a)(bc|c)",
        "a+b+",
        "(a*)*b",
        "(a|)+c",
        "((a|b)(b|c))+",
        "a(b*)*c",
        "[ab]c*[bc]",
        "(aa|a)(aa|a)(aa|a)",
        "c(a|b)?c",
        "()",
    ];

    let inputs = std::iter::once(Vec::new()).chain((1..=5).flat_map(|len| {
        itertools::repeat_n("abc".chars(), len).multi_cartesian_product()
    }));

    let inputs: Vec<Vec<char>> = inputs.collect();

    for pattern in patterns.map(|p| parse(p).unwrap()) {
        let nfa = Engine::new(Backend::Nfa).compile(&pattern).unwrap();
        let vm = Engine::new(Backend::Vm).compile(&pattern).unwrap();

        for input in inputs.iter() {
            let mut nfa_stream = input.iter().copied();
            let mut vm_stream = input.iter().copied();

            let nfa_match = nfa.find(&mut nfa_stream);
            let vm_match = vm.find(&mut vm_stream);

            let text: String = input.iter().collect();

            assert_eq!(nfa_match, vm_match, "`{}` in {:?}", pattern, text);
            assert_eq!(
                nfa_stream.collect::<String>(),
                vm_stream.collect::<String>(),
                "`{}` in {:?}",
                pattern,
                text
            );
            assert_eq!(
                nfa_match,
                reference_find(&pattern, input),
                "`{}` in {:?}",
                pattern,
                text
            );
        }
    }
}

#[test]
fn empty_pattern_consumes_nothing() {
    for input in ["", "a", "whatever"] {
        search_ok!(Pattern::Empty, input, input);
    }
}

#[test]
fn single_literal() {
    let pattern = Pattern::class(CharClass::single('q'));

    search_ok!(pattern, "q", "");
    search_ok!(pattern, "aqbqc", "bqc");
    search_fails!(pattern, "abc");
}

#[test]
fn either_prefers_first() {
    // Both alternatives match at the same offsets.
    let a = Pattern::string("ab");
    let b = Pattern::chain(
        Pattern::literal('a'),
        Pattern::class(CharClass::from_chars(['b', 'c'])),
    );

    for backend in Backend::ALL {
        let engine = Engine::new(backend);
        let either = Pattern::either(a.clone(), b.clone());

        assert_eq!(
            engine.find(&either, "xxabyy".chars()).unwrap(),
            engine.find(&a, "xxabyy".chars()).unwrap(),
        );
    }
}

#[test]
fn compilation_is_idempotent() {
    for text in ["(cat|dog)+like", "a(b*)*d", "[a-z]+@[a-z]+"] {
        let pattern = parse(text).unwrap();
        assert_eq!(
            compile_pattern(&pattern).unwrap(),
            compile_pattern(&pattern).unwrap()
        );
    }
}

#[test]
fn display_roundtrip() {
    let inputs =
        ["", "abd", "abbbd", "yoababa", "catdoglike", "a[b*d", "color"];

    for text in [
        "a(b*)*d",
        "yo(ab|c*a)*ba",
        "(cat|dog)+like",
        r"a[bc]+\*d",
        "colou?r",
        "(()())*",
        "x|",
    ] {
        let pattern = parse(text).unwrap();
        let reparsed = parse(&pattern.to_string()).unwrap();

        for input in inputs {
            assert_eq!(
                search(&pattern, &mut input.chars()),
                search(&reparsed, &mut input.chars()),
                "`{}` on {:?}",
                text,
                input
            );
        }
    }
}

#[test]
fn streams_are_borrowed() {
    let pattern = parse("X").unwrap();
    let mut stream = "aXbXc".chars();

    assert!(search(&pattern, &mut stream));
    assert!(search(&pattern, &mut stream));
    assert_eq!(stream.as_str(), "c");
    assert!(!search(&pattern, &mut stream));
    assert_eq!(stream.next(), None);
}

#[test]
fn many_alternations_are_polynomial() {
    let pattern = parse(&repeat("(aa|a)", 40)).unwrap();
    let input = format!("{} b", "a".repeat(10_000));

    for backend in Backend::ALL {
        let engine = Engine::new(backend);
        let mut stream = input.chars();
        assert!(engine.search(&pattern, &mut stream).unwrap());
        assert_eq!(stream.as_str().len(), input.len() - 40);
    }
}
