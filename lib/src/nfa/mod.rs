/*! Searches for patterns by simulating the pattern tree as an automaton.

Each leaf in the pattern tree (a [`Pattern::Literal`]) is a state of the
automaton, and the position after the root is the accepting state. Moving
from one leaf to the next one doesn't require an explicit transition table,
it's done by walking the tree: after a leaf consumes a character the search
"exits" the leaf, and exiting a node means either exiting its parent, or
entering a sibling, depending on the parent's kind. This walk is the
epsilon-closure of the automaton.

All the possible start offsets are tried at once. At every step a thread
that starts at the root is added with the lowest priority, so a single pass
over the stream is enough, and no character is read twice.
*/

use std::mem;

use bitvec::vec::BitVec;

#[cfg(feature = "logging")]
use log::*;

use crate::bitmapset::BitmapSet;
use crate::engine::{Match, Searcher};
use crate::pattern;
use crate::pattern::{CharClass, Pattern};


/// Identifies a node in [`Nfa::nodes`].
type NodeId = usize;

#[derive(Debug, Clone)]
enum NodeKind {
    Empty,
    Literal(CharClass),
    Chain(NodeId, NodeId),
    Either(NodeId, NodeId),
    Star(NodeId),
    Plus(NodeId),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
}

/// A pattern prepared for being searched by walking its tree.
///
/// The [`Pattern`] is flattened into a vector of nodes where each node
/// knows its parent. Creating an [`Nfa`] is cheap, and it can be used for
/// any number of searches.
#[derive(Debug, Clone)]
pub struct Nfa {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Nfa {
    /// Creates an [`Nfa`] for the given pattern.
    pub fn new(pattern: &Pattern) -> Self {
        match pattern::visit(pattern, Builder::new()) {
            Ok(nfa) => nfa,
            Err(never) => match never {},
        }
    }

    /// Number of nodes in the tree.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false, a tree has at least its root node.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The position that represents the end of the whole pattern. It's
    /// not the id of any node.
    #[inline]
    fn accept(&self) -> NodeId {
        self.nodes.len()
    }
}

impl Searcher for Nfa {
    fn find<I: Iterator<Item = char>>(&self, mut stream: I) -> Option<Match> {
        let accept = self.accept();

        // Threads alive before and after consuming the current character.
        // Keys are leaf ids (or `accept`), values are the offsets where the
        // threads started.
        let mut threads = BitmapSet::new(accept + 1);
        let mut next_threads = BitmapSet::new(accept + 1);
        let mut closure = EpsilonClosure::new(self.nodes.len());

        let mut pos = 0;

        closure.compute(self, Walk::Enter(self.root), pos, &mut threads);

        loop {
            if let Some(start) = threads.get(accept) {
                #[cfg(feature = "logging")]
                debug!("nfa: match at {}..{}", start, pos);
                return Some(Match::new(*start, pos));
            }

            let c = match stream.next() {
                Some(c) => c,
                None => {
                    #[cfg(feature = "logging")]
                    debug!("nfa: no match after {} characters", pos);
                    return None;
                }
            };

            pos += 1;
            closure.reset();

            for (leaf, origin) in threads.iter() {
                let class = match &self.nodes[*leaf].kind {
                    NodeKind::Literal(class) => class,
                    _ => unreachable!(),
                };
                if class.contains(c) {
                    closure.compute(
                        self,
                        Walk::Exit(*leaf),
                        *origin,
                        &mut next_threads,
                    );
                }
            }

            // A new thread starting at the current offset, with the lowest
            // priority.
            closure.compute(
                self,
                Walk::Enter(self.root),
                pos,
                &mut next_threads,
            );

            mem::swap(&mut threads, &mut next_threads);
            next_threads.clear();

            #[cfg(feature = "logging")]
            trace!("nfa: {} threads at offset {}", threads.len(), pos);
        }
    }
}

/// Returns true if `stream` contains a match for `pattern`.
///
/// If a match is found, the stream is left right after the end of the
/// match. Otherwise, the stream is exhausted.
///
/// ```
/// use regexercise::{parse, search};
///
/// let pattern = parse("hallo|a").unwrap();
/// let mut stream = "hallo".chars();
///
/// assert!(search(&pattern, &mut stream));
/// assert_eq!(stream.as_str(), "llo");
/// ```
pub fn search<I>(pattern: &Pattern, stream: &mut I) -> bool
where
    I: Iterator<Item = char> + ?Sized,
{
    Nfa::new(pattern).search(stream)
}

/// Steps in the walk performed by [`EpsilonClosure::compute`].
#[derive(Debug, Clone, Copy)]
enum Walk {
    Enter(NodeId),
    Exit(NodeId),
}

/// State of the tree walk that computes epsilon-closures.
///
/// The same node is entered (or exited) at most once per step. All
/// closures computed during the same step share the `entered` and `exited`
/// bitmaps, they are cleared by [`EpsilonClosure::reset`] when the search
/// moves to the next character. A later visit to the same node has lower
/// priority than the first one and leads to exactly the same positions, so
/// it can be ignored. This also makes loops like `(b*)*`, where the body of
/// the loop can match the empty string, finish.
struct EpsilonClosure {
    stack: Vec<Walk>,
    entered: BitVec,
    exited: BitVec,
}

impl EpsilonClosure {
    fn new(num_nodes: usize) -> Self {
        Self {
            stack: Vec::new(),
            entered: BitVec::repeat(false, num_nodes),
            exited: BitVec::repeat(false, num_nodes),
        }
    }

    fn reset(&mut self) {
        self.entered.fill(false);
        self.exited.fill(false);
    }

    /// Walks the tree starting with `start`, adding to `closure` every leaf
    /// reached, plus the accept position if the root is exited. Leaves are
    /// added in priority order.
    fn compute(
        &mut self,
        nfa: &Nfa,
        start: Walk,
        origin: usize,
        closure: &mut BitmapSet<usize>,
    ) {
        self.stack.push(start);

        while let Some(walk) = self.stack.pop() {
            match walk {
                Walk::Enter(id) => {
                    if self.entered.replace(id, true) {
                        continue;
                    }
                    // Pushed in reverse order, the last one is walked first.
                    match nfa.nodes[id].kind {
                        NodeKind::Empty => self.stack.push(Walk::Exit(id)),
                        NodeKind::Literal(_) => {
                            closure.insert(id, origin);
                        }
                        NodeKind::Chain(first, _) => {
                            self.stack.push(Walk::Enter(first))
                        }
                        NodeKind::Either(first, second) => {
                            self.stack.push(Walk::Enter(second));
                            self.stack.push(Walk::Enter(first));
                        }
                        NodeKind::Star(body) => {
                            self.stack.push(Walk::Exit(id));
                            self.stack.push(Walk::Enter(body));
                        }
                        NodeKind::Plus(body) => {
                            self.stack.push(Walk::Enter(body))
                        }
                    }
                }
                Walk::Exit(id) => {
                    if self.exited.replace(id, true) {
                        continue;
                    }
                    let parent = match nfa.nodes[id].parent {
                        Some(parent) => parent,
                        None => {
                            closure.insert(nfa.accept(), origin);
                            continue;
                        }
                    };
                    match nfa.nodes[parent].kind {
                        NodeKind::Chain(first, second) if first == id => {
                            self.stack.push(Walk::Enter(second))
                        }
                        NodeKind::Chain(..) | NodeKind::Either(..) => {
                            self.stack.push(Walk::Exit(parent))
                        }
                        // Back to the star, which either repeats the body
                        // or exits.
                        NodeKind::Star(_) => {
                            self.stack.push(Walk::Enter(parent))
                        }
                        NodeKind::Plus(body) => {
                            self.stack.push(Walk::Exit(parent));
                            self.stack.push(Walk::Enter(body));
                        }
                        NodeKind::Empty | NodeKind::Literal(_) => {
                            unreachable!()
                        }
                    }
                }
            }
        }
    }
}

/// Flattens a [`Pattern`] into the nodes of an [`Nfa`].
///
/// Nodes are created in post-order, so the ids of the children are in
/// the stack when their parent is visited.
struct Builder {
    nodes: Vec<Node>,
    stack: Vec<NodeId>,
}

impl Builder {
    fn new() -> Self {
        Self { nodes: Vec::new(), stack: Vec::new() }
    }

    fn pop(&mut self) -> NodeId {
        self.stack.pop().unwrap_or_else(|| unreachable!())
    }

    fn add_node(&mut self, kind: NodeKind) -> NodeId {
        let id = self.nodes.len();
        match kind {
            NodeKind::Empty | NodeKind::Literal(_) => {}
            NodeKind::Chain(first, second)
            | NodeKind::Either(first, second) => {
                self.nodes[first].parent = Some(id);
                self.nodes[second].parent = Some(id);
            }
            NodeKind::Star(body) | NodeKind::Plus(body) => {
                self.nodes[body].parent = Some(id);
            }
        }
        self.nodes.push(Node { kind, parent: None });
        id
    }
}

impl pattern::Visitor for Builder {
    type Output = Nfa;
    type Err = std::convert::Infallible;

    fn finish(mut self) -> Result<Self::Output, Self::Err> {
        let root = self.pop();
        debug_assert!(self.stack.is_empty());
        Ok(Nfa { nodes: self.nodes, root })
    }

    fn visit_post(&mut self, pattern: &Pattern) -> Result<(), Self::Err> {
        let kind = match pattern {
            Pattern::Empty => NodeKind::Empty,
            Pattern::Literal(class) => NodeKind::Literal(class.clone()),
            Pattern::Chain(..) => {
                let second = self.pop();
                let first = self.pop();
                NodeKind::Chain(first, second)
            }
            Pattern::Either(..) => {
                let second = self.pop();
                let first = self.pop();
                NodeKind::Either(first, second)
            }
            Pattern::Star(_) => NodeKind::Star(self.pop()),
            Pattern::Plus(_) => NodeKind::Plus(self.pop()),
        };
        let id = self.add_node(kind);
        self.stack.push(id);
        Ok(())
    }
}
