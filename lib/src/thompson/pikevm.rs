use std::mem;

use bitvec::vec::BitVec;

#[cfg(feature = "logging")]
use log::*;

use super::instr::{Instr, InstrParser, Offset, SplitId};
use super::Program;
use crate::bitmapset::BitmapSet;
use crate::engine::Match;

/// Represents a [Pike's VM](https://swtch.com/~rsc/regexp/regexp2.html) that
/// executes a [`Program`] over a stream of characters.
///
/// A [`Vm`] is created by [`crate::load_program`]. It owns the stream, which
/// can be a mutable reference to some iterator for retaining access to the
/// characters that remain after the search.
pub struct Vm<'p, I> {
    /// The code for the VM. Produced by [`crate::compile_pattern`].
    code: &'p [u8],
    /// The stream being searched.
    input: I,
    /// The set of currently active threads. Each item in this set is a
    /// position within the VM code, pointing to some VM instruction, and
    /// the offset where the thread started. The VM guarantees that there
    /// aren't two active threads at the same VM instruction.
    threads: BitmapSet<usize>,
    /// The set of threads that will become the active threads when the next
    /// character is read from the input.
    next_threads: BitmapSet<usize>,
    /// State for the [`epsilon_closure`] function.
    cache: EpsilonClosureState,
}

impl<'p, I> Vm<'p, I>
where
    I: Iterator<Item = char>,
{
    /// Creates a new [`Vm`] that will execute `program` over `input`.
    pub fn new(program: &'p Program, input: I) -> Self {
        let code = program.code();
        Self {
            code,
            input,
            threads: BitmapSet::new(code.len()),
            next_threads: BitmapSet::new(code.len()),
            cache: EpsilonClosureState::new(program.splits()),
        }
    }

    /// Runs the program until a match is found or the input is exhausted.
    /// Returns true if a match was found.
    pub fn run(&mut self) -> bool {
        self.run_match().is_some()
    }

    /// Like [`Vm::run`], but returns the offsets of the match.
    ///
    /// The input is read only as far as needed. Each call starts a new
    /// search at the current position of the input.
    pub fn run_match(&mut self) -> Option<Match> {
        // Location of the `MATCH` instruction, which is always the last one.
        let match_loc = self.code.len() - 2;
        let mut pos = 0;

        self.threads.clear();
        self.cache.reset();

        epsilon_closure(self.code, 0, pos, &mut self.cache, &mut self.threads);

        loop {
            if let Some(start) = self.threads.get(match_loc) {
                #[cfg(feature = "logging")]
                debug!("vm: match at {}..{}", start, pos);
                return Some(Match::new(*start, pos));
            }

            let c = match self.input.next() {
                Some(c) => c,
                None => {
                    #[cfg(feature = "logging")]
                    debug!("vm: no match after {} characters", pos);
                    self.threads.clear();
                    return None;
                }
            };

            pos += 1;
            self.cache.reset();

            for (ip, origin) in self.threads.iter() {
                let (instr, instr_size) =
                    InstrParser::decode_instr(&self.code[*ip..]);

                let is_match = match instr {
                    Instr::Char(expected) => expected == c,
                    Instr::Class(class) => class.contains(c),
                    _ => unreachable!(),
                };

                if is_match {
                    epsilon_closure(
                        self.code,
                        *ip + instr_size,
                        *origin,
                        &mut self.cache,
                        &mut self.next_threads,
                    );
                }
            }

            // A new thread starting at the current offset, with the lowest
            // priority.
            epsilon_closure(
                self.code,
                0,
                pos,
                &mut self.cache,
                &mut self.next_threads,
            );

            mem::swap(&mut self.threads, &mut self.next_threads);
            self.next_threads.clear();

            #[cfg(feature = "logging")]
            trace!("vm: {} threads at offset {}", self.threads.len(), pos);
        }
    }

    /// Consumes the [`Vm`] and returns the input.
    pub fn into_inner(self) -> I {
        self.input
    }
}

/// Structure used by the [`epsilon_closure`] function for maintaining
/// its state during the computation of an epsilon closure. See the
/// documentation of [`epsilon_closure`] for details.
pub(crate) struct EpsilonClosureState {
    /// Pairs (instruction pointer, origin) describing the pending threads.
    threads: Vec<(usize, usize)>,
    /// This bit vector has one bit per split instruction in the program. If
    /// the split instruction with SplitId = N is executed, the N-th bit in
    /// the vector is set to 1.
    executed_splits: BitVec,
    /// Indicates whether the `executed_splits` bit array needs to be
    /// cleared during the next call to [`EpsilonClosureState::executed`].
    dirty: bool,
}

impl EpsilonClosureState {
    pub fn new(num_splits: usize) -> Self {
        Self {
            threads: Vec::new(),
            executed_splits: BitVec::repeat(false, num_splits),
            dirty: false,
        }
    }

    /// Forgets about the splits executed so far. Must be called each time
    /// the VM moves to the next character.
    #[inline]
    pub fn reset(&mut self) {
        self.dirty = true;
    }

    #[inline(always)]
    pub fn executed(&mut self, split_id: SplitId) -> bool {
        if self.dirty {
            self.executed_splits.fill(false);
            self.dirty = false;
        }
        self.executed_splits.replace(split_id.into(), true)
    }
}

/// Computes the epsilon closure derived from executing the code starting at
/// a given position.
///
/// In a NFA, the epsilon closure of some state `S`, is the set containing all
/// the states that can be reached from `S` by following epsilon transitions
/// (i.e: transitions that don't consume any input symbol). The Pike's VM code
/// produced for a pattern is simply another way of representing a NFA where
/// each instruction is a state. The NFA jumps from one state to the other by
/// following the instruction flow. Instructions like `jump` and `split`, which
/// jump from one state to another (or others) unconditionally, without
/// consuming a character from the input, are epsilon transitions in this
/// context.
///
/// This function starts at the instruction in the `start` location, and from
/// there explore all the possible transitions that don't consume input. When
/// some instruction that consumes input (or `MATCH`) is found, its location
/// is added to the closure, together with `origin`.
///
/// A split instruction is executed at most once between two calls to
/// [`EpsilonClosureState::reset`], even across different calls to this
/// function. Threads that reach an already executed split have lower
/// priority than the one that executed it first, and would reach the same
/// instructions. This is what keeps loops with bodies that can match the
/// empty string, like `(b*)*`, from running forever.
#[inline(always)]
pub(crate) fn epsilon_closure(
    code: &[u8],
    start: usize,
    origin: usize,
    state: &mut EpsilonClosureState,
    closure: &mut BitmapSet<usize>,
) {
    state.threads.push((start, origin));

    let apply_offset = |ip: usize, offset: Offset| -> usize {
        (ip as isize + offset as isize) as usize
    };

    while let Some((ip, origin)) = state.threads.pop() {
        let (instr, instr_size) = InstrParser::decode_instr(&code[ip..]);
        match instr {
            Instr::Char(_) | Instr::Class(_) | Instr::Match => {
                closure.insert(ip, origin);
            }
            Instr::SplitA(id, offset) => {
                if !state.executed(id) {
                    state.threads.push((apply_offset(ip, offset), origin));
                    state.threads.push((ip + instr_size, origin));
                }
            }
            Instr::SplitB(id, offset) => {
                if !state.executed(id) {
                    state.threads.push((ip + instr_size, origin));
                    state.threads.push((apply_offset(ip, offset), origin));
                }
            }
            Instr::Jump(offset) => {
                state.threads.push((apply_offset(ip, offset), origin));
            }
        }
    }
}
