/*!
This module provides a compiler that takes a [`Pattern`] and produces a
sequence of instructions for the Pike VM.

The code is produced with the [Thompson's construction][1], during a
depth-first traversal of the pattern. Code for each node is emitted as soon
as possible, and instructions that jump forward are patched once the
destination is known.

[1]: https://en.wikipedia.org/wiki/Thompson%27s_construction
*/

use std::fmt::{Display, Formatter};
use std::io::{Cursor, Read, Seek, SeekFrom, Write};
use std::mem::size_of;

use super::instr;
use super::instr::{Instr, InstrParser, SplitId, OPCODE_PREFIX};

use crate::errors::Error;
use crate::pattern;
use crate::pattern::{CharClass, Pattern};

/// Compiles a [`Pattern`] into code for the Pike VM.
///
/// For each kind of pattern the compiler emits:
///
/// ```text
/// Literal(c)    c                     (the character, UTF-8 encoded)
/// Literal(cls)  CLASS ranges
/// Chain(a, b)   code for a
///               code for b
/// Either(a, b)      SPLIT_A l2
///                   code for a
///                   JUMP l3
///               l2: code for b
///               l3:
/// Star(e)       l1: SPLIT_A l3
///                   code for e
///                   JUMP l1
///               l3:
/// Plus(e)       l1: code for e
///                   SPLIT_B l1
/// Empty         nothing
/// ```
///
/// The code ends with a `MATCH` instruction.
#[derive(Default)]
pub(crate) struct Compiler {
    /// The code being produced.
    code: InstrSeq,

    /// Stack that stores the locations that the compiler needs to remember.
    /// For example, when some instruction that jumps forward in the code is
    /// emitted, the destination address is not yet known. The compiler needs
    /// to save the jump's address in order to patch the instruction and adjust
    /// the destination address once its known.
    bookmarks: Vec<usize>,
}

impl Compiler {
    /// Creates a new pattern compiler.
    pub fn new() -> Self {
        Self { code: InstrSeq::new(), bookmarks: Vec::new() }
    }

    /// Compiles the pattern, returning the code and the number of split
    /// instructions in it.
    pub fn compile(self, pattern: &Pattern) -> Result<(Vec<u8>, u32), Error> {
        let code = pattern::visit(pattern, self)?;
        let splits = code.num_splits();
        Ok((code.into_inner(), splits))
    }

    /// Patches the jump or split at `location` so that it points to
    /// `destination`.
    fn patch(
        &mut self,
        location: usize,
        destination: usize,
    ) -> Result<(), Error> {
        let offset: instr::Offset = (destination as isize - location as isize)
            .try_into()
            .map_err(|_| Error::TooLarge)?;
        self.code.patch_instr(location, offset);
        Ok(())
    }

    fn pop_bookmark(&mut self) -> usize {
        self.bookmarks.pop().unwrap_or_else(|| unreachable!())
    }
}

impl pattern::Visitor for Compiler {
    type Output = InstrSeq;
    type Err = Error;

    fn finish(mut self) -> Result<Self::Output, Self::Err> {
        debug_assert!(self.bookmarks.is_empty());
        self.code.emit_instr(Instr::MATCH)?;
        Ok(self.code)
    }

    fn visit_pre(&mut self, pattern: &Pattern) -> Result<(), Self::Err> {
        match pattern {
            Pattern::Either(..) => {
                let split = self.code.emit_instr(Instr::SPLIT_A)?;
                self.bookmarks.push(split);
            }
            Pattern::Star(_) => {
                let split = self.code.emit_instr(Instr::SPLIT_A)?;
                self.bookmarks.push(split);
            }
            Pattern::Plus(_) => {
                self.bookmarks.push(self.code.location());
            }
            Pattern::Empty | Pattern::Literal(_) | Pattern::Chain(..) => {}
        }
        Ok(())
    }

    fn visit_either_in(&mut self) -> Result<(), Self::Err> {
        // The first alternative is complete, jump over the second one.
        let split = self.pop_bookmark();
        let jump = self.code.emit_instr(Instr::JUMP)?;
        self.patch(split, self.code.location())?;
        self.bookmarks.push(jump);
        Ok(())
    }

    fn visit_post(&mut self, pattern: &Pattern) -> Result<(), Self::Err> {
        match pattern {
            Pattern::Empty | Pattern::Chain(..) => {}
            Pattern::Literal(class) => {
                self.code.emit_class(class)?;
            }
            Pattern::Either(..) => {
                let jump = self.pop_bookmark();
                self.patch(jump, self.code.location())?;
            }
            Pattern::Star(_) => {
                let split = self.pop_bookmark();
                let jump = self.code.emit_instr(Instr::JUMP)?;
                self.patch(jump, split)?;
                self.patch(split, self.code.location())?;
            }
            Pattern::Plus(_) => {
                let start = self.pop_bookmark();
                let split = self.code.emit_instr(Instr::SPLIT_B)?;
                self.patch(split, start)?;
            }
        }
        Ok(())
    }
}

/// A sequence of instructions for the Pike VM.
///
/// Instructions are appended at the end of the sequence, and jumps and
/// splits can be patched afterwards for setting their destination.
#[derive(Default)]
pub(crate) struct InstrSeq {
    /// A vector that contains the PikeVM code.
    seq: Cursor<Vec<u8>>,
    /// The ID that will identify the next split instruction emitted in this
    /// sequence.
    split_id: SplitId,
}

impl AsRef<[u8]> for InstrSeq {
    fn as_ref(&self) -> &[u8] {
        self.seq.get_ref().as_slice()
    }
}

impl InstrSeq {
    /// Creates a new [`InstrSeq`].
    pub fn new() -> Self {
        Self { seq: Cursor::new(Vec::new()), split_id: SplitId::default() }
    }

    /// Consumes the [`InstrSeq`] and returns the inner vector that contains
    /// the code.
    pub fn into_inner(self) -> Vec<u8> {
        self.seq.into_inner()
    }

    /// Returns the current location within the instruction sequence.
    ///
    /// The location is an offset relative to the sequence's starting point,
    /// the first instruction is at location 0. This function always returns
    /// the location where the next instruction will be put.
    #[inline]
    pub fn location(&self) -> usize {
        self.seq.position() as usize
    }

    /// Number of split instructions emitted so far.
    #[inline]
    pub fn num_splits(&self) -> u32 {
        self.split_id.into()
    }

    /// Adds some instruction at the end of the sequence and returns the
    /// location where the newly added instruction resides.
    pub fn emit_instr(&mut self, instr: u8) -> Result<usize, Error> {
        // Store the position where the instruction will be written, which will
        // the result for this function.
        let location = self.location();

        self.write(&[OPCODE_PREFIX, instr]);

        match instr {
            Instr::SPLIT_A | Instr::SPLIT_B => {
                // Split instructions are followed by a value that identifies
                // the split. Each split in the same program has a unique
                // value.
                self.write(self.split_id.to_le_bytes().as_slice());
                // Increment the split ID, so that the next split has a
                // different ID.
                self.split_id = self.split_id.add(1).ok_or(Error::TooLarge)?;
                // The split ID is followed by the offset, which is patched
                // later.
                self.write(&[0x00; size_of::<instr::Offset>()]);
            }
            Instr::JUMP => {
                self.write(&[0x00; size_of::<instr::Offset>()]);
            }
            _ => {}
        }

        Ok(location)
    }

    /// Adds the instruction that matches the given class at the end of the
    /// sequence and returns its location.
    ///
    /// Classes with a single character are emitted as the character itself,
    /// other classes (including the empty one) use [`Instr::Class`].
    pub fn emit_class(&mut self, class: &CharClass) -> Result<usize, Error> {
        let location = self.location();

        if let Some(c) = class.as_char() {
            let mut buf = [0; 4];
            self.write(c.encode_utf8(&mut buf).as_bytes());
            return Ok(location);
        }

        let ranges = class.ranges();
        let n: u32 = ranges.len().try_into().map_err(|_| Error::TooLarge)?;

        self.write(&[OPCODE_PREFIX, Instr::CLASS]);
        self.write(n.to_le_bytes().as_slice());

        for (start, end) in ranges {
            self.write((*start as u32).to_le_bytes().as_slice());
            self.write((*end as u32).to_le_bytes().as_slice());
        }

        Ok(location)
    }

    /// Patches the offset of the instruction that starts at the given
    /// location.
    ///
    /// # Panics
    ///
    /// If the instruction at `location` is not one that have an offset as its
    /// argument, like [`Instr::Jump`], [`Instr::SplitA`] or [`Instr::SplitB`].
    pub fn patch_instr(&mut self, location: usize, offset: instr::Offset) {
        // Save the current position in order to restore it later.
        let saved_loc = self.location();

        // Seek to the position indicated by `location`.
        self.seek(location);

        let mut buf = [0; 2];
        self.seq.read_exact(&mut buf).unwrap();

        // Make sure that we have some `split` or `jump` instruction at the
        // given location.
        assert_eq!(buf[0], OPCODE_PREFIX);

        match buf[1] {
            Instr::JUMP => {}
            Instr::SPLIT_A | Instr::SPLIT_B => {
                // Skip the split ID.
                self.seek(location + 2 + size_of::<SplitId>());
            }
            _ => {
                unreachable!()
            }
        }

        // Write the given offset after the instruction opcode. This will
        // overwrite any existing offsets, usually initialized with 0.
        self.write(instr::Offset::to_le_bytes(offset).as_slice());

        // Restore to the previous current position.
        self.seek(saved_loc);
    }

    // Writes into a `Cursor<Vec<u8>>` never fail.
    fn write(&mut self, bytes: &[u8]) {
        self.seq.write_all(bytes).unwrap();
    }

    fn seek(&mut self, location: usize) {
        self.seq.seek(SeekFrom::Start(location as u64)).unwrap();
    }
}

impl Display for InstrSeq {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write_code(f, self.as_ref())
    }
}

/// Writes a human-readable listing of `code`, one instruction per line.
pub(crate) fn write_code(
    f: &mut Formatter<'_>,
    code: &[u8],
) -> std::fmt::Result {
    for (instr, addr) in InstrParser::new(code) {
        match instr {
            Instr::Char(c) => {
                writeln!(f, "{:05x}: LIT {:?}", addr, c)?;
            }
            Instr::Class(class) => {
                write!(f, "{:05x}: CLASS", addr)?;
                for (start, end) in class.ranges() {
                    write!(f, " [{:?}-{:?}]", start, end)?;
                }
                writeln!(f)?;
            }
            Instr::Jump(offset) => {
                writeln!(
                    f,
                    "{:05x}: JUMP {:05x}",
                    addr,
                    addr as isize + offset as isize,
                )?;
            }
            Instr::SplitA(id, offset) => {
                writeln!(
                    f,
                    "{:05x}: SPLIT_A({}) {:05x}",
                    addr,
                    id,
                    addr as isize + offset as isize,
                )?;
            }
            Instr::SplitB(id, offset) => {
                writeln!(
                    f,
                    "{:05x}: SPLIT_B({}) {:05x}",
                    addr,
                    id,
                    addr as isize + offset as isize,
                )?;
            }
            Instr::Match => {
                writeln!(f, "{:05x}: MATCH", addr)?;
                break;
            }
        };
    }

    Ok(())
}
