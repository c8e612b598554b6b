/*!
This module defines the instructions executed by the Pike VM, along with
the types used for decoding them.

Instruction encoding format
---------------------------

Most of the code produced for a pattern consists in instructions that match
specific characters. For instance, the pattern `abc` could be represented as:

```text
  match 'a'
  match 'b'
  match 'c'
  MATCH
```

Instead of using an opcode followed by the character to be matched, the
character is put directly in the instruction stream, encoded as UTF-8. The
code is then mostly a copy of the literal parts of the pattern. Other
operations, like jumps or splits, are introduced by a marker that indicates
that the next byte is an opcode, not the start of a character. The marker
is [`OPCODE_PREFIX`] (`0xFF`), a byte that never appears in UTF-8 encoded
text, so there's no need to escape it. The pattern above is encoded as:

```text
    0x61  0x62  0x63  0xFF    0x00
     a     b     c   marker  MATCH
```

Offsets in jumps and splits are little-endian `i32` relative to the address
where the instruction starts. Splits also carry a little-endian `u32` with
their id, placed between the opcode and the offset. Character classes that
are not a single character use the `CLASS` opcode, followed by a
little-endian `u32` with the number of ranges and one pair of little-endian
`u32` per range, with the first and last characters in the range.
*/

use std::fmt::{Display, Formatter};
use std::mem::size_of;

/// Marker that indicates the start of some VM opcode.
pub const OPCODE_PREFIX: u8 = 0xFF;

/// Each split instruction in a program has a unique ID represented by this
/// type. This ID is used by [`super::pikevm::epsilon_closure`] for tracking
/// which split instructions have been executed. The splits in a program are
/// numbered from zero, in the order they were emitted.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct SplitId(u32);

impl From<SplitId> for usize {
    fn from(value: SplitId) -> Self {
        value.0 as Self
    }
}

impl From<SplitId> for u32 {
    fn from(value: SplitId) -> Self {
        value.0
    }
}

impl Display for SplitId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl SplitId {
    #[inline]
    pub fn to_le_bytes(self) -> [u8; size_of::<Self>()] {
        self.0.to_le_bytes()
    }

    #[inline]
    pub fn from_le_bytes(bytes: [u8; size_of::<Self>()]) -> Self {
        Self(u32::from_le_bytes(bytes))
    }

    /// Add a given amount to the split id, returning [`None`] if the result
    /// doesn't fit in a `u32`.
    #[inline]
    pub fn add(self, amount: u32) -> Option<Self> {
        self.0.checked_add(amount).map(Self)
    }
}

/// Offset for jump and split instructions. The offset is always relative to
/// the address where the instruction starts.
pub type Offset = i32;

/// Instructions supported by the Pike VM.
#[derive(Debug)]
pub enum Instr<'a> {
    /// Match for the pattern has been found.
    Match,

    /// Matches a specific character.
    Char(char),

    /// Matches any character in a class of one or more ranges.
    Class(ClassRanges<'a>),

    /// Creates a new thread that starts at the current instruction pointer
    /// + offset while the current thread continues at the next instruction.
    /// The name comes from the fact that this instruction splits the execution
    /// flow in two.
    SplitA(SplitId, Offset),

    /// Similar to SplitA, but the current thread continues at instruction
    /// pointer + offset while the new thread continues at the next
    /// instruction.
    /// The new thread has lower priority than the existing one, this is what
    /// makes `+` greedy.
    SplitB(SplitId, Offset),

    /// Relative jump. The opcode is followed by an offset, the location
    /// of the target instruction is computed by adding this offset to the
    /// location of the jump opcode.
    Jump(Offset),
}

impl<'a> Instr<'a> {
    pub const MATCH: u8 = 0x00;
    pub const SPLIT_A: u8 = 0x01;
    pub const SPLIT_B: u8 = 0x02;
    pub const JUMP: u8 = 0x03;
    pub const CLASS: u8 = 0x04;
}

/// Parses a slice of bytes that contains Pike VM instructions, returning
/// individual instructions and their addresses.
pub(crate) struct InstrParser<'a> {
    code: &'a [u8],
    addr: usize,
}

impl<'a> InstrParser<'a> {
    pub fn new(code: &'a [u8]) -> Self {
        Self { code, addr: 0 }
    }

    /// Decodes the instruction at the start of `code`, returning the
    /// instruction and its size.
    ///
    /// # Panics
    ///
    /// If `code` doesn't start with a valid instruction. Code produced by
    /// the compiler, or validated by [`InstrParser::try_decode_instr`], is
    /// always valid.
    #[inline(always)]
    pub fn decode_instr(code: &[u8]) -> (Instr, usize) {
        match Self::try_decode_instr(code) {
            Some(decoded) => decoded,
            None => unreachable!("invalid instruction"),
        }
    }

    /// Like [`InstrParser::decode_instr`], but returns [`None`] if `code`
    /// doesn't start with a valid instruction.
    pub fn try_decode_instr(code: &[u8]) -> Option<(Instr, usize)> {
        match *code {
            [OPCODE_PREFIX, Instr::MATCH, ..] => Some((Instr::Match, 2)),
            [OPCODE_PREFIX, Instr::JUMP, ..] => {
                let offset = Self::decode_offset(code.get(2..)?)?;
                Some((Instr::Jump(offset), 2 + size_of::<Offset>()))
            }
            [OPCODE_PREFIX, op @ (Instr::SPLIT_A | Instr::SPLIT_B), ..] => {
                let id = Self::decode_split_id(code.get(2..)?)?;
                let offset = Self::decode_offset(
                    code.get(2 + size_of::<SplitId>()..)?,
                )?;
                let instr = if op == Instr::SPLIT_A {
                    Instr::SplitA(id, offset)
                } else {
                    Instr::SplitB(id, offset)
                };
                Some((instr, 2 + size_of::<SplitId>() + size_of::<Offset>()))
            }
            [OPCODE_PREFIX, Instr::CLASS, ..] => {
                let n = u32::from_le_bytes(code.get(2..6)?.try_into().ok()?)
                    as usize;
                let size =
                    n.checked_mul(2 * size_of::<u32>())?.checked_add(6)?;
                let ranges = ClassRanges(code.get(6..size)?);
                // Every range must contain valid characters.
                if ranges.ranges().count() != n {
                    return None;
                }
                Some((Instr::Class(ranges), size))
            }
            [OPCODE_PREFIX, ..] => None,
            [b, ..] => {
                let len = utf8_len(b)?;
                let c = std::str::from_utf8(code.get(..len)?)
                    .ok()?
                    .chars()
                    .next()?;
                Some((Instr::Char(c), len))
            }
            [] => None,
        }
    }

    fn decode_offset(slice: &[u8]) -> Option<Offset> {
        Some(Offset::from_le_bytes(
            slice.get(..size_of::<Offset>())?.try_into().ok()?,
        ))
    }

    fn decode_split_id(slice: &[u8]) -> Option<SplitId> {
        Some(SplitId::from_le_bytes(
            slice.get(..size_of::<SplitId>())?.try_into().ok()?,
        ))
    }
}

impl<'a> Iterator for InstrParser<'a> {
    type Item = (Instr<'a>, usize);

    fn next(&mut self) -> Option<Self::Item> {
        if self.code.is_empty() {
            return None;
        }
        let (instr, size) = InstrParser::decode_instr(self.code);
        let addr = self.addr;
        self.addr += size;
        self.code = &self.code[size..];
        Some((instr, addr))
    }
}

/// Number of bytes in the UTF-8 sequence that starts with `b`, or [`None`]
/// if `b` can't be the first byte of a sequence.
fn utf8_len(b: u8) -> Option<usize> {
    match b {
        0x00..=0x7F => Some(1),
        0xC2..=0xDF => Some(2),
        0xE0..=0xEF => Some(3),
        0xF0..=0xF4 => Some(4),
        _ => None,
    }
}

/// The ranges in a [`Instr::Class`] instruction.
#[derive(Debug)]
pub struct ClassRanges<'a>(&'a [u8]);

impl<'a> ClassRanges<'a> {
    /// Returns an iterator over the ranges of characters contained in the
    /// class. Iteration stops at the first range that is not a valid pair
    /// of characters.
    pub fn ranges(&self) -> Ranges<'a> {
        Ranges(self.0)
    }

    /// Returns true if the class contains the given character.
    pub fn contains(&self, c: char) -> bool {
        self.ranges().any(|(start, end)| (start..=end).contains(&c))
    }
}

pub struct Ranges<'a>(&'a [u8]);

impl<'a> Iterator for Ranges<'a> {
    type Item = (char, char);

    fn next(&mut self) -> Option<Self::Item> {
        if self.0.len() < 2 * size_of::<u32>() {
            return None;
        }
        let start = u32::from_le_bytes(self.0[0..4].try_into().ok()?);
        let end = u32::from_le_bytes(self.0[4..8].try_into().ok()?);
        let range = (char::from_u32(start)?, char::from_u32(end)?);
        self.0 = &self.0[8..];
        Some(range)
    }
}
