/*! Compiles patterns into programs for a Pike VM, and executes them.

The compiler is based in the [Thompson's construction][1] algorithm, and the
VM is the one described in [Regular Expression Matching: the Virtual Machine
Approach][2]. The program is a compact sequence of bytes (see [`instr`] for
the encoding), which makes it cheap to store and to serialize.

[1]: https://en.wikipedia.org/wiki/Thompson%27s_construction
[2]: https://swtch.com/~rsc/regexp/regexp2.html
*/

use std::collections::{HashMap, HashSet};
use std::fmt::{Display, Formatter};
use std::io::{BufWriter, Read, Write};

use bincode::Options;
use bitvec::vec::BitVec;
#[cfg(feature = "logging")]
use log::*;
use serde::{Deserialize, Serialize};

use crate::engine::{Match, Searcher};
use crate::errors::{Error, SerializationError};
use crate::pattern::Pattern;

use self::instr::{Instr, InstrParser, Offset};

pub(crate) mod compiler;
pub(crate) mod instr;
pub(crate) mod pikevm;


pub use pikevm::Vm;

/// Header that precedes serialized programs.
const MAGIC: &[u8] = b"REXPROG";

/// A pattern compiled into code for the Pike VM.
///
/// Programs are produced by [`compile_pattern`] and executed by a [`Vm`].
/// They are immutable and can be reused for any number of searches. The
/// code of a deserialized program is validated before it is accepted.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawProgram")]
pub struct Program {
    code: Vec<u8>,
    splits: u32,
}

/// The fields of a [`Program`] as they are serialized, before validation.
#[derive(Deserialize)]
struct RawProgram {
    code: Vec<u8>,
    splits: u32,
}

impl TryFrom<RawProgram> for Program {
    type Error = SerializationError;

    fn try_from(raw: RawProgram) -> Result<Self, Self::Error> {
        if validate(&raw.code)? != raw.splits {
            return Err(SerializationError::InvalidProgram);
        }
        Ok(Program { code: raw.code, splits: raw.splits })
    }
}

impl Program {
    /// The code for the VM.
    #[inline]
    pub(crate) fn code(&self) -> &[u8] {
        self.code.as_slice()
    }

    /// Size of the program's code in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.code.len()
    }

    /// Always false, the code contains at least a `MATCH` instruction.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    /// Number of split instructions in the program.
    #[inline]
    pub fn splits(&self) -> usize {
        self.splits as usize
    }

    /// Serializes the program as a sequence of bytes.
    ///
    /// The [`Program`] can be restored back by passing the bytes to
    /// [`Program::deserialize`].
    pub fn serialize(&self) -> Result<Vec<u8>, SerializationError> {
        let mut bytes = Vec::new();
        self.serialize_into(&mut bytes)?;
        Ok(bytes)
    }

    /// Serializes the program into a `writer`.
    pub fn serialize_into<W>(
        &self,
        writer: W,
    ) -> Result<(), SerializationError>
    where
        W: Write,
    {
        let mut writer = BufWriter::new(writer);

        // Write file header.
        writer.write_all(MAGIC)?;

        bincode::DefaultOptions::new()
            .with_varint_encoding()
            .serialize_into(&mut writer, self)?;

        writer.flush()?;
        Ok(())
    }

    /// Deserializes a program from a sequence of bytes produced by
    /// [`Program::serialize`].
    ///
    /// The code is validated before returning the program, data that
    /// doesn't contain a well-formed program produces an error.
    pub fn deserialize<B>(bytes: B) -> Result<Self, SerializationError>
    where
        B: AsRef<[u8]>,
    {
        let bytes = bytes.as_ref();

        if bytes.len() < MAGIC.len() || &bytes[0..MAGIC.len()] != MAGIC {
            return Err(SerializationError::InvalidFormat);
        }

        // Skip the magic and deserialize the remaining data. Validation is
        // done apart, so that it reports `InvalidProgram`.
        let raw = bincode::DefaultOptions::new()
            .with_varint_encoding()
            .deserialize::<RawProgram>(&bytes[MAGIC.len()..])?;

        let program = Program::try_from(raw)?;

        #[cfg(feature = "logging")]
        debug!("loaded program with {} bytes", program.len());

        Ok(program)
    }

    /// Deserializes a program from a `reader`.
    pub fn deserialize_from<R>(
        mut reader: R,
    ) -> Result<Self, SerializationError>
    where
        R: Read,
    {
        let mut bytes = Vec::new();
        let _ = reader.read_to_end(&mut bytes)?;
        Self::deserialize(bytes)
    }
}

/// Disassembles the program, one instruction per line.
impl Display for Program {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        compiler::write_code(f, self.code())
    }
}

impl Searcher for Program {
    fn find<I: Iterator<Item = char>>(&self, stream: I) -> Option<Match> {
        Vm::new(self, stream).run_match()
    }
}

/// Compiles a pattern into a [`Program`].
///
/// Returns [`Error::TooLarge`] if the code is so large that the offset of
/// some jump or split doesn't fit in an `i32`. There's no limit on the
/// number of splits other than that.
pub fn compile_pattern(pattern: &Pattern) -> Result<Program, Error> {
    let (code, splits) = compiler::Compiler::new().compile(pattern)?;

    #[cfg(feature = "logging")]
    debug!("compiled program: {} bytes, {} splits", code.len(), splits);

    Ok(Program { code, splits })
}

/// Creates a [`Vm`] that will run `program` over `stream`.
///
/// ```
/// use regexercise::{compile_pattern, load_program, parse};
///
/// let program = compile_pattern(&parse("a[bc]+d").unwrap()).unwrap();
/// let mut stream = "abcbdcb".chars();
///
/// assert!(load_program(&program, &mut stream).run());
/// assert_eq!(stream.as_str(), "cb");
/// ```
pub fn load_program<I>(program: &Program, stream: I) -> Vm<'_, I>
where
    I: Iterator<Item = char>,
{
    Vm::new(program, stream)
}

/// Checks that `code` is a well-formed program, returning the number of
/// split instructions in it.
///
/// A program is well-formed if every instruction can be decoded, the last
/// instruction is the only `MATCH`, jumps and splits land at the start of
/// some instruction, split ids are unique, and no jump leads to itself
/// without going through a split.
fn validate(code: &[u8]) -> Result<u32, SerializationError> {
    let invalid = || SerializationError::InvalidProgram;

    // The N-th bit is set if some instruction starts at location N.
    let mut boundaries: BitVec = BitVec::repeat(false, code.len());
    let mut split_ids = Vec::new();
    let mut targets = Vec::new();
    let mut jumps = HashMap::new();
    let mut ends_with_match = false;
    let mut addr = 0;

    while addr < code.len() {
        if ends_with_match {
            return Err(invalid());
        }

        let (instr, size) =
            InstrParser::try_decode_instr(&code[addr..]).ok_or_else(invalid)?;

        let target = |offset: Offset| {
            usize::try_from(addr as isize + offset as isize).ok()
        };

        match instr {
            Instr::Match => ends_with_match = true,
            Instr::Char(_) | Instr::Class(_) => {}
            Instr::Jump(offset) => {
                let target = target(offset).ok_or_else(invalid)?;
                jumps.insert(addr, target);
                targets.push(target);
            }
            Instr::SplitA(id, offset) | Instr::SplitB(id, offset) => {
                split_ids.push(id);
                targets.push(target(offset).ok_or_else(invalid)?);
            }
        }

        boundaries.set(addr, true);
        addr += size;
    }

    if !ends_with_match {
        return Err(invalid());
    }

    for target in targets {
        if !boundaries.get(target).is_some_and(|bit| *bit) {
            return Err(invalid());
        }
    }

    // Split ids must be unique and go from 0 to the number of splits - 1.
    let mut seen: BitVec = BitVec::repeat(false, split_ids.len());

    for id in split_ids.iter().copied().map(usize::from) {
        if id >= seen.len() || seen.replace(id, true) {
            return Err(invalid());
        }
    }

    // Follow each chain of jumps, which must end in something that is not
    // a jump. Jumps already known to be fine are not followed again.
    let mut checked = HashSet::new();

    for start in jumps.keys() {
        let mut chain = Vec::new();
        let mut current = *start;
        while let Some(next) = jumps.get(&current) {
            if checked.contains(&current) {
                break;
            }
            if chain.contains(&current) {
                return Err(invalid());
            }
            chain.push(current);
            current = *next;
        }
        checked.extend(chain);
    }

    u32::try_from(split_ids.len()).map_err(|_| invalid())
}
