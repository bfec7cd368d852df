use core::fmt;

use serde::{Deserialize, Serialize};

/// The name of a variable, monitor, or function as written in snippet
/// source.
pub type Ident = String;

/// The role of a named variable, carried by the first character of its
/// identifier.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum VarKind {
    /// `l…`: thread-local variable, invisible to other threads
    Local,
    /// `s…`: shared field with no ordering guarantees of its own
    Shared,
    /// `v…`: volatile field; reads and writes are synchronization actions
    Volatile,
    /// `m…`: reentrant monitor operated on with `.lock()` / `.unlock()`
    Monitor,
}

impl VarKind {
    /// Classifies an identifier by its prefix.  Returns `None` for names
    /// outside the variable namespace, such as function names.
    #[must_use]
    pub fn of(name: &str) -> Option<Self> {
        match name.as_bytes().first() {
            Some(b'l') => Some(Self::Local),
            Some(b's') => Some(Self::Shared),
            Some(b'v') => Some(Self::Volatile),
            Some(b'm') => Some(Self::Monitor),
            _ => None,
        }
    }
}

/// The source line an instruction was lowered from, 1-based.
///
/// Every instruction produced for one statement carries the line of that
/// statement's first token.
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    Serialize,
    Deserialize,
)]
pub struct SourceLoc {
    /// 1-based line number within the snippet's source file
    pub line: u32,
}

impl SourceLoc {
    /// A location on the given 1-based source line
    #[must_use]
    pub const fn new(line: u32) -> Self {
        Self { line }
    }
}

impl fmt::Display for SourceLoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}", self.line)
    }
}

/// The binary integer operators of the snippet language.
///
/// `Add`, `Sub`, and `Mul` wrap modulo 2³²; `Div` and `Rem` are truncating
/// signed division and may fault on a zero divisor; the bitwise operators
/// never fault.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum ArithmeticOp {
    /// Wrapping two's-complement addition
    Add,
    /// Wrapping two's-complement subtraction
    Sub,
    /// Wrapping two's-complement multiplication
    Mul,
    /// Truncating signed division; faults on a zero divisor
    Div,
    /// Remainder of truncating signed division; faults on a zero divisor
    Rem,
    /// Bitwise or
    Or,
    /// Bitwise exclusive or
    Xor,
    /// Bitwise and
    And,
}

impl ArithmeticOp {
    /// The mnemonic used by assembly-style snippet listings.
    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Mul => "mul",
            Self::Div => "div",
            Self::Rem => "rem",
            Self::Or => "or",
            Self::Xor => "xor",
            Self::And => "and",
        }
    }
}

impl fmt::Display for ArithmeticOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mnemonic())
    }
}
