use serde::{Deserialize, Serialize};

use crate::{ArithmeticOp, Ident, LocalId, SourceLoc};

/// The value consumed by an instruction operand: either a slot in the
/// owning snippet's local table or a 32-bit unsigned constant from source.
///
/// Literals are reinterpreted as two's-complement when evaluated; all
/// snippet arithmetic is over 32-bit integers.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum LocalValue {
    /// Index into the owning snippet's local table
    Local(LocalId),
    /// Unsigned 32-bit constant written in snippet source
    Literal(u32),
}

impl LocalValue {
    /// Whether this operand is a source constant rather than a local slot.
    #[must_use]
    pub const fn is_literal(self) -> bool {
        matches!(self, Self::Literal(_))
    }
}

/// The operation performed by one snippet instruction.
///
/// Instructions that touch shared state are *actions*: the memory model
/// decides which values their reads observe.  Locks, unlocks, and volatile
/// accesses are additionally *synchronization actions* and participate in
/// the synchronization order.  Purely thread-local instructions
/// (`Arithmetic`, `Move`, `Print`) are invisible to the memory model.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum InstructionKind {
    /// Acquire the named reentrant monitor
    Lock {
        /// Monitor being acquired
        monitor: Ident,
    },

    /// Release the named reentrant monitor
    Unlock {
        /// Monitor being released
        monitor: Ident,
    },

    /// Combine two operands into a target local
    Arithmetic {
        /// Local slot receiving the combined value
        target: LocalId,
        /// Left operand
        op0: LocalValue,
        /// Operator applied to the operands
        op: ArithmeticOp,
        /// Right operand
        op1: LocalValue,
    },

    /// Observe some write to a shared field, storing the value seen into a
    /// target local
    SharedRead {
        /// Local slot receiving the observed value
        target: LocalId,
        /// Shared field being read
        source: Ident,
    },

    /// Publish a value to a shared field
    SharedWrite {
        /// Shared field being written
        target: Ident,
        /// Value stored by the write
        data: LocalValue,
    },

    /// Observe the synchronization-order-latest write to a volatile field,
    /// storing the value seen into a target local
    VolatileRead {
        /// Local slot receiving the observed value
        target: LocalId,
        /// Volatile field being read
        source: Ident,
    },

    /// Publish a value to a volatile field
    VolatileWrite {
        /// Volatile field being written
        target: Ident,
        /// Value stored by the write
        data: LocalValue,
    },

    /// Copy a value into a target local
    Move {
        /// Local slot receiving the value
        target: LocalId,
        /// Value copied
        data: LocalValue,
    },

    /// Append a value to the thread's printed output tuple
    Print {
        /// Value printed
        arg: LocalValue,
    },
}

/// One lowered instruction together with the source line it came from.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Instruction {
    /// The operation this instruction performs
    pub kind: InstructionKind,
    /// Where in snippet source this instruction was lowered from
    pub loc: SourceLoc,
}

impl Instruction {
    /// Whether the memory model can observe this instruction.
    #[must_use]
    pub const fn is_action(&self) -> bool {
        matches!(
            self.kind,
            InstructionKind::Lock { .. }
                | InstructionKind::Unlock { .. }
                | InstructionKind::SharedRead { .. }
                | InstructionKind::SharedWrite { .. }
                | InstructionKind::VolatileRead { .. }
                | InstructionKind::VolatileWrite { .. }
        )
    }

    /// Whether this instruction participates in the synchronization order.
    #[must_use]
    pub const fn is_synchronization(&self) -> bool {
        matches!(
            self.kind,
            InstructionKind::Lock { .. }
                | InstructionKind::Unlock { .. }
                | InstructionKind::VolatileRead { .. }
                | InstructionKind::VolatileWrite { .. }
        )
    }

    /// Whether this instruction acquires a monitor.
    #[must_use]
    pub const fn is_lock(&self) -> bool {
        matches!(self.kind, InstructionKind::Lock { .. })
    }

    /// Whether this instruction releases a monitor.
    #[must_use]
    pub const fn is_unlock(&self) -> bool {
        matches!(self.kind, InstructionKind::Unlock { .. })
    }

    /// Whether this instruction reads a shared field.
    #[must_use]
    pub const fn is_shared_read(&self) -> bool {
        matches!(self.kind, InstructionKind::SharedRead { .. })
    }

    /// Whether this instruction writes a shared field.
    #[must_use]
    pub const fn is_shared_write(&self) -> bool {
        matches!(self.kind, InstructionKind::SharedWrite { .. })
    }

    /// Whether this instruction reads a volatile field.
    #[must_use]
    pub const fn is_volatile_read(&self) -> bool {
        matches!(self.kind, InstructionKind::VolatileRead { .. })
    }

    /// Whether this instruction writes a volatile field.
    #[must_use]
    pub const fn is_volatile_write(&self) -> bool {
        matches!(self.kind, InstructionKind::VolatileWrite { .. })
    }

    /// Whether this instruction observes a write, shared or volatile.
    #[must_use]
    pub const fn is_read(&self) -> bool {
        self.is_shared_read() || self.is_volatile_read()
    }

    /// Whether this instruction publishes a value, shared or volatile.
    #[must_use]
    pub const fn is_write(&self) -> bool {
        self.is_shared_write() || self.is_volatile_write()
    }

    /// The monitor a `Lock` or `Unlock` operates on.
    #[must_use]
    pub const fn monitor_name(&self) -> Option<&Ident> {
        match &self.kind {
            InstructionKind::Lock { monitor }
            | InstructionKind::Unlock { monitor } => Some(monitor),
            _ => None,
        }
    }

    /// The shared field a `SharedRead` or `SharedWrite` operates on.
    #[must_use]
    pub const fn shared_name(&self) -> Option<&Ident> {
        match &self.kind {
            InstructionKind::SharedRead { source: name, .. }
            | InstructionKind::SharedWrite { target: name, .. } => Some(name),
            _ => None,
        }
    }

    /// The volatile field a `VolatileRead` or `VolatileWrite` operates on.
    #[must_use]
    pub const fn volatile_name(&self) -> Option<&Ident> {
        match &self.kind {
            InstructionKind::VolatileRead { source: name, .. }
            | InstructionKind::VolatileWrite { target: name, .. } => Some(name),
            _ => None,
        }
    }
}
