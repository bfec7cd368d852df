/// Operand-producer and transitive-read dependency tables computed before
/// the first execution
mod analysis;
/// Demand-driven evaluation of one candidate execution
mod eval;

use core::fmt;
use std::collections::{HashMap, HashSet};

use crate::{
    ArithmeticOp, Ident, Instruction, InstructionKind, LocalId, LocalValue,
    SourceLoc, VarKind,
};

/// The program of one logical thread together with its dependency analysis
/// and per-execution evaluation state.
///
/// A snippet is built instruction-by-instruction by the front-end through
/// the `emit_*` operations and is frozen once parsing completes.
/// [`Snippet::run_preexecution_analysis`] then computes the dependency
/// tables that drive lazy evaluation.  Each candidate execution starts with
/// [`Snippet::prepare_execution`], supplies the values observed by this
/// thread's reads, and collects written and printed values on demand; none
/// of this mutates the program itself.
#[derive(Debug)]
pub struct Snippet {
    /// Display name, typically the path of the source file
    name: String,
    /// Count of compiler temporaries allocated so far
    next_temporary: usize,
    /// Names of locals and compiler temporaries, in slot order
    locals: Vec<Ident>,
    /// Reverse lookup from local name to slot
    local_to_id: HashMap<Ident, LocalId>,
    /// Monitors this snippet locks or unlocks
    used_monitors: HashSet<Ident>,
    /// Shared fields this snippet reads or writes
    used_shareds: HashSet<Ident>,
    /// Volatile fields this snippet reads or writes
    used_volatiles: HashSet<Ident>,
    /// The lowered program, in source order
    instructions: Vec<Instruction>,
    /// Indices of the memory-model actions among `instructions`, in program
    /// order
    actions: Vec<usize>,

    /// Per instruction, the producing instruction of each non-literal
    /// operand in operand order; `None` reads the default zero
    argument_deps: Vec<Vec<Option<usize>>>,
    /// Per instruction, the sorted read instructions it transitively
    /// depends on
    trans_read_deps: Vec<Vec<usize>>,
    /// Action slot of each instruction, for the instructions that are
    /// actions
    instr_to_action: Vec<Option<usize>>,

    /// Which instructions have a cached value in the current execution
    evaluated: Vec<bool>,
    /// Cached instruction values, meaningful where `evaluated` is set
    values: Vec<i32>,
    /// Location of the first division by zero in the current execution
    zero_div: Option<SourceLoc>,
}

impl Snippet {
    /// An empty snippet with the given display name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            next_temporary: 0,
            locals: Vec::new(),
            local_to_id: HashMap::new(),
            used_monitors: HashSet::new(),
            used_shareds: HashSet::new(),
            used_volatiles: HashSet::new(),
            instructions: Vec::new(),
            actions: Vec::new(),
            argument_deps: Vec::new(),
            trans_read_deps: Vec::new(),
            instr_to_action: Vec::new(),
            evaluated: Vec::new(),
            values: Vec::new(),
            zero_div: None,
        }
    }

    /// The snippet's display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The lowered program in source order.
    #[must_use]
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Monitors this snippet locks or unlocks.
    #[must_use]
    pub const fn used_monitors(&self) -> &HashSet<Ident> {
        &self.used_monitors
    }

    /// Shared fields this snippet reads or writes.
    #[must_use]
    pub const fn used_shareds(&self) -> &HashSet<Ident> {
        &self.used_shareds
    }

    /// Volatile fields this snippet reads or writes.
    #[must_use]
    pub const fn used_volatiles(&self) -> &HashSet<Ident> {
        &self.used_volatiles
    }

    /// Number of memory-model actions in this snippet.
    #[must_use]
    pub fn action_count(&self) -> usize {
        self.actions.len()
    }

    /// The action at a program-order action slot.
    #[must_use]
    pub fn action(&self, action_index: usize) -> &Instruction {
        &self.instructions[self.actions[action_index]]
    }

    /// Action slots of this snippet's synchronization actions, in program
    /// order.
    #[must_use]
    pub fn synchronization_actions(&self) -> Vec<usize> {
        self.actions
            .iter()
            .enumerate()
            .filter(|&(_, &instr)| self.instructions[instr].is_synchronization())
            .map(|(slot, _)| slot)
            .collect()
    }

    /// Allocates a fresh compiler temporary in the local table.
    fn allocate_temporary(&mut self) -> LocalId {
        let temporary = format!("ct{}", self.next_temporary);
        self.next_temporary += 1;
        let local_id = self.locals.len();
        self.local_to_id.insert(temporary.clone(), local_id);
        self.locals.push(temporary);
        local_id
    }

    /// Slot of a source-named local, created on first use.
    fn local_slot(&mut self, name: &str) -> LocalId {
        if let Some(&local_id) = self.local_to_id.get(name) {
            local_id
        } else {
            let local_id = self.locals.len();
            self.local_to_id.insert(name.to_owned(), local_id);
            self.locals.push(name.to_owned());
            local_id
        }
    }

    /// Appends an instruction, recording it in the action list when the
    /// memory model can observe it.
    fn push_instruction(&mut self, kind: InstructionKind, loc: SourceLoc) {
        let instr = Instruction { kind, loc };
        if instr.is_action() {
            self.actions.push(self.instructions.len());
        }
        self.instructions.push(instr);
    }

    /// Lowers a read of `var_name`, returning the value read.
    ///
    /// A local read refers to the local's slot directly and emits nothing.
    /// A shared or volatile read allocates a fresh temporary, appends the
    /// read action targeting it, and refers to the temporary.
    #[allow(
        clippy::unreachable,
        reason = "name kinds are validated before lowering; a mis-kinded \
                  name here is a front-end bug, not an input error"
    )]
    pub fn emit_read(&mut self, var_name: &str, loc: SourceLoc) -> LocalValue {
        match VarKind::of(var_name) {
            Some(VarKind::Local) => {
                LocalValue::Local(self.local_slot(var_name))
            }
            Some(VarKind::Shared) => {
                self.used_shareds.insert(var_name.to_owned());
                let target = self.allocate_temporary();
                self.push_instruction(
                    InstructionKind::SharedRead {
                        target,
                        source: var_name.to_owned(),
                    },
                    loc,
                );
                LocalValue::Local(target)
            }
            Some(VarKind::Volatile) => {
                self.used_volatiles.insert(var_name.to_owned());
                let target = self.allocate_temporary();
                self.push_instruction(
                    InstructionKind::VolatileRead {
                        target,
                        source: var_name.to_owned(),
                    },
                    loc,
                );
                LocalValue::Local(target)
            }
            Some(VarKind::Monitor) | None => {
                unreachable!(
                    "the front-end only reads local, shared, and volatile \
                     names"
                )
            }
        }
    }

    /// Lowers a write of `data` into `target_name`: a `Move` for a local
    /// target, a write action for a shared or volatile target.
    #[allow(
        clippy::unreachable,
        reason = "name kinds are validated before lowering; a mis-kinded \
                  name here is a front-end bug, not an input error"
    )]
    pub fn emit_write(
        &mut self,
        target_name: &str,
        data: LocalValue,
        loc: SourceLoc,
    ) {
        match VarKind::of(target_name) {
            Some(VarKind::Local) => {
                let target = self.local_slot(target_name);
                self.push_instruction(
                    InstructionKind::Move { target, data },
                    loc,
                );
            }
            Some(VarKind::Shared) => {
                self.used_shareds.insert(target_name.to_owned());
                self.push_instruction(
                    InstructionKind::SharedWrite {
                        target: target_name.to_owned(),
                        data,
                    },
                    loc,
                );
            }
            Some(VarKind::Volatile) => {
                self.used_volatiles.insert(target_name.to_owned());
                self.push_instruction(
                    InstructionKind::VolatileWrite {
                        target: target_name.to_owned(),
                        data,
                    },
                    loc,
                );
            }
            Some(VarKind::Monitor) | None => {
                unreachable!(
                    "the front-end only writes local, shared, and volatile \
                     names"
                )
            }
        }
    }

    /// Lowers a read-modify-write of `target_name`.
    ///
    /// For a shared or volatile target this produces two distinct actions,
    /// the read and the write, so other threads may interleave between
    /// them; atomicity is not implied.
    pub fn emit_op_write(
        &mut self,
        target_name: &str,
        op: LocalValue,
        op_type: ArithmeticOp,
        loc: SourceLoc,
    ) {
        let original = self.emit_read(target_name, loc);
        let combined = self.emit_arithmetic(original, op, op_type, loc);
        self.emit_write(target_name, combined, loc);
    }

    /// Lowers one arithmetic operation into a fresh temporary, returning
    /// the value computed.
    pub fn emit_arithmetic(
        &mut self,
        op0: LocalValue,
        op1: LocalValue,
        op_type: ArithmeticOp,
        loc: SourceLoc,
    ) -> LocalValue {
        let target = self.allocate_temporary();
        self.push_instruction(
            InstructionKind::Arithmetic {
                target,
                op0,
                op: op_type,
                op1,
            },
            loc,
        );
        LocalValue::Local(target)
    }

    /// Lowers `object_name.method_name()`.  The only method calls in the
    /// language are `lock` and `unlock` on a monitor.
    #[allow(
        clippy::unreachable,
        reason = "the method set is validated before lowering; anything \
                  but lock() and unlock() is a front-end bug"
    )]
    pub fn emit_method_call(
        &mut self,
        object_name: &str,
        method_name: &str,
        loc: SourceLoc,
    ) {
        assert_eq!(
            VarKind::of(object_name),
            Some(VarKind::Monitor),
            "the front-end only calls methods on monitor names"
        );
        self.used_monitors.insert(object_name.to_owned());
        match method_name {
            "lock" => self.push_instruction(
                InstructionKind::Lock {
                    monitor: object_name.to_owned(),
                },
                loc,
            ),
            "unlock" => self.push_instruction(
                InstructionKind::Unlock {
                    monitor: object_name.to_owned(),
                },
                loc,
            ),
            _ => unreachable!(
                "the front-end only calls lock() and unlock() on monitors"
            ),
        }
    }

    /// Lowers `function_name(arg)`.  The only free function in the language
    /// is `print`.
    pub fn emit_static_call(
        &mut self,
        function_name: &str,
        arg: LocalValue,
        loc: SourceLoc,
    ) {
        assert_eq!(
            function_name, "print",
            "the front-end only calls the print function"
        );
        self.push_instruction(InstructionKind::Print { arg }, loc);
    }

    /// Renders an operand for the assembly-style listing.
    fn value_str(&self, value: LocalValue) -> String {
        match value {
            LocalValue::Literal(constant) => constant.to_string(),
            LocalValue::Local(local_id) => self.locals[local_id].clone(),
        }
    }
}

impl fmt::Display for Snippet {
    /// Formats the snippet as an assembly-style listing, one instruction
    /// per line.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for instr in &self.instructions {
            match &instr.kind {
                InstructionKind::Lock { monitor } => {
                    writeln!(f, "lock {monitor}")?;
                }
                InstructionKind::Unlock { monitor } => {
                    writeln!(f, "unlock {monitor}")?;
                }
                InstructionKind::Arithmetic {
                    target,
                    op0,
                    op,
                    op1,
                } => {
                    writeln!(
                        f,
                        "{} {}, {}, {}",
                        op.mnemonic(),
                        self.locals[*target],
                        self.value_str(*op0),
                        self.value_str(*op1)
                    )?;
                }
                InstructionKind::SharedRead { target, source } => {
                    writeln!(f, "sre {}, {source}", self.locals[*target])?;
                }
                InstructionKind::SharedWrite { target, data } => {
                    writeln!(f, "swr {}, {target}", self.value_str(*data))?;
                }
                InstructionKind::VolatileRead { target, source } => {
                    writeln!(f, "vre {}, {source}", self.locals[*target])?;
                }
                InstructionKind::VolatileWrite { target, data } => {
                    writeln!(f, "vwr {}, {target}", self.value_str(*data))?;
                }
                InstructionKind::Move { target, data } => {
                    writeln!(
                        f,
                        "mov {}, {}",
                        self.locals[*target],
                        self.value_str(*data)
                    )?;
                }
                InstructionKind::Print { arg } => {
                    writeln!(f, "print {}", self.value_str(*arg))?;
                }
            }
        }
        Ok(())
    }
}
