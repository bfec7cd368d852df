use crate::{ArithmeticOp, InstructionKind, LocalValue, Snippet, SourceLoc};

/// The operand values of one instruction, extracted before combining so the
/// combining step is free to record a divide fault.
enum Extracted {
    /// An arithmetic instruction's operator and operand values
    Combine(ArithmeticOp, i32, i32),
    /// A value passed through unchanged (move, write, print)
    Direct(i32),
}

impl Snippet {
    /// Clears all cached values and the divide fault, returning the snippet
    /// to its pre-execution state.  Call once per candidate execution.
    pub fn prepare_execution(&mut self) {
        self.evaluated.clear();
        self.evaluated.resize(self.instructions.len(), false);
        self.values.clear();
        self.values.resize(self.instructions.len(), 0);
        self.zero_div = None;
    }

    /// Marks the read behind an action slot as evaluated to the value it
    /// observed.
    pub fn supply_read_value(&mut self, action_index: usize, value: i32) {
        let instr = self.actions[action_index];
        debug_assert!(
            self.instructions[instr].is_read(),
            "read values can only be supplied to read actions"
        );
        self.evaluated[instr] = true;
        self.values[instr] = value;
    }

    /// Evaluates the write behind an action slot and returns the value it
    /// stores.
    ///
    /// Check [`Snippet::divide_fault`] afterwards: a faulted evaluation
    /// returns a meaningless value.
    pub fn read_write(&mut self, action_index: usize) -> i32 {
        let instr = self.actions[action_index];
        debug_assert!(
            self.instructions[instr].is_write(),
            "only write actions store a value"
        );
        self.request_eval(instr);
        self.values[instr]
    }

    /// Action slots of the reads whose values must be supplied before the
    /// write behind `action_index` can be evaluated.
    #[must_use]
    pub fn write_dependencies(&self, action_index: usize) -> Vec<usize> {
        let instr = self.actions[action_index];
        // reads are actions, so each read dependency has an action slot
        self.trans_read_deps[instr]
            .iter()
            .filter_map(|&read| self.instr_to_action[read])
            .collect()
    }

    /// Evaluates every print in program order and returns the printed
    /// values.
    ///
    /// Stops at the first divide fault; check [`Snippet::divide_fault`] to
    /// tell a complete output tuple from a truncated one.
    pub fn execution_results(&mut self) -> Vec<i32> {
        let mut printed = Vec::new();
        for i in 0..self.instructions.len() {
            if matches!(self.instructions[i].kind, InstructionKind::Print { .. })
            {
                self.request_eval(i);
                if self.zero_div.is_some() {
                    break;
                }
                printed.push(self.values[i]);
            }
        }
        printed
    }

    /// Location of the first division by zero in the current execution, if
    /// any.  A faulted snippet stays faulted until
    /// [`Snippet::prepare_execution`].
    #[must_use]
    pub const fn divide_fault(&self) -> Option<SourceLoc> {
        self.zero_div
    }

    /// Evaluates an instruction and everything it transitively needs.
    ///
    /// Dependency chains can be as long as the program, so this walks an
    /// explicit work stack instead of recursing.
    fn request_eval(&mut self, instr: usize) {
        let mut work = vec![instr];
        while let Some(&top) = work.last() {
            if self.zero_div.is_some() {
                return;
            }
            if self.evaluated[top] {
                work.pop();
                continue;
            }
            let mut inputs_ready = true;
            for &producer in self.argument_deps[top].iter() {
                if let Some(producer) = producer {
                    if !self.evaluated[producer] {
                        work.push(producer);
                        inputs_ready = false;
                    }
                }
            }
            if inputs_ready {
                self.exec_eval(top);
                work.pop();
            }
        }
    }

    /// Computes the value of one instruction from already-evaluated inputs.
    fn exec_eval(&mut self, instr: usize) {
        let loc = self.instructions[instr].loc;
        let extracted = match self.instructions[instr].kind {
            InstructionKind::Arithmetic { op0, op, op1, .. } => {
                let mut producers = self.argument_deps[instr].iter().copied();
                let v0 = self.operand_value(op0, &mut producers);
                let v1 = self.operand_value(op1, &mut producers);
                Extracted::Combine(op, v0, v1)
            }
            InstructionKind::Move { data, .. }
            | InstructionKind::SharedWrite { data, .. }
            | InstructionKind::VolatileWrite { data, .. }
            | InstructionKind::Print { arg: data } => {
                let mut producers = self.argument_deps[instr].iter().copied();
                Extracted::Direct(self.operand_value(data, &mut producers))
            }
            InstructionKind::SharedRead { .. }
            | InstructionKind::VolatileRead { .. } => {
                debug_assert!(
                    false,
                    "read values are supplied from the outside, never \
                     computed"
                );
                Extracted::Direct(0)
            }
            InstructionKind::Lock { .. } | InstructionKind::Unlock { .. } => {
                debug_assert!(false, "monitor actions have no value");
                Extracted::Direct(0)
            }
        };
        let value = match extracted {
            Extracted::Combine(op, v0, v1) => self.combine(op, v0, v1, loc),
            Extracted::Direct(value) => value,
        };
        self.values[instr] = value;
        self.evaluated[instr] = true;
    }

    /// Applies one arithmetic operator, recording a divide fault on a zero
    /// divisor.
    #[allow(clippy::cast_possible_truncation)]
    fn combine(
        &mut self,
        op: ArithmeticOp,
        v0: i32,
        v1: i32,
        loc: SourceLoc,
    ) -> i32 {
        match op {
            ArithmeticOp::Add => v0.wrapping_add(v1),
            ArithmeticOp::Sub => v0.wrapping_sub(v1),
            ArithmeticOp::Mul => v0.wrapping_mul(v1),
            ArithmeticOp::Div | ArithmeticOp::Rem if v1 == 0 => {
                self.zero_div.get_or_insert(loc);
                0
            }
            // 64-bit intermediates keep i32::MIN / -1 in range until the
            // result is narrowed back to 32 bits
            ArithmeticOp::Div => (i64::from(v0) / i64::from(v1)) as i32,
            ArithmeticOp::Rem => (i64::from(v0) % i64::from(v1)) as i32,
            ArithmeticOp::Or => v0 | v1,
            ArithmeticOp::Xor => v0 ^ v1,
            ArithmeticOp::And => v0 & v1,
        }
    }

    /// Value of one operand, consuming its producer entry when the operand
    /// is a local.
    #[allow(clippy::cast_possible_wrap)]
    fn operand_value(
        &self,
        operand: LocalValue,
        producers: &mut impl Iterator<Item = Option<usize>>,
    ) -> i32 {
        match operand {
            LocalValue::Literal(constant) => constant as i32,
            LocalValue::Local(_) => match producers.next().flatten() {
                Some(producer) => self.values[producer],
                // a local that was never written holds the default zero
                None => 0,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use coverage_helper::test;

    use crate::{ArithmeticOp, LocalValue, Snippet, SourceLoc};

    /// Emits `print(op0 <op> op1)` with literal operands on the given line.
    fn print_binary(
        snp: &mut Snippet,
        op0: u32,
        op: ArithmeticOp,
        op1: u32,
        line: u32,
    ) {
        let loc = SourceLoc::new(line);
        let combined = snp.emit_arithmetic(
            LocalValue::Literal(op0),
            LocalValue::Literal(op1),
            op,
            loc,
        );
        snp.emit_static_call("print", combined, loc);
    }

    fn results(snp: &mut Snippet) -> Vec<i32> {
        snp.run_preexecution_analysis();
        snp.prepare_execution();
        snp.execution_results()
    }

    #[test]
    fn straight_line_arithmetic() {
        let mut snp = Snippet::new("t");
        print_binary(&mut snp, 41, ArithmeticOp::Add, 1, 1);
        print_binary(&mut snp, 6, ArithmeticOp::Mul, 7, 1);
        print_binary(&mut snp, 65, ArithmeticOp::Rem, 7, 1);
        print_binary(&mut snp, 400, ArithmeticOp::Div, 10, 1);
        print_binary(&mut snp, 6, ArithmeticOp::Xor, 3, 1);
        assert_eq!(results(&mut snp), vec![42, 42, 2, 40, 5]);
        assert_eq!(snp.divide_fault(), None);
    }

    #[test]
    fn add_and_mul_wrap() {
        let mut snp = Snippet::new("t");
        print_binary(&mut snp, u32::MAX, ArithmeticOp::Add, 1, 1);
        print_binary(&mut snp, 0, ArithmeticOp::Sub, 1, 1);
        print_binary(&mut snp, 0x8000_0000, ArithmeticOp::Mul, 2, 1);
        assert_eq!(results(&mut snp), vec![0, -1, 0]);
    }

    #[test]
    fn division_uses_wide_intermediates() {
        let mut snp = Snippet::new("t");
        print_binary(&mut snp, 0x8000_0000, ArithmeticOp::Div, u32::MAX, 1);
        print_binary(&mut snp, 0x8000_0000, ArithmeticOp::Rem, u32::MAX, 1);
        // i32::MIN / -1 narrows back to i32::MIN instead of faulting
        assert_eq!(results(&mut snp), vec![i32::MIN, 0]);
        assert_eq!(snp.divide_fault(), None);
    }

    #[test]
    fn zero_divisor_faults_with_the_line() {
        let mut snp = Snippet::new("t");
        print_binary(&mut snp, 1, ArithmeticOp::Add, 1, 1);
        print_binary(&mut snp, 7, ArithmeticOp::Div, 0, 2);
        print_binary(&mut snp, 9, ArithmeticOp::Add, 9, 3);
        let printed = results(&mut snp);
        // output stops at the faulting print
        assert_eq!(printed, vec![2]);
        assert_eq!(snp.divide_fault(), Some(SourceLoc::new(2)));
    }

    #[test]
    fn zero_remainder_faults_too() {
        let mut snp = Snippet::new("t");
        print_binary(&mut snp, 7, ArithmeticOp::Rem, 0, 5);
        assert_eq!(results(&mut snp), vec![]);
        assert_eq!(snp.divide_fault(), Some(SourceLoc::new(5)));
    }

    #[test]
    fn supplied_reads_feed_downstream_arithmetic() {
        let loc = SourceLoc::new(1);
        let mut snp = Snippet::new("t");
        let seen = snp.emit_read("sx", loc);
        let sum = snp.emit_arithmetic(
            seen,
            LocalValue::Literal(2),
            ArithmeticOp::Add,
            loc,
        );
        snp.emit_write("sy", sum, loc);
        snp.emit_static_call("print", sum, loc);
        snp.run_preexecution_analysis();

        snp.prepare_execution();
        assert_eq!(
            snp.write_dependencies(1),
            vec![0],
            "the write to sy needs the value read from sx"
        );
        snp.supply_read_value(0, 40);
        assert_eq!(snp.read_write(1), 42);
        assert_eq!(snp.execution_results(), vec![42]);
    }

    #[test]
    fn executions_reset_cleanly() {
        let loc = SourceLoc::new(1);
        let mut snp = Snippet::new("t");
        let seen = snp.emit_read("sx", loc);
        snp.emit_static_call("print", seen, loc);
        snp.run_preexecution_analysis();

        snp.prepare_execution();
        snp.supply_read_value(0, 1);
        assert_eq!(snp.execution_results(), vec![1]);

        snp.prepare_execution();
        snp.supply_read_value(0, 2);
        assert_eq!(snp.execution_results(), vec![2]);

        // the same supplies produce the same outputs after another reset
        snp.prepare_execution();
        snp.supply_read_value(0, 2);
        assert_eq!(snp.execution_results(), vec![2]);
    }

    #[test]
    fn unsupplied_read_defaults_to_zero_via_missing_producer() {
        let loc = SourceLoc::new(1);
        let mut snp = Snippet::new("t");
        let never_written = snp.emit_read("lx", loc);
        snp.emit_static_call("print", never_written, loc);
        snp.run_preexecution_analysis();
        snp.prepare_execution();
        assert_eq!(snp.execution_results(), vec![0]);
    }

    #[test]
    fn deep_dependency_chains_use_the_work_stack() {
        let loc = SourceLoc::new(1);
        let mut snp = Snippet::new("t");
        snp.emit_write("l0", LocalValue::Literal(1), loc);
        for _ in 0..2048_usize {
            snp.emit_op_write(
                "l0",
                LocalValue::Literal(1),
                ArithmeticOp::Add,
                loc,
            );
        }
        let total = snp.emit_read("l0", loc);
        snp.emit_static_call("print", total, loc);
        assert_eq!(results(&mut snp), vec![2049]);
    }
}
