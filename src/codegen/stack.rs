use super::instr::Instr;

/// Running operand-stack depth for one method, with its high-water mark.
#[derive(Debug, Default, Clone)]
pub struct StackDepth {
    current: u32,
    max: u32,
}

impl StackDepth {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, n: u32) {
        self.current += n;
        if self.current > self.max {
            self.max = self.current;
        }
    }

    /// Only feeds `.limit stack`; never checked against it.
    pub fn pop(&mut self, n: u32) {
        self.current = self.current.saturating_sub(n);
    }

    /// Account for one emitted instruction.
    pub fn apply(&mut self, instr: &Instr) {
        let (popped, pushed) = instr.stack_effect();
        self.pop(popped);
        self.push(pushed);
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    pub fn max(&self) -> u32 {
        self.max
    }
}
