/// Maximum nesting depth of subroutine calls.
pub const STACK_DEPTH: usize = 16;

/// Fixed-capacity stack of return addresses.
#[derive(Debug, Clone, Default)]
pub struct CallStack {
    frames: [u16; STACK_DEPTH],
    len: usize,
}

impl CallStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes `addr`, returning false (and leaving the stack alone) when it is full.
    #[must_use]
    pub fn push(&mut self, addr: u16) -> bool {
        if self.is_full() {
            return false;
        }
        self.frames[self.len] = addr;
        self.len += 1;
        true
    }

    pub fn pop(&mut self) -> Option<u16> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        Some(self.frames[self.len])
    }

    #[cfg(test)]
    pub(crate) fn peek(&self) -> Option<u16> {
        self.len.checked_sub(1).map(|top| self.frames[top])
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == STACK_DEPTH
    }
}
