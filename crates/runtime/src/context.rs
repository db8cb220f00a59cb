//! Call context tracking.
//!
//! A [`ContextStack`] records which class's method is executing, innermost
//! last. Each thread of control owns its own stack and passes it explicitly
//! through every dispatch, so concurrent call chains never share one.

use crate::ClassId;
use std::ops::{Deref, DerefMut};

/// Stack of owner classes for the methods currently executing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextStack {
    frames: Vec<ClassId>,
}

impl ContextStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, owner: ClassId) {
        self.frames.push(owner);
    }

    /// Remove the innermost owner.
    ///
    /// Pops are paired with pushes by [`Frame`]; popping an empty stack means
    /// that pairing was broken. It is logged and otherwise a no-op.
    pub fn pop(&mut self) -> Option<ClassId> {
        let popped = self.frames.pop();
        if popped.is_none() {
            tracing::error!("call context stack underflow: pop without matching push");
        }
        popped
    }

    /// The class currently executing, or `None` outside any class context.
    pub fn current(&self) -> Option<ClassId> {
        self.frames.last().copied()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Owners from outermost to innermost.
    pub fn frames(&self) -> &[ClassId] {
        &self.frames
    }

    /// Push `owner` for the lifetime of the returned frame.
    ///
    /// The frame pops on drop, so the stack is restored whether the scope
    /// returns, propagates an error or unwinds.
    pub fn enter(&mut self, owner: ClassId) -> Frame<'_> {
        self.push(owner);
        tracing::trace!(owner = %owner, depth = self.depth(), "entered class frame");
        Frame { stack: self, owner }
    }
}

/// Scoped push on a [`ContextStack`].
///
/// Derefs to the stack so nested calls can run through it.
#[derive(Debug)]
pub struct Frame<'a> {
    stack: &'a mut ContextStack,
    owner: ClassId,
}

impl Frame<'_> {
    pub fn owner(&self) -> ClassId {
        self.owner
    }
}

impl Deref for Frame<'_> {
    type Target = ContextStack;

    fn deref(&self) -> &Self::Target {
        self.stack
    }
}

impl DerefMut for Frame<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.stack
    }
}

impl Drop for Frame<'_> {
    fn drop(&mut self) {
        match self.stack.pop() {
            Some(owner) if owner == self.owner => {
                tracing::trace!(owner = %owner, depth = self.stack.depth(), "left class frame");
            }
            Some(other) => {
                tracing::error!(
                    expected = %self.owner,
                    found = %other,
                    "call context stack out of sync on frame exit"
                );
            }
            None => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: usize) -> ClassId {
        ClassId::from_raw(n)
    }

    #[test]
    fn test_push_pop_current() {
        let mut stack = ContextStack::new();
        assert_eq!(stack.current(), None);

        stack.push(id(1));
        stack.push(id(2));
        assert_eq!(stack.current(), Some(id(2)));
        assert_eq!(stack.depth(), 2);

        assert_eq!(stack.pop(), Some(id(2)));
        assert_eq!(stack.current(), Some(id(1)));
        assert_eq!(stack.pop(), Some(id(1)));
        assert!(stack.is_empty());
    }

    #[test]
    fn test_pop_empty_is_noop() {
        let mut stack = ContextStack::new();
        assert_eq!(stack.pop(), None);
        assert!(stack.is_empty());
    }

    #[test]
    fn test_frames_nest_innermost_last() {
        let mut stack = ContextStack::new();
        {
            let mut a = stack.enter(id(1));
            {
                let mut b = a.enter(id(2));
                let c = b.enter(id(3));
                assert_eq!(c.current(), Some(id(3)));
                assert_eq!(c.frames(), &[id(1), id(2), id(3)]);
            }
            assert_eq!(a.current(), Some(id(1)));
        }
        assert!(stack.is_empty());
    }

    #[test]
    fn test_frame_pops_on_unwind() {
        let mut stack = ContextStack::new();
        stack.push(id(7));

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _frame = stack.enter(id(8));
            panic!("body failed");
        }));

        assert!(result.is_err());
        assert_eq!(stack.frames(), &[id(7)]);
    }
}
