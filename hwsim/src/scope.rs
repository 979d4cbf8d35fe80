//! Thread-local clock/reset scope stacks (`SPEC_FULL.md` §4.1, §4.3, §9 "Ambient scope").
//!
//! Register and memory-port construction need to bind to "the clock/reset currently in effect"
//! without threading it through every factory call. Each thread gets its own LIFO stack of
//! clock/reset node ids; pushing binds a new ambient value, popping restores the previous one.
//! [`ClockScope`]/[`ResetScope`] wrap that push/pop pair in a drop guard so a scope can't be
//! left open by an early return or a `?`.

use std::cell::RefCell;

use hwsim_types::NodeId;

thread_local! {
    static CLOCK_STACK: RefCell<Vec<NodeId>> = const { RefCell::new(Vec::new()) };
    static RESET_STACK: RefCell<Vec<NodeId>> = const { RefCell::new(Vec::new()) };
}

/// Push `clock` as the ambient clock for this thread.
pub fn push_clock(clock: NodeId) {
    CLOCK_STACK.with(|stack| stack.borrow_mut().push(clock));
}

/// Pop the most recently pushed ambient clock, if any.
pub fn pop_clock() -> Option<NodeId> {
    CLOCK_STACK.with(|stack| stack.borrow_mut().pop())
}

/// The current ambient clock for this thread, or `None` if the stack is empty.
pub fn current_clock() -> Option<NodeId> {
    CLOCK_STACK.with(|stack| stack.borrow().last().copied())
}

/// Push `reset` as the ambient reset for this thread.
pub fn push_reset(reset: NodeId) {
    RESET_STACK.with(|stack| stack.borrow_mut().push(reset));
}

/// Pop the most recently pushed ambient reset, if any.
pub fn pop_reset() -> Option<NodeId> {
    RESET_STACK.with(|stack| stack.borrow_mut().pop())
}

/// The current ambient reset for this thread, or `None` if the stack is empty.
pub fn current_reset() -> Option<NodeId> {
    RESET_STACK.with(|stack| stack.borrow().last().copied())
}

/// RAII guard releasing a pushed clock scope on drop.
#[derive(Debug)]
#[must_use = "dropping this immediately pops the clock scope it just pushed"]
pub struct ClockScope {
    _private: (),
}

impl ClockScope {
    pub(crate) fn enter(clock: NodeId) -> Self {
        push_clock(clock);
        Self { _private: () }
    }
}

impl Drop for ClockScope {
    fn drop(&mut self) {
        pop_clock();
    }
}

/// RAII guard releasing a pushed reset scope on drop.
#[derive(Debug)]
#[must_use = "dropping this immediately pops the reset scope it just pushed"]
pub struct ResetScope {
    _private: (),
}

impl ResetScope {
    pub(crate) fn enter(reset: NodeId) -> Self {
        push_reset(reset);
        Self { _private: () }
    }
}

impl Drop for ResetScope {
    fn drop(&mut self) {
        pop_reset();
    }
}
