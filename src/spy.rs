use std::fmt::Debug;
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::HsmError;

/// Observation hooks into the engine.
///
/// The two common uses are uniform logging and unit testing; dispatch
/// correctness never depends on a spy being attached. All methods default to
/// no-ops, so implementors override only what they care about.
pub trait Spy<C, E> {
    /// A node was entered.
    fn on_entry(&self, _node: &str, _ctx: &C) {}

    /// A node was exited.
    fn on_exit(&self, _node: &str, _ctx: &C) {}

    /// An action is about to run on the transition source `node`.
    fn action(&self, _node: &str, _ctx: &C, _event: &E, _action: &str) {}

    /// A named guard on `node` was evaluated.
    fn guard(&self, _node: &str, _ctx: &C, _event: &E, _guard: &str, _passed: bool) {}

    /// A transition declared on `node` was selected for `event`.
    fn event(&self, _node: &str, _ctx: &C, _event: &E) {}

    /// No transition anywhere in the active configuration handled `event`.
    fn no_transition(&self, _node: &str, _ctx: &C, _event: &E) {}

    /// An error not associated with an event.
    fn error(&self, _node: &str, _ctx: &C, _error: &HsmError) {}

    /// An error raised while processing `event`.
    fn event_error(&self, _node: &str, _ctx: &C, _event: &E, _error: &HsmError) {}
}

/// The default spy: errors and unhandled events go through `log`, everything
/// else is silent.
#[derive(Default, Clone, Copy)]
pub struct LogSpy;

impl<C, E: Debug> Spy<C, E> for LogSpy {
    fn no_transition(&self, node: &str, _ctx: &C, event: &E) {
        log::trace!("[{node}] no transition for {event:?}");
    }

    fn error(&self, node: &str, _ctx: &C, error: &HsmError) {
        log::error!("[{node}] {error}");
    }

    fn event_error(&self, node: &str, _ctx: &C, event: &E, error: &HsmError) {
        log::error!("[{node}] {error} (while handling {event:?})");
    }
}

/// Prints every callback to stdout, errors to stderr.
#[derive(Default, Clone, Copy)]
pub struct PrintingSpy;

impl<C, E: Debug> Spy<C, E> for PrintingSpy {
    fn on_entry(&self, node: &str, _ctx: &C) {
        println!("[{node}] [On-Entry]");
    }

    fn on_exit(&self, node: &str, _ctx: &C) {
        println!("[{node}] [On-Exit]");
    }

    fn action(&self, node: &str, _ctx: &C, _event: &E, action: &str) {
        println!("[{node}] [Action: {action}]");
    }

    fn guard(&self, node: &str, _ctx: &C, event: &E, guard: &str, passed: bool) {
        println!(
            "[{node}] [Event: {event:?}] [Guard: {guard}] [Status: {}]",
            if passed { "True" } else { "False" }
        );
    }

    fn event(&self, node: &str, _ctx: &C, event: &E) {
        println!("[{node}] [Event: {event:?}]");
    }

    fn no_transition(&self, node: &str, _ctx: &C, event: &E) {
        println!("[{node}] [No Transition: {event:?}]");
    }

    fn error(&self, node: &str, _ctx: &C, error: &HsmError) {
        eprintln!("[{node}] [Error] {error}");
    }

    fn event_error(&self, node: &str, _ctx: &C, event: &E, error: &HsmError) {
        eprintln!("[{node}] [Error] [Event: {event:?}] {error}");
    }
}

/// Records `OE-<name>` / `OX-<name>` strings for trace assertions. Clones
/// share the underlying buffer, so tests keep one handle and give another to
/// the machine.
#[derive(Default, Clone)]
pub struct TracingSpy {
    events: Arc<Mutex<Vec<String>>>,
}

impl TracingSpy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded trace.
    pub fn events(&self) -> Vec<String> {
        self.lock().clone()
    }

    /// Drains the recorded trace.
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.lock())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<String>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push(&self, prefix: &str, node: &str) {
        let mut tag = String::from(prefix);
        tag.push_str(node);
        self.lock().push(tag);
    }
}

impl<C, E: Debug> Spy<C, E> for TracingSpy {
    fn on_entry(&self, node: &str, _ctx: &C) {
        self.push("OE-", node);
    }

    fn on_exit(&self, node: &str, _ctx: &C) {
        self.push("OX-", node);
    }

    fn error(&self, node: &str, _ctx: &C, error: &HsmError) {
        log::error!("[{node}] {error}");
    }

    fn event_error(&self, node: &str, _ctx: &C, event: &E, error: &HsmError) {
        log::error!("[{node}] {error} (while handling {event:?})");
    }
}
