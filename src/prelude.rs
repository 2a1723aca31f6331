pub use crate::{
    // Components
    active::Active,
    active::Inactive,
    HistoryChildren,
    InitialChild,
    NodeKind,
    StateChildOf,
    StateChildren,
    // Core types
    error::HsmError,
    graph::StateGraph,
    machine::StateMachine,
    transitions::{EventSink, RowDecl, TransitionsBuilder},
    // Queues
    fifo::{EventFifo, QueueFifo, RingFifo},
    // Spies
    spy::{LogSpy, PrintingSpy, Spy, TracingSpy},
    // Traits
    event::HsmEvent,
};

// Derive macro; shares its name with the trait, serde-style.
pub use bevy_hsm_macros::HsmEvent;
