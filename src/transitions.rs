use std::sync::Arc;

use bevy::platform::collections::HashMap;
use bevy::prelude::*;

use crate::event::HsmEvent;

/// Lets actions defer events onto the owning machine's queue. Deferred
/// events are processed after the current run-to-completion cycle; dispatch
/// is never re-entered from inside an action.
pub struct EventSink<E> {
    pub(crate) pending: Vec<E>,
}

impl<E> EventSink<E> {
    pub(crate) fn new() -> Self {
        Self {
            pending: Vec::new(),
        }
    }

    /// Enqueue `event` behind any events already waiting.
    pub fn post(&mut self, event: E) {
        self.pending.push(event);
    }
}

pub(crate) struct Action<C, E> {
    pub name: &'static str,
    pub run: Arc<dyn Fn(&mut C, &E, &mut EventSink<E>) + Send + Sync>,
}

impl<C, E> Clone for Action<C, E> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            run: Arc::clone(&self.run),
        }
    }
}

pub(crate) struct Guard<C, E> {
    pub name: &'static str,
    pub test: Arc<dyn Fn(&C, &E) -> bool + Send + Sync>,
}

impl<C, E> Clone for Guard<C, E> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            test: Arc::clone(&self.test),
        }
    }
}

/// One resolved transition-table row. `dst == None` marks an internal
/// transition; otherwise `lca`, `lca_region` and `src_region` are cached at
/// init so dispatch never walks the tree to find them.
pub(crate) struct Row<C, E> {
    pub src: Entity,
    pub dst: Option<Entity>,
    pub actions: Vec<Action<C, E>>,
    pub guard: Option<Guard<C, E>>,
    pub lca: Option<Entity>,
    pub lca_region: Option<Entity>,
    pub src_region: Entity,
}

impl<C, E> Clone for Row<C, E> {
    fn clone(&self) -> Self {
        Self {
            src: self.src,
            dst: self.dst,
            actions: self.actions.clone(),
            guard: self.guard.clone(),
            lca: self.lca,
            lca_region: self.lca_region,
            src_region: self.src_region,
        }
    }
}

/// A row as declared by the client, before the LCA and region caches are
/// resolved. Returned by [`TransitionsBuilder::row`] for chaining actions
/// and a guard onto it.
pub struct RowDecl<C, E> {
    pub(crate) event: E,
    pub(crate) dst: Option<Entity>,
    pub(crate) actions: Vec<Action<C, E>>,
    pub(crate) guard: Option<Guard<C, E>>,
}

impl<C, E> RowDecl<C, E> {
    /// Appends an action; actions run in declaration order once the row is
    /// selected.
    pub fn action(
        &mut self,
        name: &'static str,
        run: impl Fn(&mut C, &E, &mut EventSink<E>) + Send + Sync + 'static,
    ) -> &mut Self {
        self.actions.push(Action {
            name,
            run: Arc::new(run),
        });
        self
    }

    /// Sets the row's guard. A row without a guard always passes.
    pub fn guard(
        &mut self,
        name: &'static str,
        test: impl Fn(&C, &E) -> bool + Send + Sync + 'static,
    ) -> &mut Self {
        self.guard = Some(Guard {
            name,
            test: Arc::new(test),
        });
        self
    }
}

/// Collects one node's transition rows. Rows for the same event are
/// evaluated top-down and the first whose guard passes wins.
pub struct TransitionsBuilder<C, E> {
    pub(crate) rows: Vec<RowDecl<C, E>>,
}

impl<C, E: HsmEvent> TransitionsBuilder<C, E> {
    /// A transition to `dst` on `event`. A destination equal to the
    /// declaring node is a self-transition (exit then re-entry).
    pub fn row(&mut self, event: E, dst: Entity) -> &mut RowDecl<C, E> {
        self.push(RowDecl {
            event,
            dst: Some(dst),
            actions: Vec::new(),
            guard: None,
        })
    }

    /// An internal transition: actions run without any exit or entry.
    pub fn internal(&mut self, event: E) -> &mut RowDecl<C, E> {
        self.push(RowDecl {
            event,
            dst: None,
            actions: Vec::new(),
            guard: None,
        })
    }

    fn push(&mut self, decl: RowDecl<C, E>) -> &mut RowDecl<C, E> {
        let index = self.rows.len();
        self.rows.push(decl);
        &mut self.rows[index]
    }
}

/// Per-node transition table, rebuilt on every init.
#[derive(Component)]
pub(crate) struct TransitionTable<C: 'static, E: HsmEvent> {
    pub rows: HashMap<E, Vec<Row<C, E>>>,
}

impl<C: 'static, E: HsmEvent> Default for TransitionTable<C, E> {
    fn default() -> Self {
        Self {
            rows: HashMap::default(),
        }
    }
}

/// The client's table-builder closure, run by `init` to populate the node's
/// [`TransitionTable`].
#[derive(Component)]
pub(crate) struct TableInit<C: 'static, E: 'static>(
    pub Box<dyn Fn(&mut TransitionsBuilder<C, E>) + Send + Sync>,
);
