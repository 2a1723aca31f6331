use std::marker::PhantomData;

use bevy::prelude::*;

use crate::event::HsmEvent;
use crate::transitions::{TableInit, TransitionsBuilder};
use crate::{
    find_lca, max_depth, CurrentNode, HistoryChildren, InitialChild, LastActive, NodeKind,
    RegionLevel, StateChildOf,
};

pub(crate) type HookFn<C> = Box<dyn Fn(&mut C) + Send + Sync>;

/// Optional entry/exit hooks attached to a state.
#[derive(Component)]
pub(crate) struct EntryHooks<C: 'static> {
    pub on_entry: Option<HookFn<C>>,
    pub on_exit: Option<HookFn<C>>,
}

impl<C> Default for EntryHooks<C> {
    fn default() -> Self {
        Self {
            on_entry: None,
            on_exit: None,
        }
    }
}

/// Declares a state tree: create nodes, receive handles, then wire initial
/// children, transition rules and hooks against those handles. Forward
/// references are never a problem because transition rules are closures run
/// at init time, when every handle exists.
///
/// Consumed by [`StateMachine::new`](crate::machine::StateMachine::new).
pub struct StateGraph<C, E> {
    pub(crate) world: World,
    _marker: PhantomData<fn() -> (C, E)>,
}

impl<C: 'static, E: HsmEvent> StateGraph<C, E> {
    pub fn new() -> Self {
        Self {
            world: World::new(),
            _marker: PhantomData,
        }
    }

    /// A state with no substates.
    pub fn leaf(&mut self, name: &str, parent: Option<Entity>) -> Entity {
        self.spawn_node(name, NodeKind::Leaf, parent)
    }

    /// A state with exactly one active substate at a time. Owns a shallow
    /// and a deep history pseudostate, reachable through
    /// [`shallow_history`](Self::shallow_history) /
    /// [`deep_history`](Self::deep_history).
    pub fn composite(&mut self, name: &str, parent: Option<Entity>) -> Entity {
        let node = self.spawn_node(name, NodeKind::Composite, parent);
        let shallow = self.spawn_node("ShallowHistory", NodeKind::ShallowHistory, Some(node));
        let deep = self.spawn_node("DeepHistory", NodeKind::DeepHistory, Some(node));
        self.world
            .entity_mut(node)
            .insert(HistoryChildren { shallow, deep });
        node
    }

    /// A state whose child regions are all active concurrently. Entering it
    /// enters every region; it has no initial child of its own.
    pub fn orthogonal(&mut self, name: &str, parent: Option<Entity>) -> Entity {
        self.spawn_node(name, NodeKind::Orthogonal, parent)
    }

    /// One concurrent branch of an orthogonal state. Never a valid
    /// transition destination.
    pub fn region(&mut self, name: &str, parent: Option<Entity>) -> Entity {
        let node = self.spawn_node(name, NodeKind::Region, parent);
        self.world
            .entity_mut(node)
            .insert((CurrentNode(node), RegionLevel(0)));
        node
    }

    /// Declares the substate `node` enters by default. Required on every
    /// Composite and Region.
    pub fn set_initial(&mut self, node: Entity, child: Entity) {
        self.world
            .entity_mut(node)
            .insert((InitialChild(child), LastActive(Some(child))));
    }

    pub fn shallow_history(&self, composite: Entity) -> Option<Entity> {
        self.world
            .get::<HistoryChildren>(composite)
            .map(|h| h.shallow)
    }

    pub fn deep_history(&self, composite: Entity) -> Option<Entity> {
        self.world.get::<HistoryChildren>(composite).map(|h| h.deep)
    }

    /// Registers `node`'s transition rules. The closure runs on every init;
    /// rows are matched in declaration order.
    pub fn transitions(
        &mut self,
        node: Entity,
        rules: impl Fn(&mut TransitionsBuilder<C, E>) + Send + Sync + 'static,
    ) {
        self.world
            .entity_mut(node)
            .insert(TableInit::<C, E>(Box::new(rules)));
    }

    /// Runs whenever `node` is entered.
    pub fn on_entry(&mut self, node: Entity, hook: impl Fn(&mut C) + Send + Sync + 'static) {
        let mut entity = self.world.entity_mut(node);
        if let Some(mut hooks) = entity.get_mut::<EntryHooks<C>>() {
            hooks.on_entry = Some(Box::new(hook));
        } else {
            entity.insert(EntryHooks::<C> {
                on_entry: Some(Box::new(hook)),
                on_exit: None,
            });
        }
    }

    /// Runs whenever `node` is exited.
    pub fn on_exit(&mut self, node: Entity, hook: impl Fn(&mut C) + Send + Sync + 'static) {
        let mut entity = self.world.entity_mut(node);
        if let Some(mut hooks) = entity.get_mut::<EntryHooks<C>>() {
            hooks.on_exit = Some(Box::new(hook));
        } else {
            entity.insert(EntryHooks::<C> {
                on_entry: None,
                on_exit: Some(Box::new(hook)),
            });
        }
    }

    /// Lowest common ancestor of `a` and `b`; `lca(x, x)` is the parent of
    /// `x`, so self-transitions exit and re-enter.
    pub fn lca(&self, a: Entity, b: Entity) -> Option<Entity> {
        find_lca(&self.world, Some(a), Some(b))
    }

    /// Maximum depth of the subtree rooted at `node`, counting `node` as 1.
    pub fn depth(&self, node: Entity) -> usize {
        max_depth(&self.world, node, 1)
    }

    fn spawn_node(&mut self, name: &str, kind: NodeKind, parent: Option<Entity>) -> Entity {
        let node = self
            .world
            .spawn((Name::new(name.to_owned()), kind, LastActive(None)))
            .id();
        if let Some(parent) = parent {
            self.world.entity_mut(node).insert(StateChildOf(parent));
        }
        node
    }
}

impl<C: 'static, E: HsmEvent> Default for StateGraph<C, E> {
    fn default() -> Self {
        Self::new()
    }
}
