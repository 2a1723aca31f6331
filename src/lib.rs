//! Deterministic UML hierarchical state machines on `bevy_ecs`.
//!
//! A [`StateGraph`](graph::StateGraph) declares a tree of states — leaves,
//! composites, orthogonal nodes with concurrent regions, and history
//! pseudostates — where every state is an [`Entity`] and all per-state data
//! lives in components. A [`StateMachine`](machine::StateMachine) wraps the
//! tree in a synthetic `Top` region, validates it, and dispatches events with
//! run-to-completion semantics: entry and exit chains, completion
//! (anonymous) transitions, shallow and deep history reconstruction, and a
//! deferred event queue.
//!
//! The machine owns its [`World`] and is a plain value: dispatch is
//! synchronous and single-threaded, so it can be driven from anywhere —
//! including a system in a larger bevy app.

use bevy::prelude::*;

pub mod active;
pub mod diagram;
pub mod error;
pub mod event;
pub mod fifo;
pub mod graph;
pub mod machine;
pub mod prelude;
pub mod spy;
pub mod transitions;

pub use bevy_hsm_macros::HsmEvent;

pub use crate::error::HsmError;
pub use crate::event::HsmEvent;
pub use crate::graph::StateGraph;
pub use crate::machine::StateMachine;

// State-specific hierarchy relationships.
#[derive(Component, Default, Debug, PartialEq, Eq)]
#[relationship_target(relationship = StateChildOf, linked_spawn)]
pub struct StateChildren(Vec<Entity>);

impl StateChildren {
    pub fn iter(&self) -> impl Iterator<Item = Entity> + '_ {
        self.0.iter().copied()
    }
}

impl<'a> IntoIterator for &'a StateChildren {
    type Item = <Self::IntoIter as Iterator>::Item;

    type IntoIter = std::slice::Iter<'a, Entity>;

    #[inline(always)]
    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[derive(Component, Clone, PartialEq, Eq, Debug)]
#[relationship(relationship_target = StateChildren)]
pub struct StateChildOf(pub Entity);

/// What a state entity is. The engine's per-kind behavior (entry, exit,
/// candidate collection, diagram emission) pattern-matches on this.
#[derive(Component, Clone, Copy, PartialEq, Eq, Debug)]
pub enum NodeKind {
    Leaf,
    Composite,
    Orthogonal,
    Region,
    ShallowHistory,
    DeepHistory,
}

impl NodeKind {
    pub fn is_history(self) -> bool {
        matches!(self, Self::ShallowHistory | Self::DeepHistory)
    }
}

/// The substate a Composite or Region enters by default.
#[derive(Component, Clone, Copy, PartialEq, Eq, Debug)]
pub struct InitialChild(pub Entity);

/// The two history pseudostates every Composite owns; valid only as
/// transition destinations.
#[derive(Component, Clone, Copy, Debug)]
pub struct HistoryChildren {
    pub shallow: Entity,
    pub deep: Entity,
}

/// History bookkeeping: the child that was active when this Composite or
/// Region was last exited (its initial child until then).
#[derive(Component, Clone, Copy, Default, Debug)]
pub(crate) struct LastActive(pub Option<Entity>);

/// A Region's active branch. Points at the region itself while nothing is
/// entered.
#[derive(Component, Clone, Copy, Debug)]
pub(crate) struct CurrentNode(pub Entity);

/// Depth of a Region: 1 for the synthetic Top, plus one per ancestor of any
/// kind. Smaller levels reach further outward; the candidate filter compares
/// these.
#[derive(Component, Clone, Copy, Default, Debug)]
pub(crate) struct RegionLevel(pub u32);

pub(crate) fn parent_of(world: &World, node: Entity) -> Option<Entity> {
    world.get::<StateChildOf>(node).map(|p| p.0)
}

pub(crate) fn kind_of(world: &World, node: Entity) -> Option<NodeKind> {
    world.get::<NodeKind>(node).copied()
}

pub(crate) fn node_name(world: &World, node: Entity) -> &str {
    world.get::<Name>(node).map(|n| n.as_str()).unwrap_or("?")
}

/// Lowest common ancestor of `src` and `dst`.
///
/// When one is an ancestor of the other, that ancestor is the LCA (the UML
/// internal-transition convention). When `src == dst`, the answer is the
/// parent, so a self-transition exits and re-enters the node.
pub(crate) fn find_lca(world: &World, src: Option<Entity>, dst: Option<Entity>) -> Option<Entity> {
    let (src, dst) = (src?, dst?);

    if src == dst {
        return parent_of(world, src);
    }

    let mut down = Some(dst);
    while let Some(d) = down {
        let mut up = Some(src);
        while let Some(s) = up {
            if s == d {
                return Some(s);
            }
            up = parent_of(world, s);
        }
        down = parent_of(world, d);
    }

    None
}

/// Nearest Region in the ancestor chain of `node`, including `node` itself.
pub(crate) fn nearest_region(world: &World, node: Entity) -> Option<Entity> {
    let mut cursor = Some(node);
    while let Some(n) = cursor {
        if kind_of(world, n) == Some(NodeKind::Region) {
            return Some(n);
        }
        cursor = parent_of(world, n);
    }
    None
}

pub(crate) fn max_depth(world: &World, node: Entity, depth: usize) -> usize {
    let Some(children) = world.get::<StateChildren>(node) else {
        return depth;
    };

    let mut max = depth;
    for child in children.iter() {
        max = max.max(max_depth(world, child, depth + 1));
    }
    max
}

pub(crate) fn collect_subtree(world: &World, node: Entity, out: &mut Vec<Entity>) {
    out.push(node);
    if let Some(children) = world.get::<StateChildren>(node) {
        for child in children.iter() {
            collect_subtree(world, child, out);
        }
    }
}
