use std::collections::VecDeque;
use std::fmt;

use bevy::prelude::*;

use crate::active::{Active, Inactive};
use crate::diagram;
use crate::error::HsmError;
use crate::event::HsmEvent;
use crate::fifo::{EventFifo, QueueFifo};
use crate::graph::{EntryHooks, StateGraph};
use crate::spy::{LogSpy, Spy};
use crate::transitions::{
    Action, EventSink, Guard, Row, TableInit, TransitionTable, TransitionsBuilder,
};
use crate::{
    collect_subtree, find_lca, kind_of, max_depth, nearest_region, node_name, parent_of,
    CurrentNode, InitialChild, LastActive, NodeKind, RegionLevel, StateChildOf, StateChildren,
};

/// Failsafe ceiling for the region level walk.
const MAX_LEVEL: u32 = 1_000_000;

/// A hierarchical state machine over a declared [`StateGraph`].
///
/// The machine owns the tree's `World` and the client context, wraps the
/// attached root in a synthetic `Top` region, and dispatches events with
/// run-to-completion semantics. [`init`](Self::init) must succeed before
/// anything else works.
pub struct StateMachine<C: 'static, E: HsmEvent> {
    name: String,
    world: World,
    root: Entity,
    top: Entity,
    ctx: C,
    spy: Box<dyn Spy<C, E>>,
    fifo: Box<dyn EventFifo<E>>,
    initialized: bool,
    all_nodes: Vec<Entity>,
    transitions: Vec<Row<C, E>>,
    entry_path: Vec<Entity>,
}

impl<C: 'static, E: HsmEvent> StateMachine<C, E> {
    /// Wraps `root` (a node of `graph`) in the synthetic Top region.
    /// [`init`](Self::init) must still be called before events are handled.
    pub fn new(name: impl Into<String>, graph: StateGraph<C, E>, root: Entity, ctx: C) -> Self {
        let mut world = graph.world;
        let top = world
            .spawn((
                Name::new("Top"),
                NodeKind::Region,
                LastActive(None),
                RegionLevel(0),
            ))
            .id();
        world.entity_mut(top).insert(CurrentNode(top));

        Self {
            name: name.into(),
            world,
            root,
            top,
            ctx,
            spy: Box::new(LogSpy),
            fifo: Box::new(QueueFifo::new()),
            initialized: false,
            all_nodes: Vec::new(),
            transitions: Vec::new(),
            entry_path: Vec::new(),
        }
    }

    pub fn with_spy(mut self, spy: impl Spy<C, E> + 'static) -> Self {
        self.spy = Box::new(spy);
        self
    }

    pub fn with_fifo(mut self, fifo: impl EventFifo<E> + 'static) -> Self {
        self.fifo = Box::new(fifo);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> Entity {
        self.root
    }

    pub fn context(&self) -> &C {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut C {
        &mut self.ctx
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Whether `node` is part of the active configuration.
    pub fn is_active(&self, node: Entity) -> bool {
        self.world.get::<Active>(node).is_some()
    }

    /// Lowest common ancestor of `a` and `b`; `lca(x, x)` is the parent of
    /// `x`.
    pub fn lca(&self, a: Entity, b: Entity) -> Option<Entity> {
        find_lca(&self.world, Some(a), Some(b))
    }

    /// Validates the tree, builds every transition table, enters the default
    /// configuration, and flushes completion events once.
    ///
    /// Every violation is reported through the spy; the first is returned.
    /// On failure the machine is unusable until a later `init` succeeds.
    pub fn init(&mut self) -> Result<(), HsmError> {
        if self.initialized {
            self.uninit();
        }

        // Attach the user's root under the synthetic Top region.
        self.world.entity_mut(self.root).insert(StateChildOf(self.top));
        self.world
            .entity_mut(self.top)
            .insert((InitialChild(self.root), LastActive(Some(self.root))));

        let depth = max_depth(&self.world, self.top, 1);

        let mut nodes = Vec::new();
        collect_subtree(&self.world, self.top, &mut nodes);
        self.all_nodes = nodes;

        let mut region_count = 0usize;
        let mut first_error = None;

        for index in 0..self.all_nodes.len() {
            let node = self.all_nodes[index];
            if kind_of(&self.world, node) == Some(NodeKind::Region) {
                region_count += 1;
            }
            if let Err(error) = self.init_node(node) {
                log::error!(
                    "state machine `{}`: init of `{}` failed: {error}",
                    self.name,
                    node_name(&self.world, node)
                );
                self.spy
                    .error(node_name(&self.world, node), &self.ctx, &error);
                if first_error.is_none() {
                    first_error = Some(error);
                }
            }
        }

        if let Some(error) = first_error {
            self.initialized = false;
            return Err(error);
        }

        // One winning transition per region, entry chains bounded by the
        // tree depth: pre-size the scratch buffers so dispatch never grows
        // them.
        self.transitions = Vec::with_capacity(region_count);
        self.entry_path = Vec::with_capacity(depth);

        // Default entry down to the leaves, then one completion pass.
        self.construct(self.top);

        let completion = E::completion();
        let mut batch = std::mem::take(&mut self.transitions);
        batch.clear();
        self.collect(self.top, &completion, &mut batch);
        self.process_transitions(completion, batch, false);

        self.initialized = true;
        log::debug!("state machine `{}` initialized", self.name);
        Ok(())
    }

    /// Detaches the root from Top and clears every transition table. The
    /// tree itself and its recorded history survive, so a later `init` can
    /// rebuild.
    pub fn uninit(&mut self) {
        if !self.initialized {
            return;
        }

        for index in 0..self.all_nodes.len() {
            let node = self.all_nodes[index];
            self.world
                .entity_mut(node)
                .remove::<(TransitionTable<C, E>, Active, Inactive)>();
        }

        self.world.entity_mut(self.root).remove::<StateChildOf>();
        self.world.entity_mut(self.top).remove::<InitialChild>();
        self.initialized = false;
    }

    /// Fires `event` into the machine and runs to completion, draining any
    /// events actions deferred along the way. A no-op before `init`.
    pub fn handle_event(&mut self, event: E) {
        if !self.initialized {
            return;
        }

        self.fifo.push(event);

        while let Some(event) = self.pop_front() {
            let mut batch = std::mem::take(&mut self.transitions);
            batch.clear();
            self.collect(self.top, &event, &mut batch);

            if batch.is_empty() {
                self.transitions = batch;
                self.spy
                    .no_transition(node_name(&self.world, self.top), &self.ctx, &event);
                continue;
            }

            self.process_transitions(event, batch, false);
        }
    }

    /// Enqueues an event from outside an action. Unlike
    /// [`handle_event`](Self::handle_event), calling this before `init`
    /// reports an error through the spy.
    pub fn post_fifo(&mut self, event: E) {
        if !self.initialized {
            let error = HsmError::NotInitialized { op: "post_fifo" };
            log::error!("state machine `{}`: {error}", self.name);
            self.spy.error(&self.name, &self.ctx, &error);
            return;
        }
        self.handle_event(event);
    }

    /// Teleports the configuration to `target` without firing actions, spy
    /// `event` callbacks, or completion passes; entry and exit hooks still
    /// run and default states still enter. Meant for placing the machine in
    /// a known state before a test. A no-op before `init`.
    pub fn force_transition_to(&mut self, target: Entity) {
        if !self.initialized {
            return;
        }
        let Some(src) = self.world.get::<InitialChild>(self.top).map(|i| i.0) else {
            return;
        };
        let Some(row) = Self::resolve_row(&self.world, src, Some(target), Vec::new(), None) else {
            return;
        };

        let mut batch = std::mem::take(&mut self.transitions);
        batch.clear();
        batch.push(row);
        self.process_transitions(E::completion(), batch, true);
    }

    /// Snapshot of the active configuration: the Top region's current node,
    /// plus, for every orthogonal node, the current node of each of its
    /// child regions, recursively. Empty before `init`.
    pub fn current_nodes(&self) -> Vec<String> {
        let mut names = Vec::new();
        if !self.initialized {
            return names;
        }

        let mut queue = VecDeque::new();
        if let Some(current) = self.current_of(self.top) {
            queue.push_back(current);
        }

        while let Some(node) = queue.pop_front() {
            names.push(node_name(&self.world, node).to_owned());
            if kind_of(&self.world, node) == Some(NodeKind::Orthogonal) {
                for region in self.children_of(node) {
                    if let Some(current) = self.current_of(region) {
                        queue.push_back(current);
                    }
                }
            }
        }

        names
    }

    /// Writes the GraphViz rendering of the tree. Empty output before
    /// `init`.
    pub fn graphviz<W: fmt::Write>(&self, writer: &mut W) -> fmt::Result {
        if !self.initialized {
            return Ok(());
        }
        diagram::graphviz(&self.world, &self.name, self.top, writer)
    }

    /// Writes the SCXML rendering of the tree, optionally with transitions
    /// and history pseudostates. Empty output before `init`.
    pub fn scxml<W: fmt::Write>(&self, writer: &mut W, include_transitions: bool) -> fmt::Result {
        if !self.initialized {
            return Ok(());
        }
        diagram::scxml::<C, E, W>(&self.world, &self.name, self.root, include_transitions, writer)
    }

    // ---- init internals ----

    /// Rebuilds `node`'s transition table from its declared rules and
    /// enforces the structural rules of its kind.
    fn init_node(&mut self, node: Entity) -> Result<(), HsmError> {
        let decls = match self.world.get::<TableInit<C, E>>(node) {
            Some(init) => {
                let mut builder = TransitionsBuilder { rows: Vec::new() };
                (init.0)(&mut builder);
                builder.rows
            }
            None => Vec::new(),
        };

        let mut table = TransitionTable::<C, E>::default();
        let mut result = Ok(());

        for decl in decls {
            if let Some(dst) = decl.dst {
                if kind_of(&self.world, dst) == Some(NodeKind::Region) {
                    let error = HsmError::RegionDestination {
                        node: node_name(&self.world, node).to_owned(),
                        dst: node_name(&self.world, dst).to_owned(),
                    };
                    self.spy
                        .error(node_name(&self.world, node), &self.ctx, &error);
                    if result.is_ok() {
                        result = Err(error);
                    }
                    continue;
                }
            }

            let Some(row) =
                Self::resolve_row(&self.world, node, decl.dst, decl.actions, decl.guard)
            else {
                continue;
            };
            table.rows.entry(decl.event).or_default().push(row);
        }

        self.world.entity_mut(node).insert(table);
        result?;

        let name = |world: &World, e: Entity| node_name(world, e).to_owned();

        match kind_of(&self.world, node) {
            Some(NodeKind::Composite) => {
                let Some(initial) = self.world.get::<InitialChild>(node).map(|i| i.0) else {
                    return Err(HsmError::MissingInitialChild {
                        node: name(&self.world, node),
                    });
                };
                if parent_of(&self.world, initial) != Some(node) {
                    return Err(HsmError::InitialChildNotDirect {
                        node: name(&self.world, node),
                        child: name(&self.world, initial),
                    });
                }
                if matches!(kind_of(&self.world, initial), Some(k) if k.is_history()) {
                    return Err(HsmError::InitialChildIsHistory {
                        node: name(&self.world, node),
                    });
                }
                for child in self.children_of(node) {
                    if kind_of(&self.world, child) == Some(NodeKind::Region) {
                        return Err(HsmError::RegionChildForbidden {
                            node: name(&self.world, node),
                            child: name(&self.world, child),
                        });
                    }
                }
            }
            Some(NodeKind::Region) => {
                let mut level: u32 = 1;
                let mut cursor = parent_of(&self.world, node);
                while let Some(ancestor) = cursor {
                    level += 1;
                    if level > MAX_LEVEL {
                        return Err(HsmError::DepthOverflow {
                            node: name(&self.world, node),
                        });
                    }
                    cursor = parent_of(&self.world, ancestor);
                }
                // Reset the active branch so re-init constructs from scratch.
                self.world
                    .entity_mut(node)
                    .insert((RegionLevel(level), CurrentNode(node)));

                let Some(initial) = self.world.get::<InitialChild>(node).map(|i| i.0) else {
                    return Err(HsmError::MissingInitialChild {
                        node: name(&self.world, node),
                    });
                };
                if parent_of(&self.world, initial) != Some(node) {
                    return Err(HsmError::InitialChildNotDirect {
                        node: name(&self.world, node),
                        child: name(&self.world, initial),
                    });
                }
                for child in self.children_of(node) {
                    if kind_of(&self.world, child) == Some(NodeKind::Region) {
                        return Err(HsmError::RegionChildForbidden {
                            node: name(&self.world, node),
                            child: name(&self.world, child),
                        });
                    }
                }
            }
            Some(NodeKind::Orthogonal) => {
                for child in self.children_of(node) {
                    if kind_of(&self.world, child) != Some(NodeKind::Region) {
                        return Err(HsmError::NonRegionChild {
                            node: name(&self.world, node),
                            child: name(&self.world, child),
                        });
                    }
                }
            }
            _ => {
                // Leaves and history pseudostates carry no substructure.
                if let Some(child) = self.children_of(node).first().copied() {
                    return Err(HsmError::ChildrenNotAllowed {
                        node: name(&self.world, node),
                        child: name(&self.world, child),
                    });
                }
            }
        }

        Ok(())
    }

    /// Computes the cached fields of a row: the LCA, the orthogonal
    /// normalization, and the hosting regions of the (possibly rewritten)
    /// source and LCA.
    fn resolve_row(
        world: &World,
        src: Entity,
        dst: Option<Entity>,
        actions: Vec<Action<C, E>>,
        guard: Option<Guard<C, E>>,
    ) -> Option<Row<C, E>> {
        let mut src = src;
        let mut dst = dst;
        let mut lca = find_lca(world, Some(src), dst);

        if let Some(ancestor) = lca {
            if kind_of(world, ancestor) == Some(NodeKind::Orthogonal) {
                // A transition whose LCA is an orthogonal node is rewritten
                // so the whole orthogonal node is exited and default
                // entered: this is what crossing between sibling regions
                // means.
                src = ancestor;
                dst = Some(ancestor);
                lca = parent_of(world, ancestor);
            }
        }

        let lca_region = match lca {
            Some(ancestor) => nearest_region(world, ancestor),
            None => None,
        };
        let src_region = nearest_region(world, src)?;

        Some(Row {
            src,
            dst,
            actions,
            guard,
            lca,
            lca_region,
            src_region,
        })
    }

    // ---- dispatch internals ----

    /// Walks a region's active chain from the current node upward, asking
    /// each node to handle `event`. Returns true as soon as one does.
    fn collect(&self, region: Entity, event: &E, out: &mut Vec<Row<C, E>>) -> bool {
        let Some(mut cursor) = self.current_of(region) else {
            return false;
        };

        while cursor != region {
            if self.collect_node(cursor, event, out) {
                return true;
            }
            match parent_of(&self.world, cursor) {
                Some(parent) => cursor = parent,
                None => return false,
            }
        }

        false
    }

    fn collect_node(&self, node: Entity, event: &E, out: &mut Vec<Row<C, E>>) -> bool {
        if kind_of(&self.world, node) == Some(NodeKind::Orthogonal) {
            // Every child region must be offered the event, even after one
            // of them produced a candidate.
            let mut handled = false;
            if let Some(children) = self.world.get::<StateChildren>(node) {
                for region in children.iter() {
                    handled = self.collect(region, event, out) || handled;
                }
            }
            if handled {
                return true;
            }
        }

        self.match_rows(node, event, out)
    }

    /// Evaluates `node`'s rows for `event` in declaration order; the first
    /// whose guard passes is appended to `out`.
    fn match_rows(&self, node: Entity, event: &E, out: &mut Vec<Row<C, E>>) -> bool {
        let Some(table) = self.world.get::<TransitionTable<C, E>>(node) else {
            return false;
        };
        let Some(rows) = table.rows.get(event) else {
            return false;
        };

        for row in rows {
            let passed = match &row.guard {
                Some(guard) => {
                    let passed = (guard.test)(&self.ctx, event);
                    self.spy.guard(
                        node_name(&self.world, node),
                        &self.ctx,
                        event,
                        guard.name,
                        passed,
                    );
                    passed
                }
                None => true,
            };

            if passed {
                out.push(row.clone());
                return true;
            }
        }

        false
    }

    /// Executes a batch of candidate transitions, filtering by region
    /// level, then keeps re-collecting with the completion event until the
    /// configuration settles. With `ignore_events` (forced transitions)
    /// actions, spy `event` callbacks and the completion pass are skipped.
    fn process_transitions(&mut self, event: E, mut batch: Vec<Row<C, E>>, ignore_events: bool) {
        let mut event = event;

        while !batch.is_empty() {
            // The region level currently being disturbed; zero means unset.
            // A wider transition (smaller level) invalidates later
            // candidates whose source region it tears down.
            let mut current_level: u32 = 0;

            for index in 0..batch.len() {
                let row = batch[index].clone();

                if let Some(lca_region) = row.lca_region {
                    let lca_level = self.level_of(lca_region);
                    if current_level == 0 {
                        current_level = lca_level;
                    } else if current_level < self.level_of(row.src_region) {
                        continue;
                    }
                    if lca_level < current_level {
                        current_level = lca_level;
                    }
                }

                if !ignore_events {
                    self.spy
                        .event(node_name(&self.world, row.src), &self.ctx, &event);
                    self.run_actions(&row, &event);
                }

                let Some(dst) = row.dst else {
                    // Internal transition: actions only.
                    continue;
                };

                let (Some(lca), Some(lca_region)) = (row.lca, row.lca_region) else {
                    let error = HsmError::MissingLca {
                        src: node_name(&self.world, row.src).to_owned(),
                    };
                    log::error!("state machine `{}`: {error}", self.name);
                    self.spy.event_error(
                        node_name(&self.world, row.src),
                        &self.ctx,
                        &event,
                        &error,
                    );
                    debug_assert!(false, "destination without a common ancestor");
                    continue;
                };

                self.destruct_until(lca_region, lca);

                // Entry chain from the LCA (exclusive) down to the
                // destination, gathered bottom-up and walked in reverse.
                let mut path = std::mem::take(&mut self.entry_path);
                path.clear();
                let mut node = dst;
                while node != lca {
                    path.push(node);
                    match parent_of(&self.world, node) {
                        Some(parent) => node = parent,
                        None => break,
                    }
                }

                let mut current_region = lca_region;
                let mut idx = path.len();
                while idx > 0 {
                    idx -= 1;
                    let node = path[idx];
                    self.enter_node(current_region, node);

                    match kind_of(&self.world, node) {
                        Some(NodeKind::Orthogonal) => {
                            if idx == 0 {
                                // The transition ends at the orthogonal
                                // node: default entry of every region.
                                for region in self.children_of(node) {
                                    self.construct(region);
                                }
                                break;
                            }
                            // The entry chain continues through one region;
                            // its siblings get default entry.
                            idx -= 1;
                            let next_region = path[idx];
                            debug_assert_eq!(
                                kind_of(&self.world, next_region),
                                Some(NodeKind::Region)
                            );
                            current_region = next_region;
                            for region in self.children_of(node) {
                                if region != next_region {
                                    self.construct(region);
                                }
                            }
                        }
                        Some(NodeKind::ShallowHistory) => {
                            self.enter_from_history(current_region, node, false);
                            break;
                        }
                        Some(NodeKind::DeepHistory) => {
                            self.enter_from_history(current_region, node, true);
                            break;
                        }
                        _ => {}
                    }
                }
                self.entry_path = path;

                // Drill down to the leaves in whatever region the entry
                // chain finished in.
                self.construct(current_region);
            }

            batch.clear();

            if ignore_events {
                break;
            }

            event = E::completion();
            self.collect(self.top, &event, &mut batch);
        }

        self.transitions = batch;
    }

    fn run_actions(&mut self, row: &Row<C, E>, event: &E) {
        for action in &row.actions {
            self.spy.action(
                node_name(&self.world, row.src),
                &self.ctx,
                event,
                action.name,
            );

            let mut sink = EventSink::new();
            (action.run)(&mut self.ctx, event, &mut sink);

            for deferred in sink.pending {
                if self.initialized {
                    // Best-effort: a refusing queue drops the event.
                    self.fifo.push(deferred);
                } else {
                    log::debug!(
                        "state machine `{}`: dropping {deferred:?} deferred during init",
                        self.name
                    );
                }
            }
        }
    }

    /// Default entry: from the region's current node, follow initial
    /// children down to a leaf, recursing into every region of any
    /// orthogonal node on the way.
    fn construct(&mut self, region: Entity) {
        let Some(mut cursor) = self.current_of(region) else {
            return;
        };

        while let Some(next) = self.world.get::<InitialChild>(cursor).map(|i| i.0) {
            self.enter_node(region, next);
            cursor = next;

            if kind_of(&self.world, next) == Some(NodeKind::Orthogonal) {
                for child in self.children_of(next) {
                    self.construct(child);
                }
                return;
            }
        }
    }

    /// Re-entry along recorded history: follow last-active children instead
    /// of initial ones. Regions that were never active fall back to their
    /// initial child, since that is what their history starts as.
    fn construct_from_deep_history(&mut self, region: Entity) {
        let Some(mut cursor) = self.current_of(region) else {
            return;
        };

        loop {
            if kind_of(&self.world, cursor) == Some(NodeKind::Orthogonal) {
                for child in self.children_of(cursor) {
                    self.construct_from_deep_history(child);
                }
                return;
            }

            let Some(next) = self.world.get::<LastActive>(cursor).and_then(|l| l.0) else {
                return;
            };
            self.enter_node(region, next);
            cursor = next;
        }
    }

    /// Exits the region's active chain up to, but not including, `stop`.
    /// Orthogonal nodes destruct their child regions, in declaration order,
    /// before exiting themselves. Every exit records history on the region
    /// and on the exited node's composite parent.
    fn destruct_until(&mut self, region: Entity, stop: Entity) {
        loop {
            let Some(current) = self.current_of(region) else {
                return;
            };
            if current == stop {
                return;
            }

            if kind_of(&self.world, current) == Some(NodeKind::Orthogonal) {
                for child in self.children_of(current) {
                    self.destruct(child);
                }
            }

            self.exit_node(current);
            self.set_last_visited(region, current);

            let Some(parent) = parent_of(&self.world, current) else {
                return;
            };
            if let Some(mut c) = self.world.get_mut::<CurrentNode>(region) {
                c.0 = parent;
            }

            // Forward the region's record to the composite that owns the
            // exited node, so history entries can reconstruct later.
            let last = self
                .world
                .get::<LastActive>(region)
                .copied()
                .unwrap_or_default()
                .0;
            if let Some(last) = last {
                self.set_last_visited(parent, last);
            }
        }
    }

    fn destruct(&mut self, region: Entity) {
        self.destruct_until(region, region);
    }

    /// Entry through a history pseudostate: the owning composite's
    /// last-active child is entered, then shallow entry default-constructs
    /// while deep entry follows the recorded chain.
    fn enter_from_history(&mut self, region: Entity, history: Entity, deep: bool) {
        let Some(composite) = parent_of(&self.world, history) else {
            return;
        };
        let Some(target) = self.world.get::<LastActive>(composite).and_then(|l| l.0) else {
            return;
        };

        self.enter_node(region, target);

        if deep {
            self.construct_from_deep_history(region);
        } else if kind_of(&self.world, target) == Some(NodeKind::Orthogonal) {
            for child in self.children_of(target) {
                self.construct(child);
            }
        }
    }

    fn enter_node(&mut self, region: Entity, node: Entity) {
        self.spy.on_entry(node_name(&self.world, node), &self.ctx);

        if let Some(mut current) = self.world.get_mut::<CurrentNode>(region) {
            current.0 = node;
        }

        if let Some(hooks) = self.world.get::<EntryHooks<C>>(node) {
            if let Some(hook) = &hooks.on_entry {
                hook(&mut self.ctx);
            }
        }

        if !matches!(kind_of(&self.world, node), Some(k) if k.is_history()) {
            self.world.entity_mut(node).remove::<Inactive>().insert(Active);
        }
    }

    fn exit_node(&mut self, node: Entity) {
        self.spy.on_exit(node_name(&self.world, node), &self.ctx);

        if let Some(hooks) = self.world.get::<EntryHooks<C>>(node) {
            if let Some(hook) = &hooks.on_exit {
                hook(&mut self.ctx);
            }
        }

        self.world.entity_mut(node).remove::<Active>().insert(Inactive);
    }

    /// Regions and composites track their last active child; other kinds
    /// ignore the notification.
    fn set_last_visited(&mut self, node: Entity, value: Entity) {
        if matches!(
            kind_of(&self.world, node),
            Some(NodeKind::Region) | Some(NodeKind::Composite)
        ) {
            if let Some(mut last) = self.world.get_mut::<LastActive>(node) {
                last.0 = Some(value);
            }
        }
    }

    fn pop_front(&mut self) -> Option<E> {
        let event = self.fifo.front().copied()?;
        self.fifo.pop_front();
        Some(event)
    }

    fn current_of(&self, region: Entity) -> Option<Entity> {
        self.world.get::<CurrentNode>(region).map(|c| c.0)
    }

    fn level_of(&self, region: Entity) -> u32 {
        self.world.get::<RegionLevel>(region).map(|l| l.0).unwrap_or(0)
    }

    fn children_of(&self, node: Entity) -> Vec<Entity> {
        self.world
            .get::<StateChildren>(node)
            .map(|c| c.iter().collect())
            .unwrap_or_default()
    }
}
