use bevy::prelude::Entity;
use bevy_hsm::prelude::*;
use pretty_assertions::assert_eq;

#[derive(HsmEvent, Clone, Copy, PartialEq, Eq, Hash, Debug)]
enum Evt {
    None,
    First,
    Second,
    Third,
}

#[derive(Default)]
struct Ctx {
    prints: usize,
}

struct Nodes {
    root: Entity,
    sm11: Entity,
    sm111: Entity,
    sm1111: Entity,
    sm1112: Entity,
    sm1113: Entity,
    sm112: Entity,
    sm12: Entity,
    sm121: Entity,
    sm122: Entity,
    sm1221: Entity,
    sm12211: Entity,
}

/// A two-branch composite hierarchy. Both deep leaves fire completion
/// transitions back to `sm111`, so the machine always settles in `sm1111`.
fn fixture() -> (StateGraph<Ctx, Evt>, Nodes) {
    let mut g = StateGraph::new();

    let root = g.composite("root", None);
    let sm11 = g.composite("sm11", Some(root));
    let sm12 = g.composite("sm12", Some(root));

    let sm111 = g.composite("sm111", Some(sm11));
    let sm112 = g.leaf("sm112", Some(sm11));
    let sm1111 = g.leaf("sm1111", Some(sm111));
    let sm1112 = g.leaf("sm1112", Some(sm111));
    let sm1113 = g.leaf("sm1113", Some(sm111));

    let sm121 = g.leaf("sm121", Some(sm12));
    let sm122 = g.composite("sm122", Some(sm12));
    let sm1221 = g.composite("sm1221", Some(sm122));
    let sm12211 = g.leaf("sm12211", Some(sm1221));

    g.set_initial(root, sm11);
    g.set_initial(sm11, sm112);
    g.set_initial(sm111, sm1111);
    g.set_initial(sm12, sm122);
    g.set_initial(sm122, sm1221);
    g.set_initial(sm1221, sm12211);

    for leaf in [sm1111, sm1112, sm1113] {
        g.transitions(leaf, move |t| {
            t.row(Evt::First, sm12);
            t.internal(Evt::Second)
                .action("print_something", |ctx: &mut Ctx, _e, _q| {
                    ctx.prints += 1;
                });
        });
    }
    g.transitions(sm112, move |t| {
        t.row(Evt::None, sm111);
    });
    g.transitions(sm12211, move |t| {
        t.row(Evt::None, sm111);
    });

    (
        g,
        Nodes {
            root,
            sm11,
            sm111,
            sm1111,
            sm1112,
            sm1113,
            sm112,
            sm12,
            sm121,
            sm122,
            sm1221,
            sm12211,
        },
    )
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

#[test]
fn init_enters_defaults_and_flushes_completion() {
    let (g, n) = fixture();
    let spy = TracingSpy::new();
    let trace = spy.clone();
    let mut sm = StateMachine::new("TestBackend", g, n.root, Ctx::default()).with_spy(spy);

    assert!(sm.init().is_ok());

    // sm112 is the declared initial leaf, but its completion transition
    // immediately moves the machine to sm111's branch.
    assert_eq!(
        trace.take(),
        strings(&[
            "OE-root",
            "OE-sm11",
            "OE-sm112",
            "OX-sm112",
            "OE-sm111",
            "OE-sm1111"
        ])
    );
    assert_eq!(sm.current_nodes(), strings(&["sm1111"]));
    assert!(sm.is_active(n.root));
    assert!(sm.is_active(n.sm11));
    assert!(sm.is_active(n.sm111));
    assert!(sm.is_active(n.sm1111));
    assert!(!sm.is_active(n.sm12));
}

#[test]
fn event_sequence_exits_precede_entries() {
    let (g, n) = fixture();
    let spy = TracingSpy::new();
    let trace = spy.clone();
    let mut sm = StateMachine::new("TestBackend", g, n.root, Ctx::default()).with_spy(spy);

    assert!(sm.init().is_ok());
    trace.take();

    sm.handle_event(Evt::Second);
    sm.handle_event(Evt::First);
    sm.handle_event(Evt::Third);
    sm.handle_event(Evt::First);

    assert_eq!(
        trace.take(),
        strings(&[
            "OX-sm1111",
            "OX-sm111",
            "OX-sm11",
            "OE-sm12",
            "OE-sm122",
            "OE-sm1221",
            "OE-sm12211",
            "OX-sm12211",
            "OX-sm1221",
            "OX-sm122",
            "OX-sm12",
            "OE-sm11",
            "OE-sm111",
            "OE-sm1111",
            "OX-sm1111",
            "OX-sm111",
            "OX-sm11",
            "OE-sm12",
            "OE-sm122",
            "OE-sm1221",
            "OE-sm12211",
            "OX-sm12211",
            "OX-sm1221",
            "OX-sm122",
            "OX-sm12",
            "OE-sm11",
            "OE-sm111",
            "OE-sm1111",
        ])
    );

    // The internal transition ran its action without touching the trace.
    assert_eq!(sm.context().prints, 1);
}

#[test]
fn lca_resolution() {
    let (g, n) = fixture();

    assert_eq!(g.lca(n.sm1111, n.sm12211), Some(n.root));
    assert_eq!(g.lca(n.sm121, n.sm122), Some(n.sm12));
    assert_eq!(g.lca(n.sm122, n.sm1221), Some(n.sm122));
    assert_eq!(g.lca(n.sm1111, n.sm112), Some(n.sm11));

    // Self-transitions resolve one level up so the node exits and
    // re-enters.
    assert_eq!(g.lca(n.sm11, n.sm11), Some(n.root));
    assert_eq!(g.lca(n.root, n.root), None);

    // An ancestor on either side is its own LCA, in both directions.
    assert_eq!(g.lca(n.sm1111, n.sm11), Some(n.sm11));
    assert_eq!(g.lca(n.sm11, n.sm1111), Some(n.sm11));
    assert_eq!(g.lca(n.sm1112, n.sm1113), g.lca(n.sm1113, n.sm1112));
}

#[test]
fn max_depth_of_tree() {
    let (g, n) = fixture();
    assert_eq!(g.depth(n.root), 5);
}

#[derive(HsmEvent, Clone, Copy, PartialEq, Eq, Hash, Debug)]
enum LoopEvt {
    None,
    Hop,
    Nudge,
}

#[test]
fn self_transition_exits_and_reenters() {
    let mut g: StateGraph<(), LoopEvt> = StateGraph::new();
    let root = g.composite("root", None);
    let a = g.leaf("a", Some(root));
    g.set_initial(root, a);
    g.transitions(a, move |t| {
        t.row(LoopEvt::Hop, a);
        t.internal(LoopEvt::Nudge);
    });

    let spy = TracingSpy::new();
    let trace = spy.clone();
    let mut sm = StateMachine::new("loop", g, root, ()).with_spy(spy);
    assert!(sm.init().is_ok());
    trace.take();

    sm.handle_event(LoopEvt::Hop);
    assert_eq!(trace.take(), strings(&["OX-a", "OE-a"]));

    sm.handle_event(LoopEvt::Nudge);
    assert_eq!(trace.take(), Vec::<String>::new());
}
