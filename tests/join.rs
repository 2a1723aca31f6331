use bevy::prelude::Entity;
use bevy_hsm::prelude::*;
use pretty_assertions::assert_eq;

#[derive(HsmEvent, Clone, Copy, PartialEq, Eq, Hash, Debug)]
enum Evt {
    None,
    First,
    Second,
    Third,
    Fourth,
    Reset,
}

struct Ctx {
    toggle: bool,
    join_count: i32,
}

struct Nodes {
    s1: Entity,
    ortho1: Entity,
    sa: Entity,
    sf: Entity,
}

/// The join pattern: three regions each reach a join leaf on their own
/// event; entering a join decrements a shared counter and the join's
/// completion transition to `SF` only fires once the counter hits zero,
/// which exits the whole orthogonal exactly once.
fn fixture() -> (StateGraph<Ctx, Evt>, Nodes) {
    let mut g = StateGraph::new();

    let s1 = g.composite("s1", None);
    let ortho1 = g.orthogonal("Ortho1", Some(s1));
    let sf = g.leaf("SF", Some(s1));
    g.set_initial(s1, ortho1);

    let region1 = g.region("Region1", Some(ortho1));
    let region2 = g.region("Region2", Some(ortho1));
    let region3 = g.region("Region3", Some(ortho1));

    let sa = g.leaf("SA", Some(region1));
    let join_a = g.leaf("SA_JOIN", Some(region1));
    g.set_initial(region1, sa);

    let sb = g.leaf("SB", Some(region2));
    let join_b = g.leaf("SB_JOIN", Some(region2));
    g.set_initial(region2, sb);

    let sc = g.leaf("SC", Some(region3));
    let join_c = g.leaf("SC_JOIN", Some(region3));
    g.set_initial(region3, sc);

    for join in [join_a, join_b, join_c] {
        g.on_entry(join, |ctx: &mut Ctx| ctx.join_count -= 1);
        g.transitions(join, move |t| {
            t.row(Evt::None, sf)
                .guard("join_complete", |ctx: &Ctx, _e| ctx.join_count <= 0);
        });
    }

    // Re-arm the join whenever the orthogonal is left.
    g.on_exit(ortho1, |ctx: &mut Ctx| ctx.join_count = 3);

    fn fire_next(_ctx: &mut Ctx, event: &Evt, queue: &mut EventSink<Evt>) {
        match event {
            Evt::First => queue.post(Evt::Second),
            Evt::Second | Evt::Fourth => queue.post(Evt::Third),
            _ => {}
        }
    }

    g.transitions(sa, move |t| {
        t.row(Evt::First, join_a).action("fire_next", fire_next);
    });
    g.transitions(sb, move |t| {
        t.row(Evt::Second, join_b).action("fire_next", fire_next);
    });
    g.transitions(sc, move |t| {
        // Two spellings of the same lock; both stay closed until FOURTH
        // toggles the flag.
        t.row(Evt::Third, join_c)
            .guard("joins_unlocked", |ctx: &Ctx, _e| ctx.toggle);
        t.row(Evt::Third, join_c)
            .guard("toggle_set", |ctx: &Ctx, _e| ctx.toggle);
        t.internal(Evt::Fourth)
            .action("toggle", |ctx: &mut Ctx, _e, _q| ctx.toggle = !ctx.toggle)
            .action("fire_next", fire_next);
    });
    g.transitions(sf, move |t| {
        t.row(Evt::Reset, ortho1);
    });

    (g, Nodes { s1, ortho1, sa, sf })
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

#[test]
fn join_fires_once_when_all_regions_arrive() {
    let (g, n) = fixture();
    let spy = TracingSpy::new();
    let trace = spy.clone();
    let mut sm = StateMachine::new(
        "TestBackend",
        g,
        n.s1,
        Ctx {
            toggle: false,
            join_count: 3,
        },
    )
    .with_spy(spy);

    assert!(sm.init().is_ok());
    assert_eq!(
        trace.take(),
        strings(&["OE-s1", "OE-Ortho1", "OE-SA", "OE-SB", "OE-SC"])
    );
    assert_eq!(sm.current_nodes(), strings(&["Ortho1", "SA", "SB", "SC"]));

    // FIRST cascades (via deferred posts) through SECOND and THIRD, but
    // THIRD stays guarded: only two regions reach their join.
    sm.handle_event(Evt::First);
    assert_eq!(
        trace.take(),
        strings(&["OX-SA", "OE-SA_JOIN", "OX-SB", "OE-SB_JOIN"])
    );
    assert_eq!(sm.context().join_count, 1);

    // FOURTH unlocks the guard and re-fires THIRD; the last join arrives,
    // the counter hits zero, and exactly one completion transition tears
    // the orthogonal down.
    sm.handle_event(Evt::Fourth);
    assert_eq!(
        trace.take(),
        strings(&[
            "OX-SC",
            "OE-SC_JOIN",
            "OX-SA_JOIN",
            "OX-SB_JOIN",
            "OX-SC_JOIN",
            "OX-Ortho1",
            "OE-SF",
        ])
    );
    assert_eq!(sm.current_nodes(), strings(&["SF"]));
    assert_eq!(sm.context().join_count, 3);
}

#[test]
fn forced_transitions_bypass_rules_but_enter_defaults() {
    let (g, n) = fixture();
    let mut sm = StateMachine::new(
        "TestBackend",
        g,
        n.s1,
        Ctx {
            toggle: false,
            join_count: 3,
        },
    );

    assert!(sm.init().is_ok());
    assert_eq!(sm.current_nodes(), strings(&["Ortho1", "SA", "SB", "SC"]));

    // Forcing to the root re-enters the default configuration.
    sm.force_transition_to(n.s1);
    assert_eq!(sm.current_nodes(), strings(&["Ortho1", "SA", "SB", "SC"]));

    // Forcing to a leaf inside a region lands in the same configuration.
    sm.force_transition_to(n.sa);
    assert_eq!(sm.current_nodes(), strings(&["Ortho1", "SA", "SB", "SC"]));

    sm.force_transition_to(n.sf);
    assert_eq!(sm.current_nodes(), strings(&["SF"]));

    sm.force_transition_to(n.ortho1);
    assert_eq!(sm.current_nodes(), strings(&["Ortho1", "SA", "SB", "SC"]));
}
