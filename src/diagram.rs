//! GraphViz and SCXML renderings of a declared tree. Output collaborators
//! only; dispatch never depends on them.

use std::fmt::{self, Write};

use bevy::prelude::*;

use crate::event::HsmEvent;
use crate::transitions::TransitionTable;
use crate::{kind_of, node_name, parent_of, InitialChild, NodeKind, StateChildren};

pub(crate) fn graphviz<W: Write>(
    world: &World,
    machine: &str,
    top: Entity,
    writer: &mut W,
) -> fmt::Result {
    writeln!(
        writer,
        "digraph {machine}_graphviz {{ node [shape=circle]; Top [shape=rectangle]; "
    )?;
    edges(world, top, writer)?;
    writeln!(writer, "}}")
}

fn edges<W: Write>(world: &World, node: Entity, writer: &mut W) -> fmt::Result {
    let Some(children) = world.get::<StateChildren>(node) else {
        return Ok(());
    };
    let name = node_name(world, node);
    let initial = world.get::<InitialChild>(node).map(|i| i.0);

    for child in children.iter() {
        let kind = kind_of(world, child);
        if matches!(kind, Some(k) if k.is_history()) {
            continue;
        }

        if kind == Some(NodeKind::Region) {
            writeln!(writer, "{} [shape=rectangle];", node_name(world, child))?;
        }

        writeln!(writer, "{} -> {};", name, node_name(world, child))?;

        if let Some(initial) = initial {
            writeln!(writer, "{} [shape=doublecircle];", node_name(world, initial))?;
        }

        edges(world, child, writer)?;
    }

    Ok(())
}

pub(crate) fn scxml<C: 'static, E: HsmEvent, W: Write>(
    world: &World,
    machine: &str,
    root: Entity,
    include_transitions: bool,
    writer: &mut W,
) -> fmt::Result {
    writeln!(
        writer,
        "<scxml initial=\"{}\" name=\"{machine}\" version=\"1.0\" xmlns=\"http://www.w3.org/2005/07/scxml\">",
        node_name(world, root)
    )?;
    state::<C, E, W>(world, root, include_transitions, writer)?;
    writeln!(writer, "</scxml>")
}

fn state<C: 'static, E: HsmEvent, W: Write>(
    world: &World,
    node: Entity,
    include_transitions: bool,
    writer: &mut W,
) -> fmt::Result {
    let name = node_name(world, node);

    match kind_of(world, node) {
        Some(NodeKind::ShallowHistory) | Some(NodeKind::DeepHistory) => {
            // History pseudostates only clutter a transition-free diagram.
            if include_transitions {
                let owner = parent_of(world, node)
                    .map(|p| node_name(world, p))
                    .unwrap_or("?");
                let kind = if kind_of(world, node) == Some(NodeKind::ShallowHistory) {
                    "shallow"
                } else {
                    "deep"
                };
                writeln!(writer, "<history id=\"{owner}.{name}\" type=\"{kind}\"/>")?;
            }
        }
        Some(NodeKind::Orthogonal) => {
            writeln!(writer, "<parallel id=\"{name}\">")?;
            if include_transitions {
                rows::<C, E, W>(world, node, writer)?;
            }
            children::<C, E, W>(world, node, include_transitions, writer)?;
            writeln!(writer, "</parallel>")?;
        }
        _ => {
            writeln!(writer, "<state id=\"{name}\">")?;
            if let Some(initial) = world.get::<InitialChild>(node).map(|i| i.0) {
                writeln!(writer, "<initial>")?;
                writeln!(
                    writer,
                    "<transition target=\"{}\"/>",
                    node_name(world, initial)
                )?;
                writeln!(writer, "</initial>")?;
            }
            if include_transitions {
                rows::<C, E, W>(world, node, writer)?;
            }
            children::<C, E, W>(world, node, include_transitions, writer)?;
            writeln!(writer, "</state>")?;
        }
    }

    Ok(())
}

fn children<C: 'static, E: HsmEvent, W: Write>(
    world: &World,
    node: Entity,
    include_transitions: bool,
    writer: &mut W,
) -> fmt::Result {
    let Some(children) = world.get::<StateChildren>(node) else {
        return Ok(());
    };
    for child in children.iter() {
        state::<C, E, W>(world, child, include_transitions, writer)?;
    }
    Ok(())
}

fn rows<C: 'static, E: HsmEvent, W: Write>(
    world: &World,
    node: Entity,
    writer: &mut W,
) -> fmt::Result {
    let Some(table) = world.get::<TransitionTable<C, E>>(node) else {
        return Ok(());
    };

    for (event, rows) in table.rows.iter() {
        for row in rows {
            write!(writer, "<transition type=\"internal\" event=\"{event:?}\" ")?;

            if let Some(guard) = &row.guard {
                write!(writer, "cond=\"{}\" ", guard.name)?;
            }

            if let Some(dst) = row.dst {
                if matches!(kind_of(world, dst), Some(k) if k.is_history()) {
                    let owner = parent_of(world, dst)
                        .map(|p| node_name(world, p))
                        .unwrap_or("?");
                    write!(writer, "target=\"{owner}.{}\" ", node_name(world, dst))?;
                } else {
                    write!(writer, "target=\"{}\" ", node_name(world, dst))?;
                }
            }

            writeln!(writer, ">")?;

            if !row.actions.is_empty() {
                writeln!(writer, "<script>")?;
                for action in &row.actions {
                    writeln!(writer, "{}({event:?});", action.name)?;
                }
                writeln!(writer, "</script>")?;
            }

            writeln!(writer, "</transition>")?;
        }
    }

    Ok(())
}
