use bevy::prelude::*;

/// Marker present on every state in the active configuration, from the root
/// down to the current leaves. Regions and history pseudostates are never
/// marked.
#[derive(Component)]
pub struct Active;

/// Marker for a state that has been exited at least once.
#[derive(Component)]
pub struct Inactive;
