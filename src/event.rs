use std::fmt::Debug;
use std::hash::Hash;

/// Client event enums implement this, usually via `#[derive(HsmEvent)]`.
///
/// One value is distinguished as the completion event: the engine fires it
/// after every settled transition so that anonymous (eventless) transitions
/// can run, and it never needs to be posted by hand.
pub trait HsmEvent: Copy + Eq + Hash + Debug + Send + Sync + 'static {
    fn completion() -> Self;

    fn is_completion(&self) -> bool {
        *self == Self::completion()
    }
}
