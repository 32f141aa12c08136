/// Capture/restore capability every mutable entity type provides
///
/// A captured state must be enough to restore every observable field of the
/// entity. Requests never copy fields by hand; they capture whole states
/// through this trait.
pub trait Snapshot {
    type State: Clone;

    fn capture_state(&self) -> Self::State;

    fn restore_state(&mut self, state: Self::State);
}
