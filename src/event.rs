use crossterm::event::Event;

/// Events multiplexed onto the main loop channel.
///
/// Load lifecycle events do not travel through this channel; the loop
/// polls [`crate::loader::LoadSession::next_event`] directly so that the
/// session stays the only consumer of its task's queue.
#[derive(Debug)]
pub(crate) enum DomainEvent {
    Input(Event),
    InputError(String),
    RedrawTick,
}
