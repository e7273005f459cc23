use std::time::Duration;

use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::{self, MissedTickBehavior};

use crate::error::AppResult;
use crate::event::DomainEvent;
use crate::loader::{LoadSession, SessionEvent};
use crate::ui;

use super::core::App;
use super::event_bus::EventBusRuntime;
use super::terminal_session::TerminalSession;

struct LoopRuntime {
    terminal: TerminalSession,
    redraw_tick: time::Interval,
    loop_event_rx: UnboundedReceiver<DomainEvent>,
    loop_event_runtime: EventBusRuntime,
}

enum WaitEvent {
    Event(DomainEvent),
    Load(SessionEvent),
    Closed,
}

enum LoopControl {
    Continue,
    Break,
}

impl App {
    pub async fn run(&mut self) -> AppResult<()> {
        let mut runtime = self.initialize_loop_runtime()?;
        let mut needs_redraw = true;

        loop {
            if needs_redraw {
                let app = &*self;
                runtime.terminal.draw(|frame| ui::draw(frame, app))?;
                needs_redraw = false;
            }

            let waited = wait_next_event(
                &mut runtime.loop_event_rx,
                &mut self.session,
                &mut runtime.redraw_tick,
            )
            .await;
            match self.handle_waited_event(waited, &mut needs_redraw) {
                LoopControl::Continue => {}
                LoopControl::Break => break,
            }
        }

        runtime.loop_event_runtime.shutdown();
        runtime.terminal.restore()?;
        Ok(())
    }

    fn initialize_loop_runtime(&self) -> AppResult<LoopRuntime> {
        let terminal = TerminalSession::enter()?;
        let (loop_event_rx, loop_event_runtime) = EventBusRuntime::spawn();
        let mut redraw_tick =
            time::interval(Duration::from_millis(self.config.ui.redraw_interval_ms));
        redraw_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        Ok(LoopRuntime {
            terminal,
            redraw_tick,
            loop_event_rx,
            loop_event_runtime,
        })
    }

    fn handle_waited_event(&mut self, waited: WaitEvent, needs_redraw: &mut bool) -> LoopControl {
        match waited {
            WaitEvent::Event(DomainEvent::Input(event)) => {
                let outcome = self.handle_input_event(event);
                if outcome.quit_requested {
                    return LoopControl::Break;
                }
                if outcome.redraw {
                    *needs_redraw = true;
                }
            }
            WaitEvent::Event(DomainEvent::InputError(message)) => {
                log::warn!("input error: {message}");
                self.state.status.message = format!("input error: {message}");
                *needs_redraw = true;
            }
            WaitEvent::Event(DomainEvent::RedrawTick) => {
                // keeps the progress box current while bytes stream in
                if self.session.is_loading() {
                    *needs_redraw = true;
                }
            }
            WaitEvent::Load(event) => {
                if self.on_load_event(event) {
                    *needs_redraw = true;
                }
            }
            WaitEvent::Closed => return LoopControl::Break,
        }
        LoopControl::Continue
    }

    /// Feeds one session event through the load lifecycle. Returns whether
    /// visible state changed.
    pub(crate) fn on_load_event(&mut self, event: SessionEvent) -> bool {
        if !self.session.apply_event(event) {
            return false;
        }

        if let Some(pages) = self
            .session
            .document()
            .map(|document| document.page_count())
        {
            self.state.cursor_page = 1;
            self.state.selected_highlight = 0;
            self.state.status.message = format!("loaded {pages} pages");
            self.try_apply_pending_target();
        } else if self.session.error().is_some() {
            self.state.status.message = "load failed".to_string();
        }
        true
    }
}

async fn wait_next_event(
    loop_event_rx: &mut UnboundedReceiver<DomainEvent>,
    session: &mut LoadSession,
    redraw_tick: &mut time::Interval,
) -> WaitEvent {
    tokio::select! {
        biased;
        maybe_loop = loop_event_rx.recv() => {
            match maybe_loop {
                Some(event) => WaitEvent::Event(event),
                None => WaitEvent::Closed,
            }
        },
        event = session.next_event() => WaitEvent::Load(event),
        _ = redraw_tick.tick() => {
            WaitEvent::Event(DomainEvent::RedrawTick)
        },
    }
}
