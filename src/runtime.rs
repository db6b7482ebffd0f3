use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

use crossterm::event::{
    self, Event as CtEvent, KeyEvent, KeyEventKind, MouseButton, MouseEventKind,
};

/// What the front end reacts to: keys, taps, resizes, and idle wake-ups
#[derive(Clone, Debug, PartialEq)]
pub enum TapEvent {
    Key(KeyEvent),
    /// Primary button pressed on terminal cell (`column`, `row`)
    Click { column: u16, row: u16 },
    Resize,
    Tick,
}

/// Map a raw terminal event onto a [`TapEvent`].
///
/// Only a left button press counts as a tap; drags, releases, scrolls and moves are dropped,
/// as are key releases reported by terminals with enhanced keyboard support.
pub fn translate(event: CtEvent) -> Option<TapEvent> {
    match event {
        CtEvent::Key(key) if key.kind != KeyEventKind::Release => Some(TapEvent::Key(key)),
        CtEvent::Mouse(mouse) => match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => Some(TapEvent::Click {
                column: mouse.column,
                row: mouse.row,
            }),
            _ => None,
        },
        CtEvent::Resize(_, _) => Some(TapEvent::Resize),
        _ => None,
    }
}

/// Source of terminal events
pub trait TapEventSource: Send + 'static {
    /// Wait up to `timeout` for the next event
    fn recv_timeout(&self, timeout: Duration) -> Result<TapEvent, RecvTimeoutError>;
}

/// Events delivered over a channel, either from the terminal reader thread or from a test
pub struct ChannelEventSource {
    rx: Receiver<TapEvent>,
}

impl ChannelEventSource {
    pub fn new(rx: Receiver<TapEvent>) -> Self {
        Self { rx }
    }

    /// Spawn a thread that reads crossterm events until the receiver goes away
    pub fn crossterm() -> Self {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || forward_terminal_events(tx));
        Self::new(rx)
    }
}

fn forward_terminal_events(tx: Sender<TapEvent>) {
    while let Ok(raw) = event::read() {
        let Some(evt) = translate(raw) else {
            continue;
        };
        if tx.send(evt).is_err() {
            break;
        }
    }
}

impl TapEventSource for ChannelEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<TapEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Pulls one event at a time, waking with [`TapEvent::Tick`] at least every `poll_interval`
/// so the session clock is pumped even when the user is idle.
pub struct Runner<E: TapEventSource> {
    event_source: E,
    poll_interval: Duration,
}

impl<E: TapEventSource> Runner<E> {
    pub fn new(event_source: E, poll_interval: Duration) -> Self {
        Self {
            event_source,
            poll_interval,
        }
    }

    /// Next event, or `Tick` once the poll interval passes or the source is gone
    pub fn step(&self) -> TapEvent {
        self.event_source
            .recv_timeout(self.poll_interval)
            .unwrap_or(TapEvent::Tick)
    }
}
