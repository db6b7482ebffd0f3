// Library surface for headless/integration tests and reuse.
// The terminal front end (main.rs, ui.rs) only talks to the core through `session`.
pub mod app_dirs;
pub mod clock;
pub mod config;
pub mod error;
pub mod export;
pub mod geometry;
pub mod logging;
pub mod recorder;
pub mod runtime;
pub mod sequencer;
pub mod session;
pub mod target_field;

pub use error::{Result, TouchError};
pub use recorder::Hand;
pub use sequencer::SessionPhase;
pub use session::{SessionEvent, TouchSession};
