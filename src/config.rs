use std::time::Duration;

/// Seconds shown by each pre-trial countdown
pub const COUNTDOWN_SECS: u32 = 3;
/// Length of one hand's trial, in ticks
pub const TRIAL_SECS: u32 = 30;
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);
pub const SPAWN_INTERVAL: Duration = Duration::from_secs(2);
/// Drawn and hit-test radius of a target; also the minimum gap kept from the zone center
/// and from the zone boundary when spawning
pub const TARGET_RADIUS: f64 = 40.0;
/// Live target cap used by the capped field variant
pub const CAPPED_MAX_TARGETS: usize = 10;

pub const RIGHT_COUNTDOWN_LABEL: &str = "Right hand test starts in";
pub const LEFT_COUNTDOWN_LABEL: &str = "Left hand test starts in";

/// Timing and geometry constants for one session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub countdown_secs: u32,
    pub trial_secs: u32,
    pub tick_interval: Duration,
    pub spawn_interval: Duration,
    pub target_radius: f64,
    pub max_targets: Option<usize>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            countdown_secs: COUNTDOWN_SECS,
            trial_secs: TRIAL_SECS,
            tick_interval: TICK_INTERVAL,
            spawn_interval: SPAWN_INTERVAL,
            target_radius: TARGET_RADIUS,
            max_targets: None,
        }
    }
}

impl SessionConfig {
    /// Same timings with each zone capped at [`CAPPED_MAX_TARGETS`] live targets
    pub fn capped() -> Self {
        Self {
            max_targets: Some(CAPPED_MAX_TARGETS),
            ..Self::default()
        }
    }

    pub fn trial_duration(&self) -> Duration {
        self.tick_interval * self.trial_secs
    }
}
