use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, error, info, warn};

use crate::clock::{Cadence, Clock, SystemClock};
use crate::config::SessionConfig;
use crate::error::Result;
use crate::geometry::Point;
use crate::recorder::{Hand, TouchLogEntry, TouchRecorder};
use crate::sequencer::{Countdown, SessionPhase, Sequencer};
use crate::target_field::{Target, TargetField, TargetId};

/// Something the presentation layer should react to
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    PhaseEntered(SessionPhase),
    /// The session finished; carries the csv export of the full log
    ExportReady(String),
}

#[derive(Debug, Clone, Copy)]
struct Schedule {
    tick: Cadence,
    spawn: Cadence,
}

enum Due {
    Tick,
    Spawn,
}

impl Schedule {
    fn next_due(&self, now: std::time::Duration) -> Option<Due> {
        match (self.tick.is_due(now), self.spawn.is_due(now)) {
            (true, true) if self.tick.next_due() <= self.spawn.next_due() => Some(Due::Tick),
            (_, true) => Some(Due::Spawn),
            (true, false) => Some(Due::Tick),
            (false, false) => None,
        }
    }
}

/// One run of the two-hand touch test.
///
/// Owns the phase sequencer, a target field per hand and the touch log. The
/// caller feeds it clock ticks, spawn ticks and taps, either directly or by
/// calling [`TouchSession::pump`] which derives both tick streams from the clock.
#[derive(Debug)]
pub struct TouchSession<C, R> {
    config: SessionConfig,
    sequencer: Sequencer,
    left: TargetField,
    right: TargetField,
    recorder: TouchRecorder,
    clock: C,
    rng: R,
    schedule: Option<Schedule>,
}

impl TouchSession<SystemClock, StdRng> {
    pub fn with_system_clock(config: SessionConfig) -> Self {
        Self::new(config, SystemClock::new(), StdRng::from_entropy())
    }
}

impl<C: Clock, R: Rng> TouchSession<C, R> {
    pub fn new(config: SessionConfig, clock: C, rng: R) -> Self {
        let field = TargetField::with_capacity(config.target_radius, config.max_targets);
        Self {
            sequencer: Sequencer::new(&config),
            left: field.clone(),
            right: field,
            recorder: TouchRecorder::new(),
            clock,
            rng,
            schedule: None,
            config,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn phase(&self) -> SessionPhase {
        self.sequencer.phase()
    }

    pub fn is_finished(&self) -> bool {
        self.phase().is_finished()
    }

    pub fn countdown(&self) -> Option<&Countdown> {
        self.sequencer.countdown()
    }

    pub fn countdown_text(&self) -> Option<String> {
        self.countdown().map(Countdown::text)
    }

    pub fn active_hand(&self) -> Option<Hand> {
        self.sequencer.active_hand()
    }

    pub fn field(&self, hand: Hand) -> &TargetField {
        match hand {
            Hand::Left => &self.left,
            Hand::Right => &self.right,
        }
    }

    fn field_mut(&mut self, hand: Hand) -> &mut TargetField {
        match hand {
            Hand::Left => &mut self.left,
            Hand::Right => &mut self.right,
        }
    }

    pub fn targets(&self, hand: Hand) -> &[Target] {
        self.field(hand).targets()
    }

    /// Target of `hand`'s zone under `point`, using the target radius as hit area
    pub fn target_at(&self, hand: Hand, point: Point) -> Option<TargetId> {
        self.field(hand).target_at(point, self.config.target_radius)
    }

    pub fn log(&self) -> &[TouchLogEntry] {
        self.recorder.entries()
    }

    /// Csv text of everything logged so far. Safe to call again after a failed write.
    pub fn export(&self) -> Result<String> {
        self.recorder.export()
    }

    /// Begin the countdown to the right-hand trial. Tick cadences are anchored here.
    pub fn start(&mut self) -> Vec<SessionEvent> {
        let Some(entered) = self.sequencer.start() else {
            return vec![];
        };

        let now = self.clock.now();
        self.schedule = Some(Schedule {
            tick: Cadence::starting_at(now, self.config.tick_interval),
            spawn: Cadence::starting_at(now, self.config.spawn_interval),
        });
        vec![SessionEvent::PhaseEntered(entered)]
    }

    /// One countdown/trial time unit
    pub fn tick(&mut self) -> Vec<SessionEvent> {
        let left_phase = self.sequencer.phase();
        match self.sequencer.tick() {
            Some(entered) => self.on_phase_change(left_phase, entered),
            None => vec![],
        }
    }

    /// Spawn into the active zone, if there is one
    pub fn spawn_tick(&mut self, zone_size: f64) -> Option<Target> {
        let hand = self.sequencer.active_hand()?;
        let now = self.clock.now();
        let field = match hand {
            Hand::Left => &mut self.left,
            Hand::Right => &mut self.right,
        };

        match field.spawn(zone_size, now, &mut self.rng) {
            Ok(Some(target)) => {
                debug!(%hand, id = %target.id, x = target.position.x, y = target.position.y, "target spawned");
                Some(target)
            }
            Ok(None) => {
                debug!(%hand, live = field.len(), "zone full, spawn skipped");
                None
            }
            Err(e) => {
                warn!(%hand, error = %e, "spawn skipped");
                None
            }
        }
    }

    /// Fire every tick and spawn tick that is due on the clock, oldest first
    pub fn pump(&mut self, zone_size: f64) -> Vec<SessionEvent> {
        let now = self.clock.now();
        let mut events = Vec::new();

        while let Some(due) = self.schedule.as_ref().and_then(|s| s.next_due(now)) {
            match due {
                Due::Tick => {
                    if let Some(schedule) = self.schedule.as_mut() {
                        schedule.tick.fire();
                    }
                    events.extend(self.tick());
                }
                Due::Spawn => {
                    if let Some(schedule) = self.schedule.as_mut() {
                        schedule.spawn.fire();
                    }
                    self.spawn_tick(zone_size);
                }
            }
        }

        events
    }

    /// Resolve a tap on `id` in `hand`'s zone and log it.
    ///
    /// Returns `None` when the target is no longer live, e.g. a repeated tap.
    pub fn tap(&mut self, hand: Hand, id: TargetId, zone_center: Point) -> Option<TouchLogEntry> {
        let Some(target) = self.field_mut(hand).resolve(id) else {
            debug!(%hand, %id, "tap on unknown target ignored");
            return None;
        };

        let now = self.clock.now();
        Some(self.recorder.record(&target, hand, zone_center, now))
    }

    fn on_phase_change(&mut self, left_phase: SessionPhase, entered: SessionPhase) -> Vec<SessionEvent> {
        let mut events = vec![SessionEvent::PhaseEntered(entered)];

        if let Some(hand) = left_phase.active_hand() {
            let dropped = self.field_mut(hand).clear();
            if dropped > 0 {
                info!(%hand, dropped, "trial over, cleared unresolved targets");
            }
        }

        if entered.is_finished() {
            self.schedule = None;
            match self.recorder.export() {
                Ok(text) => {
                    info!(entries = self.recorder.len(), "session finished, export ready");
                    events.push(SessionEvent::ExportReady(text));
                }
                Err(e) => error!(error = %e, "session finished but export failed"),
            }
        }

        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::geometry::zone_center;
    use assert_matches::assert_matches;
    use std::time::Duration;

    const ZONE: f64 = 400.0;

    fn session() -> TouchSession<ManualClock, StdRng> {
        TouchSession::new(
            SessionConfig::default(),
            ManualClock::new(),
            StdRng::seed_from_u64(42),
        )
    }

    fn tick_n<C: Clock, R: Rng>(s: &mut TouchSession<C, R>, n: u32) -> Vec<SessionEvent> {
        (0..n).flat_map(|_| s.tick()).collect()
    }

    #[test]
    fn test_new_session_is_idle() {
        let s = session();
        assert_eq!(s.phase(), SessionPhase::Idle);
        assert_eq!(s.countdown_text(), None);
        assert!(s.targets(Hand::Left).is_empty());
        assert!(s.targets(Hand::Right).is_empty());
        assert!(s.log().is_empty());
    }

    #[test]
    fn test_start_enters_right_countdown() {
        let mut s = session();
        assert_eq!(
            s.start(),
            vec![SessionEvent::PhaseEntered(SessionPhase::CountdownRight)]
        );
        assert_eq!(
            s.countdown_text().as_deref(),
            Some("Right hand test starts in 3...")
        );
        assert!(s.start().is_empty());
    }

    #[test]
    fn test_spawn_only_into_active_zone() {
        let mut s = session();
        assert!(s.spawn_tick(ZONE).is_none());

        s.start();
        assert!(s.spawn_tick(ZONE).is_none());

        tick_n(&mut s, 3);
        assert_eq!(s.active_hand(), Some(Hand::Right));
        assert!(s.spawn_tick(ZONE).is_some());
        assert_eq!(s.targets(Hand::Right).len(), 1);
        assert!(s.targets(Hand::Left).is_empty());

        tick_n(&mut s, 30 + 3);
        assert_eq!(s.active_hand(), Some(Hand::Left));
        assert!(s.spawn_tick(ZONE).is_some());
        assert_eq!(s.targets(Hand::Left).len(), 1);
        assert!(s.targets(Hand::Right).is_empty());
    }

    #[test]
    fn test_tap_records_entry() {
        let mut s = session();
        s.start();
        tick_n(&mut s, 3);

        s.clock().set(Duration::from_secs(4));
        let target = s.spawn_tick(ZONE).unwrap();
        s.clock().set(Duration::from_millis(6350));

        let entry = s.tap(Hand::Right, target.id, zone_center(ZONE)).unwrap();
        assert_eq!(entry.hand, Hand::Right);
        assert_eq!(entry.response_time, Duration::from_millis(2350));
        assert!((entry.distance_from_center - (entry.dx.powi(2) + entry.dy.powi(2)).sqrt()).abs() < 1e-9);
        assert!((40.0 - 1e-9..=160.0 + 1e-9).contains(&entry.distance_from_center));
        assert!(s.targets(Hand::Right).is_empty());
        assert_eq!(s.log().len(), 1);
    }

    #[test]
    fn test_double_tap_logs_once() {
        let mut s = session();
        s.start();
        tick_n(&mut s, 3);
        let target = s.spawn_tick(ZONE).unwrap();

        assert!(s.tap(Hand::Right, target.id, zone_center(ZONE)).is_some());
        assert!(s.tap(Hand::Right, target.id, zone_center(ZONE)).is_none());
        assert_eq!(s.log().len(), 1);
    }

    #[test]
    fn test_tap_in_wrong_zone_is_ignored() {
        let mut s = session();
        s.start();
        tick_n(&mut s, 3);
        let target = s.spawn_tick(ZONE).unwrap();

        assert!(s.tap(Hand::Left, target.id, zone_center(ZONE)).is_none());
        assert!(s.log().is_empty());
        assert_eq!(s.targets(Hand::Right).len(), 1);
    }

    #[test]
    fn test_unresolved_targets_cleared_when_trial_ends() {
        let mut s = session();
        s.start();
        tick_n(&mut s, 3);
        let target = s.spawn_tick(ZONE).unwrap();
        s.spawn_tick(ZONE).unwrap();

        tick_n(&mut s, 30);
        assert_eq!(s.phase(), SessionPhase::CountdownLeft);
        assert!(s.targets(Hand::Right).is_empty());
        assert!(s.tap(Hand::Right, target.id, zone_center(ZONE)).is_none());
    }

    #[test]
    fn test_export_emitted_once_at_finish() {
        let mut s = session();
        let mut events = s.start();
        events.extend(tick_n(&mut s, 3));
        let target = s.spawn_tick(ZONE).unwrap();
        s.tap(Hand::Right, target.id, zone_center(ZONE));
        events.extend(tick_n(&mut s, 30 + 3 + 30 + 10));

        let exports: Vec<&String> = events
            .iter()
            .filter_map(|e| match e {
                SessionEvent::ExportReady(text) => Some(text),
                _ => None,
            })
            .collect();
        assert_eq!(exports.len(), 1);
        assert!(exports[0].starts_with("hand,distance_from_center,dx,dy,response_time\nright,"));
        assert_eq!(exports[0].lines().count(), 2);
        assert_matches!(events.last(), Some(SessionEvent::ExportReady(_)));
        assert!(s.is_finished());
    }

    #[test]
    fn test_export_can_be_repeated_after_finish() {
        let mut s = session();
        s.start();
        let events = tick_n(&mut s, 3 + 30 + 3 + 30);
        let emitted = events.iter().find_map(|e| match e {
            SessionEvent::ExportReady(text) => Some(text.clone()),
            _ => None,
        });
        assert_eq!(emitted, Some(s.export().unwrap()));
    }

    #[test]
    fn test_pump_without_start_does_nothing() {
        let mut s = session();
        s.clock().advance(Duration::from_secs(100));
        assert!(s.pump(ZONE).is_empty());
        assert_eq!(s.phase(), SessionPhase::Idle);
    }

    #[test]
    fn test_pump_follows_clock() {
        let mut s = session();
        s.start();

        s.clock().advance(Duration::from_millis(2500));
        assert!(s.pump(ZONE).is_empty());
        assert_eq!(s.countdown().unwrap().remaining(), 1);

        s.clock().advance(Duration::from_millis(500));
        assert_eq!(
            s.pump(ZONE),
            vec![SessionEvent::PhaseEntered(SessionPhase::ActiveRight)]
        );

        // spawn ticks land on even seconds
        s.clock().advance(Duration::from_secs(1));
        s.pump(ZONE);
        assert_eq!(s.targets(Hand::Right).len(), 1);
        assert_eq!(s.targets(Hand::Right)[0].created_at, Duration::from_secs(4));
    }

    #[test]
    fn test_capped_session_limits_live_targets() {
        let mut s = TouchSession::new(
            SessionConfig::capped(),
            ManualClock::new(),
            StdRng::seed_from_u64(1),
        );
        s.start();
        tick_n(&mut s, 3);
        for _ in 0..10 {
            assert!(s.spawn_tick(ZONE).is_some());
        }
        assert!(s.spawn_tick(ZONE).is_none());
        assert_eq!(s.targets(Hand::Right).len(), 10);
    }

    #[test]
    fn test_spawn_into_tiny_zone_is_skipped() {
        let mut s = session();
        s.start();
        tick_n(&mut s, 3);
        assert!(s.spawn_tick(50.0).is_none());
        assert!(s.targets(Hand::Right).is_empty());
    }
}
