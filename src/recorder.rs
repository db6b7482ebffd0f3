use std::time::Duration;

use serde::{Serialize, Serializer};
use tracing::info;

use crate::error::Result;
use crate::geometry::Point;
use crate::target_field::Target;

/// Column names of the session export, in order
pub const EXPORT_HEADER: [&str; 5] = ["hand", "distance_from_center", "dx", "dy", "response_time"];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Hand {
    Left,
    Right,
}

impl Hand {
    pub fn other(&self) -> Hand {
        match self {
            Hand::Left => Hand::Right,
            Hand::Right => Hand::Left,
        }
    }
}

/// One resolved tap
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TouchLogEntry {
    pub hand: Hand,
    pub distance_from_center: f64,
    pub dx: f64,
    pub dy: f64,
    pub response_time: Duration,
}

impl TouchLogEntry {
    pub fn new(target: &Target, hand: Hand, zone_center: Point, now: Duration) -> Self {
        let (dx, dy) = target.position.offset_from(zone_center);
        Self {
            hand,
            distance_from_center: (dx * dx + dy * dy).sqrt(),
            dx,
            dy,
            response_time: now.saturating_sub(target.created_at),
        }
    }

    pub fn response_secs(&self) -> f64 {
        self.response_time.as_secs_f64()
    }
}

#[derive(Serialize)]
struct ExportRow {
    hand: Hand,
    #[serde(serialize_with = "two_decimals")]
    distance_from_center: f64,
    #[serde(serialize_with = "two_decimals")]
    dx: f64,
    #[serde(serialize_with = "two_decimals")]
    dy: f64,
    #[serde(serialize_with = "two_decimals")]
    response_time: f64,
}

impl From<&TouchLogEntry> for ExportRow {
    fn from(e: &TouchLogEntry) -> Self {
        Self {
            hand: e.hand,
            distance_from_center: e.distance_from_center,
            dx: e.dx,
            dy: e.dy,
            response_time: e.response_secs(),
        }
    }
}

fn two_decimals<S: Serializer>(value: &f64, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_str(&format_args!("{:.2}", value))
}

/// Append-only log of resolved taps for one session
#[derive(Debug, Default, Clone)]
pub struct TouchRecorder {
    entries: Vec<TouchLogEntry>,
}

impl TouchRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute the tap geometry for `target` and append it to the log
    pub fn record(
        &mut self,
        target: &Target,
        hand: Hand,
        zone_center: Point,
        now: Duration,
    ) -> TouchLogEntry {
        let entry = TouchLogEntry::new(target, hand, zone_center, now);
        info!(
            %hand,
            dx = entry.dx,
            dy = entry.dy,
            distance = entry.distance_from_center,
            response_secs = entry.response_secs(),
            "touch recorded"
        );
        self.entries.push(entry);
        entry
    }

    pub fn entries(&self) -> &[TouchLogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize the whole log as csv text, header first, one row per entry in log order
    pub fn export(&self) -> Result<String> {
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(vec![]);

        wtr.write_record(EXPORT_HEADER)?;
        for entry in &self.entries {
            wtr.serialize(ExportRow::from(entry))?;
        }

        let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
        Ok(String::from_utf8(bytes)?)
    }
}
