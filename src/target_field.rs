use std::f64::consts::TAU;
use std::fmt;
use std::time::Duration;

use rand::Rng;
use uuid::Uuid;

use crate::error::{Result, TouchError};
use crate::geometry::{zone_center, Point};

/// Stable identifier of a spawned target
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TargetId(Uuid);

impl TargetId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TargetId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// One spawned circle
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Target {
    pub id: TargetId,
    pub position: Point,
    pub created_at: Duration,
}

/// Live targets of a single zone.
///
/// The field does no phase checks; callers decide when spawning is allowed.
#[derive(Debug, Clone)]
pub struct TargetField {
    targets: Vec<Target>,
    margin: f64,
    capacity: Option<usize>,
}

impl TargetField {
    /// Unbounded field whose targets keep `margin` away from the zone center and edge
    pub fn new(margin: f64) -> Self {
        Self {
            targets: Vec::new(),
            margin,
            capacity: None,
        }
    }

    /// Field that refuses to spawn once `capacity` targets are live
    pub fn bounded(margin: f64, capacity: usize) -> Self {
        Self {
            capacity: Some(capacity),
            ..Self::new(margin)
        }
    }

    pub fn with_capacity(margin: f64, capacity: Option<usize>) -> Self {
        match capacity {
            Some(cap) => Self::bounded(margin, cap),
            None => Self::new(margin),
        }
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.capacity.is_some_and(|cap| self.targets.len() >= cap)
    }

    /// Add a target at a random spot of the annulus `[margin, zone_size / 2 - margin]`
    /// around the zone center.
    ///
    /// Returns `Ok(None)` without sampling when the field is at capacity.
    pub fn spawn<R: Rng>(
        &mut self,
        zone_size: f64,
        created_at: Duration,
        rng: &mut R,
    ) -> Result<Option<Target>> {
        if self.is_full() {
            return Ok(None);
        }

        let position = sample_position(zone_size, self.margin, rng)?;
        let target = Target {
            id: TargetId::new(),
            position,
            created_at,
        };
        self.targets.push(target);
        Ok(Some(target))
    }

    /// Remove and return the target with `id`, or `None` if it is already gone
    pub fn resolve(&mut self, id: TargetId) -> Option<Target> {
        let idx = self.targets.iter().position(|t| t.id == id)?;
        Some(self.targets.remove(idx))
    }

    /// Nearest target whose center lies within `radius` of `point`
    pub fn target_at(&self, point: Point, radius: f64) -> Option<TargetId> {
        self.targets
            .iter()
            .map(|t| (t.id, t.position.distance_to(point)))
            .filter(|(_, d)| *d <= radius)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id)
    }

    /// Drop every live target, returning how many were removed
    pub fn clear(&mut self) -> usize {
        let n = self.targets.len();
        self.targets.clear();
        n
    }
}

/// Uniform polar sample: angle in `[0, 2π)`, radius in `[margin, zone_size / 2 - margin]`
pub fn sample_position<R: Rng>(zone_size: f64, margin: f64, rng: &mut R) -> Result<Point> {
    let zone_radius = zone_size / 2.0;
    let max_radius = zone_radius - margin;
    if !max_radius.is_finite() || max_radius < margin {
        return Err(TouchError::ZoneTooSmall { zone_size, margin });
    }

    let angle = rng.gen_range(0.0..TAU);
    let radius = rng.gen_range(margin..=max_radius);
    Ok(zone_center(zone_size).polar_offset(radius, angle))
}
