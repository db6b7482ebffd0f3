/// A point in zone-local coordinates. The origin is the top-left corner of the
/// zone's bounding square and `y` grows downward.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Signed offset of `self` relative to `origin`
    pub fn offset_from(&self, origin: Point) -> (f64, f64) {
        (self.x - origin.x, self.y - origin.y)
    }

    pub fn distance_to(&self, other: Point) -> f64 {
        let (dx, dy) = self.offset_from(other);
        (dx * dx + dy * dy).sqrt()
    }

    /// Point at `radius` along `angle` (radians) from `self`
    pub fn polar_offset(&self, radius: f64, angle: f64) -> Point {
        Point::new(self.x + radius * angle.cos(), self.y + radius * angle.sin())
    }
}

impl From<(f64, f64)> for Point {
    fn from(v: (f64, f64)) -> Self {
        Point { x: v.0, y: v.1 }
    }
}

/// Geometric center of a square zone of side `zone_size`
pub fn zone_center(zone_size: f64) -> Point {
    let radius = zone_size / 2.0;
    Point::new(radius, radius)
}
