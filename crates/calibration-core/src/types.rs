use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign};
use std::str::FromStr;

/// Point (or vector) in deck coordinates, millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0, z: 0.0 };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Point {
    fn add_assign(&mut self, rhs: Point) {
        *self = *self + rhs;
    }
}

impl From<[f64; 3]> for Point {
    fn from(v: [f64; 3]) -> Self {
        Point::new(v[0], v[1], v[2])
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.3}, {:.3}, {:.3})", self.x, self.y, self.z)
    }
}

/// Physical pipette mount on the gantry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mount {
    Left,
    Right,
}

impl Mount {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mount::Left => "left",
            Mount::Right => "right",
        }
    }
}

impl fmt::Display for Mount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mount {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "left" => Ok(Mount::Left),
            "right" => Ok(Mount::Right),
            other => Err(format!("unknown mount: {}", other)),
        }
    }
}

/// What the hardware reports about the pipette on a mount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentInfo {
    pub model: String,
    pub pipette_id: Option<String>,
    pub channels: u8,
    pub has_tip: bool,
}

/// Geometry the calibration needs from a tip rack definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TipRackGeometry {
    pub load_name: String,
    pub display_name: String,
    /// Nominal length of a tip from this rack, mm.
    pub tip_length: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn points_add_componentwise() {
        let mut p = Point::new(1.0, 0.0, 0.0);
        p += Point::new(0.0, 1.0, 0.0);
        p += Point::from([0.0, 0.0, 1.0]);
        assert_eq!(p, Point::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn non_finite_points_are_detected() {
        assert!(Point::new(1.0, 2.0, 3.0).is_finite());
        assert!(!Point::new(f64::NAN, 0.0, 0.0).is_finite());
        assert!(!Point::new(0.0, f64::INFINITY, 0.0).is_finite());
    }

    #[test]
    fn mount_parses_case_insensitively() {
        assert_eq!("LEFT".parse::<Mount>().unwrap(), Mount::Left);
        assert_eq!("right".parse::<Mount>().unwrap(), Mount::Right);
        assert!("middle".parse::<Mount>().is_err());
    }
}
