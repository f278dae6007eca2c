use serde::{Deserialize, Serialize};

use crate::types::{Point, TipRackGeometry};

/// Measurements produced by a session. Fields fill as their save commands
/// succeed; only `invalidate_tip` clears anything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Measurements {
    pub nozzle_offset: Option<Point>,
    pub tip_offset: Option<Point>,
    pub tip_length: Option<f64>,
    pub tip_attached: bool,
}

impl Measurements {
    /// Clear the tip flag and every tip-specific measurement.
    pub fn invalidate_tip(&mut self) {
        self.tip_attached = false;
        self.tip_offset = None;
        self.tip_length = None;
    }
}

/// Jog accumulator for the current measuring state.
///
/// `reference` is the pose moved to on entering the state; `offset` is the
/// sum of jogs since then and stays `None` until the first jog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionEstimate {
    reference: Option<Point>,
    offset: Option<Point>,
}

impl PositionEstimate {
    pub fn reset(&mut self, reference: Point) {
        self.reference = Some(reference);
        self.offset = None;
    }

    pub fn accumulate(&mut self, vector: Point) {
        self.offset = Some(self.offset.unwrap_or(Point::ZERO) + vector);
    }

    pub fn offset(&self) -> Option<Point> {
        self.offset
    }

    pub fn reference(&self) -> Option<Point> {
        self.reference
    }

    /// Absolute position, when both the reference and an offset exist.
    pub fn absolute(&self) -> Option<Point> {
        Some(self.reference? + self.offset?)
    }
}

/// Everything a handler may mutate. The controller hands handlers a copy
/// and commits it only when the handler succeeds.
#[derive(Debug, Clone, Default)]
pub struct SessionData {
    pub measurements: Measurements,
    pub position: PositionEstimate,
    /// Set by a successful `pick_up_tip`, cleared by `invalidate_tip`.
    pub tip_picked_up: bool,
    pub tip_rack: Option<TipRackGeometry>,
    pub pipette_id: Option<String>,
}

impl SessionData {
    /// Length derived from the two measured heights: the tip's reference
    /// pose sits `nominal` above the nozzle's, so a perfect tip jogs by the
    /// same z in both states.
    pub fn derive_tip_length(nominal: f64, nozzle_offset: Point, tip_offset: Point) -> f64 {
        nominal + tip_offset.z - nozzle_offset.z
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_is_unset_until_first_jog() {
        let mut est = PositionEstimate::default();
        est.reset(Point::new(10.0, 10.0, 40.0));
        assert_eq!(est.offset(), None);
        assert_eq!(est.absolute(), None);

        est.accumulate(Point::new(0.0, 0.0, -2.0));
        assert_eq!(est.offset(), Some(Point::new(0.0, 0.0, -2.0)));
        assert_eq!(est.absolute(), Some(Point::new(10.0, 10.0, 38.0)));
    }

    #[test]
    fn reset_discards_previous_jogs() {
        let mut est = PositionEstimate::default();
        est.reset(Point::ZERO);
        est.accumulate(Point::new(1.0, 1.0, 1.0));
        est.reset(Point::new(0.0, 0.0, 50.0));
        assert_eq!(est.offset(), None);
        assert_eq!(est.reference(), Some(Point::new(0.0, 0.0, 50.0)));
    }

    #[test]
    fn invalidate_keeps_nozzle_offset() {
        let mut m = Measurements {
            nozzle_offset: Some(Point::new(1.0, 2.0, 3.0)),
            tip_offset: Some(Point::ZERO),
            tip_length: Some(59.3),
            tip_attached: true,
        };
        m.invalidate_tip();
        assert_eq!(m.nozzle_offset, Some(Point::new(1.0, 2.0, 3.0)));
        assert_eq!(m.tip_offset, None);
        assert_eq!(m.tip_length, None);
        assert!(!m.tip_attached);
    }

    #[test]
    fn tip_length_tracks_height_difference() {
        let nozzle = Point::new(0.0, 0.0, -1.5);
        let tip = Point::new(0.0, 0.0, -0.5);
        let length = SessionData::derive_tip_length(59.3, nozzle, tip);
        assert!((length - 60.3).abs() < 1e-9);
    }
}
