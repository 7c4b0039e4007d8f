//! Interfaces to the downstream geolocation pipeline
//!
//! Trajectory interpolation, waveform target extraction, and ground
//! projection are separate concerns; these traits are the seams they plug
//! into.

use bon::Builder;

use crate::types::Pulse;

/// Aircraft position and attitude at an instant.
#[derive(Debug, Clone, Copy, PartialEq, Builder)]
pub struct Pose {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Degrees.
    pub roll: f64,
    /// Degrees.
    pub pitch: f64,
    /// Degrees.
    pub heading: f64,
}

/// Interpolated trajectory and attitude data for a flight.
pub trait TrajectoryProvider {
    /// Pose at the given time, or `None` when the time falls outside the
    /// recorded trajectory.
    fn position_and_attitude_at(&self, time: f64) -> Option<Pose>;
}

/// Extraction of a target range from a return waveform.
pub trait RangeExtractor {
    /// Range in meters, or `None` when no target can be derived from the
    /// pulse.
    fn extract_range(&self, pulse: &Pulse) -> Option<f64>;
}

/// Projection of a ranged return onto the ground surface.
pub trait GroundProjector {
    /// Projected (x, y, z) coordinates for a return at the given range and
    /// scan angle.
    fn project_to_ground(&self, pose: &Pose, range: f64, scan_angle: f64) -> [f64; 3];
}
