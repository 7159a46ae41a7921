//! Sensor processors — pure computation over raw samples.
//!
//! Nothing in this module touches a bus. Raw samples come in through the
//! port traits in [`crate::devices::ports`]; these types turn them into
//! presence decisions, centre-of-pressure coordinates, back-seat angles,
//! and movement flags.

pub mod force_plate;
pub mod motion;
pub mod orientation;
pub mod pressure_mat;

/// A 2-D coordinate on the mat surface (cm, origin at the seat centre).
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Coord {
    pub x: f32,
    pub y: f32,
}
