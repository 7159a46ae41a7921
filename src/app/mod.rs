//! Application core — pure domain logic, zero I/O.
//!
//! This module contains the business rules for the SeatSense controller:
//! device orchestration, the tilt-reminder workflow, and the alarm pattern
//! engine. All interaction with the outside world happens through **port
//! traits** defined in [`ports`], keeping this layer fully testable
//! without real peripherals or a broker connection.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
