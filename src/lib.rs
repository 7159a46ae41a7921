//! SeatSense controller library.
//!
//! Seating posture monitoring for a powered tilt wheelchair: a pressure
//! mat detects presence and centre of pressure, two accelerometers
//! measure the backrest angle, and a tilt-reminder workflow drives the
//! notification module (LEDs + vibration motor).
//!
//! Hexagonal layout: the pure logic lives in [`app`], [`fsm`],
//! [`sensors`] and [`drivers`]; hardware is reached only through the port
//! traits in [`devices::ports`] and [`app::ports`], with the concrete
//! adapters in [`adapters`]. The broker contract (topics and payload
//! codec) is isolated in [`link`].

pub mod app;
pub mod config;
pub mod fsm;
pub mod link;

pub mod adapters;
pub mod devices;
pub mod drivers;
pub mod sensors;

pub mod error;
