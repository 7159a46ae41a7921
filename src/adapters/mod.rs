//! Driven adapters — implementations of the port traits for real and
//! simulated backends.

pub mod log_sink;
pub mod sim;
pub mod store;
