//! Output drivers — pure signal generation, no bus access.

pub mod alarm_patterns;
