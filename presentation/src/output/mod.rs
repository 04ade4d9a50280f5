//! Event stream encoders

pub mod console;
pub mod formatter;
