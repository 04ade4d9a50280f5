//! Failure isolation for external providers.

pub mod circuit_breaker;

pub use circuit_breaker::{Admission, CircuitBreaker, CircuitState};
