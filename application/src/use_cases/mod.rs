//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod chat;
pub mod debate;
pub mod orchestrate;
pub(crate) mod shared;

#[cfg(test)]
pub(crate) mod test_support;
