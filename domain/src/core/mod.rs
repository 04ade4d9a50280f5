//! Core domain concepts shared across all subdomains.
//!
//! - [`provider::ProviderId`] / [`provider::Provider`] — external LLM providers
//! - [`provider::ProviderCatalog`] — loaded-once table of provider profiles
//! - [`error::DomainError`] — domain-level errors

pub mod error;
pub mod provider;
