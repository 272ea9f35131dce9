//! Provider-facing descriptors (data), strategies (behavior), and normalized profiles.
//!
//! `descriptor` exposes validated metadata (`ProviderDescriptor`) covering HTTPS-only
//! endpoints, client authentication preferences, and provider quirks (PKCE requirement,
//! scope delimiter, bearer token placement). `strategy` defines [`ProviderStrategy`], the
//! extension point the generic engine calls to fetch a provider's user profile and to
//! classify token endpoint errors. `resource` carries the protected-resource helper handed
//! to strategies, and `profile` the provider-agnostic [`Profile`] they produce.

pub mod descriptor;
pub mod profile;
pub mod resource;
pub mod strategy;

pub use descriptor::*;
pub use profile::*;
pub use resource::*;
pub use strategy::*;
