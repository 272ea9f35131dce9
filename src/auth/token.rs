//! Token secrets and the grants issued by a provider's token endpoint.

pub mod grant;
pub mod secret;
