//! Protected-resource helper bound to a single access token.

// self
use crate::{
	_prelude::*,
	auth::{ProviderId, TokenSecret},
	error::ConfigError,
	provider::ProviderEndpoints,
};

/// Boxed future returned by [`ResourceFetcher::fetch`].
pub type ResourceFuture<'a> = Pin<Box<dyn Future<Output = Result<Vec<u8>>> + 'a + Send>>;

/// Object-safe GET primitive implemented by the engine's transport layer.
///
/// Implementations attach the access token according to the provider's
/// [`BearerPlacement`](crate::provider::BearerPlacement), treat non-2xx statuses as
/// [`TransportError::Status`](crate::error::TransportError::Status), and return the raw
/// response body.
pub trait ResourceFetcher: Send + Sync {
	/// Issues an authenticated GET against `url`.
	fn fetch<'a>(&'a self, url: &'a Url, access_token: &'a TokenSecret) -> ResourceFuture<'a>;
}

/// Everything a provider strategy needs to read protected resources for one access token.
#[derive(Clone, Copy)]
pub struct ProtectedResource<'a> {
	provider: &'a ProviderId,
	endpoints: &'a ProviderEndpoints,
	access_token: &'a TokenSecret,
	fetcher: &'a dyn ResourceFetcher,
}
impl<'a> ProtectedResource<'a> {
	/// Binds `fetcher` to the provider's endpoints and an access token.
	pub fn new(
		provider: &'a ProviderId,
		endpoints: &'a ProviderEndpoints,
		access_token: &'a TokenSecret,
		fetcher: &'a dyn ResourceFetcher,
	) -> Self {
		Self { provider, endpoints, access_token, fetcher }
	}

	/// Provider identifier used to tag normalized profiles.
	pub fn provider(&self) -> &'a ProviderId {
		self.provider
	}

	/// Endpoints declared by the provider descriptor.
	pub fn endpoints(&self) -> &'a ProviderEndpoints {
		self.endpoints
	}

	/// Returns the user-info endpoint or a configuration error when none was declared.
	pub fn profile_endpoint(&self) -> Result<&'a Url> {
		self.endpoints.profile.as_ref().ok_or_else(|| {
			ConfigError::MissingProfileEndpoint { descriptor: self.provider.to_string() }.into()
		})
	}

	/// Issues an authenticated GET against `url` and returns the response body.
	pub async fn get(&self, url: &Url) -> Result<Vec<u8>> {
		self.fetcher.fetch(url, self.access_token).await
	}
}
impl Debug for ProtectedResource<'_> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ProtectedResource")
			.field("provider", self.provider)
			.field("endpoints", self.endpoints)
			.field("access_token", self.access_token)
			.finish()
	}
}
