//! Generic OAuth 2.0 delegation engine that provider strategies plug into.

pub mod authenticate;
pub mod options;
pub mod session;
pub mod verify;

mod exchange;

pub use authenticate::*;
pub use options::*;
pub use session::*;
pub use verify::*;

// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, TokenSecret},
	error::ConfigError,
	http::OAuthHttpClient,
	oauth::{ProtectedResourceClient, TransportErrorMapper},
	obs::{self, FlowKind},
	provider::{Profile, ProtectedResource, ProviderDescriptor, ProviderStrategy},
};
#[cfg(feature = "reqwest")]
use crate::{http::ReqwestHttpClient, oauth::ReqwestTransportErrorMapper};

#[cfg(feature = "reqwest")]
/// Strategy specialized for the crate's default reqwest transport stack.
pub type ReqwestStrategy<U> = OAuth2Strategy<U, ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Runs the OAuth 2.0 authorization-code handshake against a single provider descriptor.
///
/// The engine owns the HTTP client, provider descriptor, provider strategy, and the
/// application's verify callback so each provider only has to describe its endpoints and
/// how to read a user profile. Every shared part sits behind an [`Arc`], which makes the
/// strategy cheap to clone and safe to share across request handlers.
pub struct OAuth2Strategy<U, C, M>
where
	C: ?Sized + OAuthHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Provider descriptor that defines OAuth endpoints and quirks.
	pub descriptor: ProviderDescriptor,
	/// Provider hooks used for profile retrieval and token error classification.
	pub provider: Arc<dyn ProviderStrategy>,
	/// HTTP client wrapper used for every outbound provider request.
	pub http_client: Arc<C>,
	/// Mapper applied to transport-layer errors before surfacing them to callers.
	pub transport_mapper: Arc<M>,
	verify: Arc<dyn Verify<U>>,
	client_id: String,
	client_secret: TokenSecret,
	callback_url: Url,
	scope: ScopeSet,
}
impl<U, C, M> OAuth2Strategy<U, C, M>
where
	C: ?Sized + OAuthHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a strategy that reuses the caller-provided transport + mapper pair.
	///
	/// A missing verify callback is rejected before anything else is inspected. Client
	/// credentials must be non-empty and the descriptor identifier, which doubles as the
	/// strategy name, must be lowercase.
	pub fn with_http_client(
		descriptor: ProviderDescriptor,
		provider: Arc<dyn ProviderStrategy>,
		options: StrategyOptions,
		verify: Option<Arc<dyn Verify<U>>>,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Result<Self> {
		let verify = verify.ok_or(ConfigError::MissingVerifyCallback)?;

		options.validate()?;

		if !descriptor.id.is_lowercase() {
			return Err(ConfigError::InvalidStrategyName { name: descriptor.id.to_string() }.into());
		}

		let scope =
			ScopeSet::new(options.scope.iter().map(String::as_str)).map_err(ConfigError::from)?;
		let StrategyOptions { client_id, client_secret, callback_url, .. } = options;

		Ok(Self {
			descriptor,
			provider,
			http_client: http_client.into(),
			transport_mapper: mapper.into(),
			verify,
			client_id,
			client_secret,
			callback_url,
			scope,
		})
	}

	/// Name under which hosts register the strategy (the descriptor identifier).
	pub fn name(&self) -> &str {
		&self.descriptor.id
	}

	/// OAuth 2.0 client identifier sent on every request.
	pub fn client_id(&self) -> &str {
		&self.client_id
	}

	/// Redirect URI the provider sends users back to.
	pub fn callback_url(&self) -> &Url {
		&self.callback_url
	}

	/// Scopes requested on the authorize URL.
	pub fn scope(&self) -> &ScopeSet {
		&self.scope
	}

	/// Fetches and normalizes the user's profile for `access_token`.
	///
	/// The GET is delegated to the provider strategy through a [`ProtectedResource`]
	/// bound to the token. Transport and parse failures are returned unchanged; nothing is
	/// retried and nothing is cached.
	pub async fn user_profile(&self, access_token: &TokenSecret) -> Result<Profile> {
		let fetcher = ProtectedResourceClient::new(
			self.http_client.clone(),
			self.transport_mapper.clone(),
			self.descriptor.quirks.bearer_placement,
		);
		let resource = ProtectedResource::new(
			&self.descriptor.id,
			&self.descriptor.endpoints,
			access_token,
			&fetcher,
		);

		obs::observe(
			FlowKind::Profile,
			self.name(),
			"user_profile",
			self.provider.user_profile(resource),
		)
		.await
	}

	pub(crate) fn verify_callback(&self) -> &dyn Verify<U> {
		self.verify.as_ref()
	}

	pub(crate) fn client_secret(&self) -> &TokenSecret {
		&self.client_secret
	}
}
#[cfg(feature = "reqwest")]
impl<U> OAuth2Strategy<U, ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a strategy that provisions its own reqwest-backed transport.
	pub fn new(
		descriptor: ProviderDescriptor,
		provider: Arc<dyn ProviderStrategy>,
		options: StrategyOptions,
		verify: Option<Arc<dyn Verify<U>>>,
	) -> Result<Self> {
		Self::with_http_client(
			descriptor,
			provider,
			options,
			verify,
			ReqwestHttpClient::default(),
			Arc::new(ReqwestTransportErrorMapper),
		)
	}
}
impl<U, C, M> Clone for OAuth2Strategy<U, C, M>
where
	C: ?Sized + OAuthHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn clone(&self) -> Self {
		Self {
			descriptor: self.descriptor.clone(),
			provider: self.provider.clone(),
			http_client: self.http_client.clone(),
			transport_mapper: self.transport_mapper.clone(),
			verify: self.verify.clone(),
			client_id: self.client_id.clone(),
			client_secret: self.client_secret.clone(),
			callback_url: self.callback_url.clone(),
			scope: self.scope.clone(),
		}
	}
}
impl<U, C, M> Debug for OAuth2Strategy<U, C, M>
where
	C: ?Sized + OAuthHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("OAuth2Strategy")
			.field("name", &self.name())
			.field("descriptor", &self.descriptor)
			.field("client_id", &self.client_id)
			.field("client_secret_set", &!self.client_secret.is_empty())
			.field("callback_url", &self.callback_url)
			.field("scope", &self.scope)
			.finish()
	}
}

#[cfg(all(test, feature = "reqwest"))]
mod tests {
	// crates.io
	use httpmock::prelude::*;
	// self
	use super::*;
	use crate::{_preludet::*, auth::ProviderId, error::ConfigError, flattr::FlattrProvider};

	fn options(server: &MockServer) -> StrategyOptions {
		StrategyOptions::new(
			"client",
			"secret",
			Url::parse("https://app.example.com/callback").expect("Callback fixture should parse."),
		)
		.with_profile_url(Url::parse(&server.url("/user")).expect("Profile URL should parse."))
	}

	#[tokio::test]
	async fn clones_share_transport_and_fetch_profiles() {
		let server = MockServer::start_async().await;
		let strategy = build_reqwest_test_strategy(options(&server), accept_all());
		let clone = strategy.clone();
		let mock = server
			.mock_async(|when, then| {
				when.method(GET).path("/user").header("authorization", "Bearer tok");
				then.status(200)
					.header("content-type", "application/json")
					.body(r#"{"username":"carol","firstname":"Carol","lastname":"Ng"}"#);
			})
			.await;
		let token = TokenSecret::new("tok");
		let (left, right) = tokio::join!(strategy.user_profile(&token), clone.user_profile(&token));

		mock.assert_hits_async(2).await;

		assert!(Arc::ptr_eq(&strategy.http_client, &clone.http_client));
		assert_eq!(
			left.expect("Original strategy should fetch the profile."),
			right.expect("Cloned strategy should fetch the profile.")
		);
	}

	#[tokio::test]
	async fn missing_profile_endpoint_is_a_config_error() {
		let server = MockServer::start_async().await;
		let descriptor = ProviderDescriptor::builder(
			ProviderId::new("bare").expect("Provider fixture should be valid."),
		)
		.authorization_endpoint(
			Url::parse(&server.url("/authorize")).expect("Authorize URL should parse."),
		)
		.token_endpoint(Url::parse(&server.url("/token")).expect("Token URL should parse."))
		.build()
		.expect("Descriptor without a profile endpoint should build.");
		let strategy: ReqwestTestStrategy<String> = OAuth2Strategy::with_http_client(
			descriptor,
			Arc::new(FlattrProvider),
			options(&server),
			Some(accept_all()),
			test_reqwest_http_client(),
			Arc::new(ReqwestTransportErrorMapper),
		)
		.expect("Strategy should build.");
		let err = strategy
			.user_profile(&TokenSecret::new("tok"))
			.await
			.expect_err("Profiles cannot be fetched without an endpoint.");

		assert!(matches!(err, Error::Config(ConfigError::MissingProfileEndpoint { .. })));
		assert_eq!(strategy.name(), "bare");
	}
}
