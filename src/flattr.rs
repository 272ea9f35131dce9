//! Flattr provider: default endpoints plus user-info normalization.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use oauth2_flattr::{
//! 	auth::TokenSecret,
//! 	error::Error,
//! 	flattr,
//! 	flows::{StrategyOptions, Verify, VerifyOutcome},
//! 	provider::Profile,
//! 	url::Url,
//! };
//!
//! # fn main() -> Result<(), Error> {
//! let callback = Url::parse("https://www.example.net/auth/flattr/callback").unwrap();
//! let options = StrategyOptions::new("123-456-789", "shhh-its-a-secret", callback);
//! let verify: Arc<dyn Verify<String>> =
//! 	Arc::new(|_: TokenSecret, _: Option<TokenSecret>, profile: Profile| async move {
//! 		Ok::<_, Error>(VerifyOutcome::success(profile.id))
//! 	});
//! let strategy = flattr::strategy(options, Some(verify))?;
//!
//! assert_eq!(strategy.name(), "flattr");
//! # Ok(())
//! # }
//! ```

// crates.io
use serde_json::{Map, Value};
// self
use crate::{
	_prelude::*,
	auth::ProviderId,
	error::{ConfigError, ParseError},
	flows::{OAuth2Strategy, StrategyOptions, Verify},
	http::OAuthHttpClient,
	oauth::TransportErrorMapper,
	provider::{
		ClientAuthMethod, Profile, ProfileFuture, ProtectedResource, ProviderDescriptor,
		ProviderStrategy,
	},
};
#[cfg(feature = "reqwest")]
use crate::{
	flows::ReqwestStrategy, http::ReqwestHttpClient, oauth::ReqwestTransportErrorMapper,
};

/// Name under which the strategy registers with a host.
pub const STRATEGY_NAME: &str = "flattr";
/// Default authorize page.
pub const AUTHORIZATION_URL: &str = "https://flattr.com/oauth/authorize";
/// Default token endpoint.
pub const TOKEN_URL: &str = "https://flattr.com/oauth/token";
/// Default user-info endpoint.
pub const PROFILE_URL: &str = "https://api.flattr.com/rest/v2/user";

/// Scopes documented by the Flattr API.
pub mod scope {
	/// Flattr things on the user's behalf.
	pub const FLATTR: &str = "flattr";
	/// Create and edit things.
	pub const THING: &str = "thing";
	/// Read the user's email address.
	pub const EMAIL: &str = "email";
	/// Read the user's private activity and subscriptions.
	pub const EXTENDED_READ: &str = "extendedread";
}

/// [`ProviderStrategy`] that reads `GET /rest/v2/user` and normalizes it into a [`Profile`].
#[derive(Clone, Copy, Debug, Default)]
pub struct FlattrProvider;
impl ProviderStrategy for FlattrProvider {
	fn user_profile<'a>(&'a self, resource: ProtectedResource<'a>) -> ProfileFuture<'a> {
		Box::pin(async move {
			let url = resource.profile_endpoint()?;
			let body = resource.get(url).await?;

			parse_profile(resource.provider().clone(), &body)
		})
	}
}

#[derive(Debug, Deserialize)]
struct FlattrUser {
	#[serde(default)]
	username: Option<String>,
	#[serde(default)]
	firstname: Option<String>,
	#[serde(default)]
	lastname: Option<String>,
}

/// Normalizes a Flattr user-info body.
///
/// The body must be a JSON object. Absent fields degrade to empty strings, so a body
/// carrying only `username` yields a display name of a single space.
pub fn parse_profile(provider: ProviderId, body: &[u8]) -> Result<Profile> {
	let mut deserializer = serde_json::Deserializer::from_slice(body);
	// Decoding into a map first keeps arrays from filling the fields by position.
	let object: Map<String, Value> = serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| ParseError::Profile { source })?;
	let user: FlattrUser = serde_path_to_error::deserialize(Value::Object(object))
		.map_err(|source| ParseError::Profile { source })?;
	let FlattrUser { username, firstname, lastname } = user;
	let display_name =
		format!("{} {}", firstname.unwrap_or_default(), lastname.unwrap_or_default());

	Ok(Profile::new(provider, username.unwrap_or_default(), display_name))
}

/// Builds the Flattr descriptor, substituting default endpoints for unset options.
pub fn descriptor(options: &StrategyOptions) -> Result<ProviderDescriptor> {
	let id = ProviderId::new(STRATEGY_NAME).map_err(|_| ConfigError::InvalidStrategyName {
		name: STRATEGY_NAME.into(),
	})?;
	let descriptor = ProviderDescriptor::builder(id)
		.authorization_endpoint(endpoint(options.authorization_url.as_ref(), AUTHORIZATION_URL)?)
		.token_endpoint(endpoint(options.token_url.as_ref(), TOKEN_URL)?)
		.profile_endpoint(endpoint(options.profile_url.as_ref(), PROFILE_URL)?)
		.preferred_client_auth_method(ClientAuthMethod::ClientSecretBasic)
		.build()
		.map_err(ConfigError::from)?;

	Ok(descriptor)
}

/// Builds a Flattr strategy over the default reqwest transport.
///
/// A `None` verify callback is rejected with
/// [`ConfigError::MissingVerifyCallback`] before any other option is inspected.
#[cfg(feature = "reqwest")]
pub fn strategy<U>(
	options: StrategyOptions,
	verify: Option<Arc<dyn Verify<U>>>,
) -> Result<ReqwestStrategy<U>> {
	strategy_with_http_client(
		options,
		verify,
		ReqwestHttpClient::default(),
		Arc::new(ReqwestTransportErrorMapper),
	)
}

/// Builds a Flattr strategy over a caller-provided transport + mapper pair.
pub fn strategy_with_http_client<U, C, M>(
	options: StrategyOptions,
	verify: Option<Arc<dyn Verify<U>>>,
	http_client: impl Into<Arc<C>>,
	mapper: impl Into<Arc<M>>,
) -> Result<OAuth2Strategy<U, C, M>>
where
	C: ?Sized + OAuthHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	let Some(verify) = verify else {
		return Err(ConfigError::MissingVerifyCallback.into());
	};
	let descriptor = descriptor(&options)?;

	OAuth2Strategy::with_http_client(
		descriptor,
		Arc::new(FlattrProvider),
		options,
		Some(verify),
		http_client,
		mapper,
	)
}

fn endpoint(configured: Option<&Url>, default: &str) -> Result<Url> {
	match configured {
		Some(url) => Ok(url.clone()),
		None => Url::parse(default).map_err(|source| ConfigError::InvalidDescriptor { source }.into()),
	}
}
