//! Strategy-level error types shared across flows, providers, and transports.

// self
use crate::{_prelude::*, http::Endpoint};

/// Strategy-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical strategy error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Temporary upstream failure; the caller may retry with backoff.
	#[error(transparent)]
	Transient(#[from] TransientError),
	/// Transport failure (DNS, TCP, TLS, non-success status).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Provider payload could not be decoded.
	#[error(transparent)]
	Parse(#[from] ParseError),

	/// Requested scopes exceed what was granted.
	#[error("Token lacks the required scopes: {reason}.")]
	InsufficientScope {
		/// Provider- or strategy-supplied reason string.
		reason: String,
	},
	/// Provider rejected the grant (e.g., bad or reused authorization code).
	#[error("Provider rejected the grant: {reason}.")]
	InvalidGrant {
		/// Provider- or strategy-supplied reason string.
		reason: String,
	},
	/// Client authentication failed or credentials are malformed.
	#[error("Client authentication failed: {reason}.")]
	InvalidClient {
		/// Provider- or strategy-supplied reason string.
		reason: String,
	},
	/// Callback `state` does not match the one issued with the authorize redirect.
	#[error("Authorization state mismatch.")]
	StateMismatch,
	/// Provider redirected back with an OAuth error other than `access_denied`.
	#[error("Provider returned the authorization error `{code}`.")]
	Authorization {
		/// OAuth `error` parameter.
		code: String,
		/// OAuth `error_description` parameter, when supplied.
		description: Option<String>,
		/// OAuth `error_uri` parameter, when supplied.
		uri: Option<String>,
	},
	/// The application's verify callback failed.
	#[error("Verify callback failed.")]
	Verify {
		/// Application-supplied failure.
		#[source]
		source: BoxError,
	},
}
impl Error {
	/// Wraps an application failure raised inside a verify callback.
	pub fn verify(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Verify { source: Box::new(src) }
	}
}

/// Configuration and validation failures raised while building or running a strategy.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// Provider descriptor contains an invalid URL.
	#[error("Descriptor contains an invalid URL.")]
	InvalidDescriptor {
		/// Underlying parsing failure.
		#[source]
		source: oauth2::url::ParseError,
	},
	/// Provider descriptor failed validation.
	#[error(transparent)]
	Descriptor(#[from] crate::provider::ProviderDescriptorError),
	/// Redirect URI cannot be parsed.
	#[error("Redirect URI is invalid.")]
	InvalidRedirect {
		/// Underlying parsing failure.
		#[source]
		source: oauth2::url::ParseError,
	},

	/// No verify callback was supplied at construction time.
	#[error("A verify callback is required.")]
	MissingVerifyCallback,
	/// Client identifier was empty.
	#[error("The client_id option is required.")]
	MissingClientId,
	/// Client secret was empty.
	#[error("The client_secret option is required.")]
	MissingClientSecret,
	/// Strategy names must be lowercase for host lookups.
	#[error("Strategy name `{name}` must be lowercase.")]
	InvalidStrategyName {
		/// Rejected name.
		name: String,
	},
	/// Provider descriptor does not declare a profile endpoint.
	#[error("Descriptor `{descriptor}` does not declare a profile endpoint.")]
	MissingProfileEndpoint {
		/// Provider identifier string.
		descriptor: String,
	},
	/// Requested scopes cannot be normalized.
	#[error("Requested scopes are invalid.")]
	InvalidScope(#[from] crate::auth::ScopeValidationError),
	/// Token grant builder validation failed.
	#[error("Unable to build token grant.")]
	TokenBuild(#[from] crate::auth::TokenGrantBuilderError),
	/// Token endpoint returned an excessively large `expires_in`.
	#[error("The expires_in value exceeds the supported range.")]
	ExpiresInOutOfRange,
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Temporary failure variants (safe to retry).
#[derive(Debug, ThisError)]
pub enum TransientError {
	/// Provider endpoint returned an unexpected but non-fatal response.
	#[error("The {endpoint} endpoint returned an unexpected response: {message}.")]
	Endpoint {
		/// Endpoint that failed.
		endpoint: Endpoint,
		/// Provider- or strategy-supplied message summarizing the failure.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// Token endpoint responded with malformed JSON that could not be parsed.
	#[error("Token endpoint returned malformed JSON.")]
	TokenResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::error::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
}

/// Transport-level failures (network, IO, unsuccessful status).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the {endpoint} endpoint.")]
	Network {
		/// Endpoint that was being called.
		endpoint: Endpoint,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling a provider endpoint.")]
	Io(#[from] std::io::Error),
	/// Endpoint answered with a non-success HTTP status.
	#[error("The {endpoint} endpoint responded with HTTP {status}.")]
	Status {
		/// Endpoint that was being called.
		endpoint: Endpoint,
		/// HTTP status code.
		status: u16,
		/// Truncated response body.
		body: String,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(endpoint: Endpoint, src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { endpoint, source: Box::new(src) }
	}
}

/// Decoding failures for provider payloads.
#[derive(Debug, ThisError)]
pub enum ParseError {
	/// Profile endpoint responded with a body that does not match the expected JSON shape.
	#[error("Profile endpoint returned malformed JSON at `{}`.", source.path())]
	Profile {
		/// Structured parsing failure including the JSON path.
		#[source]
		source: serde_path_to_error::Error<serde_json::error::Error>,
	},
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[derive(Debug, ThisError)]
	#[error("user store offline")]
	struct StoreOffline;

	#[test]
	fn verify_errors_keep_their_source() {
		let err = Error::verify(StoreOffline);

		assert_eq!(err.to_string(), "Verify callback failed.");
		assert_eq!(
			err.source().map(|source| source.to_string()),
			Some("user store offline".to_owned())
		);
	}

	#[test]
	fn profile_parse_errors_report_the_json_path() {
		let mut de = serde_json::Deserializer::from_str("{\"username\":7}");
		let source = serde_path_to_error::deserialize::<_, BTreeMap<String, String>>(&mut de)
			.expect_err("Numeric values should not decode as strings.");
		let err = Error::from(ParseError::Profile { source });

		assert_eq!(err.to_string(), "Profile endpoint returned malformed JSON at `username`.");
	}
}
