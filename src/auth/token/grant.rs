//! Token grants returned by the authorization-code exchange.

// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, token::secret::TokenSecret},
};

/// Errors produced by [`TokenGrantBuilder`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum TokenGrantBuilderError {
	/// Issued when no access token value was provided.
	#[error("Access token is required.")]
	MissingAccessToken,
}

/// Tokens issued for one successful authorization-code exchange.
///
/// Grants are handed to the verify callback and never stored by the strategy. Providers
/// such as Flattr issue non-expiring tokens, so `expires_at` is optional.
#[derive(Clone, Serialize, Deserialize)]
pub struct TokenGrant {
	/// Access token secret; callers must avoid logging it.
	pub access_token: TokenSecret,
	/// Refresh token secret, if the provider issued one.
	pub refresh_token: Option<TokenSecret>,
	/// Scopes granted by the provider (falls back to the requested scopes).
	pub scope: ScopeSet,
	/// Instant the grant was received.
	pub issued_at: OffsetDateTime,
	/// Expiry instant derived from `expires_in`, when the provider sent one.
	pub expires_at: Option<OffsetDateTime>,
}
impl TokenGrant {
	/// Returns a builder for assembling a grant from a token response.
	pub fn builder(scope: ScopeSet) -> TokenGrantBuilder {
		TokenGrantBuilder::new(scope)
	}

	/// Returns `true` if the grant has an expiry at or before `instant`.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		self.expires_at.is_some_and(|expires_at| instant >= expires_at)
	}
}
impl Debug for TokenGrant {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenGrant")
			.field("access_token", &"<redacted>")
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.field("scope", &self.scope)
			.field("issued_at", &self.issued_at)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

/// Builder for [`TokenGrant`].
#[derive(Clone, Debug)]
pub struct TokenGrantBuilder {
	scope: ScopeSet,
	access_token: Option<TokenSecret>,
	refresh_token: Option<TokenSecret>,
	issued_at: Option<OffsetDateTime>,
	expires_in: Option<Duration>,
}
impl TokenGrantBuilder {
	fn new(scope: ScopeSet) -> Self {
		Self { scope, access_token: None, refresh_token: None, issued_at: None, expires_in: None }
	}

	/// Sets the issued-at instant.
	pub fn issued_at(mut self, instant: OffsetDateTime) -> Self {
		self.issued_at = Some(instant);

		self
	}

	/// Sets a relative expiry duration from the issued instant.
	pub fn expires_in(mut self, duration: Duration) -> Self {
		self.expires_in = Some(duration);

		self
	}

	/// Provides the access token value.
	pub fn access_token(mut self, token: impl Into<String>) -> Self {
		self.access_token = Some(TokenSecret::new(token));

		self
	}

	/// Provides the refresh token value.
	pub fn refresh_token(mut self, token: impl Into<String>) -> Self {
		self.refresh_token = Some(TokenSecret::new(token));

		self
	}

	/// Consumes the builder and produces a [`TokenGrant`].
	pub fn build(self) -> Result<TokenGrant, TokenGrantBuilderError> {
		let access_token = self.access_token.ok_or(TokenGrantBuilderError::MissingAccessToken)?;
		let issued_at = self.issued_at.unwrap_or_else(OffsetDateTime::now_utc);

		Ok(TokenGrant {
			access_token,
			refresh_token: self.refresh_token,
			scope: self.scope,
			issued_at,
			expires_at: self.expires_in.map(|delta| issued_at + delta),
		})
	}
}
