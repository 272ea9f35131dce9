//! Host-facing entry point that drives the whole handshake for one request.

// std
use std::borrow::Cow;
// self
use crate::{
	_prelude::*,
	flows::{AuthorizationSession, OAuth2Strategy, VerifyOutcome},
	http::OAuthHttpClient,
	oauth::TransportErrorMapper,
	obs::{self, FlowKind},
};

const ACCESS_DENIED: &str = "access_denied";
const MISSING_SESSION_MESSAGE: &str = "Unable to verify authorization request state.";
const STATE_MISMATCH_MESSAGE: &str = "Invalid authorization request state.";

/// Query parameters the provider appends to the callback URL.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackParams {
	/// Authorization code issued by the provider.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub code: Option<String>,
	/// State echoed back by the provider.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub state: Option<String>,
	/// OAuth error code (e.g. `access_denied`).
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
	/// Human readable error description.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error_description: Option<String>,
	/// Link to a page describing the error.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error_uri: Option<String>,
}
impl CallbackParams {
	/// Builds callback parameters carrying an authorization code and state.
	pub fn with_code(code: impl Into<String>, state: impl Into<String>) -> Self {
		Self { code: Some(code.into()), state: Some(state.into()), ..Default::default() }
	}

	/// Extracts the parameters from a full callback URL.
	pub fn from_url(url: &Url) -> Self {
		Self::from_pairs(url.query_pairs())
	}

	/// Extracts the parameters from a raw query string (without the leading `?`).
	pub fn from_query(query: &str) -> Self {
		Self::from_pairs(url::form_urlencoded::parse(query.as_bytes()))
	}

	fn from_pairs<'a>(pairs: impl Iterator<Item = (Cow<'a, str>, Cow<'a, str>)>) -> Self {
		let mut params = Self::default();

		for (key, value) in pairs {
			let slot = match key.as_ref() {
				"code" => &mut params.code,
				"state" => &mut params.state,
				"error" => &mut params.error,
				"error_description" => &mut params.error_description,
				"error_uri" => &mut params.error_uri,
				_ => continue,
			};

			if slot.is_none() {
				*slot = Some(value.into_owned());
			}
		}

		params
	}
}

/// Result of [`OAuth2Strategy::authenticate`], mirroring what a host framework does next.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthOutcome<U> {
	/// Send the user agent to the authorize URL and persist the session until the callback.
	Redirect(AuthorizationSession),
	/// The verify callback accepted the user.
	Success {
		/// Application user record.
		user: U,
		/// Optional message forwarded from the verify callback.
		info: Option<String>,
	},
	/// Authentication did not succeed (denied by the user, state mismatch, or rejected by
	/// the verify callback).
	Fail {
		/// Human readable reason, when one is available.
		message: Option<String>,
	},
}
impl<U> From<VerifyOutcome<U>> for AuthOutcome<U> {
	fn from(outcome: VerifyOutcome<U>) -> Self {
		match outcome {
			VerifyOutcome::Success { user, info } => Self::Success { user, info },
			VerifyOutcome::Fail { message } => Self::Fail { message },
		}
	}
}

impl<U, C, M> OAuth2Strategy<U, C, M>
where
	C: ?Sized + OAuthHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Handles one request against the strategy's route.
	///
	/// - A provider error of `access_denied` fails softly with the provider's description;
	///   any other provider error is returned as [`Error::Authorization`].
	/// - Without a `code`, a fresh session is returned for the redirect.
	/// - With a `code`, the stored `session` must be present and its state must match.
	///   The code is then exchanged, the profile fetched, and the verify callback invoked.
	pub async fn authenticate(
		&self,
		params: &CallbackParams,
		session: Option<AuthorizationSession>,
	) -> Result<AuthOutcome<U>> {
		obs::observe(FlowKind::Authenticate, self.name(), "authenticate", async move {
			if let Some(error) = params.error.as_deref() {
				if error == ACCESS_DENIED {
					return Ok(AuthOutcome::Fail { message: params.error_description.clone() });
				}

				return Err(Error::Authorization {
					code: error.to_owned(),
					description: params.error_description.clone(),
					uri: params.error_uri.clone(),
				});
			}

			let Some(code) = params.code.as_deref() else {
				return Ok(AuthOutcome::Redirect(self.start_authorization()));
			};
			let Some(session) = session else {
				return Ok(AuthOutcome::Fail { message: Some(MISSING_SESSION_MESSAGE.into()) });
			};

			if session.validate_state(params.state.as_deref().unwrap_or_default()).is_err() {
				return Ok(AuthOutcome::Fail { message: Some(STATE_MISMATCH_MESSAGE.into()) });
			}

			let grant = self.exchange_code(&session, code).await?;
			let profile = self.user_profile(&grant.access_token).await?;
			let outcome = self
				.verify_callback()
				.verify(grant.access_token, grant.refresh_token, profile)
				.await?;

			Ok(outcome.into())
		})
		.await
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn parses_success_callback() {
		let url = Url::parse("https://www.example.net/auth/flattr/callback?code=abc%20123&state=xyz")
			.expect("Callback fixture should parse.");

		assert_eq!(CallbackParams::from_url(&url), CallbackParams::with_code("abc 123", "xyz"));
	}

	#[test]
	fn parses_error_callback_and_ignores_unknown_keys() {
		let params = CallbackParams::from_query(
			"error=access_denied&error_description=The+user+denied+access&foo=bar",
		);

		assert_eq!(params.error.as_deref(), Some("access_denied"));
		assert_eq!(params.error_description.as_deref(), Some("The user denied access"));
		assert!(params.code.is_none());
		assert!(params.error_uri.is_none());
	}

	#[test]
	fn first_value_wins_for_repeated_keys() {
		let params = CallbackParams::from_query("code=first&code=second");

		assert_eq!(params.code.as_deref(), Some("first"));
	}

	#[test]
	fn verify_outcomes_map_onto_auth_outcomes() {
		assert_eq!(
			AuthOutcome::from(VerifyOutcome::Success { user: 1, info: Some("hi".into()) }),
			AuthOutcome::Success { user: 1, info: Some("hi".into()) }
		);
		assert_eq!(
			AuthOutcome::<u8>::from(VerifyOutcome::fail("nope")),
			AuthOutcome::Fail { message: Some("nope".into()) }
		);
	}
}
