//! Application callback invoked once a profile has been fetched.

// self
use crate::{_prelude::*, auth::TokenSecret, provider::Profile};

/// Boxed future returned by [`Verify::verify`].
pub type VerifyFuture<'a, U> = Pin<Box<dyn Future<Output = Result<VerifyOutcome<U>>> + 'a + Send>>;

/// Decision returned by the application's verify callback.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VerifyOutcome<U> {
	/// The profile maps to an application user.
	Success {
		/// Application user record.
		user: U,
		/// Optional message forwarded to the host (e.g. a flash notice).
		info: Option<String>,
	},
	/// The profile was understood but the application refuses to log the user in.
	Fail {
		/// Human readable reason forwarded to the host.
		message: Option<String>,
	},
}
impl<U> VerifyOutcome<U> {
	/// Accepts `user` without an info message.
	pub fn success(user: U) -> Self {
		Self::Success { user, info: None }
	}

	/// Refuses the login with a reason.
	pub fn fail(message: impl Into<String>) -> Self {
		Self::Fail { message: Some(message.into()) }
	}
}

/// Maps provider credentials and a normalized profile onto an application user.
///
/// Application failures (a database outage, for instance) should be returned as
/// [`Error::Verify`] through [`Error::verify`]; a refusal is a
/// [`VerifyOutcome::Fail`], not an error.
///
/// Any `Fn(TokenSecret, Option<TokenSecret>, Profile) -> impl Future` closure implements the
/// trait.
pub trait Verify<U>: Send + Sync {
	/// Resolves the user for a completed handshake.
	fn verify(
		&self,
		access_token: TokenSecret,
		refresh_token: Option<TokenSecret>,
		profile: Profile,
	) -> VerifyFuture<'_, U>;
}
impl<U, F, Fut> Verify<U> for F
where
	F: Send + Sync + Fn(TokenSecret, Option<TokenSecret>, Profile) -> Fut,
	Fut: 'static + Send + Future<Output = Result<VerifyOutcome<U>>>,
{
	fn verify(
		&self,
		access_token: TokenSecret,
		refresh_token: Option<TokenSecret>,
		profile: Profile,
	) -> VerifyFuture<'_, U> {
		Box::pin(self(access_token, refresh_token, profile))
	}
}
