//! Flattr OAuth 2.0 authentication strategy. Redirect users to Flattr, exchange the returned
//! code, and hand a normalized profile to your verify callback, all on top of a pluggable
//! OAuth 2.0 engine.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod error;
pub mod flattr;
pub mod flows;
pub mod http;
pub mod oauth;
pub mod obs;
pub mod provider;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		auth::TokenSecret,
		flattr,
		flows::{ReqwestStrategy, StrategyOptions, Verify, VerifyOutcome},
		http::ReqwestHttpClient,
		oauth::ReqwestTransportErrorMapper,
		provider::Profile,
	};

	/// Client identifier registered for test strategies.
	pub const CLIENT_ID: &str = "ABC123";
	/// Client secret registered for test strategies.
	pub const CLIENT_SECRET: &str = "shhh-9f2c";
	/// Path of the mocked Flattr user-info endpoint.
	pub const PROFILE_PATH: &str = "/rest/v2/user";
	/// Path of the mocked Flattr token endpoint.
	pub const TOKEN_PATH: &str = "/oauth/token";

	/// Strategy type alias used by reqwest-backed integration tests.
	pub type ReqwestTestStrategy<U> = ReqwestStrategy<U>;

	/// Parses a URL fixture.
	pub fn url(value: &str) -> Url {
		Url::parse(value).expect("Test URL should parse.")
	}

	/// Callback URL registered for test strategies.
	pub fn callback_url() -> Url {
		url("https://www.example.net/auth/flattr/callback")
	}

	/// Options carrying the test credentials and Flattr's default endpoints.
	pub fn options() -> StrategyOptions {
		StrategyOptions::new(CLIENT_ID, CLIENT_SECRET, callback_url())
	}

	/// Options whose token and profile endpoints live under `base_url`, typically
	/// `MockServer::base_url`.
	pub fn mock_options(base_url: &str) -> StrategyOptions {
		let base = url(base_url);

		options()
			.with_token_url(base.join(TOKEN_PATH).expect("Mock token URL should join."))
			.with_profile_url(base.join(PROFILE_PATH).expect("Mock profile URL should join."))
	}

	/// Verify callback that accepts every profile and returns its identifier.
	pub fn accept_all() -> Arc<dyn Verify<String>> {
		Arc::new(|_: TokenSecret, _: Option<TokenSecret>, profile: Profile| async move {
			Ok::<_, Error>(VerifyOutcome::success(profile.id))
		})
	}

	/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Constructs a Flattr strategy wired to the insecure reqwest transport used across
	/// integration tests.
	pub fn build_reqwest_test_strategy<U>(
		options: StrategyOptions,
		verify: Arc<dyn Verify<U>>,
	) -> ReqwestTestStrategy<U>
	where
		U: 'static + Send,
	{
		flattr::strategy_with_http_client(
			options,
			Some(verify),
			test_reqwest_http_client(),
			Arc::new(ReqwestTransportErrorMapper),
		)
		.expect("Failed to build Flattr strategy for tests.")
	}
}

mod _prelude {
	pub use std::{
		collections::BTreeMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::Mutex;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
