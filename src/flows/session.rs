//! Authorization redirect: state, PKCE, and authorize URL construction.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{Rng, distr::Alphanumeric};
use sha2::{Digest, Sha256};
// self
use crate::{
	_prelude::*,
	auth::ScopeSet,
	flows::OAuth2Strategy,
	http::OAuthHttpClient,
	oauth::TransportErrorMapper,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	provider::ProviderStrategy,
};

const STATE_LEN: usize = 32;
const PKCE_VERIFIER_LEN: usize = 64;

/// Supported PKCE challenge methods surfaced via [`AuthorizationSession`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PkceCodeChallengeMethod {
	/// SHA-256 based PKCE (RFC 7636 S256).
	S256,
}
impl PkceCodeChallengeMethod {
	/// Returns the RFC 7636 identifier for the challenge method.
	pub fn as_str(self) -> &'static str {
		match self {
			PkceCodeChallengeMethod::S256 => "S256",
		}
	}
}

/// Redirect metadata returned by [`OAuth2Strategy::start_authorization`].
///
/// Hosts persist the session (it is serde-serializable) between the redirect and the
/// callback, then hand it back to [`OAuth2Strategy::authenticate`].
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationSession {
	/// Requested scope set.
	pub scope: ScopeSet,
	/// Opaque state value that must round-trip via the redirect handler.
	pub state: String,
	/// Redirect URI supplied when constructing the authorize URL.
	pub redirect_uri: Url,
	/// Fully-formed authorize URL that callers should send end-users to.
	pub authorize_url: Url,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pkce: Option<PkcePair>,
}
impl AuthorizationSession {
	pub(super) fn new(
		scope: ScopeSet,
		redirect_uri: Url,
		authorize_url: Url,
		state: String,
		pkce: Option<PkcePair>,
	) -> Self {
		Self { scope, state, redirect_uri, authorize_url, pkce }
	}

	/// PKCE code challenge derived from the secret verifier, when the provider uses PKCE.
	pub fn code_challenge(&self) -> Option<&str> {
		self.pkce.as_ref().map(|pkce| pkce.challenge.as_str())
	}

	/// PKCE challenge method (currently always `S256`), when the provider uses PKCE.
	pub fn code_challenge_method(&self) -> Option<PkceCodeChallengeMethod> {
		self.pkce.as_ref().map(|pkce| pkce.method)
	}

	/// Validates the returned `state` parameter after the authorization redirect.
	///
	/// A mismatch is reported as [`Error::StateMismatch`].
	pub fn validate_state(&self, returned_state: &str) -> Result<()> {
		if returned_state == self.state { Ok(()) } else { Err(Error::StateMismatch) }
	}

	pub(super) fn pkce_verifier(&self) -> Option<&str> {
		self.pkce.as_ref().map(|pkce| pkce.verifier.as_str())
	}
}
impl Debug for AuthorizationSession {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthorizationSession")
			.field("scope", &self.scope)
			.field("state", &self.state)
			.field("redirect_uri", &self.redirect_uri)
			.field("authorize_url", &self.authorize_url)
			.field("code_challenge", &self.code_challenge())
			.field("code_challenge_method", &self.code_challenge_method())
			.finish()
	}
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(super) struct PkcePair {
	verifier: String,
	challenge: String,
	method: PkceCodeChallengeMethod,
}
impl PkcePair {
	pub(super) fn generate() -> Self {
		let verifier = random_string(PKCE_VERIFIER_LEN);
		let challenge = compute_pkce_challenge(&verifier);

		Self { verifier, challenge, method: PkceCodeChallengeMethod::S256 }
	}
}

impl<U, C, M> OAuth2Strategy<U, C, M>
where
	C: ?Sized + OAuthHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Starts the handshake by generating state (plus PKCE when the provider needs it) and
	/// the authorize URL the user agent should be redirected to.
	pub fn start_authorization(&self) -> AuthorizationSession {
		let _guard =
			FlowSpan::new(FlowKind::Authorize, self.name(), "start_authorization").entered();

		obs::record_flow_outcome(FlowKind::Authorize, self.name(), FlowOutcome::Attempt);

		let state = random_string(STATE_LEN);
		let pkce = self.descriptor.uses_pkce().then(PkcePair::generate);
		let authorize_url = build_authorize_url(
			&self.descriptor.endpoints.authorization,
			self.provider.as_ref(),
			AuthorizeParams {
				client_id: self.client_id(),
				redirect_uri: self.callback_url(),
				scope: self.scope().join(self.descriptor.quirks.scope_delimiter),
				state: &state,
				pkce: pkce.as_ref(),
			},
		);

		obs::record_flow_outcome(FlowKind::Authorize, self.name(), FlowOutcome::Success);

		AuthorizationSession::new(
			self.scope().clone(),
			self.callback_url().clone(),
			authorize_url,
			state,
			pkce,
		)
	}
}

struct AuthorizeParams<'a> {
	client_id: &'a str,
	redirect_uri: &'a Url,
	scope: Option<String>,
	state: &'a str,
	pkce: Option<&'a PkcePair>,
}

fn build_authorize_url(
	endpoint: &Url,
	provider: &dyn ProviderStrategy,
	params: AuthorizeParams,
) -> Url {
	let mut extra = BTreeMap::new();

	provider.augment_authorization_params(&mut extra);

	let mut url = endpoint.clone();
	let mut pairs = url.query_pairs_mut();

	pairs.append_pair("response_type", "code");
	pairs.append_pair("client_id", params.client_id);
	pairs.append_pair("redirect_uri", params.redirect_uri.as_str());

	if let Some(scope) = params.scope.as_deref() {
		pairs.append_pair("scope", scope);
	}

	pairs.append_pair("state", params.state);

	if let Some(pkce) = params.pkce {
		pairs.append_pair("code_challenge", &pkce.challenge);
		pairs.append_pair("code_challenge_method", pkce.method.as_str());
	}
	for (key, value) in &extra {
		pairs.append_pair(key, value);
	}

	drop(pairs);

	url
}

fn random_string(len: usize) -> String {
	rand::rng().sample_iter(Alphanumeric).take(len).map(char::from).collect()
}

fn compute_pkce_challenge(verifier: &str) -> String {
	let mut hasher = Sha256::new();
	hasher.update(verifier.as_bytes());
	let digest = hasher.finalize();
	URL_SAFE_NO_PAD.encode(digest)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::provider::{ProfileFuture, ProtectedResource};

	struct ExtraParams;
	impl ProviderStrategy for ExtraParams {
		fn user_profile<'a>(&'a self, _resource: ProtectedResource<'a>) -> ProfileFuture<'a> {
			Box::pin(async { Err(Error::InvalidGrant { reason: "unused".into() }) })
		}

		fn augment_authorization_params(&self, params: &mut BTreeMap<String, String>) {
			params.insert("display".into(), "popup".into());
		}
	}

	fn session(pkce: Option<PkcePair>) -> AuthorizationSession {
		AuthorizationSession::new(
			ScopeSet::default(),
			Url::parse("https://example.com/cb")
				.expect("Redirect URL fixture should parse successfully."),
			Url::parse("https://example.com/auth?state=abc")
				.expect("Authorization URL fixture should parse successfully."),
			"expected".into(),
			pkce,
		)
	}

	#[test]
	fn state_validation_errors_on_mismatch() {
		let session = session(None);

		assert!(session.validate_state("expected").is_ok());

		let err = session.validate_state("other").expect_err("State mismatch should fail.");

		assert!(matches!(err, Error::StateMismatch));
		assert_eq!(err.to_string(), "Authorization state mismatch.");
	}

	#[test]
	fn pkce_challenge_matches_rfc_7636_vector() {
		assert_eq!(
			compute_pkce_challenge("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk"),
			"E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
		);
	}

	#[test]
	fn authorize_url_carries_handshake_parameters() {
		let endpoint =
			Url::parse("https://flattr.com/oauth/authorize").expect("Endpoint fixture should parse.");
		let redirect = Url::parse("https://www.example.net/auth/flattr/callback")
			.expect("Redirect fixture should parse.");
		let pkce = PkcePair::generate();
		let url = build_authorize_url(&endpoint, &ExtraParams, AuthorizeParams {
			client_id: "client",
			redirect_uri: &redirect,
			scope: Some("flattr thing".into()),
			state: "state-1",
			pkce: Some(&pkce),
		});
		let pairs = url.query_pairs().into_owned().collect::<BTreeMap<_, _>>();

		assert_eq!(url.path(), "/oauth/authorize");
		assert_eq!(pairs.get("response_type").map(String::as_str), Some("code"));
		assert_eq!(pairs.get("client_id").map(String::as_str), Some("client"));
		assert_eq!(pairs.get("redirect_uri").map(String::as_str), Some(redirect.as_str()));
		assert_eq!(pairs.get("scope").map(String::as_str), Some("flattr thing"));
		assert_eq!(pairs.get("state").map(String::as_str), Some("state-1"));
		assert_eq!(pairs.get("code_challenge").map(String::as_str), Some(pkce.challenge.as_str()));
		assert_eq!(pairs.get("code_challenge_method").map(String::as_str), Some("S256"));
		assert_eq!(pairs.get("display").map(String::as_str), Some("popup"));
	}

	#[test]
	fn session_round_trips_through_serde_with_redacted_debug() {
		let original = session(Some(PkcePair::generate()));
		let json = serde_json::to_string(&original).expect("Session should serialize.");
		let restored: AuthorizationSession =
			serde_json::from_str(&json).expect("Session should deserialize.");

		assert_eq!(restored, original);
		assert_eq!(restored.pkce_verifier(), original.pkce_verifier());

		let verifier = original.pkce_verifier().expect("PKCE verifier should be present.");

		assert!(!format!("{original:?}").contains(verifier));
	}
}
