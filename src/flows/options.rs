//! Constructor options shared by every provider strategy.

// self
use crate::{_prelude::*, auth::TokenSecret, error::ConfigError};

/// Options accepted when constructing a strategy.
///
/// Endpoint URLs are optional; providers substitute their documented defaults for any
/// value left unset. The struct deserializes from both snake_case keys and the
/// conventional `clientID`/`clientSecret`/`callbackURL`/`authorizationURL`/`tokenURL`/
/// `profileURL` spellings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyOptions {
	/// OAuth 2.0 client identifier issued by the provider.
	#[serde(alias = "clientID")]
	pub client_id: String,
	/// OAuth 2.0 client secret issued by the provider.
	#[serde(alias = "clientSecret")]
	pub client_secret: TokenSecret,
	/// URL the provider redirects to after the user grants (or denies) access.
	#[serde(alias = "callbackURL")]
	pub callback_url: Url,
	/// Authorize page override.
	#[serde(default, alias = "authorizationURL", skip_serializing_if = "Option::is_none")]
	pub authorization_url: Option<Url>,
	/// Token endpoint override.
	#[serde(default, alias = "tokenURL", skip_serializing_if = "Option::is_none")]
	pub token_url: Option<Url>,
	/// User-info endpoint override.
	#[serde(default, alias = "profileURL", skip_serializing_if = "Option::is_none")]
	pub profile_url: Option<Url>,
	/// Scopes requested on the authorize URL.
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub scope: Vec<String>,
}
impl StrategyOptions {
	/// Creates options with the three required settings.
	pub fn new(
		client_id: impl Into<String>,
		client_secret: impl Into<TokenSecret>,
		callback_url: Url,
	) -> Self {
		Self {
			client_id: client_id.into(),
			client_secret: client_secret.into(),
			callback_url,
			authorization_url: None,
			token_url: None,
			profile_url: None,
			scope: Vec::new(),
		}
	}

	/// Overrides the authorize page URL.
	pub fn with_authorization_url(mut self, url: Url) -> Self {
		self.authorization_url = Some(url);

		self
	}

	/// Overrides the token endpoint URL.
	pub fn with_token_url(mut self, url: Url) -> Self {
		self.token_url = Some(url);

		self
	}

	/// Overrides the user-info endpoint URL.
	pub fn with_profile_url(mut self, url: Url) -> Self {
		self.profile_url = Some(url);

		self
	}

	/// Sets the scopes requested on the authorize URL.
	pub fn with_scope<I, S>(mut self, scope: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.scope = scope.into_iter().map(Into::into).collect();

		self
	}

	/// Rejects options missing required credentials.
	pub(crate) fn validate(&self) -> Result<(), ConfigError> {
		if self.client_id.trim().is_empty() {
			return Err(ConfigError::MissingClientId);
		}
		if self.client_secret.is_empty() {
			return Err(ConfigError::MissingClientSecret);
		}

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn callback() -> Url {
		Url::parse("https://www.example.net/auth/flattr/callback")
			.expect("Callback fixture should parse.")
	}

	#[test]
	fn deserializes_conventional_option_names() {
		let options: StrategyOptions = serde_json::from_str(
			r#"{
				"clientID": "123-456-789",
				"clientSecret": "shhh-its-a-secret",
				"callbackURL": "https://www.example.net/auth/flattr/callback",
				"tokenURL": "https://flattr.example.com/oauth/token"
			}"#,
		)
		.expect("Options should deserialize from conventional keys.");

		assert_eq!(options.client_id, "123-456-789");
		assert_eq!(options.client_secret.expose(), "shhh-its-a-secret");
		assert_eq!(options.callback_url, callback());
		assert_eq!(options.authorization_url, None);
		assert_eq!(
			options.token_url.as_ref().map(Url::as_str),
			Some("https://flattr.example.com/oauth/token")
		);
		assert!(options.scope.is_empty());
	}

	#[test]
	fn validation_requires_credentials() {
		assert!(StrategyOptions::new("id", "secret", callback()).validate().is_ok());
		assert!(matches!(
			StrategyOptions::new("  ", "secret", callback()).validate(),
			Err(ConfigError::MissingClientId)
		));
		assert!(matches!(
			StrategyOptions::new("id", "", callback()).validate(),
			Err(ConfigError::MissingClientSecret)
		));
	}

	#[test]
	fn builder_setters_override_fields() {
		let url = Url::parse("https://api.example.com/me").expect("URL fixture should parse.");
		let options = StrategyOptions::new("id", "secret", callback())
			.with_profile_url(url.clone())
			.with_scope(["flattr", "thing"]);

		assert_eq!(options.profile_url, Some(url));
		assert_eq!(options.scope, vec!["flattr".to_owned(), "thing".to_owned()]);
	}
}
