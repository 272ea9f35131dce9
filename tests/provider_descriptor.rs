// std
use std::collections::BTreeMap;
// self
use oauth2_flattr::{
	auth::ProviderId,
	error::Error,
	provider::{
		BearerPlacement, ClientAuthMethod, Profile, ProfileFuture, ProtectedResource,
		ProviderDescriptor, ProviderDescriptorBuilder, ProviderDescriptorError,
		ProviderErrorContext, ProviderErrorKind, ProviderQuirks, ProviderStrategy,
	},
	url::Url,
};

fn url(value: &str) -> Url {
	Url::parse(value).expect("Failed to parse mock provider URL.")
}

fn builder(id: &str) -> ProviderDescriptorBuilder {
	let provider_id =
		ProviderId::new(id).expect("Failed to build provider identifier for mock descriptor.");

	ProviderDescriptor::builder(provider_id)
}

struct NoProfile;
impl ProviderStrategy for NoProfile {
	fn user_profile<'a>(&'a self, resource: ProtectedResource<'a>) -> ProfileFuture<'a> {
		unsupported_profile(resource)
	}
}

fn unsupported_profile(resource: ProtectedResource<'_>) -> ProfileFuture<'_> {
	Box::pin(async move {
		let url = resource.profile_endpoint()?;

		Err::<Profile, _>(Error::InvalidGrant { reason: format!("{url} is not served in tests") })
	})
}

#[test]
fn descriptor_rejects_missing_and_insecure_endpoints() {
	let err = builder("mock")
		.token_endpoint(url("https://example.com/token"))
		.build()
		.expect_err("Descriptor builder should require an authorization endpoint.");

	assert_eq!(err, ProviderDescriptorError::MissingAuthorizationEndpoint);

	let err = builder("mock")
		.authorization_endpoint(url("http://example.com/auth"))
		.token_endpoint(url("https://example.com/token"))
		.build()
		.expect_err("Descriptor builder should reject insecure authorization endpoints.");

	assert!(matches!(
		err,
		ProviderDescriptorError::InsecureEndpoint { endpoint: "authorization", .. }
	));

	let err = builder("mock")
		.authorization_endpoint(url("https://example.com/auth"))
		.token_endpoint(url("https://example.com/token"))
		.profile_endpoint(url("http://api.example.com/user"))
		.build()
		.expect_err("Descriptor builder should reject insecure profile endpoints.");

	assert!(matches!(err, ProviderDescriptorError::InsecureEndpoint { endpoint: "profile", .. }));
}

#[test]
fn descriptor_keeps_configured_values() {
	let quirks = ProviderQuirks { bearer_placement: BearerPlacement::Query, ..Default::default() };
	let descriptor = builder("flattr")
		.authorization_endpoint(url("https://example.com/auth"))
		.token_endpoint(url("https://example.com/token"))
		.profile_endpoint(url("https://api.example.com/user"))
		.preferred_client_auth_method(ClientAuthMethod::ClientSecretPost)
		.quirks(quirks)
		.build()
		.expect("Descriptor builder should succeed for secure endpoints.");

	assert_eq!(descriptor.endpoints.authorization.as_str(), "https://example.com/auth");
	assert_eq!(descriptor.endpoints.token.as_str(), "https://example.com/token");
	assert_eq!(
		descriptor
			.endpoints
			.profile
			.as_ref()
			.expect("Profile endpoint should be populated when configured.")
			.as_str(),
		"https://api.example.com/user",
	);
	assert_eq!(descriptor.preferred_client_auth_method, ClientAuthMethod::ClientSecretPost);
	assert!(!descriptor.uses_pkce());
	assert_eq!(descriptor.quirks.scope_delimiter, ' ');
	assert_eq!(descriptor.quirks.bearer_placement, BearerPlacement::Query);
}

#[test]
fn public_clients_require_pkce() {
	let err = builder("public")
		.authorization_endpoint(url("https://example.com/auth"))
		.token_endpoint(url("https://example.com/token"))
		.preferred_client_auth_method(ClientAuthMethod::NoneWithPkce)
		.build()
		.expect_err("Public clients without PKCE should be rejected.");

	assert_eq!(err, ProviderDescriptorError::PublicClientWithoutPkce);

	let descriptor = builder("public")
		.authorization_endpoint(url("https://example.com/auth"))
		.token_endpoint(url("https://example.com/token"))
		.preferred_client_auth_method(ClientAuthMethod::NoneWithPkce)
		.quirks(ProviderQuirks { pkce_required: true, ..Default::default() })
		.build()
		.expect("Public clients with PKCE should be accepted.");

	assert!(descriptor.uses_pkce());
}

#[test]
fn control_characters_are_rejected_as_scope_delimiters() {
	let err = builder("delimiter")
		.authorization_endpoint(url("https://example.com/auth"))
		.token_endpoint(url("https://example.com/token"))
		.quirks(ProviderQuirks { scope_delimiter: '\n', ..Default::default() })
		.build()
		.expect_err("Control characters should be rejected.");

	assert_eq!(err, ProviderDescriptorError::InvalidScopeDelimiter { delimiter: '\n' });
}

#[test]
fn default_classification_prefers_oauth_error_fields() {
	let strategy = NoProfile;
	let ctx = ProviderErrorContext::new().with_http_status(400).with_oauth_error("invalid_grant");

	assert_eq!(strategy.classify_token_error(&ctx), ProviderErrorKind::InvalidGrant);

	let ctx = ProviderErrorContext::new().with_http_status(401).with_oauth_error("invalid_client");

	assert_eq!(strategy.classify_token_error(&ctx), ProviderErrorKind::InvalidClient);

	let ctx = ProviderErrorContext::new()
		.with_http_status(500)
		.with_error_description("invalid_grant: code already used");

	assert_eq!(strategy.classify_token_error(&ctx), ProviderErrorKind::InvalidGrant);
	assert_eq!(
		strategy.classify_token_error(&ProviderErrorContext::new().with_http_status(503)),
		ProviderErrorKind::Transient
	);
}

#[test]
fn custom_strategies_can_augment_requests() {
	struct AudienceStrategy;
	impl ProviderStrategy for AudienceStrategy {
		fn user_profile<'a>(&'a self, resource: ProtectedResource<'a>) -> ProfileFuture<'a> {
			unsupported_profile(resource)
		}

		fn classify_token_error(&self, _ctx: &ProviderErrorContext) -> ProviderErrorKind {
			ProviderErrorKind::InvalidGrant
		}

		fn augment_token_request(&self, form: &mut BTreeMap<String, String>) {
			form.insert("audience".into(), "api.flattr.com".into());
		}

		fn augment_authorization_params(&self, params: &mut BTreeMap<String, String>) {
			params.insert("display".into(), "popup".into());
		}
	}

	let strategy = AudienceStrategy;
	let mut form = BTreeMap::new();

	strategy.augment_token_request(&mut form);

	assert_eq!(form.get("audience").map(String::as_str), Some("api.flattr.com"));

	let mut params = BTreeMap::new();

	strategy.augment_authorization_params(&mut params);

	assert_eq!(params.get("display").map(String::as_str), Some("popup"));
	assert_eq!(
		strategy.classify_token_error(&ProviderErrorContext::new().with_http_status(503)),
		ProviderErrorKind::InvalidGrant
	);
}
