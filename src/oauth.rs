//! Internal OAuth client facade: authorization-code exchange and protected-resource GETs.

pub use oauth2;

// crates.io
use oauth2::{
	AsyncHttpClient, AuthType, AuthUrl, AuthorizationCode, ClientId, ClientSecret,
	EndpointNotSet, EndpointSet, HttpClientError, HttpRequest, PkceCodeVerifier, RedirectUrl,
	RequestTokenError, TokenResponse, TokenUrl,
	basic::{BasicClient, BasicErrorResponse, BasicRequestTokenError},
	http::{
		Method, Request,
		header::{ACCEPT, AUTHORIZATION},
	},
};
// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, TokenGrant, TokenSecret},
	error::{ConfigError, TransientError, TransportError},
	http::{Endpoint, OAuthHttpClient, ResponseMetadata, ResponseMetadataSlot},
	provider::{
		BearerPlacement, ClientAuthMethod, ProviderDescriptor, ProviderErrorContext,
		ProviderErrorKind, ProviderStrategy, ResourceFetcher, ResourceFuture,
		strategy::truncate_preview,
	},
};

type ConfiguredBasicClient =
	BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;
type FacadeTokenResponse = oauth2::basic::BasicTokenResponse;
type FacadeFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// Maps HTTP transport failures into strategy [`Error`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted by the transport into a strategy error.
	fn map_transport_error(
		&self,
		endpoint: Endpoint,
		metadata: Option<&ResponseMetadata>,
		error: HttpClientError<E>,
	) -> Error;
}

/// Default mapper for reqwest-backed transports.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(
		&self,
		endpoint: Endpoint,
		meta: Option<&ResponseMetadata>,
		err: HttpClientError<ReqwestError>,
	) -> Error {
		match err {
			HttpClientError::Reqwest(inner) => map_reqwest_error(endpoint, meta, *inner),
			HttpClientError::Http(inner) => ConfigError::from(inner).into(),
			HttpClientError::Io(inner) => TransportError::Io(inner).into(),
			HttpClientError::Other(message) => map_generic_transport_error(endpoint, meta, message),
			_ => map_unknown_transport_error(endpoint, meta),
		}
	}
}

pub(crate) trait OAuth2Facade {
	fn exchange_authorization_code<'a, 'strategy, 'code, 'pkce, 'scope>(
		&'a self,
		strategy: &'strategy dyn ProviderStrategy,
		code: &'code str,
		pkce_verifier: Option<&'pkce str>,
		requested_scope: &'scope ScopeSet,
	) -> FacadeFuture<'a, TokenGrant>
	where
		'strategy: 'a,
		'code: 'a,
		'pkce: 'a,
		'scope: 'a;
}

pub(crate) struct BasicFacade<C, M>
where
	C: ?Sized + OAuthHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	oauth_client: ConfiguredBasicClient,
	http_client: Arc<C>,
	error_mapper: Arc<M>,
}
impl<C, M> BasicFacade<C, M>
where
	C: ?Sized + OAuthHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	pub(crate) fn from_descriptor(
		descriptor: &ProviderDescriptor,
		client_id: &str,
		client_secret: Option<&TokenSecret>,
		redirect_uri: Option<&Url>,
		http_client: Arc<C>,
		error_mapper: Arc<M>,
	) -> Result<Self> {
		let auth_url = AuthUrl::new(descriptor.endpoints.authorization.to_string())
			.map_err(|source| ConfigError::InvalidDescriptor { source })?;
		let token_url = TokenUrl::new(descriptor.endpoints.token.to_string())
			.map_err(|source| ConfigError::InvalidDescriptor { source })?;
		let secret =
			if matches!(descriptor.preferred_client_auth_method, ClientAuthMethod::NoneWithPkce) {
				None
			} else {
				client_secret.map(|value| ClientSecret::new(value.expose().to_owned()))
			};
		let mut oauth_client = BasicClient::new(ClientId::new(client_id.to_owned()))
			.set_auth_uri(auth_url)
			.set_token_uri(token_url);

		if let Some(secret) = secret {
			oauth_client = oauth_client.set_client_secret(secret);
		}
		if let Some(redirect) = redirect_uri {
			let redirect_url = RedirectUrl::new(redirect.to_string())
				.map_err(|source| ConfigError::InvalidRedirect { source })?;

			oauth_client = oauth_client.set_redirect_uri(redirect_url);
		}
		if matches!(descriptor.preferred_client_auth_method, ClientAuthMethod::ClientSecretPost) {
			oauth_client = oauth_client.set_auth_type(AuthType::RequestBody);
		}

		Ok(Self { oauth_client, http_client, error_mapper })
	}
}
impl<C, M> OAuth2Facade for BasicFacade<C, M>
where
	C: ?Sized + OAuthHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn exchange_authorization_code<'a, 'strategy, 'code, 'pkce, 'scope>(
		&'a self,
		strategy: &'strategy dyn ProviderStrategy,
		code: &'code str,
		pkce_verifier: Option<&'pkce str>,
		requested_scope: &'scope ScopeSet,
	) -> FacadeFuture<'a, TokenGrant>
	where
		'strategy: 'a,
		'code: 'a,
		'pkce: 'a,
		'scope: 'a,
	{
		let meta = ResponseMetadataSlot::default();

		Box::pin(async move {
			let instrumented = self.http_client.with_metadata(meta.clone());
			let mut form = BTreeMap::new();

			strategy.augment_token_request(&mut form);

			let mut request =
				self.oauth_client.exchange_code(AuthorizationCode::new(code.to_owned()));

			if let Some(verifier) = pkce_verifier {
				request = request.set_pkce_verifier(PkceCodeVerifier::new(verifier.to_owned()));
			}
			for (key, value) in form {
				request = request.add_extra_param(key, value);
			}

			let response = request.request_async(&instrumented).await.map_err(|err| {
				map_request_error(strategy, meta.take(), err, self.error_mapper.as_ref())
			})?;

			map_token_response(requested_scope, response)
		})
	}
}

/// Protected-resource GET helper shared by every provider strategy.
pub(crate) struct ProtectedResourceClient<C, M>
where
	C: ?Sized + OAuthHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	http_client: Arc<C>,
	error_mapper: Arc<M>,
	placement: BearerPlacement,
}
impl<C, M> ProtectedResourceClient<C, M>
where
	C: ?Sized + OAuthHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	pub(crate) fn new(http_client: Arc<C>, error_mapper: Arc<M>, placement: BearerPlacement) -> Self {
		Self { http_client, error_mapper, placement }
	}
}
impl<C, M> ResourceFetcher for ProtectedResourceClient<C, M>
where
	C: ?Sized + OAuthHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fetch<'a>(&'a self, url: &'a Url, access_token: &'a TokenSecret) -> ResourceFuture<'a> {
		let meta = ResponseMetadataSlot::default();

		Box::pin(async move {
			let handle = self.http_client.with_metadata(meta.clone());
			let request = build_resource_request(url, access_token, self.placement)?;
			let response = handle.call(request).await.map_err(|err| {
				self.error_mapper.map_transport_error(Endpoint::Profile, meta.take().as_ref(), err)
			})?;
			let status = response.status();

			if !status.is_success() {
				let body = String::from_utf8_lossy(response.body()).into_owned();

				return Err(TransportError::Status {
					endpoint: Endpoint::Profile,
					status: status.as_u16(),
					body: truncate_preview(body),
				}
				.into());
			}

			Ok(response.into_body())
		})
	}
}

fn build_resource_request(
	url: &Url,
	access_token: &TokenSecret,
	placement: BearerPlacement,
) -> Result<HttpRequest> {
	let mut target = url.clone();
	let mut builder = Request::builder().method(Method::GET).header(ACCEPT, "application/json");

	match placement {
		BearerPlacement::Header => {
			builder = builder.header(AUTHORIZATION, format!("Bearer {}", access_token.expose()));
		},
		BearerPlacement::Query => {
			target.query_pairs_mut().append_pair("access_token", access_token.expose());
		},
	}

	builder.uri(target.as_str()).body(Vec::new()).map_err(|err| ConfigError::from(err).into())
}

fn map_token_response(
	requested_scope: &ScopeSet,
	response: FacadeTokenResponse,
) -> Result<TokenGrant> {
	let scope = match response.scopes() {
		Some(scopes) => ScopeSet::new(scopes.iter().map(|scope| scope.as_str()))
			.map_err(ConfigError::from)?,
		None => requested_scope.clone(),
	};
	let mut builder = TokenGrant::builder(scope)
		.access_token(response.access_token().secret().to_owned())
		.issued_at(OffsetDateTime::now_utc());

	if let Some(expires_in) = response.expires_in() {
		let expires_in =
			i64::try_from(expires_in.as_secs()).map_err(|_| ConfigError::ExpiresInOutOfRange)?;

		builder = builder.expires_in(Duration::seconds(expires_in));
	}
	if let Some(refresh) = response.refresh_token() {
		builder = builder.refresh_token(refresh.secret().to_owned());
	}

	builder.build().map_err(|err| ConfigError::from(err).into())
}

fn map_request_error<E, M>(
	strategy: &dyn ProviderStrategy,
	meta: Option<ResponseMetadata>,
	err: BasicRequestTokenError<HttpClientError<E>>,
	mapper: &M,
) -> Error
where
	E: 'static + Send + Sync + StdError,
	M: ?Sized + TransportErrorMapper<E>,
{
	let meta_ref = meta.as_ref();

	match err {
		RequestTokenError::ServerResponse(response) =>
			map_server_response_error(strategy, response, meta_ref),
		RequestTokenError::Request(error) =>
			mapper.map_transport_error(Endpoint::Token, meta_ref, error),
		RequestTokenError::Parse(error, body) =>
			map_unparsed_response_error(strategy, error, body, meta_ref),
		RequestTokenError::Other(message) => TransientError::Endpoint {
			endpoint: Endpoint::Token,
			message,
			status: meta_status(meta_ref),
			retry_after: meta_retry_after(meta_ref),
		}
		.into(),
	}
}

fn map_server_response_error(
	strategy: &dyn ProviderStrategy,
	response: BasicErrorResponse,
	meta: Option<&ResponseMetadata>,
) -> Error {
	let mut ctx = ProviderErrorContext::new().with_oauth_error(response.error().as_ref().to_string());

	if let Some(description) = response.error_description() {
		ctx = ctx.with_error_description(description.clone());
	}
	if let Some(status) = meta_status(meta) {
		ctx = ctx.with_http_status(status);
	}

	let message = if let Some(description) = response.error_description() {
		format!("Token endpoint returned an OAuth error: {description}")
	} else {
		format!("Token endpoint returned an OAuth error: {}", response.error().as_ref())
	};

	classified_token_error(strategy.classify_token_error(&ctx), message, meta)
}

// Error statuses with a non-JSON body are classified from the body text; anything else stays
// a parse failure.
fn map_unparsed_response_error(
	strategy: &dyn ProviderStrategy,
	source: serde_path_to_error::Error<serde_json::Error>,
	body: Vec<u8>,
	meta: Option<&ResponseMetadata>,
) -> Error {
	let Some(status) = meta_status(meta).filter(|code| *code >= 400) else {
		let status = meta_status(meta);

		return TransientError::TokenResponseParse { source, status }.into();
	};
	let preview = String::from_utf8_lossy(&body).into_owned();
	let ctx = ProviderErrorContext::new().with_http_status(status).with_body_preview(preview);
	let message = format!(
		"Token endpoint returned HTTP {status}: {}",
		ctx.body_preview.as_deref().unwrap_or_default()
	);

	classified_token_error(strategy.classify_token_error(&ctx), message, meta)
}

fn classified_token_error(
	kind: ProviderErrorKind,
	message: String,
	meta: Option<&ResponseMetadata>,
) -> Error {
	match kind {
		ProviderErrorKind::InvalidGrant => Error::InvalidGrant { reason: message },
		ProviderErrorKind::InvalidClient => Error::InvalidClient { reason: message },
		ProviderErrorKind::InsufficientScope => Error::InsufficientScope { reason: message },
		ProviderErrorKind::Transient => TransientError::Endpoint {
			endpoint: Endpoint::Token,
			message,
			status: meta_status(meta),
			retry_after: meta_retry_after(meta),
		}
		.into(),
	}
}

#[cfg(feature = "reqwest")]
fn map_reqwest_error(
	endpoint: Endpoint,
	meta: Option<&ResponseMetadata>,
	err: ReqwestError,
) -> Error {
	if err.is_builder() {
		return ConfigError::from(err).into();
	}
	if err.is_timeout() {
		return TransientError::Endpoint {
			endpoint,
			message: "request timed out".into(),
			status: meta_status(meta).or_else(|| err.status().map(|code| code.as_u16())),
			retry_after: meta_retry_after(meta),
		}
		.into();
	}

	TransportError::network(endpoint, err).into()
}

#[cfg(feature = "reqwest")]
fn map_generic_transport_error(
	endpoint: Endpoint,
	meta: Option<&ResponseMetadata>,
	message: impl Display,
) -> Error {
	TransientError::Endpoint {
		endpoint,
		message: format!("HTTP client error: {message}"),
		status: meta_status(meta),
		retry_after: meta_retry_after(meta),
	}
	.into()
}

#[cfg(feature = "reqwest")]
fn map_unknown_transport_error(endpoint: Endpoint, meta: Option<&ResponseMetadata>) -> Error {
	TransientError::Endpoint {
		endpoint,
		message: "unknown HTTP client error".into(),
		status: meta_status(meta),
		retry_after: meta_retry_after(meta),
	}
	.into()
}

fn meta_status(meta: Option<&ResponseMetadata>) -> Option<u16> {
	meta.and_then(|value| value.status)
}

fn meta_retry_after(meta: Option<&ResponseMetadata>) -> Option<Duration> {
	meta.and_then(|value| value.retry_after)
}
