#![cfg(feature = "reqwest")]

// self
use oauth2_flattr::{
	_preludet::*,
	auth::TokenSecret,
	error::{ConfigError, TransientError, TransportError},
	flattr,
	flows::OAuth2Strategy,
	http::{Endpoint, OAuthHttpClient, ResponseMetadata, ResponseMetadataSlot},
	oauth::{
		TransportErrorMapper,
		oauth2::{AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse},
	},
};

type FakeStrategy = OAuth2Strategy<String, FakeHttpClient, RecordingTransportErrorMapper>;

#[derive(Debug)]
enum FakeTransportError {
	Throttled,
}
impl Display for FakeTransportError {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::Throttled => write!(f, "Transport throttled."),
		}
	}
}
impl StdError for FakeTransportError {}

#[derive(Clone, Copy)]
struct FakeHttpClient {
	retry_after: Duration,
}
impl FakeHttpClient {
	fn throttled(retry_after: Duration) -> Self {
		Self { retry_after }
	}
}
impl OAuthHttpClient for FakeHttpClient {
	type Handle = FakeHttpHandle;
	type TransportError = FakeTransportError;

	fn with_metadata(&self, slot: ResponseMetadataSlot) -> Self::Handle {
		FakeHttpHandle { slot, retry_after: self.retry_after }
	}
}

struct FakeHttpHandle {
	slot: ResponseMetadataSlot,
	retry_after: Duration,
}
impl<'a> AsyncHttpClient<'a> for FakeHttpHandle {
	type Error = HttpClientError<FakeTransportError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'a + Send + Sync>>;

	fn call(&'a self, _request: HttpRequest) -> Self::Future {
		let slot = self.slot.clone();
		let retry_after = self.retry_after;

		Box::pin(async move {
			assert!(
				slot.take().is_none(),
				"ResponseMetadataSlot must be clear before dispatching a request."
			);
			slot.store(ResponseMetadata { status: Some(429), retry_after: Some(retry_after) });

			Err(HttpClientError::Reqwest(Box::new(FakeTransportError::Throttled)))
		})
	}
}

#[derive(Clone, Default)]
struct RecordingTransportErrorMapper {
	calls: Arc<Mutex<Vec<(Endpoint, Option<ResponseMetadata>)>>>,
}
impl RecordingTransportErrorMapper {
	fn recorded(&self) -> Vec<(Endpoint, Option<ResponseMetadata>)> {
		self.calls.lock().clone()
	}
}
impl TransportErrorMapper<FakeTransportError> for RecordingTransportErrorMapper {
	fn map_transport_error(
		&self,
		endpoint: Endpoint,
		meta: Option<&ResponseMetadata>,
		err: HttpClientError<FakeTransportError>,
	) -> Error {
		let status = meta.and_then(|value| value.status);
		let retry_after = meta.and_then(|value| value.retry_after);

		self.calls.lock().push((endpoint, meta.cloned()));

		match err {
			HttpClientError::Reqwest(inner) => TransientError::Endpoint {
				endpoint,
				message: format!("Fake transport error: {inner}"),
				status,
				retry_after,
			}
			.into(),
			HttpClientError::Http(inner) => ConfigError::from(inner).into(),
			HttpClientError::Io(inner) => TransportError::Io(inner).into(),
			other => TransientError::Endpoint {
				endpoint,
				message: format!("Unhandled HTTP client error variant: {other:?}"),
				status,
				retry_after,
			}
			.into(),
		}
	}
}

fn build_fake_strategy(retry_after: Duration) -> (FakeStrategy, RecordingTransportErrorMapper) {
	let mapper = RecordingTransportErrorMapper::default();
	let strategy: FakeStrategy = flattr::strategy_with_http_client(
		options(),
		Some(accept_all()),
		Arc::new(FakeHttpClient::throttled(retry_after)),
		Arc::new(mapper.clone()),
	)
	.expect("Strategy over the fake transport should build.");

	(strategy, mapper)
}

#[tokio::test]
async fn throttled_code_exchange_surfaces_metadata() {
	let (strategy, mapper) = build_fake_strategy(Duration::seconds(5));
	let session = strategy.start_authorization();
	let err = strategy
		.exchange_code(&session, "valid-code")
		.await
		.expect_err("Exchange should be throttled with HTTP 429.");

	match err {
		Error::Transient(TransientError::Endpoint { endpoint, status, retry_after, .. }) => {
			assert_eq!(endpoint, Endpoint::Token);
			assert_eq!(status, Some(429));
			assert_eq!(retry_after, Some(Duration::seconds(5)));
		},
		other => panic!("Unexpected error variant: {other:?}."),
	}

	let recorded = mapper.recorded();

	assert_eq!(recorded.len(), 1, "Mapper must record a single request.");
	assert_eq!(recorded[0].0, Endpoint::Token);
}

#[tokio::test]
async fn throttled_profile_fetch_is_tagged_with_profile_endpoint() {
	let (strategy, mapper) = build_fake_strategy(Duration::seconds(30));
	let err = strategy
		.user_profile(&TokenSecret::new("T1"))
		.await
		.expect_err("Profile fetch should be throttled with HTTP 429.");

	assert!(
		matches!(
			err,
			Error::Transient(TransientError::Endpoint { endpoint: Endpoint::Profile, .. })
		),
		"Unexpected error: {err:?}."
	);

	let recorded = mapper.recorded();
	let (endpoint, meta) = recorded.first().cloned().expect("Mapper should record the request.");
	let meta = meta.expect("Response metadata should be recorded exactly once.");

	assert_eq!(endpoint, Endpoint::Profile);
	assert_eq!(meta.status, Some(429));
	assert_eq!(meta.retry_after, Some(Duration::seconds(30)));
}
