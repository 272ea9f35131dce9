//! Optional observability helpers for strategy flows.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `oauth2_flattr.flow` with the `flow`
//!   (handshake step), `strategy` (strategy name) and `stage` (call site) fields. Failed steps
//!   log a warning inside their span.
//! - Enable `metrics` to increment the `oauth2_flattr_flow_total` counter for every
//!   attempt/success/failure, labeled by `flow`, `strategy` and `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Handshake steps observed by the strategy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Building the redirect to the provider's authorize page.
	Authorize,
	/// Exchanging an authorization code at the token endpoint.
	CodeExchange,
	/// Fetching and normalizing the user profile.
	Profile,
	/// Full callback handling, including the verify callback.
	Authenticate,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::Authorize => "authorize",
			FlowKind::CodeExchange => "code_exchange",
			FlowKind::Profile => "profile",
			FlowKind::Authenticate => "authenticate",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to a strategy step.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Runs `fut` inside a [`FlowSpan`] and records attempt + outcome counters around it.
pub(crate) async fn observe<T, Fut>(
	kind: FlowKind,
	strategy: &str,
	stage: &'static str,
	fut: Fut,
) -> Result<T>
where
	Fut: Future<Output = Result<T>>,
{
	let span = FlowSpan::new(kind, strategy, stage);

	record_flow_outcome(kind, strategy, FlowOutcome::Attempt);

	let result = span.instrument(fut).await;

	match &result {
		Ok(_) => record_flow_outcome(kind, strategy, FlowOutcome::Success),
		Err(err) => {
			span.record_failure(err);
			record_flow_outcome(kind, strategy, FlowOutcome::Failure);
		},
	}

	result
}
