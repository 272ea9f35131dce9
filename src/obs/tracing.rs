// self
use crate::{_prelude::*, obs::FlowKind};

/// Future returned by [`FlowSpan::instrument`]; instrumented only with the `tracing` feature.
#[cfg(feature = "tracing")]
pub type InstrumentedFlow<F> = tracing::instrument::Instrumented<F>;
/// Future returned by [`FlowSpan::instrument`]; instrumented only with the `tracing` feature.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFlow<F> = F;

/// Span covering one strategy step, tagged with the strategy name that ran it.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FlowSpan {
	/// Opens a span for `kind` on behalf of the `strategy` named strategy.
	pub fn new(kind: FlowKind, strategy: &str, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!(
				"oauth2_flattr.flow",
				flow = kind.as_str(),
				strategy,
				stage
			);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, strategy, stage);

			Self {}
		}
	}

	/// Enters the span for the synchronous redirect step.
	pub fn entered(self) -> FlowSpanGuard {
		#[cfg(feature = "tracing")]
		{
			FlowSpanGuard { _guard: self.span.entered() }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = self;

			FlowSpanGuard {}
		}
	}

	/// Attaches the span to `fut` so it is re-entered on every poll.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedFlow<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}

	/// Logs why a step ended in failure, as a warning inside the span.
	pub fn record_failure(&self, err: &Error) {
		#[cfg(feature = "tracing")]
		{
			let _enter = self.span.enter();

			tracing::warn!(error = %err, "strategy step failed");
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = err;
		}
	}
}

/// Guard returned by [`FlowSpan::entered`]; leaves the span on drop.
pub struct FlowSpanGuard {
	#[cfg(feature = "tracing")]
	_guard: tracing::span::EnteredSpan,
}
impl Debug for FlowSpanGuard {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("FlowSpanGuard(..)")
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn spans_work_with_or_without_a_subscriber() {
		let span = FlowSpan::new(FlowKind::Authorize, "flattr", "start_authorization");

		span.record_failure(&Error::InvalidGrant { reason: "stale".into() });

		let _guard = span.entered();
	}

	#[cfg(feature = "tracing")]
	#[tokio::test]
	async fn instrumented_futures_keep_their_output() {
		let span = FlowSpan::new(FlowKind::Profile, "flattr", "user_profile");

		assert_eq!(span.instrument(async { "alice" }).await, "alice");
	}
}
