// self
use crate::obs::{FlowKind, FlowOutcome};

/// Increments `oauth2_flattr_flow_total` for `kind` + `outcome` when the `metrics` feature is on.
pub fn record_flow_outcome(kind: FlowKind, strategy: &str, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	metrics::counter!(
		"oauth2_flattr_flow_total",
		"flow" => kind.as_str(),
		"strategy" => strategy.to_owned(),
		"outcome" => outcome.as_str()
	)
	.increment(1);

	#[cfg(not(feature = "metrics"))]
	let _ = (kind, strategy, outcome);
}
