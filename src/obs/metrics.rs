// self
use crate::{
	auth::Decision,
	obs::{DecisionReason, OpOutcome},
};

/// Records an issuance outcome via the global metrics recorder (when enabled).
pub fn record_issuance_outcome(outcome: OpOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("authgate_issuance_total", "outcome" => outcome.as_str()).increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = outcome;
	}
}

/// Records a gateway decision via the global metrics recorder (when enabled).
pub fn record_decision(decision: Decision, reason: DecisionReason) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"authgate_decision_total",
			"decision" => decision.as_str(),
			"reason" => reason.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (decision, reason);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn recorders_noop_without_metrics() {
		record_issuance_outcome(OpOutcome::Failure);
		record_decision(Decision::Deny, DecisionReason::ScopeNotPermitted);
	}
}
