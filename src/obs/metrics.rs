// self
use crate::obs::{ControllerKind, ReconcileOutcome};

/// Records a reconcile outcome via the global metrics recorder (when enabled).
pub fn record_reconcile_outcome(kind: ControllerKind, outcome: ReconcileOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"access_token_operator_reconcile_total",
			"controller" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}
