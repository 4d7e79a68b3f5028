// crates.io
use tracing::{Instrument, Span, instrument::Instrumented};
// self
use crate::{_prelude::*, api::ObjectKey, obs::ControllerKind};

/// A span builder used by controller workers.
#[derive(Clone, Debug)]
pub struct ReconcileSpan {
	span: Span,
}
impl ReconcileSpan {
	/// Creates a new span tagged with the controller and the reconciled key.
	pub fn new(kind: ControllerKind, key: &ObjectKey) -> Self {
		let span = tracing::info_span!(
			"access_token_operator.reconcile",
			controller = kind.as_str(),
			key = %key
		);

		Self { span }
	}

	/// Enters the span for synchronous sections.
	pub fn entered(self) -> ReconcileSpanGuard {
		ReconcileSpanGuard { _guard: self.span.entered() }
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> Instrumented<Fut>
	where
		Fut: Future,
	{
		fut.instrument(self.span.clone())
	}
}

/// RAII guard returned by [`ReconcileSpan::entered`].
pub struct ReconcileSpanGuard {
	_guard: tracing::span::EnteredSpan,
}
impl Debug for ReconcileSpanGuard {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("ReconcileSpanGuard(..)")
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn span_guard_can_be_entered() {
		let _guard =
			ReconcileSpan::new(ControllerKind::Binding, &ObjectKey::new("ns", "name")).entered();
	}

	#[tokio::test]
	async fn instrument_wraps_future() {
		let span = ReconcileSpan::new(ControllerKind::AccessToken, &ObjectKey::new("ns", "name"));
		let value = ReconcileSpan::instrument(&span, async { 42 }).await;

		assert_eq!(value, 42);
	}
}
