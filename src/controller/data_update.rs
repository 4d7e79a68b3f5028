//! Storage-change triggers: force a token reconcile, then consume the trigger.

// self
use crate::{
	_prelude::*,
	api::{AccessTokenDataUpdate, ObjectKey},
	cluster::{Cluster, ObjectStore},
	obs::ControllerKind,
	runtime::{Action, ReconcileFuture, Reconciler, WorkQueue},
};

/// Reconciler for [`AccessTokenDataUpdate`] triggers.
///
/// Holds the access token controller's queue, so the named token is reconciled even though
/// neither its spec nor its status changed.
pub struct DataUpdateReconciler {
	triggers: Arc<dyn ObjectStore<AccessTokenDataUpdate>>,
	token_queue: WorkQueue,
}
impl DataUpdateReconciler {
	/// Creates a reconciler that forwards triggers into `token_queue`.
	pub fn new(cluster: &Cluster, token_queue: WorkQueue) -> Self {
		Self { triggers: cluster.data_updates.clone(), token_queue }
	}

	async fn consume(&self, key: &ObjectKey) -> Result<Action> {
		let Some(trigger) = self.triggers.get(key).await? else {
			return Ok(Action::await_change());
		};
		let token = trigger.token_key();

		tracing::debug!(token = %token, "Forwarding storage change to the access token.");
		self.token_queue.add(token);

		match self.triggers.delete(key).await {
			Ok(()) => Ok(Action::await_change()),
			// Fire-once: another pass already consumed it.
			Err(e) if e.is_not_found() => Ok(Action::await_change()),
			Err(e) => Err(e.into()),
		}
	}
}
impl Reconciler for DataUpdateReconciler {
	type Resource = AccessTokenDataUpdate;

	fn kind(&self) -> ControllerKind {
		ControllerKind::DataUpdate
	}

	fn reconcile<'a>(&'a self, key: &'a ObjectKey) -> ReconcileFuture<'a> {
		Box::pin(self.consume(key))
	}
}
impl Debug for DataUpdateReconciler {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("DataUpdateReconciler")
			.field("token_queue", &self.token_queue)
			.finish_non_exhaustive()
	}
}
