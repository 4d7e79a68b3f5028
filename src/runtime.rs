//! Level-triggered controller runtime.
//!
//! A [`Controller`] turns watch events, periodic resyncs and explicit requeues into keys on a
//! [`WorkQueue`], and runs a pool of workers that hand each key to a [`Reconciler`]. Reconciles
//! always re-read current state, so the runtime never carries object snapshots between passes.
//!
//! Failed passes are retried with per-key backoff only when their [`ErrorKind`] is retryable;
//! other failures wait for the next watch event or resync.
//!
//! Each pass is bounded by a deadline and aborted on shutdown. Aborting drops the reconcile
//! future, so a pass either completes its final status write or writes nothing.

pub mod backoff;
pub mod queue;

pub use backoff::Backoff;
pub use queue::WorkQueue;

// std
use std::{future, time::Duration as StdDuration};
// crates.io
use tokio::{
	sync::broadcast::{Receiver, error::RecvError},
	task::JoinSet,
};
// self
use crate::{
	_prelude::*,
	api::{LabelSelector, ObjectKey, Resource},
	cluster::{ObjectStore, WatchEvent},
	obs::{self, ControllerKind, ReconcileOutcome, ReconcileSpan},
};

/// Boxed future returned by [`Reconciler::reconcile`].
pub type ReconcileFuture<'a> = Pin<Box<dyn Future<Output = Result<Action>> + 'a + Send>>;

type WatchTask = Box<dyn FnOnce(WorkQueue, CancellationToken) -> BoxedTask + Send>;
type BoxedTask = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Drives one resource kind towards its desired state.
pub trait Reconciler
where
	Self: 'static + Send + Sync,
{
	/// Primary resource kind.
	type Resource: Resource;

	/// Label used in spans and metrics.
	fn kind(&self) -> ControllerKind;

	/// Reconciles the object at `key`, which may no longer exist.
	fn reconcile<'a>(&'a self, key: &'a ObjectKey) -> ReconcileFuture<'a>;
}

/// What the runtime should do after a successful reconcile.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Action {
	/// Run again after this delay even without a new event.
	pub requeue_after: Option<StdDuration>,
}
impl Action {
	/// Wait for the next event.
	pub fn await_change() -> Self {
		Self::default()
	}

	/// Run again after `delay`.
	pub fn requeue(delay: StdDuration) -> Self {
		Self { requeue_after: Some(delay) }
	}
}

/// Tuning shared by every controller of an operator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ControllerSettings {
	/// Concurrent workers per controller.
	pub workers: usize,
	/// Interval between full relists of the primary kind.
	pub resync_period: StdDuration,
	/// Upper bound for a single reconcile pass.
	pub reconcile_timeout: StdDuration,
	/// First retry delay after a failure.
	pub backoff_base: StdDuration,
	/// Upper bound for retry delays.
	pub backoff_max: StdDuration,
}
impl Default for ControllerSettings {
	fn default() -> Self {
		Self {
			workers: 4,
			resync_period: StdDuration::from_secs(300),
			reconcile_timeout: StdDuration::from_secs(30),
			backoff_base: StdDuration::from_millis(100),
			backoff_max: StdDuration::from_secs(300),
		}
	}
}

/// Watches a primary kind (and any mapped secondary kinds) and feeds a [`Reconciler`].
pub struct Controller<R>
where
	R: Reconciler,
{
	reconciler: Arc<R>,
	store: Arc<dyn ObjectStore<R::Resource>>,
	queue: WorkQueue,
	settings: ControllerSettings,
	watches: Vec<WatchTask>,
}
impl<R> Controller<R>
where
	R: Reconciler,
{
	/// Creates a controller for `reconciler` over the primary `store`.
	pub fn new(
		reconciler: R,
		store: Arc<dyn ObjectStore<R::Resource>>,
		settings: ControllerSettings,
	) -> Self {
		Self {
			reconciler: Arc::new(reconciler),
			store,
			queue: WorkQueue::new(),
			settings,
			watches: Vec::new(),
		}
	}

	/// Uses an existing queue, e.g. one another component already enqueues into.
	pub fn with_queue(mut self, queue: WorkQueue) -> Self {
		self.queue = queue;

		self
	}

	/// Enqueues the keys `mapper` derives from every event of a secondary kind.
	pub fn watches<K, F>(self, store: Arc<dyn ObjectStore<K>>, mapper: F) -> Self
	where
		K: Resource,
		F: 'static + Send + Sync + Fn(&WatchEvent<K>) -> Vec<ObjectKey>,
	{
		self.watches_async(store, move |event| future::ready(mapper(&event)))
	}

	/// Like [`Controller::watches`] for mappers that need to query the cluster.
	pub fn watches_async<K, F, Fut>(mut self, store: Arc<dyn ObjectStore<K>>, mapper: F) -> Self
	where
		K: Resource,
		F: 'static + Send + Sync + Fn(WatchEvent<K>) -> Fut,
		Fut: 'static + Send + Future<Output = Vec<ObjectKey>>,
	{
		self.watches.push(Box::new(
			move |queue: WorkQueue, shutdown: CancellationToken| -> BoxedTask {
				let events = store.watch();

				Box::pin(watch_loop(store, events, queue, shutdown, mapper))
			},
		));

		self
	}

	/// Handle to the controller's queue.
	pub fn queue(&self) -> WorkQueue {
		self.queue.clone()
	}

	/// The reconciler driven by this controller.
	pub fn reconciler(&self) -> &Arc<R> {
		&self.reconciler
	}

	/// Runs until `shutdown` is cancelled, then drains the workers.
	pub async fn run(self, shutdown: CancellationToken) {
		let Self { reconciler, store, queue, settings, watches } = self;
		let kind = reconciler.kind();
		let backoff = Arc::new(Backoff::new(settings.backoff_base, settings.backoff_max));
		let mut tasks = JoinSet::new();

		// Subscribe to every stream before the first list so no change falls in between.
		for watch in watches {
			tasks.spawn(watch(queue.clone(), shutdown.clone()));
		}

		let events = store.watch();

		tasks.spawn(watch_loop(store.clone(), events, queue.clone(), shutdown.clone(), |e| {
			future::ready(vec![e.object().key()])
		}));
		tasks.spawn(resync_loop(store, queue.clone(), settings.resync_period, shutdown.clone()));

		for _ in 0..settings.workers.max(1) {
			tasks.spawn(worker_loop(
				reconciler.clone(),
				queue.clone(),
				backoff.clone(),
				settings.reconcile_timeout,
				shutdown.clone(),
			));
		}

		tracing::info!(
			controller = kind.as_str(),
			workers = settings.workers,
			"Controller started."
		);

		shutdown.cancelled().await;
		queue.shutdown();

		while let Some(joined) = tasks.join_next().await {
			if let Err(e) = joined {
				tracing::error!(
					controller = kind.as_str(),
					error = %e,
					"Controller task failed."
				);
			}
		}

		tracing::info!(controller = kind.as_str(), "Controller stopped.");
	}
}
impl<R> Debug for Controller<R>
where
	R: Reconciler,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Controller")
			.field("kind", &self.reconciler.kind())
			.field("queue", &self.queue)
			.field("settings", &self.settings)
			.finish_non_exhaustive()
	}
}

async fn watch_loop<K, F, Fut>(
	store: Arc<dyn ObjectStore<K>>,
	mut events: Receiver<WatchEvent<K>>,
	queue: WorkQueue,
	shutdown: CancellationToken,
	mapper: F,
) where
	K: Resource,
	F: Fn(WatchEvent<K>) -> Fut,
	Fut: Future<Output = Vec<ObjectKey>>,
{
	loop {
		let event = tokio::select! {
			_ = shutdown.cancelled() => return,
			event = events.recv() => event,
		};

		match event {
			Ok(event) => mapper(event).await.into_iter().for_each(|key| queue.add(key)),
			Err(RecvError::Lagged(missed)) => {
				tracing::warn!(kind = K::KIND, missed, "Watch lagged; relisting.");

				let objects = match store.list(None, &LabelSelector::everything()).await {
					Ok(objects) => objects,
					Err(e) => {
						tracing::warn!(kind = K::KIND, error = %e, "Relist failed.");

						continue;
					},
				};

				for object in objects {
					for key in mapper(WatchEvent::Applied(object)).await {
						queue.add(key);
					}
				}
			},
			Err(RecvError::Closed) => return,
		}
	}
}

async fn resync_loop<K>(
	store: Arc<dyn ObjectStore<K>>,
	queue: WorkQueue,
	period: StdDuration,
	shutdown: CancellationToken,
) where
	K: Resource,
{
	// The first tick fires immediately and doubles as the initial list.
	let mut ticker = tokio::time::interval(period.max(StdDuration::from_millis(1)));

	loop {
		tokio::select! {
			_ = shutdown.cancelled() => return,
			_ = ticker.tick() => {},
		}

		match store.list(None, &LabelSelector::everything()).await {
			Ok(objects) => objects.iter().for_each(|o| queue.add(o.key())),
			Err(e) => tracing::warn!(kind = K::KIND, error = %e, "Resync list failed."),
		}
	}
}

async fn worker_loop<R>(
	reconciler: Arc<R>,
	queue: WorkQueue,
	backoff: Arc<Backoff>,
	timeout: StdDuration,
	shutdown: CancellationToken,
) where
	R: Reconciler,
{
	let kind = reconciler.kind();

	while let Some(key) = queue.get().await {
		let span = ReconcileSpan::new(kind, &key);

		obs::record_reconcile_outcome(kind, ReconcileOutcome::Attempt);

		let pass = span.instrument(tokio::time::timeout(timeout, reconciler.reconcile(&key)));
		let result = tokio::select! {
			_ = shutdown.cancelled() => Err(Error::Cancelled { key: key.to_string() }),
			finished = pass => finished
				.unwrap_or_else(|_| Err(Error::DeadlineExceeded { key: key.to_string() })),
		};

		{
			let _guard = span.entered();

			match result {
				Ok(action) => {
					backoff.reset(&key);

					match action.requeue_after {
						Some(delay) => {
							obs::record_reconcile_outcome(kind, ReconcileOutcome::Requeue);
							tracing::debug!(?delay, "Reconciled; requeue requested.");
							queue.add_after(key.clone(), delay);
						},
						None => {
							obs::record_reconcile_outcome(kind, ReconcileOutcome::Success);
							tracing::debug!("Reconciled.");
						},
					}
				},
				Err(Error::Cancelled { .. }) => {
					tracing::debug!("Reconcile cancelled by shutdown.");
				},
				Err(e) if !e.kind().is_retryable() => {
					backoff.reset(&key);
					obs::record_reconcile_outcome(kind, ReconcileOutcome::Failure);
					tracing::warn!(
						error = %e,
						error_kind = e.kind().as_str(),
						"Reconcile failed; waiting for the next change."
					);
				},
				Err(e) => {
					let delay = backoff.next_delay(&key);

					obs::record_reconcile_outcome(kind, ReconcileOutcome::Failure);
					tracing::warn!(
						error = %e,
						error_kind = e.kind().as_str(),
						retry_in = ?delay,
						"Reconcile failed."
					);
					queue.add_after(key.clone(), delay);
				},
			}
		}

		queue.done(&key);
	}
}
