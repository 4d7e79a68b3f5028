//! Keyed work queue with deduplication and single-flight processing.
//!
//! A key is queued at most once. A key handed to a worker is tracked as processing until
//! [`WorkQueue::done`]; re-adding it meanwhile only marks it dirty, and it is queued again once
//! the current pass finishes. Two workers therefore never reconcile the same key concurrently.

// std
use std::time::Duration as StdDuration;
// crates.io
use tokio::sync::Notify;
// self
use crate::{_prelude::*, api::ObjectKey};

#[derive(Default)]
struct QueueState {
	queue: VecDeque<ObjectKey>,
	dirty: HashSet<ObjectKey>,
	processing: HashSet<ObjectKey>,
	shutting_down: bool,
}

#[derive(Default)]
struct Inner {
	state: Mutex<QueueState>,
	notify: Notify,
}

/// Cloneable handle to a shared work queue.
#[derive(Clone, Default)]
pub struct WorkQueue(Arc<Inner>);
impl WorkQueue {
	/// Creates an empty queue.
	pub fn new() -> Self {
		Self::default()
	}

	/// Queues `key` unless it is already waiting; keys being processed are deferred.
	pub fn add(&self, key: ObjectKey) {
		let mut state = self.0.state.lock();

		if state.shutting_down || !state.dirty.insert(key.clone()) {
			return;
		}
		if state.processing.contains(&key) {
			return;
		}

		state.queue.push_back(key);
		drop(state);
		self.0.notify.notify_one();
	}

	/// Queues `key` after `delay`.
	///
	/// Must be called from within a Tokio runtime when `delay` is non-zero.
	pub fn add_after(&self, key: ObjectKey, delay: StdDuration) {
		if delay.is_zero() {
			self.add(key);

			return;
		}

		let queue = self.clone();

		tokio::spawn(async move {
			tokio::time::sleep(delay).await;
			queue.add(key);
		});
	}

	/// Waits for the next key; `None` once the queue shuts down.
	pub async fn get(&self) -> Option<ObjectKey> {
		loop {
			let notified = self.0.notify.notified();

			{
				let mut state = self.0.state.lock();

				if let Some(key) = state.queue.pop_front() {
					state.dirty.remove(&key);
					state.processing.insert(key.clone());

					return Some(key);
				}
				if state.shutting_down {
					return None;
				}
			}

			notified.await;
		}
	}

	/// Marks `key` as finished, re-queueing it if it was added while processing.
	pub fn done(&self, key: &ObjectKey) {
		let mut state = self.0.state.lock();

		state.processing.remove(key);

		if state.dirty.contains(key) && !state.shutting_down {
			state.queue.push_back(key.clone());
			drop(state);
			self.0.notify.notify_one();
		}
	}

	/// Stops handing out keys and wakes every waiting worker.
	pub fn shutdown(&self) {
		self.0.state.lock().shutting_down = true;
		self.0.notify.notify_waiters();
	}

	/// Returns true after [`WorkQueue::shutdown`].
	pub fn is_shutting_down(&self) -> bool {
		self.0.state.lock().shutting_down
	}

	/// Number of keys waiting to be handed out.
	pub fn len(&self) -> usize {
		self.0.state.lock().queue.len()
	}

	/// Returns true when nothing is waiting.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}
impl Debug for WorkQueue {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let state = self.0.state.lock();

		f.debug_struct("WorkQueue")
			.field("queued", &state.queue.len())
			.field("processing", &state.processing.len())
			.field("shutting_down", &state.shutting_down)
			.finish()
	}
}
