//! Per-key exponential backoff for failed reconciles.

// std
use std::time::Duration as StdDuration;
// crates.io
use rand::Rng;
// self
use crate::{_prelude::*, api::ObjectKey};

const MAX_JITTER: f64 = 0.1;

/// Tracks consecutive failures per key and turns them into retry delays.
///
/// The `n`-th consecutive failure waits `base * 2^n`, capped at `max`, plus up to 10% random
/// jitter. A success resets the key.
#[derive(Debug)]
pub struct Backoff {
	base: StdDuration,
	max: StdDuration,
	failures: Mutex<HashMap<ObjectKey, u32>>,
}
impl Backoff {
	/// Creates a policy with the provided bounds.
	pub fn new(base: StdDuration, max: StdDuration) -> Self {
		Self { base, max: max.max(base), failures: Mutex::new(HashMap::new()) }
	}

	/// Records a failure for `key` and returns how long to wait before retrying.
	pub fn next_delay(&self, key: &ObjectKey) -> StdDuration {
		let attempt = {
			let mut failures = self.failures.lock();
			let count = failures.entry(key.clone()).or_insert(0);
			let attempt = *count;

			*count = count.saturating_add(1);

			attempt
		};
		let delay = self.delay_for(attempt);
		let jitter = rand::rng().random_range(0.0..=MAX_JITTER);

		delay + delay.mul_f64(jitter)
	}

	/// Un-jittered delay for the `attempt`-th consecutive failure.
	pub fn delay_for(&self, attempt: u32) -> StdDuration {
		let factor = 2_u32.checked_pow(attempt).unwrap_or(u32::MAX);

		self.base.saturating_mul(factor).min(self.max)
	}

	/// Consecutive failures recorded for `key`.
	pub fn failures(&self, key: &ObjectKey) -> u32 {
		self.failures.lock().get(key).copied().unwrap_or(0)
	}

	/// Forgets the failure history of `key`.
	pub fn reset(&self, key: &ObjectKey) {
		self.failures.lock().remove(key);
	}
}
