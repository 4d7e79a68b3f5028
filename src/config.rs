//! Operator settings loaded from JSON and adjustable through builder methods.

// std
use std::time::Duration as StdDuration;
// self
use crate::{
	_prelude::*,
	error::ConfigError,
	oauth::{OAuthUrlBuilder, StateCodec},
	runtime::ControllerSettings,
};

/// OAuth service used to build `oauthUrl` links for tokens awaiting data.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthConfig {
	/// Base URL of the OAuth service.
	pub base_url: Url,
	/// Standard-base64 HMAC key (at least 32 bytes once decoded) signing the state parameter.
	pub state_key: String,
}
impl Debug for OAuthConfig {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("OAuthConfig")
			.field("base_url", &self.base_url.as_str())
			.field("state_key", &"<redacted>")
			.finish()
	}
}

/// Operator-wide settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OperatorConfig {
	/// Concurrent workers per controller.
	pub workers: usize,
	/// Seconds between full relists.
	pub resync_period_secs: u64,
	/// Seconds a single reconcile may take.
	pub reconcile_timeout_secs: u64,
	/// First retry delay in milliseconds.
	pub backoff_base_millis: u64,
	/// Retry delay cap in seconds.
	pub backoff_max_secs: u64,
	/// Seconds between deletion re-checks while bindings still reference a token.
	pub linked_bindings_recheck_secs: u64,
	/// Optional OAuth service settings.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub oauth: Option<OAuthConfig>,
}
impl OperatorConfig {
	/// Parses settings from JSON; missing fields take their defaults.
	pub fn from_json(json: &str) -> Result<Self, ConfigError> {
		let mut deserializer = serde_json::Deserializer::from_str(json);
		let config: Self = serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
			ConfigError::Parse { path: e.path().to_string(), message: e.inner().to_string() }
		})?;

		config.validate()?;

		Ok(config)
	}

	/// Checks every setting.
	pub fn validate(&self) -> Result<(), ConfigError> {
		let positive = [
			("workers", self.workers as u64),
			("resyncPeriodSecs", self.resync_period_secs),
			("reconcileTimeoutSecs", self.reconcile_timeout_secs),
			("backoffBaseMillis", self.backoff_base_millis),
			("backoffMaxSecs", self.backoff_max_secs),
			("linkedBindingsRecheckSecs", self.linked_bindings_recheck_secs),
		];

		if let Some((field, _)) = positive.into_iter().find(|(_, value)| *value == 0) {
			return Err(ConfigError::NonPositive { field });
		}
		if let Some(oauth) = &self.oauth {
			if oauth.base_url.cannot_be_a_base() {
				return Err(ConfigError::Parse {
					path: "oauth.baseUrl".into(),
					message: format!("`{}` cannot be used as a base URL", oauth.base_url),
				});
			}

			StateCodec::from_base64(&oauth.state_key)?;
		}

		Ok(())
	}

	/// Sets the worker count.
	pub fn with_workers(mut self, workers: usize) -> Self {
		self.workers = workers;

		self
	}

	/// Sets the resync period.
	pub fn with_resync_period(mut self, period: Duration) -> Self {
		self.resync_period_secs = whole_seconds(period);

		self
	}

	/// Sets the reconcile deadline.
	pub fn with_reconcile_timeout(mut self, timeout: Duration) -> Self {
		self.reconcile_timeout_secs = whole_seconds(timeout);

		self
	}

	/// Sets the retry delay bounds.
	pub fn with_backoff(mut self, base: Duration, max: Duration) -> Self {
		self.backoff_base_millis = u64::try_from(base.whole_milliseconds()).unwrap_or(0);
		self.backoff_max_secs = whole_seconds(max);

		self
	}

	/// Sets the deletion re-check interval used while bindings still reference a token.
	pub fn with_linked_bindings_recheck(mut self, interval: Duration) -> Self {
		self.linked_bindings_recheck_secs = whole_seconds(interval);

		self
	}

	/// Enables `oauthUrl` links.
	pub fn with_oauth(mut self, base_url: Url, state_key: impl Into<String>) -> Self {
		self.oauth = Some(OAuthConfig { base_url, state_key: state_key.into() });

		self
	}

	/// Interval between full relists.
	pub fn resync_period(&self) -> Duration {
		seconds(self.resync_period_secs)
	}

	/// Deadline of a single reconcile.
	pub fn reconcile_timeout(&self) -> Duration {
		seconds(self.reconcile_timeout_secs)
	}

	/// First retry delay.
	pub fn backoff_base(&self) -> Duration {
		Duration::milliseconds(i64::try_from(self.backoff_base_millis).unwrap_or(i64::MAX))
	}

	/// Retry delay cap.
	pub fn backoff_max(&self) -> Duration {
		seconds(self.backoff_max_secs)
	}

	/// Deletion re-check interval while bindings still reference a token.
	pub fn linked_bindings_recheck(&self) -> Duration {
		seconds(self.linked_bindings_recheck_secs)
	}

	/// Runtime tuning derived from these settings.
	pub fn controller_settings(&self) -> ControllerSettings {
		ControllerSettings {
			workers: self.workers,
			resync_period: self.resync_period().unsigned_abs(),
			reconcile_timeout: self.reconcile_timeout().unsigned_abs(),
			backoff_base: self.backoff_base().unsigned_abs(),
			backoff_max: self.backoff_max().unsigned_abs(),
		}
	}

	/// OAuth link builder, when an OAuth service is configured.
	pub fn oauth_url_builder(&self) -> Result<Option<OAuthUrlBuilder>, ConfigError> {
		self.oauth
			.as_ref()
			.map(|oauth| {
				StateCodec::from_base64(&oauth.state_key)
					.map(|codec| OAuthUrlBuilder::new(&oauth.base_url, codec))
			})
			.transpose()
	}

	pub(crate) fn linked_bindings_recheck_std(&self) -> StdDuration {
		StdDuration::from_secs(self.linked_bindings_recheck_secs)
	}
}
impl Default for OperatorConfig {
	fn default() -> Self {
		Self {
			workers: 4,
			resync_period_secs: 300,
			reconcile_timeout_secs: 30,
			backoff_base_millis: 100,
			backoff_max_secs: 300,
			linked_bindings_recheck_secs: 5,
			oauth: None,
		}
	}
}

fn seconds(secs: u64) -> Duration {
	Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX))
}

fn whole_seconds(duration: Duration) -> u64 {
	u64::try_from(duration.whole_seconds()).unwrap_or(0)
}
