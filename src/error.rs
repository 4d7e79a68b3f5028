//! Operator-level error types shared across controllers, stores, and providers.

// self
use crate::_prelude::*;

/// Operator-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Coarse classification every collaborator failure is reduced to before it turns into status
/// fields or a retry decision.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
	/// Network or API unavailability; retried with backoff and never written to status.
	Infrastructure,
	/// Rejected credential content; terminal until the inputs change.
	Content,
	/// Operator or resource misconfiguration; terminal until the configuration changes.
	Configuration,
}
impl ErrorKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			ErrorKind::Infrastructure => "infrastructure",
			ErrorKind::Content => "content",
			ErrorKind::Configuration => "configuration",
		}
	}

	/// Returns true when the failure should be retried with backoff.
	pub const fn is_retryable(self) -> bool {
		matches!(self, ErrorKind::Infrastructure)
	}
}
impl Display for ErrorKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Canonical operator error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Cluster API failure.
	#[error(transparent)]
	Cluster(#[from] crate::cluster::ClusterError),
	/// Token storage failure.
	#[error(transparent)]
	Storage(#[from] crate::storage::StorageError),
	/// Service provider failure.
	#[error(transparent)]
	Provider(#[from] crate::provider::ServiceProviderError),
	/// OAuth state token failure.
	#[error(transparent)]
	State(#[from] crate::oauth::StateError),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),

	/// The reconcile ran past its deadline.
	#[error("Reconcile of {key} exceeded its deadline.")]
	DeadlineExceeded {
		/// Key of the resource being reconciled.
		key: String,
	},
	/// The reconcile was cancelled by shutdown.
	#[error("Reconcile of {key} was cancelled.")]
	Cancelled {
		/// Key of the resource being reconciled.
		key: String,
	},
}
impl Error {
	/// Classifies the failure into the operator's error taxonomy.
	pub fn kind(&self) -> ErrorKind {
		match self {
			Error::Cluster(_) | Error::Storage(_) => ErrorKind::Infrastructure,
			Error::Provider(e) => e.kind(),
			Error::State(_) => ErrorKind::Content,
			Error::Config(_) => ErrorKind::Configuration,
			Error::DeadlineExceeded { .. } | Error::Cancelled { .. } => ErrorKind::Infrastructure,
		}
	}
}

/// Configuration and validation failures raised by the operator.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Operator settings could not be parsed.
	#[error("Operator configuration is invalid at `{path}`: {message}.")]
	Parse {
		/// Path of the offending field.
		path: String,
		/// Parser message.
		message: String,
	},
	/// A numeric setting must be positive.
	#[error("The `{field}` setting must be greater than zero.")]
	NonPositive {
		/// Offending setting name.
		field: &'static str,
	},
	/// The OAuth state key is not valid base64.
	#[error("The OAuth state key is not valid base64.")]
	StateKeyEncoding {
		/// Underlying decoding failure.
		#[source]
		source: base64::DecodeError,
	},
	/// The OAuth state key is too short to sign state tokens.
	#[error("The OAuth state key must be at least {min} bytes, got {actual}.")]
	StateKeyTooShort {
		/// Minimum accepted length.
		min: usize,
		/// Supplied length.
		actual: usize,
	},
	/// No registered service provider matches the URL.
	#[error("No service provider is registered for `{url}`.")]
	UnknownServiceProvider {
		/// URL that failed to match.
		url: String,
	},
}
