//! Service provider failures and their classification into the operator error taxonomy.

// self
use crate::_prelude::*;

const RESPONSE_PREVIEW_LIMIT: usize = 256;

/// Error type produced by [`ServiceProvider`](crate::provider::ServiceProvider) implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum ServiceProviderError {
	/// The provider answered with a non-success status.
	#[error("Service provider responded with status {status_code}: {response}.")]
	Response {
		/// HTTP status code returned by the provider.
		status_code: u16,
		/// Provider response text, truncated for display.
		response: String,
	},
	/// The provider could not be reached.
	#[error("Service provider is unavailable: {message}.")]
	Unavailable {
		/// Human-readable error payload.
		message: String,
	},
}
impl ServiceProviderError {
	/// Builds a [`ServiceProviderError::Response`] with the body truncated to a short preview.
	pub fn response(status_code: u16, response: impl Into<String>) -> Self {
		Self::Response { status_code, response: truncate_preview(response.into()) }
	}

	/// Builds a [`ServiceProviderError::Unavailable`].
	pub fn unavailable(message: impl Into<String>) -> Self {
		Self::Unavailable { message: message.into() }
	}

	/// Returns the status code of a provider response, if any.
	pub fn status_code(&self) -> Option<u16> {
		match self {
			Self::Response { status_code, .. } => Some(*status_code),
			Self::Unavailable { .. } => None,
		}
	}

	/// Classifies the failure: authorization rejections are content errors, everything else is
	/// treated as transient infrastructure.
	pub fn kind(&self) -> ErrorKind {
		classify_status(self.status_code())
	}
}

fn classify_status(status: Option<u16>) -> ErrorKind {
	match status {
		Some(401 | 403) => ErrorKind::Content,
		_ => ErrorKind::Infrastructure,
	}
}

fn truncate_preview(body: String) -> String {
	if body.chars().count() <= RESPONSE_PREVIEW_LIMIT {
		return body;
	}

	let mut buf = body.chars().take(RESPONSE_PREVIEW_LIMIT).collect::<String>();

	buf.push('…');

	buf
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn authorization_failures_are_content() {
		assert_eq!(ServiceProviderError::response(401, "unauthorized").kind(), ErrorKind::Content);
		assert_eq!(ServiceProviderError::response(403, "forbidden").kind(), ErrorKind::Content);
		assert_eq!(
			ServiceProviderError::response(404, "not found").kind(),
			ErrorKind::Infrastructure
		);
		assert_eq!(ServiceProviderError::response(500, "boom").kind(), ErrorKind::Infrastructure);
		assert_eq!(ServiceProviderError::unavailable("dns").kind(), ErrorKind::Infrastructure);
	}

	#[test]
	fn long_responses_are_truncated() {
		let err = ServiceProviderError::response(401, "x".repeat(RESPONSE_PREVIEW_LIMIT * 2));

		match err {
			ServiceProviderError::Response { response, .. } => {
				assert_eq!(response.chars().count(), RESPONSE_PREVIEW_LIMIT + 1);
				assert!(response.ends_with('…'));
			},
			other => panic!("Unexpected error: {other:?}."),
		}
	}
}
