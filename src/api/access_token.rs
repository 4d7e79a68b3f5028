//! The credential resource: intent to hold a validated provider credential.

// self
use crate::{
	_prelude::*,
	api::{ObjectMeta, Permissions, impl_resource},
};

/// Lifecycle phase of an [`AccessToken`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccessTokenPhase {
	/// No secret record exists yet.
	#[default]
	AwaitingData,
	/// The secret was validated and metadata is available.
	Ready,
	/// The secret or the requested permissions were rejected.
	Invalid,
	/// The token cannot be processed as configured.
	Error,
}
impl AccessTokenPhase {
	/// Returns a stable label.
	pub const fn as_str(self) -> &'static str {
		match self {
			AccessTokenPhase::AwaitingData => "AwaitingData",
			AccessTokenPhase::Ready => "Ready",
			AccessTokenPhase::Invalid => "Invalid",
			AccessTokenPhase::Error => "Error",
		}
	}
}
impl Display for AccessTokenPhase {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Machine-readable reason accompanying the `Invalid` and `Error` phases.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccessTokenErrorReason {
	/// The provider rejected the credential while reading its metadata.
	MetadataFailure,
	/// The provider cannot grant some of the requested permissions.
	UnsupportedPermissions,
	/// No registered provider matches the token's service provider URL.
	UnknownServiceProvider,
}
impl AccessTokenErrorReason {
	/// Returns a stable label.
	pub const fn as_str(self) -> &'static str {
		match self {
			AccessTokenErrorReason::MetadataFailure => "MetadataFailure",
			AccessTokenErrorReason::UnsupportedPermissions => "UnsupportedPermissions",
			AccessTokenErrorReason::UnknownServiceProvider => "UnknownServiceProvider",
		}
	}
}
impl Display for AccessTokenErrorReason {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Provider-reported facts about a validated credential.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TokenMetadata {
	/// Provider user name owning the credential.
	pub username: String,
	/// Provider user identifier owning the credential.
	pub user_id: String,
	/// Scopes the provider reports for the credential.
	pub scopes: Vec<String>,
	/// Opaque provider bookkeeping.
	pub service_provider_state: Vec<u8>,
}

/// Desired state of an [`AccessToken`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AccessTokenSpec {
	/// URL selecting the service provider that validates the credential.
	pub service_provider_url: String,
	/// Permissions the credential must grant.
	pub permissions: Permissions,
}

/// Observed state of an [`AccessToken`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AccessTokenStatus {
	/// Current lifecycle phase.
	pub phase: AccessTokenPhase,
	/// Reason for the `Invalid`/`Error` phases.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error_reason: Option<AccessTokenErrorReason>,
	/// Human-readable failure description.
	#[serde(skip_serializing_if = "String::is_empty")]
	pub error_message: String,
	/// Where a user can supply the credential through the OAuth flow.
	#[serde(skip_serializing_if = "String::is_empty")]
	pub oauth_url: String,
	/// Provider metadata; present only in the `Ready` phase.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub token_metadata: Option<TokenMetadata>,
}
impl AccessTokenStatus {
	/// Status of a token without secret data.
	pub fn awaiting_data(oauth_url: impl Into<String>) -> Self {
		Self { oauth_url: oauth_url.into(), ..Default::default() }
	}

	/// Status of a validated token.
	pub fn ready(metadata: TokenMetadata) -> Self {
		Self {
			phase: AccessTokenPhase::Ready,
			token_metadata: Some(metadata),
			..Default::default()
		}
	}

	/// Status of a rejected token.
	pub fn invalid(reason: AccessTokenErrorReason, message: impl Into<String>) -> Self {
		Self {
			phase: AccessTokenPhase::Invalid,
			error_reason: Some(reason),
			error_message: message.into(),
			..Default::default()
		}
	}

	/// Status of a token that cannot be processed.
	pub fn error(reason: AccessTokenErrorReason, message: impl Into<String>) -> Self {
		Self {
			phase: AccessTokenPhase::Error,
			error_reason: Some(reason),
			error_message: message.into(),
			..Default::default()
		}
	}

	/// Checks the phase/reason/metadata invariants.
	pub fn is_consistent(&self) -> bool {
		match self.phase {
			AccessTokenPhase::AwaitingData =>
				self.error_reason.is_none() && self.token_metadata.is_none(),
			AccessTokenPhase::Ready => self.error_reason.is_none() && self.token_metadata.is_some(),
			AccessTokenPhase::Invalid | AccessTokenPhase::Error =>
				self.error_reason.is_some() && self.token_metadata.is_none(),
		}
	}
}

/// Namespaced record of intent to hold and validate a provider credential.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessToken {
	/// Object metadata.
	pub metadata: ObjectMeta,
	/// Desired state.
	pub spec: AccessTokenSpec,
	/// Observed state.
	pub status: AccessTokenStatus,
}
impl AccessToken {
	/// Creates a token resource for the provider URL with no permissions.
	pub fn new(metadata: ObjectMeta, service_provider_url: impl Into<String>) -> Self {
		Self {
			metadata,
			spec: AccessTokenSpec {
				service_provider_url: service_provider_url.into(),
				permissions: Permissions::default(),
			},
			status: AccessTokenStatus::default(),
		}
	}

	/// Replaces the requested permissions.
	pub fn with_permissions(mut self, permissions: Permissions) -> Self {
		self.spec.permissions = permissions;

		self
	}
}
impl_resource!(AccessToken, AccessTokenStatus, "AccessToken");
