//! Usage bindings: a workload's request for a credential matching a repository URL.

// self
use crate::{
	_prelude::*,
	api::{LINKED_ACCESS_TOKEN_LABEL, ObjectMeta, Permissions, impl_resource},
};

/// Lifecycle phase of an [`AccessTokenBinding`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccessTokenBindingPhase {
	/// Linked token has no validated data yet.
	#[default]
	AwaitingTokenData,
	/// Linked token is ready for use.
	Ready,
	/// The binding cannot be resolved.
	Error,
}

/// Machine-readable reason accompanying the `Error` binding phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccessTokenBindingErrorReason {
	/// No registered provider matches the repository URL.
	UnknownServiceProvider,
	/// The provider refused to look up a matching token.
	TokenLookupFailed,
}

/// Desired state of an [`AccessTokenBinding`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AccessTokenBindingSpec {
	/// Repository the workload needs access to.
	pub repo_url: String,
	/// Permissions the workload needs.
	pub permissions: Permissions,
}

/// Observed state of an [`AccessTokenBinding`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AccessTokenBindingStatus {
	/// Current phase.
	pub phase: AccessTokenBindingPhase,
	/// Reason for the `Error` phase.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error_reason: Option<AccessTokenBindingErrorReason>,
	/// Human-readable failure description.
	#[serde(skip_serializing_if = "String::is_empty")]
	pub error_message: String,
	/// Name of the resolved access token.
	#[serde(skip_serializing_if = "String::is_empty")]
	pub linked_access_token_name: String,
}

/// Workload-facing request that resolves to exactly one access token.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessTokenBinding {
	/// Object metadata.
	pub metadata: ObjectMeta,
	/// Desired state.
	pub spec: AccessTokenBindingSpec,
	/// Observed state.
	pub status: AccessTokenBindingStatus,
}
impl AccessTokenBinding {
	/// Creates a binding for the repository URL.
	pub fn new(
		metadata: ObjectMeta,
		repo_url: impl Into<String>,
		permissions: Permissions,
	) -> Self {
		Self {
			metadata,
			spec: AccessTokenBindingSpec { repo_url: repo_url.into(), permissions },
			status: AccessTokenBindingStatus::default(),
		}
	}

	/// Name of the linked access token, read from the link label.
	pub fn linked_token_name(&self) -> Option<&str> {
		self.metadata.label(LINKED_ACCESS_TOKEN_LABEL).filter(|name| !name.is_empty())
	}
}
impl_resource!(AccessTokenBinding, AccessTokenBindingStatus, "AccessTokenBinding");
