//! Fire-once trigger announcing that a token's secret record changed outside the controller.

// self
use crate::{
	_prelude::*,
	api::{ObjectKey, ObjectMeta, impl_resource},
};

/// Prefix used for generated trigger names.
pub const DATA_UPDATE_NAME_PREFIX: &str = "token-data-update-";

/// Desired state of an [`AccessTokenDataUpdate`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenDataUpdateSpec {
	/// Name of the access token whose secret record changed.
	pub token_name: String,
}

/// Ephemeral trigger consumed exactly once by the data-update reconciler.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenDataUpdate {
	/// Object metadata.
	#[serde(default)]
	pub metadata: ObjectMeta,
	/// Desired state.
	pub spec: AccessTokenDataUpdateSpec,
	#[serde(skip)]
	status: (),
}
impl AccessTokenDataUpdate {
	/// Creates a trigger for the token in `namespace` with a generated name.
	pub fn for_token(namespace: impl Into<String>, token_name: impl Into<String>) -> Self {
		Self {
			metadata: ObjectMeta::generated(namespace, DATA_UPDATE_NAME_PREFIX),
			spec: AccessTokenDataUpdateSpec { token_name: token_name.into() },
			status: (),
		}
	}

	/// Key of the access token named by the trigger.
	pub fn token_key(&self) -> ObjectKey {
		ObjectKey::new(&self.metadata.namespace, &self.spec.token_name)
	}
}
impl_resource!(AccessTokenDataUpdate, (), "AccessTokenDataUpdate");
