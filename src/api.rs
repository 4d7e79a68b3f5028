//! Cluster resource model: metadata, the credential resource, usage bindings, and storage-change
//! triggers.

pub mod access_token;
pub mod binding;
pub mod data_update;
pub mod meta;
pub mod permission;

pub use access_token::*;
pub use binding::*;
pub use data_update::*;
pub use meta::*;
pub use permission::*;

// self
use crate::_prelude::*;

/// Finalizer blocking deletion while usage bindings still reference the token.
pub const LINKED_BINDINGS_FINALIZER: &str = "tokens.operator.dev/linked-bindings";
/// Finalizer blocking deletion until the secret record was removed from storage.
pub const TOKEN_STORAGE_FINALIZER: &str = "tokens.operator.dev/token-storage";
/// Binding label carrying the name of the resolved access token.
pub const LINKED_ACCESS_TOKEN_LABEL: &str = "tokens.operator.dev/linked-access-token";

/// Namespaced cluster object with metadata and a status subresource.
pub trait Resource
where
	Self: 'static + Clone + Debug + Send + Sync + Serialize + DeserializeOwned,
{
	/// Status subresource type.
	type Status: 'static + Clone + Debug + Default + PartialEq + Send + Sync;

	/// Kind label used in errors and logs.
	const KIND: &'static str;

	/// Object metadata.
	fn meta(&self) -> &ObjectMeta;

	/// Mutable object metadata.
	fn meta_mut(&mut self) -> &mut ObjectMeta;

	/// Status subresource.
	fn status(&self) -> &Self::Status;

	/// Mutable status subresource.
	fn status_mut(&mut self) -> &mut Self::Status;

	/// Namespace/name key addressing the object.
	fn key(&self) -> ObjectKey {
		self.meta().key()
	}

	/// Returns true once deletion has been requested.
	fn is_deleting(&self) -> bool {
		self.meta().deletion_timestamp.is_some()
	}
}

macro_rules! impl_resource {
	($ty:ty, $status:ty, $kind:literal) => {
		impl $crate::api::Resource for $ty {
			type Status = $status;

			const KIND: &'static str = $kind;

			fn meta(&self) -> &$crate::api::ObjectMeta {
				&self.metadata
			}

			fn meta_mut(&mut self) -> &mut $crate::api::ObjectMeta {
				&mut self.metadata
			}

			fn status(&self) -> &Self::Status {
				&self.status
			}

			fn status_mut(&mut self) -> &mut Self::Status {
				&mut self.status
			}
		}
	};
}
pub(crate) use impl_resource;
