//! Cluster resource API contract and the in-memory implementation used for tests and demos.
//!
//! [`ObjectStore`] follows the usual control-plane semantics: optimistic concurrency through
//! `resource_version`, a separate status write path, finalizer-aware deletion, and a watch
//! stream of [`WatchEvent`]s that controllers turn into work-queue keys.

pub mod memory;

pub use memory::MemoryObjectStore;

// crates.io
use tokio::sync::broadcast;
// self
use crate::{
	_prelude::*,
	api::{
		AccessToken, AccessTokenBinding, AccessTokenDataUpdate, LabelSelector, ObjectKey, Resource,
	},
};

/// Boxed future returned by [`ObjectStore`] operations.
pub type ClusterFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ClusterError>> + 'a + Send>>;

/// Typed access to one resource kind.
pub trait ObjectStore<K>
where
	Self: Send + Sync,
	K: Resource,
{
	/// Fetches the object, if present.
	fn get<'a>(&'a self, key: &'a ObjectKey) -> ClusterFuture<'a, Option<K>>;

	/// Lists objects in `namespace` (all namespaces when `None`) matching `selector`.
	fn list<'a>(
		&'a self,
		namespace: Option<&'a str>,
		selector: &'a LabelSelector,
	) -> ClusterFuture<'a, Vec<K>>;

	/// Creates the object, generating a name from `generate_name` when `name` is empty.
	fn create(&self, object: K) -> ClusterFuture<'_, K>;

	/// Replaces metadata and spec; the stored status is preserved.
	fn update(&self, object: K) -> ClusterFuture<'_, K>;

	/// Replaces the status only.
	fn update_status(&self, object: K) -> ClusterFuture<'_, K>;

	/// Requests deletion; objects with finalizers are only marked.
	fn delete<'a>(&'a self, key: &'a ObjectKey) -> ClusterFuture<'a, ()>;

	/// Subscribes to change notifications.
	fn watch(&self) -> broadcast::Receiver<WatchEvent<K>>;
}

/// Change notification emitted by an [`ObjectStore`].
#[derive(Clone, Debug, PartialEq)]
pub enum WatchEvent<K> {
	/// The object was created or modified.
	Applied(K),
	/// The object was removed.
	Deleted(K),
}
impl<K> WatchEvent<K>
where
	K: Resource,
{
	/// The object carried by the event.
	pub fn object(&self) -> &K {
		match self {
			WatchEvent::Applied(object) | WatchEvent::Deleted(object) => object,
		}
	}
}

/// Error type produced by [`ObjectStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ClusterError {
	/// The object does not exist.
	#[error("{kind} {key} was not found.")]
	NotFound {
		/// Resource kind.
		kind: &'static str,
		/// Object key.
		key: String,
	},
	/// An object with the same name already exists.
	#[error("{kind} {key} already exists.")]
	AlreadyExists {
		/// Resource kind.
		kind: &'static str,
		/// Object key.
		key: String,
	},
	/// The write was based on a stale resource version.
	#[error("{kind} {key} was modified concurrently; expected version {expected}, found {actual}.")]
	Conflict {
		/// Resource kind.
		kind: &'static str,
		/// Object key.
		key: String,
		/// Version the writer held.
		expected: u64,
		/// Version currently stored.
		actual: u64,
	},
	/// The object is malformed.
	#[error("{kind} is invalid: {message}.")]
	Invalid {
		/// Resource kind.
		kind: &'static str,
		/// Human-readable payload.
		message: String,
	},
	/// The cluster API cannot be reached.
	#[error("Cluster API is unavailable: {message}.")]
	Unavailable {
		/// Human-readable payload.
		message: String,
	},
}
impl ClusterError {
	/// Returns true for [`ClusterError::NotFound`].
	pub fn is_not_found(&self) -> bool {
		matches!(self, ClusterError::NotFound { .. })
	}

	/// Returns true for [`ClusterError::Conflict`].
	pub fn is_conflict(&self) -> bool {
		matches!(self, ClusterError::Conflict { .. })
	}
}

/// Handles to every resource kind the operator works with.
#[derive(Clone)]
pub struct Cluster {
	/// Credential resources.
	pub access_tokens: Arc<dyn ObjectStore<AccessToken>>,
	/// Usage bindings.
	pub bindings: Arc<dyn ObjectStore<AccessTokenBinding>>,
	/// Storage-change triggers.
	pub data_updates: Arc<dyn ObjectStore<AccessTokenDataUpdate>>,
}
impl Cluster {
	/// Builds a cluster backed by fresh in-memory stores.
	pub fn in_memory() -> Self {
		Self {
			access_tokens: Arc::new(MemoryObjectStore::<AccessToken>::default()),
			bindings: Arc::new(MemoryObjectStore::<AccessTokenBinding>::default()),
			data_updates: Arc::new(MemoryObjectStore::<AccessTokenDataUpdate>::default()),
		}
	}
}
impl Debug for Cluster {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("Cluster(..)")
	}
}
