//! Token storage contracts: the bridge between access-token resources and the external secret
//! store holding their [`Token`] records.

pub mod memory;
pub mod notifying;

pub use memory::MemoryTokenStorage;
pub use notifying::NotifyingTokenStorage;

// self
use crate::{_prelude::*, api::AccessToken, token::Token};

/// Boxed future returned by [`TokenStorage`] operations.
pub type StorageFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StorageError>> + 'a + Send>>;

/// Secret-store contract addressed by access-token identity.
///
/// A missing record is `Ok(None)` from [`TokenStorage::get`], never an error; the access token
/// controller relies on that distinction to fall back to `AwaitingData`.
pub trait TokenStorage
where
	Self: Send + Sync,
{
	/// Creates or overwrites the record owned by `owner`.
	fn store<'a>(&'a self, owner: &'a AccessToken, token: Token) -> StorageFuture<'a, ()>;

	/// Fetches the record owned by `owner`, if present.
	fn get<'a>(&'a self, owner: &'a AccessToken) -> StorageFuture<'a, Option<Token>>;

	/// Removes the record owned by `owner`; removing a missing record succeeds.
	fn delete<'a>(&'a self, owner: &'a AccessToken) -> StorageFuture<'a, ()>;
}

/// Error type produced by [`TokenStorage`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StorageError {
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// Unique key identifying a stored token record.
///
/// The owner's uid is part of the key, so a token recreated under the same name never sees a
/// record written for its predecessor.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StorageKey {
	/// Namespace of the owning access token.
	pub namespace: String,
	/// Name of the owning access token.
	pub name: String,
	/// Uid of the owning access token.
	pub uid: String,
}
impl StorageKey {
	/// Builds the key for the provided owner.
	pub fn for_owner(owner: &AccessToken) -> Self {
		Self {
			namespace: owner.metadata.namespace.clone(),
			name: owner.metadata.name.clone(),
			uid: owner.metadata.uid.clone(),
		}
	}
}
impl Display for StorageKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "{}/{} ({})", self.namespace, self.name, self.uid)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::api::ObjectMeta;

	#[test]
	fn storage_error_exposes_source() {
		let storage_error = StorageError::Backend { message: "database unreachable".into() };
		let error: Error = storage_error.clone().into();
		let source = StdError::source(&error);

		// Transparent variants forward `source` to the inner error's own source.
		assert!(source.is_none());
		assert_eq!(error.to_string(), storage_error.to_string());
	}

	#[test]
	fn key_is_owner_identity() {
		let mut owner =
			AccessToken::new(ObjectMeta::named("team-a", "github"), "https://github.com");

		owner.metadata.uid = "6f1c".into();

		let key = StorageKey::for_owner(&owner);

		assert_eq!(
			key,
			StorageKey { namespace: "team-a".into(), name: "github".into(), uid: "6f1c".into() }
		);
		assert_eq!(key.to_string(), "team-a/github (6f1c)");
	}
}
