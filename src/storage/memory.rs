//! Thread-safe in-memory [`TokenStorage`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	api::AccessToken,
	storage::{StorageError, StorageFuture, StorageKey, TokenStorage},
	token::Token,
};

type StorageMap = Arc<RwLock<HashMap<StorageKey, Token>>>;

/// Thread-safe storage backend that keeps records in-process for tests and demos.
#[derive(Clone, Debug, Default)]
pub struct MemoryTokenStorage(StorageMap);
impl MemoryTokenStorage {
	/// Number of stored records.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns true when no records are stored.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}

	/// Returns true if a record exists for the key.
	pub fn contains(&self, key: &StorageKey) -> bool {
		self.0.read().contains_key(key)
	}

	fn store_now(map: StorageMap, key: StorageKey, token: Token) -> Result<(), StorageError> {
		map.write().insert(key, token);

		Ok(())
	}

	fn get_now(map: StorageMap, key: StorageKey) -> Option<Token> {
		map.read().get(&key).cloned()
	}

	fn delete_now(map: StorageMap, key: StorageKey) -> Result<(), StorageError> {
		map.write().remove(&key);

		Ok(())
	}
}
impl TokenStorage for MemoryTokenStorage {
	fn store<'a>(&'a self, owner: &'a AccessToken, token: Token) -> StorageFuture<'a, ()> {
		let map = self.0.clone();
		let key = StorageKey::for_owner(owner);

		Box::pin(async move { Self::store_now(map, key, token) })
	}

	fn get<'a>(&'a self, owner: &'a AccessToken) -> StorageFuture<'a, Option<Token>> {
		let map = self.0.clone();
		let key = StorageKey::for_owner(owner);

		Box::pin(async move { Ok(Self::get_now(map, key)) })
	}

	fn delete<'a>(&'a self, owner: &'a AccessToken) -> StorageFuture<'a, ()> {
		let map = self.0.clone();
		let key = StorageKey::for_owner(owner);

		Box::pin(async move { Self::delete_now(map, key) })
	}
}
