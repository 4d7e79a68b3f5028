//! [`TokenStorage`] decorator for writers outside the controller.
//!
//! Writes made directly against the secret store are invisible to the controller's watches. This
//! wrapper announces every successful write by creating an [`AccessTokenDataUpdate`] naming the
//! owner, which the data-update reconciler turns into a reconcile of that token.

// self
use crate::{
	_prelude::*,
	api::{AccessToken, AccessTokenDataUpdate, Resource},
	cluster::ObjectStore,
	storage::{StorageError, StorageFuture, TokenStorage},
	token::Token,
};

/// Storage wrapper that emits a storage-change trigger after each successful write.
#[derive(Clone)]
pub struct NotifyingTokenStorage {
	inner: Arc<dyn TokenStorage>,
	triggers: Arc<dyn ObjectStore<AccessTokenDataUpdate>>,
}
impl NotifyingTokenStorage {
	/// Wraps `inner`, publishing triggers into `triggers`.
	pub fn new(
		inner: Arc<dyn TokenStorage>,
		triggers: Arc<dyn ObjectStore<AccessTokenDataUpdate>>,
	) -> Self {
		Self { inner, triggers }
	}

	async fn notify(&self, owner: &AccessToken) -> Result<(), StorageError> {
		let trigger =
			AccessTokenDataUpdate::for_token(&owner.metadata.namespace, &owner.metadata.name);

		match self.triggers.create(trigger).await {
			Ok(created) => {
				tracing::debug!(
					token = %owner.key(),
					trigger = %created.metadata.name,
					"Announced token storage change."
				);

				Ok(())
			},
			Err(e) => Err(StorageError::Backend {
				message: format!(
					"token data for {} changed but the update trigger failed: {e}",
					owner.key()
				),
			}),
		}
	}
}
impl TokenStorage for NotifyingTokenStorage {
	fn store<'a>(&'a self, owner: &'a AccessToken, token: Token) -> StorageFuture<'a, ()> {
		Box::pin(async move {
			self.inner.store(owner, token).await?;
			self.notify(owner).await
		})
	}

	fn get<'a>(&'a self, owner: &'a AccessToken) -> StorageFuture<'a, Option<Token>> {
		self.inner.get(owner)
	}

	fn delete<'a>(&'a self, owner: &'a AccessToken) -> StorageFuture<'a, ()> {
		Box::pin(async move {
			self.inner.delete(owner).await?;
			self.notify(owner).await
		})
	}
}
impl Debug for NotifyingTokenStorage {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("NotifyingTokenStorage(..)")
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{
		api::{DATA_UPDATE_NAME_PREFIX, LabelSelector, ObjectMeta},
		cluster::MemoryObjectStore,
		storage::MemoryTokenStorage,
	};

	#[tokio::test]
	async fn writes_create_triggers_naming_the_owner() {
		let backend = MemoryTokenStorage::default();
		let triggers = MemoryObjectStore::<AccessTokenDataUpdate>::new();
		let storage =
			NotifyingTokenStorage::new(Arc::new(backend.clone()), Arc::new(triggers.clone()));
		let owner = AccessToken::new(ObjectMeta::named("team-a", "github"), "https://github.com");

		storage.store(&owner, Token::new("ghp_1")).await.expect("Store should succeed.");
		storage.delete(&owner).await.expect("Delete should succeed.");

		let created = triggers
			.list(Some("team-a"), &LabelSelector::everything())
			.await
			.expect("Listing triggers should succeed.");

		assert_eq!(created.len(), 2);
		assert!(created.iter().all(|t| t.spec.token_name == "github"));
		assert!(created.iter().all(|t| t.metadata.name.starts_with(DATA_UPDATE_NAME_PREFIX)));
		assert!(backend.is_empty());
	}

	#[tokio::test]
	async fn reads_do_not_notify() {
		let triggers = MemoryObjectStore::<AccessTokenDataUpdate>::new();
		let storage = NotifyingTokenStorage::new(
			Arc::new(MemoryTokenStorage::default()),
			Arc::new(triggers.clone()),
		);
		let owner = AccessToken::new(ObjectMeta::named("team-a", "github"), "https://github.com");

		assert_eq!(storage.get(&owner).await, Ok(None));
		assert!(triggers.is_empty());
	}
}
