#![allow(dead_code)]

// std
use std::{
	future::{self, Future},
	sync::{
		Arc,
		atomic::{AtomicBool, Ordering},
	},
	time::{Duration as StdDuration, Instant},
};
// self
use access_token_operator::{
	api::{
		AccessToken, AccessTokenBinding, LINKED_ACCESS_TOKEN_LABEL, ObjectKey, ObjectMeta,
		Permission, PermissionArea, PermissionType, Permissions, TokenMetadata,
	},
	cluster::{Cluster, ObjectStore},
	provider::{
		ProviderFuture, ServiceProvider, ServiceProviderError, ServiceProviderRegistry,
		ServiceProviderType, ValidationResult,
	},
	storage::{MemoryTokenStorage, StorageError, StorageFuture, TokenStorage},
	token::Token,
};

pub const NAMESPACE: &str = "default";
pub const GITHUB_URL: &str = "https://github.com";
pub const REPO_URL: &str = "https://github.com/hack-ink/operator";

type ValidateFn =
	dyn Fn(&Token, &Permissions) -> Result<ValidationResult, ServiceProviderError> + Send + Sync;
type LookupFn = dyn Fn(&AccessTokenBinding) -> Result<Option<AccessToken>, ServiceProviderError>
	+ Send
	+ Sync;
type PersistFn =
	dyn Fn(&AccessToken, &Token) -> Result<TokenMetadata, ServiceProviderError> + Send + Sync;

/// Provider double whose operations are chosen when the test builds it.
pub struct StubServiceProvider {
	provider_type: ServiceProviderType,
	base_url: String,
	validate: Box<ValidateFn>,
	lookup: Box<LookupFn>,
	persist: Box<PersistFn>,
}
impl StubServiceProvider {
	/// Accepts every credential, never finds existing tokens and reports empty metadata.
	pub fn github() -> Self {
		Self {
			provider_type: ServiceProviderType::new("github")
				.expect("Stub provider type should be valid."),
			base_url: GITHUB_URL.into(),
			validate: Box::new(|_, _| Ok(ValidationResult::valid())),
			lookup: Box::new(|_| Ok(None)),
			persist: Box::new(|_, _| Ok(TokenMetadata::default())),
		}
	}

	pub fn on_validate<F>(mut self, f: F) -> Self
	where
		F: 'static
			+ Send
			+ Sync
			+ Fn(&Token, &Permissions) -> Result<ValidationResult, ServiceProviderError>,
	{
		self.validate = Box::new(f);

		self
	}

	pub fn on_lookup<F>(mut self, f: F) -> Self
	where
		F: 'static
			+ Send
			+ Sync
			+ Fn(&AccessTokenBinding) -> Result<Option<AccessToken>, ServiceProviderError>,
	{
		self.lookup = Box::new(f);

		self
	}

	pub fn on_persist_metadata<F>(mut self, f: F) -> Self
	where
		F: 'static
			+ Send
			+ Sync
			+ Fn(&AccessToken, &Token) -> Result<TokenMetadata, ServiceProviderError>,
	{
		self.persist = Box::new(f);

		self
	}

	pub fn into_registry(self) -> ServiceProviderRegistry {
		ServiceProviderRegistry::new().with_provider(Arc::new(self))
	}
}
impl ServiceProvider for StubServiceProvider {
	fn provider_type(&self) -> &ServiceProviderType {
		&self.provider_type
	}

	fn base_url(&self) -> &str {
		&self.base_url
	}

	fn translate_to_scopes(&self, permission: &Permission) -> Vec<String> {
		let area = match permission.area {
			PermissionArea::Repository => "repo",
			PermissionArea::User => "read:user",
			_ => "read:org",
		};

		vec![area.to_owned()]
	}

	fn validate<'a>(
		&'a self,
		token: &'a Token,
		permissions: &'a Permissions,
	) -> ProviderFuture<'a, ValidationResult> {
		Box::pin(future::ready((self.validate)(token, permissions)))
	}

	fn lookup_token<'a>(
		&'a self,
		binding: &'a AccessTokenBinding,
	) -> ProviderFuture<'a, Option<AccessToken>> {
		Box::pin(future::ready((self.lookup)(binding)))
	}

	fn persist_metadata<'a>(
		&'a self,
		owner: &'a AccessToken,
		token: &'a Token,
	) -> ProviderFuture<'a, TokenMetadata> {
		Box::pin(future::ready((self.persist)(owner, token)))
	}
}

/// In-memory storage whose deletes can be switched to fail.
#[derive(Clone, Debug, Default)]
pub struct FlakyTokenStorage {
	pub inner: MemoryTokenStorage,
	fail_deletes: Arc<AtomicBool>,
}
impl FlakyTokenStorage {
	pub fn fail_deletes(&self, fail: bool) {
		self.fail_deletes.store(fail, Ordering::SeqCst);
	}
}
impl TokenStorage for FlakyTokenStorage {
	fn store<'a>(&'a self, owner: &'a AccessToken, token: Token) -> StorageFuture<'a, ()> {
		self.inner.store(owner, token)
	}

	fn get<'a>(&'a self, owner: &'a AccessToken) -> StorageFuture<'a, Option<Token>> {
		self.inner.get(owner)
	}

	fn delete<'a>(&'a self, owner: &'a AccessToken) -> StorageFuture<'a, ()> {
		if self.fail_deletes.load(Ordering::SeqCst) {
			return Box::pin(future::ready(Err(StorageError::Backend {
				message: "secret store is read-only".into(),
			})));
		}

		self.inner.delete(owner)
	}
}

pub fn permissions() -> Permissions {
	Permissions::default().require(PermissionType::ReadWrite, PermissionArea::Repository)
}

pub fn key(name: &str) -> ObjectKey {
	ObjectKey::new(NAMESPACE, name)
}

pub fn github_token(name: &str) -> AccessToken {
	AccessToken::new(ObjectMeta::named(NAMESPACE, name), GITHUB_URL).with_permissions(permissions())
}

pub fn binding(name: &str) -> AccessTokenBinding {
	AccessTokenBinding::new(ObjectMeta::named(NAMESPACE, name), REPO_URL, permissions())
}

pub fn linked_binding(name: &str, token_name: &str) -> AccessTokenBinding {
	let mut binding = binding(name);

	binding.metadata.labels.insert(LINKED_ACCESS_TOKEN_LABEL.into(), token_name.into());

	binding
}

pub async fn create_token(cluster: &Cluster, name: &str) -> AccessToken {
	cluster
		.access_tokens
		.create(github_token(name))
		.await
		.expect("Access token fixture should be created.")
}

pub async fn fetch_token(cluster: &Cluster, name: &str) -> Option<AccessToken> {
	cluster.access_tokens.get(&key(name)).await.expect("Access token lookup should succeed.")
}

pub async fn fetch_binding(cluster: &Cluster, name: &str) -> Option<AccessTokenBinding> {
	cluster.bindings.get(&key(name)).await.expect("Binding lookup should succeed.")
}

/// Polls `check` until it yields a value or ten seconds pass.
pub async fn eventually<T, F, Fut>(what: &str, mut check: F) -> T
where
	F: FnMut() -> Fut,
	Fut: Future<Output = Option<T>>,
{
	let deadline = Instant::now() + StdDuration::from_secs(10);

	loop {
		if let Some(value) = check().await {
			return value;
		}

		assert!(Instant::now() < deadline, "Timed out waiting for {what}.");

		tokio::time::sleep(StdDuration::from_millis(20)).await;
	}
}
