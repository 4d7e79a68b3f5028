mod common;

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use url::Url;
// self
use access_token_operator::{
	api::{
		AccessTokenErrorReason, AccessTokenPhase, LINKED_BINDINGS_FINALIZER, PermissionArea,
		PermissionType, Permissions, TOKEN_STORAGE_FINALIZER, TokenMetadata,
	},
	cluster::{Cluster, ObjectStore},
	controller::AccessTokenReconciler,
	error::ErrorKind,
	oauth::{OAuthUrlBuilder, StateCodec},
	provider::{ServiceProviderError, ValidationResult},
	runtime::Reconciler,
	storage::{MemoryTokenStorage, StorageKey, TokenStorage},
	token::Token,
};
use common::*;

fn reconciler(
	cluster: &Cluster,
	storage: Arc<dyn TokenStorage>,
	provider: StubServiceProvider,
) -> AccessTokenReconciler {
	AccessTokenReconciler::new(cluster, storage, provider.into_registry())
}

fn alois() -> TokenMetadata {
	TokenMetadata { username: "alois".into(), user_id: "42".into(), ..Default::default() }
}

#[tokio::test]
async fn new_token_awaits_data_with_both_finalizers() -> Result<()> {
	let cluster = Cluster::in_memory();
	let reconciler = reconciler(
		&cluster,
		Arc::new(MemoryTokenStorage::default()),
		StubServiceProvider::github(),
	);

	create_token(&cluster, "fresh").await;
	reconciler.reconcile(&key("fresh")).await?;

	let token = fetch_token(&cluster, "fresh").await.expect("Token should exist.");

	assert_eq!(token.status.phase, AccessTokenPhase::AwaitingData);
	assert!(token.status.token_metadata.is_none());
	assert!(token.status.error_reason.is_none());
	assert!(token.metadata.has_finalizer(LINKED_BINDINGS_FINALIZER));
	assert!(token.metadata.has_finalizer(TOKEN_STORAGE_FINALIZER));
	assert!(token.status.oauth_url.is_empty());

	// A second pass over unchanged inputs writes nothing.
	let version = token.metadata.resource_version;

	reconciler.reconcile(&key("fresh")).await?;

	assert_eq!(
		fetch_token(&cluster, "fresh").await.map(|t| t.metadata.resource_version),
		Some(version)
	);

	Ok(())
}

#[tokio::test]
async fn stored_data_makes_the_token_ready_until_it_disappears() -> Result<()> {
	let cluster = Cluster::in_memory();
	let storage = MemoryTokenStorage::default();
	let reconciler = reconciler(
		&cluster,
		Arc::new(storage.clone()),
		StubServiceProvider::github().on_persist_metadata(|_, _| Ok(alois())),
	);
	let token = create_token(&cluster, "github").await;

	storage.store(&token, Token::new("gho_secret").with_username("alois")).await?;
	reconciler.reconcile(&key("github")).await?;

	let ready = fetch_token(&cluster, "github").await.expect("Token should exist.");

	assert_eq!(ready.status.phase, AccessTokenPhase::Ready);
	assert!(ready.status.error_reason.is_none());
	assert!(ready.status.error_message.is_empty());
	assert_eq!(ready.status.token_metadata, Some(alois()));

	storage.delete(&token).await?;
	reconciler.reconcile(&key("github")).await?;

	let reverted = fetch_token(&cluster, "github").await.expect("Token should exist.");

	assert_eq!(reverted.status.phase, AccessTokenPhase::AwaitingData);
	assert!(reverted.status.token_metadata.is_none());

	Ok(())
}

#[tokio::test]
async fn rejected_credentials_are_invalid() -> Result<()> {
	let cluster = Cluster::in_memory();
	let storage = MemoryTokenStorage::default();
	let unauthorized = reconciler(
		&cluster,
		Arc::new(storage.clone()),
		StubServiceProvider::github().on_persist_metadata(|_, _| {
			Err(ServiceProviderError::response(401, r#"{"message":"Bad credentials"}"#))
		}),
	);
	let token = create_token(&cluster, "revoked").await;

	storage.store(&token, Token::new("gho_revoked")).await?;
	unauthorized.reconcile(&key("revoked")).await?;

	let revoked = fetch_token(&cluster, "revoked").await.expect("Token should exist.");

	assert_eq!(revoked.status.phase, AccessTokenPhase::Invalid);
	assert_eq!(revoked.status.error_reason, Some(AccessTokenErrorReason::MetadataFailure));
	assert!(!revoked.status.error_message.is_empty());
	assert!(revoked.status.token_metadata.is_none());

	let under_scoped = reconciler(
		&cluster,
		Arc::new(storage.clone()),
		StubServiceProvider::github()
			.on_validate(|_, _| Ok(ValidationResult::rejected(["token lacks the repo scope"]))),
	);
	let token = create_token(&cluster, "narrow").await;

	storage.store(&token, Token::new("gho_narrow")).await?;
	under_scoped.reconcile(&key("narrow")).await?;

	let narrow = fetch_token(&cluster, "narrow").await.expect("Token should exist.");

	assert_eq!(narrow.status.phase, AccessTokenPhase::Invalid);
	assert_eq!(narrow.status.error_reason, Some(AccessTokenErrorReason::UnsupportedPermissions));
	assert_eq!(narrow.status.error_message, "token lacks the repo scope");

	Ok(())
}

#[tokio::test]
async fn unknown_provider_urls_are_errors() -> Result<()> {
	let cluster = Cluster::in_memory();
	let reconciler = reconciler(
		&cluster,
		Arc::new(MemoryTokenStorage::default()),
		StubServiceProvider::github(),
	);
	let mut token = github_token("elsewhere");

	token.spec.service_provider_url = "https://gitlab.example.com".into();
	cluster.access_tokens.create(token).await?;
	reconciler.reconcile(&key("elsewhere")).await?;

	let token = fetch_token(&cluster, "elsewhere").await.expect("Token should exist.");

	assert_eq!(token.status.phase, AccessTokenPhase::Error);
	assert_eq!(token.status.error_reason, Some(AccessTokenErrorReason::UnknownServiceProvider));
	assert!(token.status.error_message.contains("gitlab.example.com"));

	Ok(())
}

#[tokio::test]
async fn provider_outages_fail_the_pass_without_touching_status() -> Result<()> {
	let cluster = Cluster::in_memory();
	let storage = MemoryTokenStorage::default();
	let reconciler = reconciler(
		&cluster,
		Arc::new(storage.clone()),
		StubServiceProvider::github()
			.on_persist_metadata(|_, _| Err(ServiceProviderError::unavailable("connection reset"))),
	);
	let token = create_token(&cluster, "outage").await;

	storage.store(&token, Token::new("gho_outage")).await?;

	let err = reconciler.reconcile(&key("outage")).await.expect_err("Outage should fail the pass.");

	assert_eq!(err.kind(), ErrorKind::Infrastructure);

	let token = fetch_token(&cluster, "outage").await.expect("Token should exist.");

	assert_eq!(token.status.phase, AccessTokenPhase::AwaitingData);
	assert!(token.status.error_message.is_empty());

	Ok(())
}

#[tokio::test]
async fn validation_outages_fail_the_pass_without_touching_status() -> Result<()> {
	let cluster = Cluster::in_memory();
	let storage = MemoryTokenStorage::default();
	let reconciler = reconciler(
		&cluster,
		Arc::new(storage.clone()),
		StubServiceProvider::github()
			.on_validate(|_, _| Err(ServiceProviderError::unavailable("scope endpoint down"))),
	);
	let token = create_token(&cluster, "unchecked").await;

	reconciler.reconcile(&key("unchecked")).await?;
	storage.store(&token, Token::new("gho_unchecked")).await?;

	let before = fetch_token(&cluster, "unchecked").await.expect("Token should exist.");
	let err =
		reconciler.reconcile(&key("unchecked")).await.expect_err("Outage should fail the pass.");

	assert_eq!(err.kind(), ErrorKind::Infrastructure);

	let after = fetch_token(&cluster, "unchecked").await.expect("Token should exist.");

	assert_eq!(after.status, before.status);
	assert_eq!(after.metadata.resource_version, before.metadata.resource_version);

	Ok(())
}

#[tokio::test]
async fn awaiting_tokens_carry_a_stable_oauth_url() -> Result<()> {
	let cluster = Cluster::in_memory();
	let codec = StateCodec::new(&[9_u8; 32])?;
	let builder = OAuthUrlBuilder::new(&Url::parse("https://oauth.example.com/")?, codec.clone());
	let reconciler = reconciler(
		&cluster,
		Arc::new(MemoryTokenStorage::default()),
		StubServiceProvider::github(),
	)
	.with_oauth(Some(builder));

	create_token(&cluster, "linked").await;
	reconciler.reconcile(&key("linked")).await?;

	let first =
		fetch_token(&cluster, "linked").await.expect("Token should exist.").status.oauth_url;
	let state = first
		.strip_prefix("https://oauth.example.com/github/authenticate?state=")
		.expect("OAuth URL should point at the provider's authenticate endpoint.");
	let decoded = codec.parse_anonymous(state)?;

	assert_eq!(decoded.token_name, "linked");
	assert_eq!(decoded.token_namespace, NAMESPACE);
	assert_eq!(decoded.scopes, vec!["repo".to_string()]);
	assert_eq!(decoded.service_provider_url, GITHUB_URL);

	reconciler.reconcile(&key("linked")).await?;

	let second =
		fetch_token(&cluster, "linked").await.expect("Token should exist.").status.oauth_url;

	assert_eq!(first, second);

	Ok(())
}

#[tokio::test]
async fn oauth_url_follows_permission_changes() -> Result<()> {
	let cluster = Cluster::in_memory();
	let codec = StateCodec::new(&[9_u8; 32])?;
	let builder = OAuthUrlBuilder::new(&Url::parse("https://oauth.example.com/")?, codec.clone());
	let reconciler = reconciler(
		&cluster,
		Arc::new(MemoryTokenStorage::default()),
		StubServiceProvider::github(),
	)
	.with_oauth(Some(builder.clone()));

	create_token(&cluster, "widened").await;
	reconciler.reconcile(&key("widened")).await?;

	let mut token = fetch_token(&cluster, "widened").await.expect("Token should exist.");
	let before = builder.published_state(&token.status.oauth_url).expect("State should decode.");

	assert_eq!(before.scopes, vec!["repo".to_string()]);

	token.spec.permissions =
		Permissions::default().require(PermissionType::Read, PermissionArea::User);
	cluster.access_tokens.update(token).await?;
	reconciler.reconcile(&key("widened")).await?;

	let token = fetch_token(&cluster, "widened").await.expect("Token should exist.");
	let after = builder.published_state(&token.status.oauth_url).expect("State should decode.");

	assert_eq!(token.status.phase, AccessTokenPhase::AwaitingData);
	assert_eq!(after.scopes, vec!["read:user".to_string()]);
	assert_eq!(after.token_name, "widened");

	Ok(())
}

#[tokio::test]
async fn deletion_waits_for_linked_bindings() -> Result<()> {
	let cluster = Cluster::in_memory();
	let storage = MemoryTokenStorage::default();
	let reconciler =
		reconciler(&cluster, Arc::new(storage.clone()), StubServiceProvider::github());
	let token = create_token(&cluster, "shared").await;

	reconciler.reconcile(&key("shared")).await?;
	storage.store(&token, Token::new("gho_shared")).await?;
	cluster.bindings.create(linked_binding("workload", "shared")).await?;
	cluster.access_tokens.delete(&key("shared")).await?;

	let action = reconciler.reconcile(&key("shared")).await?;

	assert!(action.requeue_after.is_some(), "Blocked deletion should be re-checked.");

	let blocked = fetch_token(&cluster, "shared").await.expect("Token should still exist.");

	assert!(blocked.metadata.deletion_timestamp.is_some());
	assert!(blocked.metadata.has_finalizer(LINKED_BINDINGS_FINALIZER));
	assert!(!blocked.metadata.has_finalizer(TOKEN_STORAGE_FINALIZER));
	assert!(!storage.contains(&StorageKey::for_owner(&token)));

	cluster.bindings.delete(&key("workload")).await?;
	reconciler.reconcile(&key("shared")).await?;

	assert!(fetch_token(&cluster, "shared").await.is_none());

	Ok(())
}

#[tokio::test]
async fn failed_secret_cleanup_keeps_the_storage_finalizer() -> Result<()> {
	let cluster = Cluster::in_memory();
	let storage = FlakyTokenStorage::default();
	let reconciler =
		reconciler(&cluster, Arc::new(storage.clone()), StubServiceProvider::github());
	let token = create_token(&cluster, "sticky").await;

	reconciler.reconcile(&key("sticky")).await?;
	storage.store(&token, Token::new("gho_sticky")).await?;
	storage.fail_deletes(true);
	cluster.access_tokens.delete(&key("sticky")).await?;

	let err = reconciler.reconcile(&key("sticky")).await.expect_err("Cleanup should fail.");

	assert_eq!(err.kind(), ErrorKind::Infrastructure);

	let stuck = fetch_token(&cluster, "sticky").await.expect("Token should still exist.");

	assert_eq!(stuck.metadata.finalizers, vec![TOKEN_STORAGE_FINALIZER.to_string()]);
	assert!(storage.inner.contains(&StorageKey::for_owner(&token)));

	storage.fail_deletes(false);
	reconciler.reconcile(&key("sticky")).await?;

	assert!(fetch_token(&cluster, "sticky").await.is_none());
	assert!(storage.inner.is_empty());

	Ok(())
}
