//! Access token phase state machine.
//!
//! Every pass recomputes the status from the current spec, the current secret record and the
//! current provider answer, then writes it in one call if it changed. Nothing is carried over
//! from earlier passes, so a token whose secret disappears falls back to `AwaitingData` on its
//! own and repeated passes over unchanged inputs are no-ops.
//!
//! Deletion is held back by two finalizers that are evaluated independently on every pass:
//! [`LINKED_BINDINGS_FINALIZER`] stays while any binding still carries the token's link label,
//! and [`TOKEN_STORAGE_FINALIZER`] stays until the secret record was deleted from storage.

// std
use std::time::Duration as StdDuration;
// self
use crate::{
	_prelude::*,
	api::{
		AccessToken, AccessTokenBinding, AccessTokenErrorReason, AccessTokenPhase,
		AccessTokenStatus, LINKED_BINDINGS_FINALIZER, ObjectKey, Resource, TOKEN_STORAGE_FINALIZER,
	},
	cluster::{Cluster, ObjectStore},
	controller,
	oauth::{AnonymousOAuthState, OAuthUrlBuilder},
	obs::ControllerKind,
	provider::{ServiceProvider, ServiceProviderRegistry},
	runtime::{Action, ReconcileFuture, Reconciler},
	storage::TokenStorage,
};

const DEFAULT_LINKED_BINDINGS_RECHECK: StdDuration = StdDuration::from_secs(5);

/// Reconciler for [`AccessToken`] resources.
pub struct AccessTokenReconciler {
	tokens: Arc<dyn ObjectStore<AccessToken>>,
	bindings: Arc<dyn ObjectStore<AccessTokenBinding>>,
	storage: Arc<dyn TokenStorage>,
	providers: ServiceProviderRegistry,
	oauth: Option<OAuthUrlBuilder>,
	linked_bindings_recheck: StdDuration,
}
impl AccessTokenReconciler {
	/// Creates a reconciler over the cluster's tokens and bindings.
	pub fn new(
		cluster: &Cluster,
		storage: Arc<dyn TokenStorage>,
		providers: ServiceProviderRegistry,
	) -> Self {
		Self {
			tokens: cluster.access_tokens.clone(),
			bindings: cluster.bindings.clone(),
			storage,
			providers,
			oauth: None,
			linked_bindings_recheck: DEFAULT_LINKED_BINDINGS_RECHECK,
		}
	}

	/// Publishes OAuth links on tokens awaiting data.
	pub fn with_oauth(mut self, oauth: Option<OAuthUrlBuilder>) -> Self {
		self.oauth = oauth;

		self
	}

	/// Sets how often a deletion blocked by linked bindings is re-checked.
	pub fn with_linked_bindings_recheck(mut self, interval: StdDuration) -> Self {
		self.linked_bindings_recheck = interval;

		self
	}

	async fn reconcile_token(&self, key: &ObjectKey) -> Result<Action> {
		let Some(mut token) = self.tokens.get(key).await? else {
			tracing::debug!("Access token is gone.");

			return Ok(Action::await_change());
		};

		if token.is_deleting() {
			return self.finalize(token).await;
		}

		let meta = &mut token.metadata;

		// A token that already carries one guard is left as-is; only first-seen tokens get both.
		if !meta.has_finalizer(LINKED_BINDINGS_FINALIZER)
			&& !meta.has_finalizer(TOKEN_STORAGE_FINALIZER)
		{
			meta.add_finalizer(LINKED_BINDINGS_FINALIZER);
			meta.add_finalizer(TOKEN_STORAGE_FINALIZER);
			token = self.tokens.update(token).await?;
			tracing::debug!("Attached finalizers.");
		}

		let status = self.desired_status(&token).await?;

		if status != token.status {
			tracing::info!(
				from = token.status.phase.as_str(),
				to = status.phase.as_str(),
				"Access token status changed."
			);
			token.status = status;
			self.tokens.update_status(token).await?;
		}

		Ok(Action::await_change())
	}

	async fn finalize(&self, mut token: AccessToken) -> Result<Action> {
		let mut released = false;
		let mut blocked = false;
		let mut cleanup_error = None;

		if token.metadata.has_finalizer(LINKED_BINDINGS_FINALIZER) {
			let linked = controller::linked_bindings(
				self.bindings.as_ref(),
				&token.metadata.namespace,
				&token.metadata.name,
			)
			.await?;

			if linked.is_empty() {
				released |= token.metadata.remove_finalizer(LINKED_BINDINGS_FINALIZER);
			} else {
				tracing::info!(bindings = linked.len(), "Deletion blocked by linked bindings.");

				blocked = true;
			}
		}
		if token.metadata.has_finalizer(TOKEN_STORAGE_FINALIZER) {
			match self.storage.delete(&token).await {
				Ok(()) => {
					released |= token.metadata.remove_finalizer(TOKEN_STORAGE_FINALIZER);
					tracing::debug!("Deleted token data from storage.");
				},
				Err(e) => cleanup_error = Some(e),
			}
		}
		if released {
			self.tokens.update(token).await?;
		}
		if let Some(e) = cleanup_error {
			return Err(e.into());
		}
		if blocked {
			return Ok(Action::requeue(self.linked_bindings_recheck));
		}

		Ok(Action::await_change())
	}

	async fn desired_status(&self, token: &AccessToken) -> Result<AccessTokenStatus> {
		let provider = match self.providers.for_url(&token.spec.service_provider_url) {
			Ok(provider) => provider,
			Err(e) =>
				return Ok(AccessTokenStatus::error(
					AccessTokenErrorReason::UnknownServiceProvider,
					e.to_string(),
				)),
		};
		let Some(secret) = self.storage.get(token).await? else {
			return self.awaiting_data(token, provider.as_ref());
		};
		let validation = provider.validate(&secret, &token.spec.permissions).await?;

		if !validation.is_valid() {
			return Ok(AccessTokenStatus::invalid(
				AccessTokenErrorReason::UnsupportedPermissions,
				validation.message(),
			));
		}

		match provider.persist_metadata(token, &secret).await {
			Ok(metadata) => Ok(AccessTokenStatus::ready(metadata)),
			Err(e) if e.kind() == ErrorKind::Content => Ok(AccessTokenStatus::invalid(
				AccessTokenErrorReason::MetadataFailure,
				e.to_string(),
			)),
			Err(e) => Err(e.into()),
		}
	}

	fn awaiting_data(
		&self,
		token: &AccessToken,
		provider: &dyn ServiceProvider,
	) -> Result<AccessTokenStatus> {
		let Some(oauth) = &self.oauth else {
			return Ok(AccessTokenStatus::awaiting_data(""));
		};
		let mut state = AnonymousOAuthState {
			token_name: token.metadata.name.clone(),
			token_namespace: token.metadata.namespace.clone(),
			issued_at: 0,
			scopes: provider.required_scopes(&token.spec.permissions).into_vec(),
			service_provider_type: provider.provider_type().clone(),
			service_provider_url: token.spec.service_provider_url.clone(),
		};
		let current = &token.status;

		// The issue time is the only field allowed to differ from a link worth keeping.
		let reusable = current.phase == AccessTokenPhase::AwaitingData
			&& oauth.published_state(&current.oauth_url).is_some_and(|published| {
				AnonymousOAuthState { issued_at: 0, ..published } == state
			});

		if reusable {
			return Ok(AccessTokenStatus::awaiting_data(current.oauth_url.clone()));
		}

		state.issued_at = OffsetDateTime::now_utc().unix_timestamp();
		tracing::debug!(scopes = ?state.scopes, "Issued a new OAuth link.");

		Ok(AccessTokenStatus::awaiting_data(oauth.authenticate_url(&state)?))
	}
}
impl Reconciler for AccessTokenReconciler {
	type Resource = AccessToken;

	fn kind(&self) -> ControllerKind {
		ControllerKind::AccessToken
	}

	fn reconcile<'a>(&'a self, key: &'a ObjectKey) -> ReconcileFuture<'a> {
		Box::pin(self.reconcile_token(key))
	}
}
impl Debug for AccessTokenReconciler {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AccessTokenReconciler")
			.field("providers", &self.providers)
			.field("oauth", &self.oauth.is_some())
			.field("linked_bindings_recheck", &self.linked_bindings_recheck)
			.finish_non_exhaustive()
	}
}
