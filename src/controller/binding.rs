//! Binding resolution: link each usage binding to exactly one access token.

// self
use crate::{
	_prelude::*,
	api::{
		AccessToken, AccessTokenBinding, AccessTokenBindingErrorReason, AccessTokenBindingPhase,
		AccessTokenBindingStatus, AccessTokenPhase, LINKED_ACCESS_TOKEN_LABEL, ObjectKey,
		ObjectMeta, Resource,
	},
	cluster::{Cluster, ObjectStore},
	obs::ControllerKind,
	provider::{ServiceProvider, ServiceProviderRegistry},
	runtime::{Action, ReconcileFuture, Reconciler},
};

/// Name prefix of access tokens created for bindings without a matching token.
pub const GENERATED_TOKEN_NAME_PREFIX: &str = "generated-access-token-";

/// Reconciler for [`AccessTokenBinding`] resources.
pub struct BindingReconciler {
	tokens: Arc<dyn ObjectStore<AccessToken>>,
	bindings: Arc<dyn ObjectStore<AccessTokenBinding>>,
	providers: ServiceProviderRegistry,
}
impl BindingReconciler {
	/// Creates a reconciler over the cluster's bindings and tokens.
	pub fn new(cluster: &Cluster, providers: ServiceProviderRegistry) -> Self {
		Self {
			tokens: cluster.access_tokens.clone(),
			bindings: cluster.bindings.clone(),
			providers,
		}
	}

	async fn reconcile_binding(&self, key: &ObjectKey) -> Result<Action> {
		let Some(mut binding) = self.bindings.get(key).await? else {
			return Ok(Action::await_change());
		};

		if binding.is_deleting() {
			return Ok(Action::await_change());
		}

		let status = match self.resolve(&binding).await? {
			Resolution::Linked(token) => {
				let name = token.metadata.name.clone();

				if binding.linked_token_name() != Some(name.as_str()) {
					binding.metadata.labels.insert(LINKED_ACCESS_TOKEN_LABEL.into(), name.clone());
					binding = self.bindings.update(binding).await?;
					tracing::info!(token = %name, "Linked binding to access token.");
				}

				AccessTokenBindingStatus {
					phase: if token.status.phase == AccessTokenPhase::Ready {
						AccessTokenBindingPhase::Ready
					} else {
						AccessTokenBindingPhase::AwaitingTokenData
					},
					linked_access_token_name: name,
					..Default::default()
				}
			},
			Resolution::Failed { reason, message } => AccessTokenBindingStatus {
				phase: AccessTokenBindingPhase::Error,
				error_reason: Some(reason),
				error_message: message,
				linked_access_token_name: binding.status.linked_access_token_name.clone(),
			},
		};

		if status != binding.status {
			binding.status = status;
			self.bindings.update_status(binding).await?;
		}

		Ok(Action::await_change())
	}

	async fn resolve(&self, binding: &AccessTokenBinding) -> Result<Resolution> {
		let provider = match self.providers.for_url(&binding.spec.repo_url) {
			Ok(provider) => provider,
			Err(e) =>
				return Ok(Resolution::Failed {
					reason: AccessTokenBindingErrorReason::UnknownServiceProvider,
					message: e.to_string(),
				}),
		};

		// A linked token stays linked while it exists, so the link keeps blocking its deletion.
		if let Some(name) = binding.linked_token_name() {
			let key = ObjectKey::new(&binding.metadata.namespace, name);

			if let Some(token) = self.tokens.get(&key).await? {
				return Ok(Resolution::Linked(token));
			}
		}

		match provider.lookup_token(binding).await {
			Ok(Some(token)) => Ok(Resolution::Linked(token)),
			Ok(None) => {
				let created = self.create_token(binding, provider.as_ref()).await?;

				Ok(Resolution::Linked(created))
			},
			Err(e) if e.kind() == ErrorKind::Content => Ok(Resolution::Failed {
				reason: AccessTokenBindingErrorReason::TokenLookupFailed,
				message: e.to_string(),
			}),
			Err(e) => Err(e.into()),
		}
	}

	async fn create_token(
		&self,
		binding: &AccessTokenBinding,
		provider: &dyn ServiceProvider,
	) -> Result<AccessToken> {
		let token = AccessToken::new(
			ObjectMeta::generated(&binding.metadata.namespace, GENERATED_TOKEN_NAME_PREFIX),
			provider.base_url(),
		)
		.with_permissions(binding.spec.permissions.clone());
		let created = self.tokens.create(token).await?;

		tracing::info!(token = %created.metadata.name, "Created access token for binding.");

		Ok(created)
	}
}
impl Reconciler for BindingReconciler {
	type Resource = AccessTokenBinding;

	fn kind(&self) -> ControllerKind {
		ControllerKind::Binding
	}

	fn reconcile<'a>(&'a self, key: &'a ObjectKey) -> ReconcileFuture<'a> {
		Box::pin(self.reconcile_binding(key))
	}
}
impl Debug for BindingReconciler {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("BindingReconciler")
			.field("providers", &self.providers)
			.finish_non_exhaustive()
	}
}

enum Resolution {
	Linked(AccessToken),
	Failed { reason: AccessTokenBindingErrorReason, message: String },
}
