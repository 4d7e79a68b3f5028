//! Operator assembly: the three controllers wired to one cluster, one storage, one registry.

// self
use crate::{
	_prelude::*,
	api::{AccessToken, AccessTokenBinding, ObjectKey},
	cluster::{Cluster, WatchEvent},
	config::OperatorConfig,
	controller::{self, AccessTokenReconciler, BindingReconciler, DataUpdateReconciler},
	provider::ServiceProviderRegistry,
	runtime::{Controller, WorkQueue},
	storage::TokenStorage,
};

/// Access token, binding and data-update controllers sharing one cluster.
pub struct Operator {
	tokens: Controller<AccessTokenReconciler>,
	bindings: Controller<BindingReconciler>,
	data_updates: Controller<DataUpdateReconciler>,
}
impl Operator {
	/// Wires the controllers together.
	pub fn new(
		cluster: Cluster,
		storage: Arc<dyn TokenStorage>,
		providers: ServiceProviderRegistry,
		config: &OperatorConfig,
	) -> Result<Self> {
		config.validate()?;

		let settings = config.controller_settings();
		let token_reconciler = AccessTokenReconciler::new(&cluster, storage, providers.clone())
			.with_oauth(config.oauth_url_builder()?)
			.with_linked_bindings_recheck(config.linked_bindings_recheck_std());
		// A removed binding may be the last thing holding a token's deletion back.
		let tokens =
			Controller::new(token_reconciler, cluster.access_tokens.clone(), settings.clone())
				.watches(cluster.bindings.clone(), released_token);
		let bindings_store = cluster.bindings.clone();
		let bindings = Controller::new(
			BindingReconciler::new(&cluster, providers),
			cluster.bindings.clone(),
			settings.clone(),
		)
		.watches_async(cluster.access_tokens.clone(), move |event: WatchEvent<AccessToken>| {
			let bindings = bindings_store.clone();

			async move {
				let token = event.object();

				controller::linked_binding_keys(
					bindings.as_ref(),
					&token.metadata.namespace,
					&token.metadata.name,
				)
				.await
			}
		});
		let data_updates = Controller::new(
			DataUpdateReconciler::new(&cluster, tokens.queue()),
			cluster.data_updates.clone(),
			settings,
		);

		Ok(Self { tokens, bindings, data_updates })
	}

	/// Queue of the access token controller.
	pub fn token_queue(&self) -> WorkQueue {
		self.tokens.queue()
	}

	/// Runs every controller until `shutdown` is cancelled.
	pub async fn run(self, shutdown: CancellationToken) {
		let Self { tokens, bindings, data_updates } = self;

		tracing::info!("Operator starting.");
		tokio::join!(
			tokens.run(shutdown.clone()),
			bindings.run(shutdown.clone()),
			data_updates.run(shutdown),
		);
		tracing::info!("Operator stopped.");
	}
}
impl Debug for Operator {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Operator")
			.field("tokens", &self.tokens)
			.field("bindings", &self.bindings)
			.field("data_updates", &self.data_updates)
			.finish()
	}
}

fn released_token(event: &WatchEvent<AccessTokenBinding>) -> Vec<ObjectKey> {
	match event {
		WatchEvent::Deleted(binding) => binding
			.linked_token_name()
			.map(|name| ObjectKey::new(&binding.metadata.namespace, name))
			.into_iter()
			.collect(),
		WatchEvent::Applied(_) => Vec::new(),
	}
}
