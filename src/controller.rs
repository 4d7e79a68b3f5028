//! Reconcilers for the operator's three resource kinds.
//!
//! - [`AccessTokenReconciler`] drives an access token through `AwaitingData`, `Ready`,
//!   `Invalid` and `Error`, and gates its deletion on linked bindings and secret cleanup.
//! - [`BindingReconciler`] resolves a binding to an access token and labels it with the result.
//! - [`DataUpdateReconciler`] turns storage-change triggers into access token reconciles.

pub mod access_token;
pub mod binding;
pub mod data_update;

pub use access_token::AccessTokenReconciler;
pub use binding::BindingReconciler;
pub use data_update::DataUpdateReconciler;

// self
use crate::{
	_prelude::*,
	api::{AccessTokenBinding, LINKED_ACCESS_TOKEN_LABEL, LabelSelector, ObjectKey},
	cluster::ObjectStore,
};

/// Bindings in `namespace` whose link label names `token_name`.
pub async fn linked_bindings(
	bindings: &dyn ObjectStore<AccessTokenBinding>,
	namespace: &str,
	token_name: &str,
) -> Result<Vec<AccessTokenBinding>> {
	let selector = LabelSelector::everything().matching(LINKED_ACCESS_TOKEN_LABEL, token_name);

	Ok(bindings.list(Some(namespace), &selector).await?)
}

/// Keys of the bindings in `namespace` linked to `token_name`; lookup failures yield nothing.
pub(crate) async fn linked_binding_keys(
	bindings: &dyn ObjectStore<AccessTokenBinding>,
	namespace: &str,
	token_name: &str,
) -> Vec<ObjectKey> {
	match linked_bindings(bindings, namespace, token_name).await {
		Ok(found) => found.iter().map(|b| b.metadata.key()).collect(),
		Err(e) => {
			tracing::warn!(
				namespace,
				token = token_name,
				error = %e,
				"Failed to list bindings linked to a token."
			);

			Vec::new()
		},
	}
}
