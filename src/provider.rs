//! Service provider contract: the pluggable capability set each external provider implements.
//!
//! Controllers never talk to a provider directly. They resolve a [`ServiceProvider`] through a
//! [`ServiceProviderRegistry`] chosen when the operator is assembled, so tests swap provider
//! behavior by registering a different implementation instead of patching shared state.
//! [`get_all_scopes`] and [`default_map_token`] are the provider-neutral helpers every
//! implementation builds on.

pub mod error;
pub mod id;
pub mod mapping;
pub mod registry;
pub mod scopes;

pub use error::*;
pub use id::*;
pub use mapping::*;
pub use registry::*;
pub use scopes::*;

// self
use crate::{
	_prelude::*,
	api::{AccessToken, AccessTokenBinding, Permission, Permissions, TokenMetadata},
	token::{ScopeSet, Token},
};

/// Boxed future returned by [`ServiceProvider`] operations.
pub type ProviderFuture<'a, T> =
	Pin<Box<dyn Future<Output = Result<T, ServiceProviderError>> + 'a + Send>>;

/// Capability set implemented per external service provider.
///
/// Errors returned from the async operations are transport or API failures. Rejection of the
/// credential's content is expressed through [`ValidationResult`] or, for metadata, through a
/// 401/403 [`ServiceProviderError::Response`].
pub trait ServiceProvider
where
	Self: Send + Sync,
{
	/// Provider type label.
	fn provider_type(&self) -> &ServiceProviderType;

	/// Base URL matched against token and binding URLs.
	fn base_url(&self) -> &str;

	/// Expands one provider-neutral permission into provider scopes.
	fn translate_to_scopes(&self, permission: &Permission) -> Vec<String>;

	/// Checks that the credential grants `permissions`.
	fn validate<'a>(
		&'a self,
		token: &'a Token,
		permissions: &'a Permissions,
	) -> ProviderFuture<'a, ValidationResult>;

	/// Finds an existing access token satisfying the binding; `None` asks for a new one.
	fn lookup_token<'a>(
		&'a self,
		binding: &'a AccessTokenBinding,
	) -> ProviderFuture<'a, Option<AccessToken>>;

	/// Reads the provider-side facts about the credential owned by `owner`.
	fn persist_metadata<'a>(
		&'a self,
		owner: &'a AccessToken,
		token: &'a Token,
	) -> ProviderFuture<'a, TokenMetadata>;

	/// Flattens the credential for injection into workloads.
	fn map_token(&self, owner: &AccessToken, token: &Token) -> TokenMapping {
		default_map_token(owner, token)
	}

	/// Scopes required by `permissions` for this provider.
	fn required_scopes(&self, permissions: &Permissions) -> ScopeSet {
		get_all_scopes(|p| self.translate_to_scopes(p), permissions)
	}
}

/// Outcome of [`ServiceProvider::validate`]; each entry describes one unmet requirement.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ValidationResult {
	/// Human-readable scope validation failures.
	pub scope_validation: Vec<String>,
}
impl ValidationResult {
	/// A result with no failures.
	pub fn valid() -> Self {
		Self::default()
	}

	/// A result carrying the provided failures.
	pub fn rejected<I, S>(errors: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self { scope_validation: errors.into_iter().map(Into::into).collect() }
	}

	/// Returns true when every requirement is met.
	pub fn is_valid(&self) -> bool {
		self.scope_validation.is_empty()
	}

	/// Failures joined into one message.
	pub fn message(&self) -> String {
		self.scope_validation.join(", ")
	}
}
