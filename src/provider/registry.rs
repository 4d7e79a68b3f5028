//! Lookup of [`ServiceProvider`] implementations by URL.

// self
use crate::{
	_prelude::*,
	error::ConfigError,
	provider::{ServiceProvider, ServiceProviderType},
};

/// Set of configured service providers, resolved by URL prefix.
#[derive(Clone, Default)]
pub struct ServiceProviderRegistry {
	providers: Vec<Arc<dyn ServiceProvider>>,
}
impl ServiceProviderRegistry {
	/// Creates an empty registry.
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds a provider.
	pub fn with_provider(mut self, provider: Arc<dyn ServiceProvider>) -> Self {
		self.register(provider);

		self
	}

	/// Adds a provider in place.
	pub fn register(&mut self, provider: Arc<dyn ServiceProvider>) {
		self.providers.push(provider);
	}

	/// Number of registered providers.
	pub fn len(&self) -> usize {
		self.providers.len()
	}

	/// Returns true when no providers are registered.
	pub fn is_empty(&self) -> bool {
		self.providers.is_empty()
	}

	/// Resolves the provider whose base URL is the longest prefix of `url`.
	///
	/// A base URL only matches on a path boundary, so `https://github.com` does not claim
	/// `https://github.company.io`.
	pub fn for_url(&self, url: &str) -> Result<Arc<dyn ServiceProvider>, ConfigError> {
		self.providers
			.iter()
			.filter(|p| url_matches(p.base_url(), url))
			.max_by_key(|p| p.base_url().trim_end_matches('/').len())
			.cloned()
			.ok_or_else(|| ConfigError::UnknownServiceProvider { url: url.to_owned() })
	}

	/// Resolves a provider by its type label.
	pub fn by_type(&self, provider_type: &ServiceProviderType) -> Option<Arc<dyn ServiceProvider>> {
		self.providers.iter().find(|p| p.provider_type() == provider_type).cloned()
	}
}
impl Debug for ServiceProviderRegistry {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_list()
			.entries(self.providers.iter().map(|p| (p.provider_type().to_string(), p.base_url())))
			.finish()
	}
}

fn url_matches(base_url: &str, url: &str) -> bool {
	let base = base_url.trim_end_matches('/');

	if base.is_empty() {
		return false;
	}

	match url.strip_prefix(base) {
		Some(rest) => rest.is_empty() || rest.starts_with('/'),
		None => false,
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{
		api::{AccessToken, AccessTokenBinding, Permission, Permissions, TokenMetadata},
		provider::{ProviderFuture, ValidationResult},
		token::Token,
	};

	struct Fixed {
		provider_type: ServiceProviderType,
		base_url: &'static str,
	}
	impl Fixed {
		fn new(provider_type: &str, base_url: &'static str) -> Arc<dyn ServiceProvider> {
			Arc::new(Self {
				provider_type: ServiceProviderType::new(provider_type)
					.expect("Fixture provider type should be valid."),
				base_url,
			})
		}
	}
	impl ServiceProvider for Fixed {
		fn provider_type(&self) -> &ServiceProviderType {
			&self.provider_type
		}

		fn base_url(&self) -> &str {
			self.base_url
		}

		fn translate_to_scopes(&self, _: &Permission) -> Vec<String> {
			Vec::new()
		}

		fn validate<'a>(
			&'a self,
			_: &'a Token,
			_: &'a Permissions,
		) -> ProviderFuture<'a, ValidationResult> {
			Box::pin(async { Ok(ValidationResult::valid()) })
		}

		fn lookup_token<'a>(
			&'a self,
			_: &'a AccessTokenBinding,
		) -> ProviderFuture<'a, Option<AccessToken>> {
			Box::pin(async { Ok(None) })
		}

		fn persist_metadata<'a>(
			&'a self,
			_: &'a AccessToken,
			_: &'a Token,
		) -> ProviderFuture<'a, TokenMetadata> {
			Box::pin(async { Ok(TokenMetadata::default()) })
		}
	}

	#[test]
	fn urls_resolve_on_path_boundaries() {
		let registry = ServiceProviderRegistry::new()
			.with_provider(Fixed::new("github", "https://github.com"))
			.with_provider(Fixed::new("quay", "https://quay.io/"));
		let resolve = |url: &str| registry.for_url(url).map(|p| p.provider_type().to_string());

		assert_eq!(resolve("https://github.com").ok().as_deref(), Some("github"));
		assert_eq!(resolve("https://github.com/org/repo").ok().as_deref(), Some("github"));
		assert_eq!(resolve("https://quay.io/repository/org/image").ok().as_deref(), Some("quay"));
		assert!(matches!(
			resolve("https://github.company.io"),
			Err(ConfigError::UnknownServiceProvider { .. })
		));
	}

	#[test]
	fn longest_base_url_wins() {
		let registry = ServiceProviderRegistry::new()
			.with_provider(Fixed::new("generic", "https://git.example.com"))
			.with_provider(Fixed::new("gitlab", "https://git.example.com/gitlab"));
		let provider = registry
			.for_url("https://git.example.com/gitlab/group/project")
			.expect("Nested provider URL should match.");

		assert_eq!(provider.provider_type().as_ref(), "gitlab");
		assert!(
			registry
				.by_type(&ServiceProviderType::new("generic").expect("Type should be valid."))
				.is_some()
		);
	}
}
