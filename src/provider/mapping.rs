//! Flattened credential-injection payload handed to workloads.

// self
use crate::{_prelude::*, api::AccessToken, token::Token};

/// Flat view of a credential and the provider identity behind it.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TokenMapping {
	/// Access token value.
	pub token: String,
	/// Name of the access token resource.
	pub name: String,
	/// Scopes reported by the provider.
	pub scopes: Vec<String>,
	/// Service provider URL of the access token.
	pub service_provider_url: String,
	/// Provider user name.
	pub service_provider_user_name: String,
	/// Provider user identifier.
	pub service_provider_user_id: String,
	/// Generic user identifier; providers that know one fill it in their own mapping.
	pub user_id: String,
	/// Seconds to live, copied from the secret record.
	pub expired_after: Option<u64>,
}
impl TokenMapping {
	/// Flattens the mapping into string pairs, omitting empty values.
	///
	/// Scopes are joined with `,`.
	pub fn to_secret_data(&self) -> BTreeMap<String, String> {
		let scopes = self.scopes.join(",");
		let expired_after = self.expired_after.map(|e| e.to_string()).unwrap_or_default();

		[
			("token", self.token.as_str()),
			("name", self.name.as_str()),
			("serviceProviderUrl", self.service_provider_url.as_str()),
			("serviceProviderUserName", self.service_provider_user_name.as_str()),
			("serviceProviderUserId", self.service_provider_user_id.as_str()),
			("userId", self.user_id.as_str()),
			("expiredAfter", expired_after.as_str()),
			("scopes", scopes.as_str()),
		]
		.into_iter()
		.filter(|(_, value)| !value.is_empty())
		.map(|(key, value)| (key.to_owned(), value.to_owned()))
		.collect()
	}
}
impl Debug for TokenMapping {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenMapping")
			.field("token", &"<redacted>")
			.field("name", &self.name)
			.field("scopes", &self.scopes)
			.field("service_provider_url", &self.service_provider_url)
			.field("service_provider_user_name", &self.service_provider_user_name)
			.field("service_provider_user_id", &self.service_provider_user_id)
			.field("user_id", &self.user_id)
			.field("expired_after", &self.expired_after)
			.finish()
	}
}

/// Provider-neutral mapping of a token resource and its secret record.
///
/// Identity comes from the stored token metadata: `service_provider_user_name` and
/// `service_provider_user_id` are filled from it while `user_id` is always left empty.
/// `expired_after` is always present and carries the secret's relative expiry unchanged.
pub fn default_map_token(token: &AccessToken, secret: &Token) -> TokenMapping {
	let metadata = token.status.token_metadata.clone().unwrap_or_default();

	TokenMapping {
		token: secret.access_token.expose().to_owned(),
		name: token.metadata.name.clone(),
		scopes: metadata.scopes,
		service_provider_url: token.spec.service_provider_url.clone(),
		service_provider_user_name: metadata.username,
		service_provider_user_id: metadata.user_id,
		user_id: String::new(),
		expired_after: Some(secret.expiry),
	}
}
