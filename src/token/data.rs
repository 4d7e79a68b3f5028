//! The secret record: credential material that lives only in token storage.

// self
use crate::{_prelude::*, token::TokenSecret};

/// Credential material addressed by access-token identity.
///
/// `expiry` is relative: seconds the credential stays valid, as reported when it was stored.
/// It is never converted to an absolute deadline by the operator.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Token {
	/// Access token value.
	pub access_token: TokenSecret,
	/// Provider user name the credential was issued for.
	pub username: String,
	/// Seconds to live.
	pub expiry: u64,
}
impl Token {
	/// Creates a record holding only an access token.
	pub fn new(access_token: impl Into<TokenSecret>) -> Self {
		Self { access_token: access_token.into(), ..Default::default() }
	}

	/// Sets the provider user name.
	pub fn with_username(mut self, username: impl Into<String>) -> Self {
		self.username = username.into();

		self
	}

	/// Sets the relative expiry in seconds.
	pub fn with_expiry(mut self, expiry: u64) -> Self {
		self.expiry = expiry;

		self
	}
}
impl Debug for Token {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Token")
			.field("access_token", &"<redacted>")
			.field("username", &self.username)
			.field("expiry", &self.expiry)
			.finish()
	}
}
