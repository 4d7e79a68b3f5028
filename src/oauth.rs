//! Anonymous OAuth redirect state and its signed codec.
//!
//! The operator cannot know which human will complete an authorization flow, so the state it
//! publishes in a token's `oauthUrl` only names the token, the scopes it needs, and the provider.
//! The OAuth service decodes it, attaches the caller's identity, and continues the flow.
//!
//! Wire format: `base64url(json) "." base64url(HMAC-SHA256(key, base64url(json)))`, unpadded.
//! Encoding is deterministic, so identical states (including `issued_at`) yield identical
//! strings.

// crates.io
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use sha2::Sha256;
// self
use crate::{_prelude::*, error::ConfigError, provider::ServiceProviderType};

type HmacSha256 = Hmac<Sha256>;

/// Minimum accepted HMAC key length in bytes.
pub const MIN_STATE_KEY_LEN: usize = 32;

/// Redirect state published by the operator before the initiating user is known.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnonymousOAuthState {
	/// Name of the access token the flow is for.
	pub token_name: String,
	/// Namespace of the access token the flow is for.
	pub token_namespace: String,
	/// Unix seconds at which the state was issued; zero is omitted on the wire.
	#[serde(default, skip_serializing_if = "is_zero")]
	pub issued_at: i64,
	/// Provider scopes the flow must request.
	pub scopes: Vec<String>,
	/// Provider type handling the flow.
	pub service_provider_type: ServiceProviderType,
	/// URL of the provider instance.
	pub service_provider_url: String,
}
impl AnonymousOAuthState {
	/// Fails when the state claims to be issued after the current instant.
	///
	/// Old states are accepted; age limits are not enforced here.
	pub fn validate(&self) -> Result<(), StateError> {
		self.validate_at(OffsetDateTime::now_utc())
	}

	/// Same as [`AnonymousOAuthState::validate`] against an explicit instant.
	pub fn validate_at(&self, now: OffsetDateTime) -> Result<(), StateError> {
		let now = now.unix_timestamp();

		if self.issued_at > now {
			return Err(StateError::FromTheFuture { issued_at: self.issued_at, now });
		}

		Ok(())
	}
}

/// Failures raised while decoding or validating OAuth state.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum StateError {
	/// The token is not in `payload.signature` form or a segment is not base64url.
	#[error("OAuth state is malformed: {message}.")]
	Malformed {
		/// Human-readable error payload.
		message: String,
	},
	/// The signature does not match the payload.
	#[error("OAuth state signature mismatch.")]
	SignatureMismatch,
	/// The payload could not be serialized or deserialized.
	#[error("OAuth state payload is invalid at `{path}`: {message}.")]
	Payload {
		/// Path of the offending field.
		path: String,
		/// Parser message.
		message: String,
	},
	/// `issued_at` lies after the validation instant.
	#[error("OAuth state is a request from the future: issued at {issued_at}, now {now}.")]
	FromTheFuture {
		/// Claimed issue time in unix seconds.
		issued_at: i64,
		/// Validation time in unix seconds.
		now: i64,
	},
}

/// Signs and verifies OAuth state tokens with a shared HMAC key.
#[derive(Clone)]
pub struct StateCodec {
	mac: HmacSha256,
}
impl StateCodec {
	/// Creates a codec from raw key bytes.
	pub fn new(key: &[u8]) -> Result<Self, ConfigError> {
		if key.len() < MIN_STATE_KEY_LEN {
			return Err(ConfigError::StateKeyTooShort {
				min: MIN_STATE_KEY_LEN,
				actual: key.len(),
			});
		}

		let mac = HmacSha256::new_from_slice(key).map_err(|_| ConfigError::StateKeyTooShort {
			min: MIN_STATE_KEY_LEN,
			actual: key.len(),
		})?;

		Ok(Self { mac })
	}

	/// Creates a codec from a standard-base64 key.
	pub fn from_base64(key: &str) -> Result<Self, ConfigError> {
		let bytes = base64::engine::general_purpose::STANDARD
			.decode(key.trim())
			.map_err(|source| ConfigError::StateKeyEncoding { source })?;

		Self::new(&bytes)
	}

	/// Serializes and signs `state`.
	pub fn encode<T>(&self, state: &T) -> Result<String, StateError>
	where
		T: Serialize,
	{
		let json = serde_json::to_vec(state)
			.map_err(|e| StateError::Payload { path: ".".into(), message: e.to_string() })?;
		let payload = URL_SAFE_NO_PAD.encode(json);
		let signature = URL_SAFE_NO_PAD.encode(self.mac(&payload).finalize().into_bytes());

		Ok(format!("{payload}.{signature}"))
	}

	/// Verifies and deserializes a token produced by [`StateCodec::encode`].
	pub fn decode<T>(&self, token: &str) -> Result<T, StateError>
	where
		T: DeserializeOwned,
	{
		let (payload, signature) = token.split_once('.').ok_or_else(|| StateError::Malformed {
			message: "missing signature segment".into(),
		})?;
		let signature = URL_SAFE_NO_PAD.decode(signature).map_err(|_| StateError::Malformed {
			message: "signature is not valid base64url".into(),
		})?;

		self.mac(payload).verify_slice(&signature).map_err(|_| StateError::SignatureMismatch)?;

		let json = URL_SAFE_NO_PAD.decode(payload).map_err(|_| StateError::Malformed {
			message: "payload is not valid base64url".into(),
		})?;
		let mut deserializer = serde_json::Deserializer::from_slice(&json);

		serde_path_to_error::deserialize(&mut deserializer).map_err(|e| StateError::Payload {
			path: e.path().to_string(),
			message: e.inner().to_string(),
		})
	}

	/// Decodes an anonymous state and validates its issue time.
	pub fn parse_anonymous(&self, token: &str) -> Result<AnonymousOAuthState, StateError> {
		let state = self.decode::<AnonymousOAuthState>(token)?;

		state.validate()?;

		Ok(state)
	}

	fn mac(&self, payload: &str) -> HmacSha256 {
		let mut mac = self.mac.clone();

		mac.update(payload.as_bytes());

		mac
	}
}
impl Debug for StateCodec {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("StateCodec").finish_non_exhaustive()
	}
}

/// Builds the OAuth service links published in access token status.
#[derive(Clone, Debug)]
pub struct OAuthUrlBuilder {
	base_url: String,
	codec: StateCodec,
}
impl OAuthUrlBuilder {
	/// Creates a builder for the OAuth service at `base_url`.
	pub fn new(base_url: &Url, codec: StateCodec) -> Self {
		Self { base_url: base_url.as_str().trim_end_matches('/').to_owned(), codec }
	}

	/// Codec used to sign the state parameter.
	pub fn codec(&self) -> &StateCodec {
		&self.codec
	}

	/// `<base>/<providerType>/authenticate?state=<encoded state>`.
	pub fn authenticate_url(&self, state: &AnonymousOAuthState) -> Result<String, StateError> {
		let encoded = self.codec.encode(state)?;

		// base64url segments and provider types need no query or path escaping.
		Ok(format!(
			"{}/{}/authenticate?state={encoded}",
			self.base_url, state.service_provider_type
		))
	}

	/// Recovers the state carried by a link built by [`OAuthUrlBuilder::authenticate_url`].
	///
	/// Links for another base URL, with a path that disagrees with the state's provider type, or
	/// whose state does not verify under this builder's key yield `None`.
	pub fn published_state(&self, url: &str) -> Option<AnonymousOAuthState> {
		let rest = url.strip_prefix(self.base_url.as_str())?.strip_prefix('/')?;
		let (provider_type, encoded) = rest.split_once("/authenticate?state=")?;
		let state = self.codec.decode::<AnonymousOAuthState>(encoded).ok()?;

		(&*state.service_provider_type == provider_type).then_some(state)
	}
}

fn is_zero(value: &i64) -> bool {
	*value == 0
}
