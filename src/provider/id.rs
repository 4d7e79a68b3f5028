//! Strongly typed service provider identifier.

// std
use std::{borrow::Borrow, ops::Deref};
// self
use crate::_prelude::*;

const IDENTIFIER_MAX_LEN: usize = 63;

/// Error returned when identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// The identifier was empty.
	#[error("Service provider type cannot be empty.")]
	Empty,
	/// The identifier contains characters outside `[a-z0-9-]`.
	#[error("Service provider type `{value}` must only contain lowercase letters, digits and `-`.")]
	InvalidCharacter {
		/// Rejected value.
		value: String,
	},
	/// The identifier exceeded the allowed character count.
	#[error("Service provider type exceeds {max} characters.")]
	TooLong {
		/// Maximum permitted character count.
		max: usize,
	},
}

/// Provider type label (e.g. `github`, `quay`); also the path segment of the OAuth service URL.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ServiceProviderType(String);
impl ServiceProviderType {
	/// Creates a new identifier after validation.
	pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
		let view = value.as_ref();

		validate_view(view)?;

		Ok(Self(view.to_owned()))
	}
}
impl Deref for ServiceProviderType {
	type Target = str;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
impl AsRef<str> for ServiceProviderType {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl Borrow<str> for ServiceProviderType {
	fn borrow(&self) -> &str {
		&self.0
	}
}
impl From<ServiceProviderType> for String {
	fn from(value: ServiceProviderType) -> Self {
		value.0
	}
}
impl TryFrom<String> for ServiceProviderType {
	type Error = IdentifierError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		validate_view(&value)?;

		Ok(Self(value))
	}
}
impl Debug for ServiceProviderType {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "ServiceProviderType({})", self.0)
	}
}
impl Display for ServiceProviderType {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}
impl FromStr for ServiceProviderType {
	type Err = IdentifierError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s)
	}
}

fn validate_view(view: &str) -> Result<(), IdentifierError> {
	if view.is_empty() {
		return Err(IdentifierError::Empty);
	}
	if !view.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-') {
		return Err(IdentifierError::InvalidCharacter { value: view.to_owned() });
	}
	if view.len() > IDENTIFIER_MAX_LEN {
		return Err(IdentifierError::TooLong { max: IDENTIFIER_MAX_LEN });
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn identifiers_validate() {
		let github = ServiceProviderType::new("github").expect("Lowercase type should be valid.");

		assert_eq!(github.as_ref(), "github");
		assert_eq!(github.to_string(), "github");
		assert!(ServiceProviderType::new("").is_err());
		assert!(ServiceProviderType::new("GitHub").is_err());
		assert!(ServiceProviderType::new("with space").is_err());
		assert!(ServiceProviderType::new("a".repeat(IDENTIFIER_MAX_LEN + 1)).is_err());
	}

	#[test]
	fn serde_round_trip_enforces_validation() {
		let quay: ServiceProviderType =
			serde_json::from_str("\"quay\"").expect("Type should deserialize successfully.");

		assert_eq!(serde_json::to_string(&quay).expect("Type should serialize."), "\"quay\"");
		assert!(serde_json::from_str::<ServiceProviderType>("\"Quay\"").is_err());
	}

	#[test]
	fn borrow_supports_fast_lookup() {
		let map = HashMap::from([(
			ServiceProviderType::new("github").expect("Type used for lookup should be valid."),
			7_u8,
		)]);

		assert_eq!(map.get("github"), Some(&7));
	}
}
