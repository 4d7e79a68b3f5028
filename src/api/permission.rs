//! Permission declarations attached to tokens and bindings.

// self
use crate::_prelude::*;

/// Access level requested for an area.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PermissionType {
	/// Read-only access.
	#[serde(rename = "r")]
	Read,
	/// Write-only access.
	#[serde(rename = "w")]
	Write,
	/// Read and write access.
	#[serde(rename = "rw")]
	ReadWrite,
}
impl PermissionType {
	/// Returns the wire label.
	pub const fn as_str(self) -> &'static str {
		match self {
			PermissionType::Read => "r",
			PermissionType::Write => "w",
			PermissionType::ReadWrite => "rw",
		}
	}

	/// Returns true if the type grants reading.
	pub const fn is_read(self) -> bool {
		matches!(self, PermissionType::Read | PermissionType::ReadWrite)
	}

	/// Returns true if the type grants writing.
	pub const fn is_write(self) -> bool {
		matches!(self, PermissionType::Write | PermissionType::ReadWrite)
	}
}
impl Display for PermissionType {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Provider-neutral area a permission applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PermissionArea {
	/// Repository content.
	Repository,
	/// Repository metadata (settings, collaborators).
	RepositoryMetadata,
	/// Repository webhooks.
	Webhooks,
	/// User profile.
	User,
	/// Container registry content.
	Registry,
	/// Container registry metadata.
	RegistryMetadata,
}
impl PermissionArea {
	/// Returns the wire label.
	pub const fn as_str(self) -> &'static str {
		match self {
			PermissionArea::Repository => "repository",
			PermissionArea::RepositoryMetadata => "repositoryMetadata",
			PermissionArea::Webhooks => "webhooks",
			PermissionArea::User => "user",
			PermissionArea::Registry => "registry",
			PermissionArea::RegistryMetadata => "registryMetadata",
		}
	}
}
impl Display for PermissionArea {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// A single `{type, area}` requirement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Permission {
	/// Requested access level.
	#[serde(rename = "type")]
	pub kind: PermissionType,
	/// Area the access applies to.
	pub area: PermissionArea,
}
impl Permission {
	/// Creates a requirement.
	pub const fn new(kind: PermissionType, area: PermissionArea) -> Self {
		Self { kind, area }
	}
}
impl Display for Permission {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "{}:{}", self.kind, self.area)
	}
}

/// Permissions declared on a token or binding.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Permissions {
	/// Ordered provider-neutral requirements.
	pub required: Vec<Permission>,
	/// Provider-specific scopes requested verbatim.
	pub additional_scopes: Vec<String>,
}
impl Permissions {
	/// Appends a requirement.
	pub fn require(mut self, kind: PermissionType, area: PermissionArea) -> Self {
		self.required.push(Permission::new(kind, area));

		self
	}

	/// Appends a verbatim provider scope.
	pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
		self.additional_scopes.push(scope.into());

		self
	}

	/// Returns true when nothing is requested.
	pub fn is_empty(&self) -> bool {
		self.required.is_empty() && self.additional_scopes.is_empty()
	}
}
