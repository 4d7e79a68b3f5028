//! Object metadata, keys, and label selectors.

// self
use crate::_prelude::*;

/// Namespace + name pair addressing a namespaced object.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectKey {
	/// Object namespace.
	pub namespace: String,
	/// Object name.
	pub name: String,
}
impl ObjectKey {
	/// Creates a key for the provided namespace and name.
	pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
		Self { namespace: namespace.into(), name: name.into() }
	}
}
impl Display for ObjectKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "{}/{}", self.namespace, self.name)
	}
}

/// Standard object metadata shared by every resource kind.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ObjectMeta {
	/// Object name, unique within the namespace.
	pub name: String,
	/// Prefix used to generate a unique name when `name` is empty.
	pub generate_name: String,
	/// Object namespace.
	pub namespace: String,
	/// Cluster-assigned unique identifier.
	pub uid: String,
	/// Optimistic concurrency token; bumped on every write.
	pub resource_version: u64,
	/// Creation instant recorded by the cluster.
	pub creation_timestamp: Option<OffsetDateTime>,
	/// Deletion request instant; set while finalizers are still pending.
	pub deletion_timestamp: Option<OffsetDateTime>,
	/// Labels used for selection.
	pub labels: BTreeMap<String, String>,
	/// Named guards that must be removed before deletion completes.
	pub finalizers: Vec<String>,
}
impl ObjectMeta {
	/// Creates metadata for a named object.
	pub fn named(namespace: impl Into<String>, name: impl Into<String>) -> Self {
		Self { name: name.into(), namespace: namespace.into(), ..Default::default() }
	}

	/// Creates metadata that asks the cluster to generate a name from `prefix`.
	pub fn generated(namespace: impl Into<String>, prefix: impl Into<String>) -> Self {
		Self { generate_name: prefix.into(), namespace: namespace.into(), ..Default::default() }
	}

	/// Namespace/name key addressing the object.
	pub fn key(&self) -> ObjectKey {
		ObjectKey::new(&self.namespace, &self.name)
	}

	/// Returns true if the finalizer is attached.
	pub fn has_finalizer(&self, finalizer: &str) -> bool {
		self.finalizers.iter().any(|f| f == finalizer)
	}

	/// Attaches the finalizer; returns true if it was missing.
	pub fn add_finalizer(&mut self, finalizer: &str) -> bool {
		if self.has_finalizer(finalizer) {
			return false;
		}

		self.finalizers.push(finalizer.to_owned());

		true
	}

	/// Removes the finalizer; returns true if it was present.
	pub fn remove_finalizer(&mut self, finalizer: &str) -> bool {
		let before = self.finalizers.len();

		self.finalizers.retain(|f| f != finalizer);

		before != self.finalizers.len()
	}

	/// Returns the label value, if set.
	pub fn label(&self, key: &str) -> Option<&str> {
		self.labels.get(key).map(String::as_str)
	}
}

/// Equality-based label selector; an empty selector matches everything.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LabelSelector(BTreeMap<String, String>);
impl LabelSelector {
	/// Selector matching every object.
	pub fn everything() -> Self {
		Self::default()
	}

	/// Adds a `key=value` requirement.
	pub fn matching(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.0.insert(key.into(), value.into());

		self
	}

	/// Returns true when every requirement is met by the labels.
	pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
		self.0.iter().all(|(k, v)| labels.get(k) == Some(v))
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn finalizers_are_added_once_and_removed() {
		let mut meta = ObjectMeta::named("default", "token");

		assert!(meta.add_finalizer("a"));
		assert!(!meta.add_finalizer("a"));
		assert!(meta.add_finalizer("b"));
		assert_eq!(meta.finalizers, vec!["a".to_string(), "b".to_string()]);
		assert!(meta.remove_finalizer("a"));
		assert!(!meta.remove_finalizer("a"));
		assert!(!meta.has_finalizer("a"));
		assert!(meta.has_finalizer("b"));
	}

	#[test]
	fn selector_requires_every_label() {
		let labels = BTreeMap::from([
			("app".to_string(), "web".to_string()),
			("tier".to_string(), "front".to_string()),
		]);

		assert!(LabelSelector::everything().matches(&labels));
		assert!(LabelSelector::everything().matching("app", "web").matches(&labels));
		assert!(
			!LabelSelector::everything()
				.matching("app", "web")
				.matching("tier", "back")
				.matches(&labels)
		);
		assert!(!LabelSelector::everything().matching("missing", "x").matches(&BTreeMap::new()));
	}

	#[test]
	fn key_displays_namespace_and_name() {
		assert_eq!(ObjectKey::new("ns", "obj").to_string(), "ns/obj");
		assert_eq!(ObjectMeta::named("ns", "obj").key(), ObjectKey::new("ns", "obj"));
	}
}
