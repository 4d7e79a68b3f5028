//! Scope set produced by the permission mapper.

// self
use crate::_prelude::*;

/// Deduplicated, ordered set of provider scopes.
///
/// Scopes are kept verbatim. Order of insertion is irrelevant: equality and [`ScopeSet::into_vec`]
/// both use the sorted form.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScopeSet(BTreeSet<String>);
impl ScopeSet {
	/// Number of distinct scopes.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns true if no scopes are defined.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Returns true if the set contains the provided scope.
	pub fn contains(&self, scope: &str) -> bool {
		self.0.contains(scope)
	}

	/// Consumes the set into a sorted vector.
	pub fn into_vec(self) -> Vec<String> {
		self.0.into_iter().collect()
	}
}
impl<S> FromIterator<S> for ScopeSet
where
	S: Into<String>,
{
	fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
		Self(iter.into_iter().map(Into::into).collect())
	}
}
impl<S> Extend<S> for ScopeSet
where
	S: Into<String>,
{
	fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
		self.0.extend(iter.into_iter().map(Into::into));
	}
}
