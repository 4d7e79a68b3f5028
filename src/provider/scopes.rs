//! Required-scope computation shared by every provider.

// self
use crate::{
	api::{Permission, Permissions},
	token::ScopeSet,
};

/// Union of `translate` applied to every required permission plus the additional scopes.
///
/// The result is deduplicated and order-independent; `translate` may expand one permission into
/// several provider scopes. Scopes are taken verbatim.
pub fn get_all_scopes<F>(translate: F, permissions: &Permissions) -> ScopeSet
where
	F: Fn(&Permission) -> Vec<String>,
{
	let mut scopes = permissions.required.iter().flat_map(&translate).collect::<ScopeSet>();

	scopes.extend(permissions.additional_scopes.iter().cloned());

	scopes
}
