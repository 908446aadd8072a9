//! Storage contract and built-in backend for cached upstream tokens.

pub mod memory;

pub use memory::MemoryStore;

// self
use crate::{_prelude::*, auth::CachedToken, issuer::IssuanceRequest};

/// Boxed future returned by [`TokenStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Storage backend contract for cached tokens.
///
/// Slots are partitioned by credential identity and requested scope so one warm
/// context can serve several upstream audiences; each slot holds at most one
/// token. `save` replaces unconditionally: writers only run after independently
/// confirming staleness, so last writer wins is safe.
pub trait TokenStore
where
	Self: Send + Sync,
{
	/// Persists or replaces the token held for the provided key.
	fn save(&self, key: StoreKey, token: CachedToken) -> StoreFuture<'_, ()>;

	/// Fetches the token held for the provided key, if present.
	fn fetch<'a>(&'a self, key: &'a StoreKey) -> StoreFuture<'a, Option<CachedToken>>;
}

/// Error type produced by [`TokenStore`] implementations.
///
/// The in-memory backend never fails; the variant exists for external backends
/// behind the same trait.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum StoreError {
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// Unique key identifying a cached-token slot.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StoreKey {
	/// Client identifier the slot's token was issued for.
	pub client_id: String,
	/// Fingerprint of the scope requested at issuance.
	pub scope_fingerprint: String,
}
impl StoreKey {
	/// Builds the key for an issuance request's credential identity and scope.
	pub fn new(request: &IssuanceRequest) -> Self {
		Self {
			client_id: request.client_id.clone(),
			scope_fingerprint: request.scope.fingerprint(),
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::auth::ScopeSet;

	#[test]
	fn store_key_is_stable_across_scope_orderings() {
		let scope_a =
			ScopeSet::new(["profile", "email"]).expect("First scope fixture should be valid.");
		let scope_b =
			ScopeSet::new(["email", "profile"]).expect("Second scope fixture should be valid.");
		let key_a = StoreKey::new(&IssuanceRequest::new("client-1", "secret").with_scope(scope_a));
		let key_b = StoreKey::new(&IssuanceRequest::new("client-1", "secret").with_scope(scope_b));

		assert_eq!(key_a, key_b);
	}

	#[test]
	fn store_key_partitions_by_credential_and_scope() {
		let scoped = StoreKey::new(
			&IssuanceRequest::new("client-1", "secret").with_scope(
				ScopeSet::new(["email"]).expect("Scope fixture should be valid."),
			),
		);
		let unscoped = StoreKey::new(&IssuanceRequest::new("client-1", "secret"));
		let other_client = StoreKey::new(&IssuanceRequest::new("client-2", "secret"));

		assert_ne!(scoped, unscoped);
		assert_ne!(unscoped, other_client);
	}
}
