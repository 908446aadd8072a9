//! Thread-safe in-memory [`TokenStore`] shared across warm invocations.

// self
use crate::{
	_prelude::*,
	auth::CachedToken,
	store::{StoreError, StoreFuture, StoreKey, TokenStore},
};

type StoreMap = Arc<RwLock<HashMap<StoreKey, CachedToken>>>;

/// Process-lifetime storage backend keeping tokens in memory.
///
/// Clones share the same underlying map, so a single value handed to several
/// authorizer instances behaves as one warm cache.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(StoreMap);
impl MemoryStore {
	fn save_now(map: StoreMap, key: StoreKey, token: CachedToken) -> Result<(), StoreError> {
		map.write().insert(key, token);

		Ok(())
	}

	fn fetch_now(map: StoreMap, key: StoreKey) -> Option<CachedToken> {
		map.read().get(&key).cloned()
	}
}
impl TokenStore for MemoryStore {
	fn save(&self, key: StoreKey, token: CachedToken) -> StoreFuture<'_, ()> {
		let map = self.0.clone();

		Box::pin(async move { Self::save_now(map, key, token) })
	}

	fn fetch<'a>(&'a self, key: &'a StoreKey) -> StoreFuture<'a, Option<CachedToken>> {
		let map = self.0.clone();
		let key = key.to_owned();

		Box::pin(async move { Ok(Self::fetch_now(map, key)) })
	}
}
