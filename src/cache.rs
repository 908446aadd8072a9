//! Cache manager driving the single-flight token refresh protocol.
//!
//! Every invocation asks [`TokenCache::valid_token`] for a usable bearer token.
//! The fast path is a plain store read that must dominate in steady state; only
//! when the held token is missing or inside the safety margin does a caller
//! take the per-credential refresh guard, re-check the store, and drive one
//! issuance call whose result every waiter reuses. Failed issuance leaves the
//! store untouched.

// self
use crate::{
	_prelude::*,
	auth::CachedToken,
	issuer::{IssuanceRequest, TokenIssuer},
	obs::{self, AuthSpan, OpKind, OpOutcome},
	store::{StoreKey, TokenStore},
};

/// Process-lifetime token cache with bounded concurrent refresh.
///
/// The store and the guard map are the only shared mutable state in the
/// system; both live behind this handle so a warm execution context can pass
/// one cache to every invocation.
pub struct TokenCache {
	store: Arc<dyn TokenStore>,
	issuer: TokenIssuer,
	safety_margin: Duration,
	refresh_guards: Mutex<HashMap<StoreKey, Arc<AsyncMutex<()>>>>,
}
impl TokenCache {
	/// Default slack deducted from the provider-reported expiry before a token
	/// counts as stale. Generous on purpose; clock skew between the margin
	/// computation and actual use is tolerated in seconds, not milliseconds.
	pub const DEFAULT_SAFETY_MARGIN: Duration = Duration::seconds(30);

	/// Creates a cache over the provided store handle and issuer.
	pub fn new(store: Arc<dyn TokenStore>, issuer: TokenIssuer) -> Self {
		Self {
			store,
			issuer,
			safety_margin: Self::DEFAULT_SAFETY_MARGIN,
			refresh_guards: Mutex::default(),
		}
	}

	/// Overrides the safety margin; negative values clamp to zero.
	pub fn with_safety_margin(mut self, margin: Duration) -> Self {
		self.safety_margin = if margin.is_negative() { Duration::ZERO } else { margin };

		self
	}

	/// Returns a token guaranteed fresh past the safety margin, driving at most
	/// one issuance call even under concurrent callers.
	pub async fn valid_token(&self, request: &IssuanceRequest) -> Result<CachedToken> {
		let span = AuthSpan::new(OpKind::Issuance, "valid_token");

		span.instrument(async move {
			let key = StoreKey::new(request);

			if let Some(current) = self.fetch_fresh(&key).await? {
				return Ok(current);
			}

			let guard = self.refresh_guard(&key);
			let _flight = guard.lock().await;

			// A refresh that completed while waiting on the guard serves every
			// caller that queued behind it.
			if let Some(current) = self.fetch_fresh(&key).await? {
				return Ok(current);
			}

			obs::record_issuance_outcome(OpOutcome::Attempt);

			let token = match self.issuer.issue(request).await {
				Ok(token) => {
					obs::record_issuance_outcome(OpOutcome::Success);

					token
				},
				Err(err) => {
					obs::record_issuance_outcome(OpOutcome::Failure);

					return Err(err.into());
				},
			};

			self.store.save(key, token.clone()).await?;

			Ok(token)
		})
		.await
	}

	async fn fetch_fresh(&self, key: &StoreKey) -> Result<Option<CachedToken>> {
		let now = OffsetDateTime::now_utc();

		Ok(self
			.store
			.fetch(key)
			.await?
			.filter(|token| token.is_fresh_at(now, self.safety_margin)))
	}

	/// Returns (and creates on demand) the refresh guard for a store key.
	fn refresh_guard(&self, key: &StoreKey) -> Arc<AsyncMutex<()>> {
		let mut guards = self.refresh_guards.lock();

		guards.entry(key.clone()).or_insert_with(|| Arc::new(AsyncMutex::new(()))).clone()
	}
}
impl Debug for TokenCache {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenCache")
			.field("issuer", &self.issuer)
			.field("safety_margin", &self.safety_margin)
			.finish()
	}
}
