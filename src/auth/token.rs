//! Cached bearer-token record and its redacting secret wrapper.

// self
use crate::_prelude::*;

/// Redacted token secret wrapper keeping sensitive material out of logs.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl AsRef<str> for TokenSecret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl From<String> for TokenSecret {
	fn from(value: String) -> Self {
		Self(value)
	}
}
impl From<&str> for TokenSecret {
	fn from(value: &str) -> Self {
		Self(value.to_owned())
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TokenSecret").field(&"<redacted>").finish()
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// Bearer token held in the process-lifetime cache.
///
/// A record is only ever created by a successful issuance call and is
/// invalidated by time alone; there is no explicit destroy. `expires_at` is the
/// provider-reported instant, and every freshness check deducts the configured
/// safety margin so the token is never raced against server-side expiry.
#[derive(Clone, Debug)]
pub struct CachedToken {
	/// Opaque bearer value presented to the upstream backend.
	pub value: TokenSecret,
	/// Instant the issuance call was dispatched.
	pub issued_at: OffsetDateTime,
	/// Provider-reported expiry instant.
	pub expires_at: OffsetDateTime,
}
impl CachedToken {
	/// Creates a record with an absolute expiry instant.
	pub fn new(
		value: impl Into<TokenSecret>,
		issued_at: OffsetDateTime,
		expires_at: OffsetDateTime,
	) -> Self {
		Self { value: value.into(), issued_at, expires_at }
	}

	/// Creates a record expiring `lifetime` after the issuance instant.
	pub fn with_lifetime(
		value: impl Into<TokenSecret>,
		issued_at: OffsetDateTime,
		lifetime: Duration,
	) -> Self {
		Self::new(value, issued_at, issued_at + lifetime)
	}

	/// True when the token remains usable at `instant` with `margin` of slack
	/// deducted from the provider-reported expiry.
	pub fn is_fresh_at(&self, instant: OffsetDateTime, margin: Duration) -> bool {
		self.expires_at - margin > instant
	}
}
