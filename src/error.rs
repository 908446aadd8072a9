//! Error taxonomy shared across the issuance, caching, and gateway layers.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Token issuance against the identity provider failed.
	#[error(transparent)]
	Issuance(#[from] IssuanceError),
	/// Local configuration problem; fatal at process start.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
}

/// Failures raised while obtaining a fresh token from the identity provider.
///
/// Issuance is attempted at most once per refresh; retrying, if wanted at all,
/// is left to the gateway re-invoking the authorizer.
#[derive(Debug, ThisError)]
pub enum IssuanceError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the token endpoint.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// The token endpoint did not answer within the configured timeout.
	#[error("Token endpoint did not respond within the configured timeout.")]
	Timeout,
	/// Provider returned a non-success response for the credential grant.
	#[error("Token endpoint rejected the request: {reason}.")]
	Rejected {
		/// Provider-supplied reason string.
		reason: String,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Token endpoint responded with malformed JSON that could not be parsed.
	#[error("Token endpoint returned malformed JSON.")]
	ResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::error::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Provider returned an unexpected but well-formed response.
	#[error("Token endpoint returned an unexpected response: {message}.")]
	Endpoint {
		/// Broker- or transport-supplied message summarizing the failure.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Token request construction failed before dispatch.
	#[error(transparent)]
	Request(#[from] oauth2::http::Error),
	/// Token endpoint response omitted `expires_in`.
	#[error("Token endpoint response is missing expires_in.")]
	MissingExpiresIn,
	/// Token endpoint returned an excessively large `expires_in`.
	#[error("The expires_in value exceeds the supported range.")]
	ExpiresInOutOfRange,
	/// Token endpoint returned a non-positive lifetime.
	#[error("The expires_in value must be positive.")]
	NonPositiveExpiresIn,
}
impl From<ReqwestError> for IssuanceError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() { Self::Timeout } else { Self::Network { source: Box::new(e) } }
	}
}

/// Configuration failures; raised once at startup, never per invocation.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Required configuration variable absent or empty.
	#[error("Configuration variable `{name}` is missing.")]
	MissingVariable {
		/// Variable name.
		name: &'static str,
	},
	/// Variable present but unusable.
	#[error("Configuration variable `{name}` is invalid: {reason}.")]
	InvalidVariable {
		/// Variable name.
		name: &'static str,
		/// Human-readable rejection reason.
		reason: String,
	},
	/// Token endpoint URL cannot be parsed.
	#[error("Token endpoint URL is invalid.")]
	InvalidEndpoint {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Configured scopes cannot be normalized.
	#[error("Configured scopes are invalid.")]
	InvalidScope(#[from] crate::auth::ScopeValidationError),
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}
