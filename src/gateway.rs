//! Gateway invocation entry point producing allow/deny responses.
//!
//! The gateway has already authenticated the inbound call; this layer only
//! decides whether the requested scope is granted and, on allow, attaches the
//! upstream bearer token from the cache. Failures surface in diagnostics and
//! never in the caller-visible response, and allow is never a fallback.

// self
use crate::{
	_prelude::*,
	auth::{Decision, ScopeAuthorizer},
	cache::TokenCache,
	config::AuthorizerConfig,
	http::TokenHttpClient,
	issuer::{IssuanceRequest, TokenIssuer},
	obs::{self, AuthSpan, DecisionReason, OpKind},
	store::{MemoryStore, TokenStore},
};

/// One inbound gateway invocation.
///
/// The transport shape is gateway-defined; only the requested-scope claim is
/// consumed here, everything else is carried through untouched.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct GatewayRequest {
	/// Scope claim extracted by the gateway from the inbound call.
	#[serde(default, alias = "scope")]
	pub requested_scope: String,
	/// Authenticated fields the backend expects to receive unchanged.
	#[serde(default, flatten)]
	pub passthrough: BTreeMap<String, String>,
}
impl GatewayRequest {
	/// Creates a request carrying the provided scope claim.
	pub fn new(requested_scope: impl Into<String>) -> Self {
		Self { requested_scope: requested_scope.into(), passthrough: BTreeMap::new() }
	}

	/// Adds a pass-through field.
	pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.passthrough.insert(key.into(), value.into());

		self
	}
}

/// Decision object returned to the gateway.
#[derive(Clone, Debug, Serialize)]
pub struct GatewayResponse {
	/// Allow/deny verdict.
	pub decision: Decision,
	/// Context forwarded to the backend.
	pub context: ResponseContext,
}
impl GatewayResponse {
	fn allow(token: String, passthrough: BTreeMap<String, String>) -> Self {
		Self {
			decision: Decision::Allow,
			context: ResponseContext { token: Some(token), passthrough },
		}
	}

	fn deny(passthrough: BTreeMap<String, String>) -> Self {
		Self { decision: Decision::Deny, context: ResponseContext { token: None, passthrough } }
	}

	/// Returns true when the invocation was allowed.
	pub fn is_allow(&self) -> bool {
		self.decision.is_allow()
	}
}

/// Pass-through context carried on the response.
///
/// The token field is structurally absent on deny: it is an `Option` skipped
/// during serialization, so no deny path can leak a token.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ResponseContext {
	/// Upstream bearer token; populated only on allow.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub token: Option<String>,
	/// Fields copied through from the inbound invocation.
	#[serde(flatten)]
	pub passthrough: BTreeMap<String, String>,
}

/// Authorization hook composing the cache manager and scope authorizer.
pub struct Authorizer {
	cache: TokenCache,
	scopes: ScopeAuthorizer,
	issuance: IssuanceRequest,
}
impl Authorizer {
	/// Builds an authorizer with a fresh in-memory token store.
	pub fn new(config: AuthorizerConfig) -> Result<Self> {
		Self::with_store(config, Arc::new(MemoryStore::default()))
	}

	/// Builds an authorizer over a caller-provided store handle.
	///
	/// Warm execution contexts hand the same store to every instance so cached
	/// tokens survive across invocations; tests inject a store to observe it.
	pub fn with_store(config: AuthorizerConfig, store: Arc<dyn TokenStore>) -> Result<Self> {
		let http_client = TokenHttpClient::with_timeout(config.http_timeout)?;

		Self::with_http_client(config, store, http_client)
	}

	/// Builds an authorizer that reuses a caller-provided HTTP client.
	///
	/// The client's own timeout configuration applies; see
	/// [`TokenHttpClient::with_client`].
	pub fn with_http_client(
		config: AuthorizerConfig,
		store: Arc<dyn TokenStore>,
		http_client: TokenHttpClient,
	) -> Result<Self> {
		let issuer = TokenIssuer::new(config.token_endpoint, config.client_auth_method, http_client)?;
		let cache = TokenCache::new(store, issuer).with_safety_margin(config.safety_margin);
		let scopes = ScopeAuthorizer::new(config.permitted_scopes, config.match_policy);
		let issuance = IssuanceRequest::new(config.client_id, config.client_secret)
			.with_scope(config.issuance_scope);

		Ok(Self { cache, scopes, issuance })
	}

	/// Handles one gateway invocation.
	///
	/// Infallible by design: every failure mode resolves to a deny response
	/// whose detail lives only in diagnostic output.
	pub async fn authorize(&self, request: GatewayRequest) -> GatewayResponse {
		let span = AuthSpan::new(OpKind::Decision, "authorize");

		span.instrument(async move {
			let GatewayRequest { requested_scope, passthrough } = request;

			if !self.scopes.authorize(&requested_scope).is_allow() {
				#[cfg(feature = "tracing")]
				tracing::info!(scope = %requested_scope, "Requested scope is not permitted.");

				obs::record_decision(Decision::Deny, DecisionReason::ScopeNotPermitted);

				return GatewayResponse::deny(passthrough);
			}

			match self.cache.valid_token(&self.issuance).await {
				Ok(token) => {
					obs::record_decision(Decision::Allow, DecisionReason::Granted);

					GatewayResponse::allow(token.value.expose().to_owned(), passthrough)
				},
				Err(error) => {
					#[cfg(feature = "tracing")]
					tracing::warn!(%error, "Token issuance failed; denying the invocation.");
					#[cfg(not(feature = "tracing"))]
					let _ = error;

					obs::record_decision(Decision::Deny, DecisionReason::IssuanceFailed);

					GatewayResponse::deny(passthrough)
				},
			}
		})
		.await
	}
}
impl Debug for Authorizer {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Authorizer")
			.field("cache", &self.cache)
			.field("permitted", self.scopes.permitted())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn requests_deserialize_from_gateway_payloads() {
		let request: GatewayRequest =
			serde_json::from_str("{\"scope\":\"read\",\"sub\":\"caller-7\"}")
				.expect("Gateway payload should deserialize.");

		assert_eq!(request.requested_scope, "read");
		assert_eq!(request.passthrough.get("sub").map(String::as_str), Some("caller-7"));
	}

	#[test]
	fn deny_responses_serialize_without_a_token_key() {
		let response = GatewayResponse::deny(BTreeMap::from([("sub".into(), "caller-7".into())]));
		let value = serde_json::to_value(&response).expect("Deny response should serialize.");

		assert_eq!(value["decision"], "DENY");
		assert_eq!(value["context"]["sub"], "caller-7");
		assert!(
			value["context"].as_object().expect("Context should be an object.").get("token").is_none(),
			"Deny responses must not carry a token field.",
		);
	}

	#[test]
	fn allow_responses_attach_the_token() {
		let response = GatewayResponse::allow("bearer-value".into(), BTreeMap::new());
		let value = serde_json::to_value(&response).expect("Allow response should serialize.");

		assert!(response.is_allow());
		assert_eq!(value["decision"], "ALLOW");
		assert_eq!(value["context"]["token"], "bearer-value");
	}
}
