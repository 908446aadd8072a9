//! Startup configuration for the authorizer, loaded once and immutable after.

// std
use std::env;
// self
use crate::{
	_prelude::*,
	auth::{MatchPolicy, ScopeSet, TokenSecret},
	cache::TokenCache,
	error::ConfigError,
	issuer::ClientAuthMethod,
};

const ENV_TOKEN_ENDPOINT: &str = "AUTHGATE_TOKEN_ENDPOINT";
const ENV_CLIENT_ID: &str = "AUTHGATE_CLIENT_ID";
const ENV_CLIENT_SECRET: &str = "AUTHGATE_CLIENT_SECRET";
const ENV_SCOPE: &str = "AUTHGATE_SCOPE";
const ENV_PERMITTED_SCOPES: &str = "AUTHGATE_PERMITTED_SCOPES";
const ENV_MATCH_POLICY: &str = "AUTHGATE_MATCH_POLICY";
const ENV_CLIENT_AUTH_METHOD: &str = "AUTHGATE_CLIENT_AUTH_METHOD";
const ENV_SAFETY_MARGIN_SECS: &str = "AUTHGATE_SAFETY_MARGIN_SECS";
const ENV_HTTP_TIMEOUT_SECS: &str = "AUTHGATE_HTTP_TIMEOUT_SECS";

/// Immutable authorizer configuration.
///
/// Built once at process start, either programmatically through
/// [`new`](Self::new) + `with_*` helpers or from `AUTHGATE_*` environment
/// variables through [`from_env`](Self::from_env). All validation failures are
/// [`ConfigError`] values and fatal at startup; nothing here is re-evaluated
/// per invocation.
#[derive(Clone, Debug)]
pub struct AuthorizerConfig {
	/// Identity-provider token endpoint called for issuance.
	pub token_endpoint: Url,
	/// OAuth client identifier presented at the token endpoint.
	pub client_id: String,
	/// Confidential client secret.
	pub client_secret: TokenSecret,
	/// Scope requested at issuance; an empty set omits the parameter.
	pub issuance_scope: ScopeSet,
	/// Scopes the authorizer grants to inbound callers; never empty.
	pub permitted_scopes: ScopeSet,
	/// Matching strategy applied to inbound scope claims.
	pub match_policy: MatchPolicy,
	/// How client credentials are transmitted to the token endpoint.
	pub client_auth_method: ClientAuthMethod,
	/// Slack deducted from the provider-reported expiry at freshness checks.
	pub safety_margin: Duration,
	/// Upper bound on one token-endpoint call.
	pub http_timeout: Duration,
}
impl AuthorizerConfig {
	/// Default upper bound on one token-endpoint call.
	pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::seconds(10);

	/// Creates a configuration from the required fields with defaults elsewhere.
	///
	/// Fails when `permitted_scopes` is empty: a deny-all authorizer is a
	/// misconfiguration, not a policy.
	pub fn new(
		token_endpoint: Url,
		client_id: impl Into<String>,
		client_secret: impl Into<TokenSecret>,
		permitted_scopes: ScopeSet,
	) -> Result<Self, ConfigError> {
		if permitted_scopes.is_empty() {
			return Err(ConfigError::InvalidVariable {
				name: ENV_PERMITTED_SCOPES,
				reason: "at least one permitted scope is required".into(),
			});
		}

		Ok(Self {
			token_endpoint,
			client_id: client_id.into(),
			client_secret: client_secret.into(),
			issuance_scope: ScopeSet::default(),
			permitted_scopes,
			match_policy: MatchPolicy::default(),
			client_auth_method: ClientAuthMethod::default(),
			safety_margin: TokenCache::DEFAULT_SAFETY_MARGIN,
			http_timeout: Self::DEFAULT_HTTP_TIMEOUT,
		})
	}

	/// Sets the scope requested at issuance.
	pub fn with_issuance_scope(mut self, scope: ScopeSet) -> Self {
		self.issuance_scope = scope;

		self
	}

	/// Overrides the scope matching policy.
	pub fn with_match_policy(mut self, policy: MatchPolicy) -> Self {
		self.match_policy = policy;

		self
	}

	/// Overrides the client authentication method.
	pub fn with_client_auth_method(mut self, method: ClientAuthMethod) -> Self {
		self.client_auth_method = method;

		self
	}

	/// Overrides the safety margin.
	pub fn with_safety_margin(mut self, margin: Duration) -> Self {
		self.safety_margin = margin;

		self
	}

	/// Overrides the HTTP timeout.
	pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
		self.http_timeout = timeout;

		self
	}

	/// Loads configuration from `AUTHGATE_*` environment variables.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|name| env::var(name).ok())
	}

	/// Loads configuration from an arbitrary variable source.
	///
	/// The lookup indirection keeps the loader testable without mutating
	/// process-global environment state.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let token_endpoint = Url::parse(&require(&lookup, ENV_TOKEN_ENDPOINT)?)
			.map_err(|source| ConfigError::InvalidEndpoint { source })?;
		let client_id = require(&lookup, ENV_CLIENT_ID)?;
		let client_secret = require(&lookup, ENV_CLIENT_SECRET)?;
		let permitted_scopes = ScopeSet::from_str(&require(&lookup, ENV_PERMITTED_SCOPES)?)?;
		let mut config = Self::new(token_endpoint, client_id, client_secret, permitted_scopes)?;

		if let Some(raw) = lookup(ENV_SCOPE) {
			config = config.with_issuance_scope(ScopeSet::from_str(&raw)?);
		}
		if let Some(raw) = lookup(ENV_MATCH_POLICY) {
			config = config.with_match_policy(parse_match_policy(&raw)?);
		}
		if let Some(raw) = lookup(ENV_CLIENT_AUTH_METHOD) {
			config = config.with_client_auth_method(parse_client_auth_method(&raw)?);
		}
		if let Some(raw) = lookup(ENV_SAFETY_MARGIN_SECS) {
			config = config
				.with_safety_margin(parse_seconds(ENV_SAFETY_MARGIN_SECS, &raw, Bound::NonNegative)?);
		}
		if let Some(raw) = lookup(ENV_HTTP_TIMEOUT_SECS) {
			config =
				config.with_http_timeout(parse_seconds(ENV_HTTP_TIMEOUT_SECS, &raw, Bound::Positive)?);
		}

		Ok(config)
	}
}

enum Bound {
	NonNegative,
	Positive,
}

fn require<F>(lookup: &F, name: &'static str) -> Result<String, ConfigError>
where
	F: Fn(&str) -> Option<String>,
{
	lookup(name).filter(|value| !value.is_empty()).ok_or(ConfigError::MissingVariable { name })
}

fn parse_match_policy(raw: &str) -> Result<MatchPolicy, ConfigError> {
	match raw {
		"exact" => Ok(MatchPolicy::Exact),
		"hierarchical" => Ok(MatchPolicy::Hierarchical),
		_ => Err(ConfigError::InvalidVariable {
			name: ENV_MATCH_POLICY,
			reason: format!("expected `exact` or `hierarchical`, got `{raw}`"),
		}),
	}
}

fn parse_client_auth_method(raw: &str) -> Result<ClientAuthMethod, ConfigError> {
	match raw {
		"client_secret_basic" => Ok(ClientAuthMethod::ClientSecretBasic),
		"client_secret_post" => Ok(ClientAuthMethod::ClientSecretPost),
		_ => Err(ConfigError::InvalidVariable {
			name: ENV_CLIENT_AUTH_METHOD,
			reason: format!("expected `client_secret_basic` or `client_secret_post`, got `{raw}`"),
		}),
	}
}

fn parse_seconds(name: &'static str, raw: &str, bound: Bound) -> Result<Duration, ConfigError> {
	let seconds = raw.parse::<i64>().map_err(|_| ConfigError::InvalidVariable {
		name,
		reason: format!("expected an integer number of seconds, got `{raw}`"),
	})?;
	let floor = match bound {
		Bound::NonNegative => 0,
		Bound::Positive => 1,
	};

	if seconds < floor {
		return Err(ConfigError::InvalidVariable {
			name,
			reason: format!("expected a value of at least {floor}, got `{raw}`"),
		});
	}

	Ok(Duration::seconds(seconds))
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn source<'a>(overrides: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
		move |name| {
			overrides
				.iter()
				.find(|(key, _)| *key == name)
				.map(|(_, value)| (*value).to_owned())
		}
	}

	const REQUIRED: [(&str, &str); 4] = [
		(ENV_TOKEN_ENDPOINT, "https://idp.example.com/oauth2/token"),
		(ENV_CLIENT_ID, "gateway-client"),
		(ENV_CLIENT_SECRET, "shh"),
		(ENV_PERMITTED_SCOPES, "read write"),
	];

	#[test]
	fn required_variables_load_with_defaults() {
		let config = AuthorizerConfig::from_lookup(source(&REQUIRED))
			.expect("Required variables should be sufficient.");

		assert_eq!(config.token_endpoint.as_str(), "https://idp.example.com/oauth2/token");
		assert_eq!(config.client_id, "gateway-client");
		assert_eq!(config.client_secret.expose(), "shh");
		assert!(config.issuance_scope.is_empty());
		assert_eq!(config.permitted_scopes.normalized(), "read write");
		assert_eq!(config.match_policy, MatchPolicy::Exact);
		assert_eq!(config.client_auth_method, ClientAuthMethod::ClientSecretBasic);
		assert_eq!(config.safety_margin, TokenCache::DEFAULT_SAFETY_MARGIN);
		assert_eq!(config.http_timeout, AuthorizerConfig::DEFAULT_HTTP_TIMEOUT);
	}

	#[test]
	fn optional_variables_override_defaults() {
		let mut vars = REQUIRED.to_vec();

		vars.extend([
			(ENV_SCOPE, "backend.read"),
			(ENV_MATCH_POLICY, "hierarchical"),
			(ENV_CLIENT_AUTH_METHOD, "client_secret_post"),
			(ENV_SAFETY_MARGIN_SECS, "45"),
			(ENV_HTTP_TIMEOUT_SECS, "5"),
		]);

		let config = AuthorizerConfig::from_lookup(source(&vars))
			.expect("Overridden variables should load.");

		assert_eq!(config.issuance_scope.normalized(), "backend.read");
		assert_eq!(config.match_policy, MatchPolicy::Hierarchical);
		assert_eq!(config.client_auth_method, ClientAuthMethod::ClientSecretPost);
		assert_eq!(config.safety_margin, Duration::seconds(45));
		assert_eq!(config.http_timeout, Duration::seconds(5));
	}

	#[test]
	fn missing_and_empty_variables_are_rejected() {
		let missing_secret: Vec<_> =
			REQUIRED.iter().copied().filter(|(key, _)| *key != ENV_CLIENT_SECRET).collect();
		let err = AuthorizerConfig::from_lookup(source(&missing_secret))
			.expect_err("Missing secret must be rejected.");

		assert!(matches!(err, ConfigError::MissingVariable { name: ENV_CLIENT_SECRET }));

		let mut empty_id = REQUIRED.to_vec();

		empty_id[1] = (ENV_CLIENT_ID, "");

		let err = AuthorizerConfig::from_lookup(source(&empty_id))
			.expect_err("Empty client id must be rejected.");

		assert!(matches!(err, ConfigError::MissingVariable { name: ENV_CLIENT_ID }));
	}

	#[test]
	fn invalid_values_are_rejected() {
		let mut bad_endpoint = REQUIRED.to_vec();

		bad_endpoint[0] = (ENV_TOKEN_ENDPOINT, "not a url");

		assert!(matches!(
			AuthorizerConfig::from_lookup(source(&bad_endpoint)),
			Err(ConfigError::InvalidEndpoint { .. })
		));

		let mut bad_policy = REQUIRED.to_vec();

		bad_policy.push((ENV_MATCH_POLICY, "fuzzy"));

		assert!(matches!(
			AuthorizerConfig::from_lookup(source(&bad_policy)),
			Err(ConfigError::InvalidVariable { name: ENV_MATCH_POLICY, .. })
		));

		let mut bad_margin = REQUIRED.to_vec();

		bad_margin.push((ENV_SAFETY_MARGIN_SECS, "-3"));

		assert!(matches!(
			AuthorizerConfig::from_lookup(source(&bad_margin)),
			Err(ConfigError::InvalidVariable { name: ENV_SAFETY_MARGIN_SECS, .. })
		));

		let mut zero_timeout = REQUIRED.to_vec();

		zero_timeout.push((ENV_HTTP_TIMEOUT_SECS, "0"));

		assert!(matches!(
			AuthorizerConfig::from_lookup(source(&zero_timeout)),
			Err(ConfigError::InvalidVariable { name: ENV_HTTP_TIMEOUT_SECS, .. })
		));
	}

	#[test]
	fn empty_permitted_scopes_are_a_configuration_error() {
		let endpoint = Url::parse("https://idp.example.com/oauth2/token")
			.expect("Endpoint fixture should parse.");
		let err = AuthorizerConfig::new(endpoint, "client", "secret", ScopeSet::default())
			.expect_err("Empty permitted set must be rejected.");

		assert!(matches!(err, ConfigError::InvalidVariable { name: ENV_PERMITTED_SCOPES, .. }));
	}
}
