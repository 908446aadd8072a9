//! Client-credentials token issuance against the identity provider.

// crates.io
use oauth2::{
	AuthType, ClientId, ClientSecret, EndpointNotSet, EndpointSet, HttpClientError,
	RequestTokenError, Scope, TokenResponse, TokenUrl,
	basic::{BasicClient, BasicErrorResponse, BasicRequestTokenError},
};
// self
use crate::{
	_prelude::*,
	auth::{CachedToken, ScopeSet, TokenSecret},
	error::{ConfigError, IssuanceError},
	http::{StatusSlot, TokenHttpClient},
};

type ConfiguredTokenClient =
	BasicClient<EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// Client-credential material and requested scope for issuance calls.
///
/// Loaded once from configuration at process start and immutable thereafter.
#[derive(Clone, Debug)]
pub struct IssuanceRequest {
	/// OAuth client identifier.
	pub client_id: String,
	/// Confidential client secret.
	pub client_secret: TokenSecret,
	/// Scope requested at the token endpoint; an empty set omits the parameter.
	pub scope: ScopeSet,
}
impl IssuanceRequest {
	/// Creates a request for the provided credential pair with no scope.
	pub fn new(client_id: impl Into<String>, client_secret: impl Into<TokenSecret>) -> Self {
		Self {
			client_id: client_id.into(),
			client_secret: client_secret.into(),
			scope: ScopeSet::default(),
		}
	}

	/// Sets the scope requested at issuance.
	pub fn with_scope(mut self, scope: ScopeSet) -> Self {
		self.scope = scope;

		self
	}
}

/// How client credentials are presented to the token endpoint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ClientAuthMethod {
	#[default]
	/// HTTP Basic with `client_id`/`client_secret`.
	ClientSecretBasic,
	/// Form POST body parameters for `client_id`/`client_secret`.
	ClientSecretPost,
}

/// Performs the network exchange that mints fresh bearer tokens.
///
/// One synchronous-looking call per invocation of [`issue`](Self::issue), no
/// retries; the request timeout belongs to the [`TokenHttpClient`] the issuer
/// was built with.
pub struct TokenIssuer {
	token_url: TokenUrl,
	auth_method: ClientAuthMethod,
	http_client: TokenHttpClient,
}
impl TokenIssuer {
	/// Creates an issuer for the provided token endpoint.
	pub fn new(
		token_endpoint: Url,
		auth_method: ClientAuthMethod,
		http_client: TokenHttpClient,
	) -> Result<Self, ConfigError> {
		let token_url = TokenUrl::new(token_endpoint.to_string())
			.map_err(|source| ConfigError::InvalidEndpoint { source })?;

		Ok(Self { token_url, auth_method, http_client })
	}

	/// Exchanges the configured credentials for a fresh token.
	///
	/// `issued_at` is stamped before dispatch, so the computed expiry is a
	/// conservative bound even when the provider responds slowly.
	pub async fn issue(&self, request: &IssuanceRequest) -> Result<CachedToken, IssuanceError> {
		let oauth_client = self.oauth_client(request);
		let slot = StatusSlot::default();
		let handle = self.http_client.instrumented(slot.clone());
		let mut exchange = oauth_client.exchange_client_credentials();

		for scope in request.scope.iter() {
			exchange = exchange.add_scope(Scope::new(scope.to_owned()));
		}

		let issued_at = OffsetDateTime::now_utc();
		let response = exchange
			.request_async(&handle)
			.await
			.map_err(|err| map_request_error(err, slot.take()))?;
		let lifetime = response.expires_in().ok_or(IssuanceError::MissingExpiresIn)?.as_secs();
		let lifetime = i64::try_from(lifetime).map_err(|_| IssuanceError::ExpiresInOutOfRange)?;

		if lifetime <= 0 {
			return Err(IssuanceError::NonPositiveExpiresIn);
		}

		Ok(CachedToken::with_lifetime(
			response.access_token().secret().to_owned(),
			issued_at,
			Duration::seconds(lifetime),
		))
	}

	fn oauth_client(&self, request: &IssuanceRequest) -> ConfiguredTokenClient {
		let mut oauth_client = BasicClient::new(ClientId::new(request.client_id.clone()))
			.set_client_secret(ClientSecret::new(request.client_secret.expose().to_owned()))
			.set_token_uri(self.token_url.clone());

		if matches!(self.auth_method, ClientAuthMethod::ClientSecretPost) {
			oauth_client = oauth_client.set_auth_type(AuthType::RequestBody);
		}

		oauth_client
	}
}
impl Debug for TokenIssuer {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenIssuer")
			.field("token_url", &self.token_url)
			.field("auth_method", &self.auth_method)
			.finish()
	}
}

fn map_request_error(
	err: BasicRequestTokenError<HttpClientError<ReqwestError>>,
	status: Option<u16>,
) -> IssuanceError {
	match err {
		RequestTokenError::ServerResponse(response) =>
			IssuanceError::Rejected { reason: rejection_reason(&response), status },
		RequestTokenError::Request(error) => map_transport_error(error),
		RequestTokenError::Parse(source, _body) => IssuanceError::ResponseParse { source, status },
		RequestTokenError::Other(message) => IssuanceError::Endpoint { message, status },
	}
}

fn rejection_reason(response: &BasicErrorResponse) -> String {
	match response.error_description() {
		Some(description) => description.clone(),
		None => response.error().as_ref().to_owned(),
	}
}

fn map_transport_error(err: HttpClientError<ReqwestError>) -> IssuanceError {
	match err {
		HttpClientError::Reqwest(inner) => IssuanceError::from(*inner),
		HttpClientError::Http(inner) => IssuanceError::Request(inner),
		HttpClientError::Io(inner) => IssuanceError::Network { source: Box::new(inner) },
		HttpClientError::Other(message) => IssuanceError::Endpoint { message, status: None },
		_ => IssuanceError::Endpoint {
			message: "HTTP client error occurred while calling the token endpoint.".into(),
			status: None,
		},
	}
}
