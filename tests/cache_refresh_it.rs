// std
use std::sync::Arc;
// crates.io
use httpmock::prelude::*;
use time::{Duration, OffsetDateTime};
// self
use authgate::{
	auth::{CachedToken, ScopeSet},
	cache::TokenCache,
	error::{Error, IssuanceError},
	http::TokenHttpClient,
	issuer::{ClientAuthMethod, IssuanceRequest, TokenIssuer},
	store::{MemoryStore, StoreKey, TokenStore},
	url::Url,
};

const TOKEN_BODY: &str =
	"{\"access_token\":\"minted-token\",\"token_type\":\"bearer\",\"expires_in\":900}";

fn build_cache(server: &MockServer) -> (TokenCache, Arc<MemoryStore>) {
	let endpoint = Url::parse(&server.url("/token"))
		.expect("Mock token endpoint should parse successfully.");
	let http_client = TokenHttpClient::with_client(authgate::reqwest::Client::new());
	let issuer = TokenIssuer::new(endpoint, ClientAuthMethod::ClientSecretPost, http_client)
		.expect("Issuer should build for the mock endpoint.");
	let store = Arc::new(MemoryStore::default());
	let cache = TokenCache::new(store.clone(), issuer);

	(cache, store)
}

fn build_request() -> IssuanceRequest {
	let scope = ScopeSet::new(["backend.read"])
		.expect("Scope fixture should be valid for cache tests.");

	IssuanceRequest::new("cache-client", "cache-secret").with_scope(scope)
}

#[tokio::test]
async fn cold_store_issues_once_and_populates() {
	let server = MockServer::start_async().await;
	let (cache, store) = build_cache(&server);
	let request = build_request();
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200).header("content-type", "application/json").body(TOKEN_BODY);
		})
		.await;
	let token = cache
		.valid_token(&request)
		.await
		.expect("Cold-store issuance should succeed against the mock provider.");

	assert_eq!(token.value.expose(), "minted-token");

	mock.assert_calls_async(1).await;

	let stored = store
		.fetch(&StoreKey::new(&request))
		.await
		.expect("Store fetch should succeed.")
		.expect("Issuance should populate the store.");

	assert_eq!(stored.value.expose(), "minted-token");
}

#[tokio::test]
async fn issued_tokens_are_fresh_past_the_margin() {
	let server = MockServer::start_async().await;
	let (cache, _store) = build_cache(&server);
	let margin = Duration::seconds(30);
	let cache = cache.with_safety_margin(margin);
	let _mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200).header("content-type", "application/json").body(TOKEN_BODY);
		})
		.await;
	let token = cache
		.valid_token(&build_request())
		.await
		.expect("Issuance should succeed against the mock provider.");

	assert!(
		token.is_fresh_at(OffsetDateTime::now_utc(), margin),
		"Returned tokens must outlive the call by more than the safety margin.",
	);
}

#[tokio::test]
async fn fresh_store_skips_issuance() {
	let server = MockServer::start_async().await;
	let (cache, store) = build_cache(&server);
	let request = build_request();
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200).header("content-type", "application/json").body(TOKEN_BODY);
		})
		.await;
	let warm = CachedToken::with_lifetime("warm-token", OffsetDateTime::now_utc(), Duration::hours(1));

	store
		.save(StoreKey::new(&request), warm)
		.await
		.expect("Seeding the store should succeed.");

	let token = cache
		.valid_token(&request)
		.await
		.expect("Fast-path lookup should succeed without a network call.");

	assert_eq!(token.value.expose(), "warm-token");

	mock.assert_calls_async(0).await;
}

#[tokio::test]
async fn expired_token_triggers_refresh_and_replacement() {
	let server = MockServer::start_async().await;
	let (cache, store) = build_cache(&server);
	let request = build_request();
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200).header("content-type", "application/json").body(TOKEN_BODY);
		})
		.await;
	let stale = CachedToken::with_lifetime(
		"stale-token",
		OffsetDateTime::now_utc() - Duration::hours(2),
		Duration::hours(1),
	);

	store
		.save(StoreKey::new(&request), stale)
		.await
		.expect("Seeding the stale token should succeed.");

	let token = cache
		.valid_token(&request)
		.await
		.expect("Expired tokens should be refreshed transparently.");

	assert_eq!(token.value.expose(), "minted-token");

	mock.assert_calls_async(1).await;

	let stored = store
		.fetch(&StoreKey::new(&request))
		.await
		.expect("Store fetch should succeed.")
		.expect("Refresh should replace the store entry.");

	assert_eq!(stored.value.expose(), "minted-token");
}

#[tokio::test]
async fn concurrent_callers_share_one_issuance() {
	let server = MockServer::start_async().await;
	let (cache, _store) = build_cache(&server);
	let request = build_request();
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200).header("content-type", "application/json").body(TOKEN_BODY);
		})
		.await;
	let (first, second, third, fourth) = tokio::join!(
		cache.valid_token(&request),
		cache.valid_token(&request),
		cache.valid_token(&request),
		cache.valid_token(&request),
	);

	for result in [first, second, third, fourth] {
		let token = result.expect("Every concurrent caller should receive a token.");

		assert_eq!(token.value.expose(), "minted-token");
	}

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn failed_issuance_preserves_the_store() {
	let server = MockServer::start_async().await;
	let (cache, store) = build_cache(&server);
	let request = build_request();
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(500)
				.header("content-type", "application/json")
				.body("{\"error\":\"server_error\"}");
		})
		.await;
	let stale = CachedToken::with_lifetime(
		"stale-token",
		OffsetDateTime::now_utc() - Duration::hours(2),
		Duration::hours(1),
	);

	store
		.save(StoreKey::new(&request), stale)
		.await
		.expect("Seeding the stale token should succeed.");

	let err = cache
		.valid_token(&request)
		.await
		.expect_err("Provider failures should surface to the caller.");

	assert!(matches!(err, Error::Issuance(IssuanceError::Rejected { status: Some(500), .. })));

	mock.assert_calls_async(1).await;

	let stored = store
		.fetch(&StoreKey::new(&request))
		.await
		.expect("Store fetch should succeed.")
		.expect("Failed issuance must not clear the store.");

	assert_eq!(
		stored.value.expose(),
		"stale-token",
		"Failed issuance must not overwrite the prior entry.",
	);
}
