//! Demonstrates wiring the authorizer against a mock identity provider and
//! reusing the warm token cache across gateway invocations.

// crates.io
use httpmock::prelude::*;
use url::Url;
// self
use authgate::{
	auth::ScopeSet,
	config::AuthorizerConfig,
	gateway::{Authorizer, GatewayRequest},
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"demo-access\",\"token_type\":\"bearer\",\"expires_in\":900}",
			);
		})
		.await;
	let config = AuthorizerConfig::new(
		Url::parse(&server.url("/token"))?,
		"demo-client",
		"demo-secret",
		ScopeSet::new(["read", "write"])?,
	)?;
	let authorizer = Authorizer::new(config)?;
	let allowed = authorizer.authorize(GatewayRequest::new("read")).await;
	let cached = authorizer.authorize(GatewayRequest::new("write")).await;
	let denied = authorizer.authorize(GatewayRequest::new("delete")).await;

	println!("read   -> {} (token attached: {})", allowed.decision, allowed.context.token.is_some());
	println!("write  -> {} (token attached: {})", cached.decision, cached.context.token.is_some());
	println!("delete -> {} (token attached: {})", denied.decision, denied.context.token.is_some());

	// Both allowed invocations shared one issuance call.
	token_mock.assert_async().await;

	Ok(())
}
