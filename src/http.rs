//! Reqwest transport for token-endpoint calls with response-status capture.
//!
//! The issuer hands each exchange an [`InstrumentedHandle`] tied to a
//! [`StatusSlot`]; the handle records the HTTP status of the response (or error)
//! so issuance failures can be classified with the status attached. The slot is
//! drained before every dispatch so stale statuses never leak across calls.

// crates.io
use oauth2::{AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse};
// self
use crate::{_prelude::*, error::ConfigError};

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one
/// place. Token requests do not follow redirects, matching OAuth 2.0 guidance
/// that token endpoints return results directly instead of delegating to
/// another URI.
#[derive(Clone, Default)]
pub struct TokenHttpClient(ReqwestClient);
impl TokenHttpClient {
	/// Builds a client enforcing `timeout` on every token-endpoint call.
	pub fn with_timeout(timeout: Duration) -> Result<Self, ConfigError> {
		let timeout = std::time::Duration::try_from(timeout).map_err(ConfigError::http_client_build)?;
		let client = ReqwestClient::builder()
			.timeout(timeout)
			.redirect(reqwest::redirect::Policy::none())
			.build()?;

		Ok(Self(client))
	}

	/// Wraps an existing [`ReqwestClient`]. The caller is responsible for
	/// configuring a request timeout and disabling redirect following.
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds an instrumented handle that records statuses in `slot`.
	pub(crate) fn instrumented(&self, slot: StatusSlot) -> InstrumentedHandle {
		InstrumentedHandle { client: self.0.clone(), slot }
	}
}
impl AsRef<ReqwestClient> for TokenHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}

/// Thread-safe slot capturing the HTTP status of the most recent token call.
#[derive(Clone, Debug, Default)]
pub struct StatusSlot(Arc<Mutex<Option<u16>>>);
impl StatusSlot {
	/// Stores the status observed for the current request.
	pub fn store(&self, status: u16) {
		*self.0.lock() = Some(status);
	}

	/// Returns the captured status, if any, consuming it from the slot.
	pub fn take(&self) -> Option<u16> {
		self.0.lock().take()
	}
}

/// [`AsyncHttpClient`] adapter dispatching through reqwest while publishing the
/// response status to its [`StatusSlot`].
#[derive(Clone)]
pub(crate) struct InstrumentedHandle {
	client: ReqwestClient,
	slot: StatusSlot,
}
impl<'c> AsyncHttpClient<'c> for InstrumentedHandle {
	type Error = HttpClientError<ReqwestError>;
	type Future = Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		let client = self.client.clone();
		let slot = self.slot.clone();

		Box::pin(async move {
			slot.take();

			let response =
				client.execute(request.try_into().map_err(Box::new)?).await.map_err(Box::new)?;
			let status = response.status();
			let headers = response.headers().to_owned();

			slot.store(status.as_u16());

			let mut response_new =
				HttpResponse::new(response.bytes().await.map_err(Box::new)?.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}
