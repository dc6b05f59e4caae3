//! Per-call-site request wrapper with observable loading and error state.
//!
//! Each [`ApiHandle`] owns its own flag and slot, so independent call sites
//! never see each other's failures. Clones of one handle share that state.

use super::{client::ApiClient, error::ApiError};
use reqwest::Method;
use serde::{de::DeserializeOwned, Serialize};
use std::{
    future::Future,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
};

#[derive(Debug, Default)]
struct HandleState {
    in_flight: AtomicUsize,
    error: Mutex<Option<String>>,
}

/// Decrements the in-flight count on every exit path, including cancellation.
struct LoadingGuard<'a>(&'a AtomicUsize);

impl<'a> LoadingGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Clone, Debug)]
pub struct ApiHandle {
    client: ApiClient,
    state: Arc<HandleState>,
}

impl ApiHandle {
    pub(crate) fn new(client: ApiClient) -> Self {
        Self {
            client,
            state: Arc::new(HandleState::default()),
        }
    }

    #[must_use]
    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// True while at least one call through this handle is pending.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state.in_flight.load(Ordering::SeqCst) > 0
    }

    /// Message captured from the most recent failed call, if any.
    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.error_slot().clone()
    }

    pub fn clear_error(&self) {
        *self.error_slot() = None;
    }

    fn error_slot(&self) -> MutexGuard<'_, Option<String>> {
        self.state
            .error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// # Errors
    /// Returns the request failure after recording its message.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.track(async {
            let builder = self.client.request(Method::GET, path)?;
            self.client.send_json(builder).await
        })
        .await
    }

    /// # Errors
    /// Returns the request failure after recording its message.
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.track(async {
            let builder = self.client.request(Method::POST, path)?.json(body);
            self.client.send_json(builder).await
        })
        .await
    }

    /// # Errors
    /// Returns the request failure after recording its message.
    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.track(async {
            let builder = self.client.request(Method::PUT, path)?.json(body);
            self.client.send_json(builder).await
        })
        .await
    }

    /// # Errors
    /// Returns the request failure after recording its message.
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.track(async {
            let builder = self.client.request(Method::DELETE, path)?;
            self.client.send_json(builder).await
        })
        .await
    }

    async fn track<T>(
        &self,
        call: impl Future<Output = Result<T, ApiError>>,
    ) -> Result<T, ApiError> {
        let _loading = LoadingGuard::enter(&self.state.in_flight);
        let result = call.await;
        if let Err(err) = &result {
            *self.error_slot() = Some(err.user_message());
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{api::ClientConfig, session::SessionStore};
    use anyhow::{anyhow, Result};
    use serde_json::{json, Value};
    use std::{net::TcpListener, time::Duration};
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn can_bind_localhost() -> bool {
        TcpListener::bind("127.0.0.1:0").is_ok()
    }

    fn client_for(server: &MockServer) -> Result<ApiClient> {
        let config = ClientConfig::new(&server.uri())?;
        Ok(ApiClient::new(config, SessionStore::in_memory())?)
    }

    #[tokio::test]
    async fn success_unwraps_body_and_resets_loading() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/exam/results"))
            .and(body_json(json!({"examId": "e1", "score": 80})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"saved": true})))
            .mount(&server)
            .await;

        let handle = client_for(&server)?.handle();
        let body: Value = handle
            .post("/api/v1/exam/results", &json!({"examId": "e1", "score": 80}))
            .await?;

        assert_eq!(body["saved"], true);
        assert!(!handle.is_loading());
        assert_eq!(handle.error(), None);
        Ok(())
    }

    #[tokio::test]
    async fn failure_records_server_message_and_rethrows() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/v1/questions/9"))
            .respond_with(
                ResponseTemplate::new(422).set_body_json(json!({"message": "Answer is required"})),
            )
            .mount(&server)
            .await;

        let handle = client_for(&server)?.handle();
        let err = handle
            .put::<_, Value>("/api/v1/questions/9", &json!({}))
            .await
            .err()
            .ok_or_else(|| anyhow!("expected error"))?;

        assert_eq!(err.status(), Some(422));
        assert_eq!(handle.error(), Some("Answer is required".to_string()));
        assert!(!handle.is_loading());

        handle.clear_error();
        assert_eq!(handle.error(), None);
        Ok(())
    }

    #[tokio::test]
    async fn handles_do_not_share_error_state() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/v1/questions/1"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Not found"})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/questions/2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 2})))
            .mount(&server)
            .await;

        let client = client_for(&server)?;
        let failing = client.handle();
        let healthy = client.handle();

        assert!(failing.delete::<Value>("/api/v1/questions/1").await.is_err());
        let body: Value = healthy.get("/api/v1/questions/2").await?;

        assert_eq!(body["id"], 2);
        assert_eq!(failing.error(), Some("Not found".to_string()));
        assert_eq!(healthy.error(), None);
        Ok(())
    }

    #[tokio::test]
    async fn loading_is_visible_while_pending() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({}))
                    .set_delay(Duration::from_millis(300)),
            )
            .mount(&server)
            .await;

        let handle = client_for(&server)?.handle();
        let observer = handle.clone();
        let call = tokio::spawn(async move { handle.get::<Value>("/slow").await });

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(observer.is_loading());

        call.await??;
        assert!(!observer.is_loading());
        Ok(())
    }

    #[tokio::test]
    async fn transport_timeout_is_reported_as_timeout() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({}))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let session = SessionStore::in_memory();
        session.set_token("abc");
        let config = ClientConfig::new(&server.uri())?.with_timeout(Duration::from_millis(50));
        let handle = ApiClient::new(config, session.clone())?.handle();

        let err = handle
            .get::<Value>("/slow")
            .await
            .err()
            .ok_or_else(|| anyhow!("expected timeout"))?;

        assert!(matches!(err, ApiError::Timeout(_)), "got {err:?}");
        assert!(session.is_authenticated());
        assert_eq!(
            handle.error(),
            Some("Request timed out. Please try again.".to_string())
        );
        assert!(!handle.is_loading());
        Ok(())
    }

    #[tokio::test]
    async fn cancelled_call_still_resets_loading() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let handle = client_for(&server)?.handle();
        let outcome =
            tokio::time::timeout(Duration::from_millis(100), handle.get::<Value>("/slow")).await;

        assert!(outcome.is_err());
        assert!(!handle.is_loading());
        Ok(())
    }
}
