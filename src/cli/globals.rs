use crate::{
    api::{ApiClient, ClientConfig},
    session::{FileStorage, SessionStore},
};
use anyhow::{Context, Result};
use std::{path::PathBuf, sync::Arc, time::Duration};

/// Options shared by every subcommand.
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub api_url: String,
    pub state_file: PathBuf,
    pub timeout: Duration,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(api_url: String, state_file: PathBuf) -> Self {
        Self {
            api_url,
            state_file,
            timeout: crate::api::DEFAULT_TIMEOUT,
        }
    }

    /// Opens the persisted session and hydrates it.
    #[must_use]
    pub fn session(&self) -> SessionStore {
        let store = SessionStore::new(Arc::new(FileStorage::new(&self.state_file)));
        store.initialize();
        store
    }

    /// Builds the API client bound to `session`.
    ///
    /// # Errors
    /// Returns an error if the API URL is invalid or the HTTP client cannot be built.
    pub fn client(&self, session: SessionStore) -> Result<ApiClient> {
        let config = ClientConfig::new(&self.api_url)
            .with_context(|| format!("invalid --api-url: {}", self.api_url))?
            .with_timeout(self.timeout);
        ApiClient::new(config, session).context("failed to build API client")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_global_args() -> Result<()> {
        let dir = std::env::temp_dir().join(format!("studyhub-globals-{}", Uuid::new_v4()));
        let args = GlobalArgs::new(
            "http://localhost:8111".to_string(),
            dir.join("session.json"),
        );
        assert_eq!(args.timeout, crate::api::DEFAULT_TIMEOUT);

        let session = args.session();
        assert!(!session.is_authenticated());

        let client = args.client(session)?;
        assert_eq!(client.config().base_url.as_str(), "http://localhost:8111/");
        Ok(())
    }

    #[test]
    fn test_global_args_rejects_bad_url() -> Result<()> {
        let dir = std::env::temp_dir().join(format!("studyhub-globals-{}", Uuid::new_v4()));
        let args = GlobalArgs::new("localhost".to_string(), dir.join("session.json"));
        let err = args
            .client(args.session())
            .err()
            .ok_or_else(|| anyhow::anyhow!("expected error"))?;
        assert!(err.to_string().contains("invalid --api-url"));
        Ok(())
    }
}
