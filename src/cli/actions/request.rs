use crate::cli::globals::GlobalArgs;
use anyhow::{Context, Result};
use serde_json::Value;
use tracing::warn;

/// Handle the get action
///
/// # Errors
/// Returns an error if the request fails; a `401` also clears the stored session.
pub async fn get(globals: &GlobalArgs, path: &str) -> Result<()> {
    let client = globals.client(globals.session())?;
    let handle = client.handle();

    match handle.get::<Value>(path).await {
        Ok(body) => {
            println!("{}", serde_json::to_string_pretty(&body)?);
            Ok(())
        }
        Err(err) => {
            if err.is_unauthorized() {
                warn!("session expired or rejected; log in again");
            }
            Err(err).with_context(|| {
                format!(
                    "GET {path} failed: {}",
                    handle.error().unwrap_or_default()
                )
            })
        }
    }
}
