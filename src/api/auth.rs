//! Authentication endpoints. Login results are applied to the session through a
//! [`SessionTicket`](crate::session::SessionTicket), so a login that finishes
//! after a newer logout or login never overwrites it. Passwords and tokens must
//! never be logged.

use super::{client::ApiClient, error::ApiError};
use crate::session::{SessionTicket, UserProfile};
use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

const TOKEN_PATH: &str = "/api/v1/token";
const LOGIN_PATH: &str = "/api/v1/login";
const REGISTER_PATH: &str = "/api/v1/register";

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    user: Option<UserProfile>,
}

#[derive(Serialize)]
struct Credentials<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct RegisterResponse {
    pub message: String,
    pub user_id: i64,
}

/// What happened to the session after a successful login call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoginOutcome {
    /// The token was stored and is now in effect.
    Applied,
    /// The session changed while the call was in flight; the token was dropped.
    Superseded,
}

/// Logs in with the OAuth2 password form and stores the issued token.
///
/// # Errors
/// Returns the request failure. A `401` here also clears any previous session.
#[instrument(skip(client, password))]
pub async fn login(
    client: &ApiClient,
    username: &str,
    password: &SecretString,
) -> Result<LoginOutcome, ApiError> {
    let ticket = client.session().begin_mutation();
    let form = Credentials {
        username: username.trim(),
        password: password.expose_secret(),
    };
    let builder = client.request(Method::POST, TOKEN_PATH)?.form(&form);
    let response: TokenResponse = client.send_json(builder).await?;

    Ok(apply(client, ticket, response))
}

/// Logs in through the JSON endpoint and stores the issued token.
///
/// # Errors
/// Returns the request failure. A `401` here also clears any previous session.
#[instrument(skip(client, password))]
pub async fn login_json(
    client: &ApiClient,
    username: &str,
    password: &SecretString,
) -> Result<LoginOutcome, ApiError> {
    let ticket = client.session().begin_mutation();
    let body = Credentials {
        username: username.trim(),
        password: password.expose_secret(),
    };
    let builder = client.request(Method::POST, LOGIN_PATH)?.json(&body);
    let response: TokenResponse = client.send_json(builder).await?;

    Ok(apply(client, ticket, response))
}

/// Creates an account. The backend takes the fields as query parameters and
/// does not log the user in.
///
/// # Errors
/// Returns `ApiError::Config` for blank fields, or the request failure.
#[instrument(skip(client, password))]
pub async fn register(
    client: &ApiClient,
    username: &str,
    password: &SecretString,
    email: &str,
) -> Result<RegisterResponse, ApiError> {
    let username = username.trim();
    let email = email.trim();
    if username.is_empty() || email.is_empty() || password.expose_secret().is_empty() {
        return Err(ApiError::Config(
            "Username, password and email are required.".to_string(),
        ));
    }

    let builder = client.request(Method::POST, REGISTER_PATH)?.query(&[
        ("username", username),
        ("password", password.expose_secret()),
        ("email", email),
    ]);
    let response: RegisterResponse = client.send_json(builder).await?;
    info!(user_id = response.user_id, "account registered");
    Ok(response)
}

/// Ends the session locally. The API keeps no server-side session to revoke.
pub fn logout(client: &ApiClient) {
    client.session().clear_token();
}

fn apply(
    client: &ApiClient,
    ticket: SessionTicket,
    response: TokenResponse,
) -> LoginOutcome {
    if let Some(kind) = response.token_type.as_deref() {
        if !kind.eq_ignore_ascii_case("bearer") {
            debug!(token_type = kind, "unexpected token type, storing as bearer");
        }
    }

    let applied = client.session().establish_with_ticket(
        ticket,
        SecretString::from(response.access_token),
        response.user,
    );

    if applied {
        info!("login succeeded");
        LoginOutcome::Applied
    } else {
        info!("login result superseded by a newer session change");
        LoginOutcome::Superseded
    }
}
