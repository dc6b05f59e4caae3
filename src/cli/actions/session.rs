use crate::{
    api::auth::{self, LoginOutcome},
    cli::globals::GlobalArgs,
    session::SessionStore,
};
use anyhow::{Context, Result};
use secrecy::SecretString;

#[derive(Debug)]
pub struct LoginArgs {
    pub username: String,
    pub password: SecretString,
    /// Use the JSON endpoint instead of the OAuth2 password form.
    pub json: bool,
}

#[derive(Debug)]
pub struct RegisterArgs {
    pub username: String,
    pub password: SecretString,
    pub email: String,
}

/// Handle the login action
///
/// # Errors
/// Returns an error if the API rejects the credentials or cannot be reached.
pub async fn login(globals: &GlobalArgs, args: LoginArgs) -> Result<()> {
    let session = globals.session();
    let client = globals.client(session.clone())?;

    let result = if args.json {
        auth::login_json(&client, &args.username, &args.password).await
    } else {
        auth::login(&client, &args.username, &args.password).await
    };
    let outcome = result.with_context(|| format!("login failed for {}", args.username))?;

    match outcome {
        LoginOutcome::Applied => println!("{}", status_line(&session)),
        LoginOutcome::Superseded => println!("login superseded; session unchanged"),
    }
    Ok(())
}

/// Handle the register action
///
/// # Errors
/// Returns an error if registration is rejected or the API cannot be reached.
pub async fn register(globals: &GlobalArgs, args: RegisterArgs) -> Result<()> {
    let client = globals.client(globals.session())?;
    let response = auth::register(&client, &args.username, &args.password, &args.email)
        .await
        .with_context(|| format!("registration failed for {}", args.username))?;

    println!("{} (user id {})", response.message, response.user_id);
    Ok(())
}

/// Handle the logout action
///
/// # Errors
/// Returns an error if the API client cannot be configured.
pub fn logout(globals: &GlobalArgs) -> Result<()> {
    let client = globals.client(globals.session())?;
    auth::logout(&client);
    println!("{}", status_line(client.session()));
    Ok(())
}

/// Handle the status action
///
/// # Errors
/// Never fails; the signature matches the other actions.
pub fn status(globals: &GlobalArgs) -> Result<()> {
    println!("{}", status_line(&globals.session()));
    Ok(())
}

/// One-line description of the session.
#[must_use]
pub fn status_line(session: &SessionStore) -> String {
    if !session.is_authenticated() {
        return "not authenticated".to_string();
    }

    match session.user() {
        Some(user) => format!("authenticated as {} ({})", user.username, user.role),
        None => "authenticated".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{Role, UserProfile};
    use uuid::Uuid;

    #[test]
    fn status_line_reflects_session() {
        let session = SessionStore::in_memory();
        assert_eq!(status_line(&session), "not authenticated");

        session.set_token("abc");
        assert_eq!(status_line(&session), "authenticated");

        session.set_user(UserProfile {
            id: 5,
            username: "mei".to_string(),
            email: None,
            full_name: None,
            role: Role::Teacher,
        });
        assert_eq!(status_line(&session), "authenticated as mei (teacher)");

        session.clear_token();
        assert_eq!(status_line(&session), "not authenticated");
    }

    #[test]
    fn logout_clears_persisted_session() -> anyhow::Result<()> {
        let dir = std::env::temp_dir().join(format!("studyhub-logout-{}", Uuid::new_v4()));
        let globals = GlobalArgs::new(
            "http://localhost:8111".to_string(),
            dir.join("session.json"),
        );
        globals.session().set_token("abc");
        assert!(globals.session().is_authenticated());

        logout(&globals)?;
        assert!(!globals.session().is_authenticated());
        Ok(())
    }
}
