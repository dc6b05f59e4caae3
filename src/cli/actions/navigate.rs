use crate::{
    cli::globals::GlobalArgs,
    routes::{Navigation, RoutePolicy, RouteTable},
};
use anyhow::{Context, Result};
use std::fmt::Write as _;

/// Handle the routes action
///
/// # Errors
/// Returns an error if the built-in route table is inconsistent.
pub fn routes() -> Result<()> {
    let table = RouteTable::default_routes().context("invalid route table")?;
    print!("{}", render_routes(&table));
    Ok(())
}

/// Handle the navigate action
///
/// # Errors
/// Returns an error if the built-in route table is inconsistent.
pub fn navigate(globals: &GlobalArgs, path: &str) -> Result<()> {
    let table = RouteTable::default_routes().context("invalid route table")?;
    let session = globals.session();
    println!("{}", describe(path, &table.resolve(path, &session)));
    Ok(())
}

fn describe_policy(policy: &RoutePolicy) -> String {
    let mut rules = Vec::new();
    if policy.requires_auth {
        rules.push("auth".to_string());
    }
    if policy.guest_only {
        rules.push("guest-only".to_string());
    }
    if let Some(role) = &policy.requires_role {
        rules.push(format!("role={role}"));
    }
    if rules.is_empty() {
        "public".to_string()
    } else {
        rules.join(",")
    }
}

/// Table of routes, one per line: name, path, policy.
#[must_use]
pub fn render_routes(table: &RouteTable) -> String {
    let width = table.iter().map(|route| route.name().len()).max().unwrap_or(0);
    let path_width = table.iter().map(|route| route.path().len()).max().unwrap_or(0);

    let mut output = String::new();
    for route in table.iter() {
        let _ = writeln!(
            output,
            "{:<width$}  {:<path_width$}  {}",
            route.name(),
            route.path(),
            describe_policy(route.policy()),
        );
    }
    output
}

#[must_use]
pub fn describe(path: &str, navigation: &Navigation<'_>) -> String {
    match navigation {
        Navigation::Allowed(matched) => format!("{path}: allowed ({})", matched.route.name()),
        Navigation::Redirect {
            decision,
            requested,
            target,
        } => format!(
            "{path}: {decision:?} from {} to {} ({})",
            requested.name(),
            target.name(),
            target.path()
        ),
        Navigation::NotFound => format!("{path}: not found"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionStore;

    #[test]
    fn render_routes_lists_policies() -> Result<()> {
        let table = RouteTable::default_routes()?;
        let rendered = render_routes(&table);

        assert_eq!(rendered.lines().count(), table.len());
        let teacher = rendered
            .lines()
            .find(|line| line.starts_with("teacher "))
            .unwrap_or_default();
        assert!(teacher.ends_with("auth,role=teacher"), "got {teacher}");
        let login = rendered
            .lines()
            .find(|line| line.starts_with("login "))
            .unwrap_or_default();
        assert!(login.ends_with("guest-only"), "got {login}");
        Ok(())
    }

    #[test]
    fn describe_reports_redirects() -> Result<()> {
        let table = RouteTable::default_routes()?;
        let session = SessionStore::in_memory();

        assert_eq!(
            describe("/exam/1", &table.resolve("/exam/1", &session)),
            "/exam/1: RedirectToLogin from exam to login (/login)"
        );
        assert_eq!(
            describe("/login", &table.resolve("/login", &session)),
            "/login: allowed (login)"
        );
        assert_eq!(
            describe("/nope", &table.resolve("/nope", &session)),
            "/nope: not found"
        );
        Ok(())
    }
}
