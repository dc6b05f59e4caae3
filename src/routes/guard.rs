//! Navigation guard. Evaluation is a pure function of the route policy and the
//! session as it is right now; it never calls the API. A token the server no
//! longer accepts is caught later by the client's `401` handling.

use super::table::RoutePolicy;
use crate::session::{Role, SessionStore};

/// Outcome of evaluating one navigation attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    RedirectToLogin,
    RedirectToHome,
}

/// Applies the guard rules in order; the first match wins.
#[must_use]
pub fn evaluate(policy: &RoutePolicy, authenticated: bool, role: Option<&Role>) -> Decision {
    if policy.requires_auth && !authenticated {
        return Decision::RedirectToLogin;
    }

    if policy.guest_only && authenticated {
        return Decision::RedirectToHome;
    }

    if let Some(required) = &policy.requires_role {
        if role != Some(required) {
            return Decision::RedirectToHome;
        }
    }

    Decision::Allowed
}

/// Evaluates `policy` against one consistent snapshot of the store.
#[must_use]
pub fn evaluate_session(policy: &RoutePolicy, session: &SessionStore) -> Decision {
    let snapshot = session.snapshot();
    evaluate(policy, snapshot.authenticated, snapshot.role.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::UserProfile;

    fn user(role: Role) -> UserProfile {
        UserProfile {
            id: 1,
            username: "lin".to_string(),
            email: None,
            full_name: None,
            role,
        }
    }

    #[test]
    fn requires_auth_without_token_redirects_to_login() {
        let policy = RoutePolicy::authenticated();
        assert_eq!(evaluate(&policy, false, None), Decision::RedirectToLogin);
        assert_eq!(evaluate(&policy, true, None), Decision::Allowed);
    }

    #[test]
    fn guest_only_with_token_redirects_home() {
        let policy = RoutePolicy::guest_only();
        assert_eq!(evaluate(&policy, true, None), Decision::RedirectToHome);
        assert_eq!(evaluate(&policy, false, None), Decision::Allowed);
    }

    #[test]
    fn role_mismatch_redirects_home() {
        let policy = RoutePolicy::authenticated().with_role(Role::Teacher);
        assert_eq!(
            evaluate(&policy, true, Some(&Role::Student)),
            Decision::RedirectToHome
        );
        assert_eq!(evaluate(&policy, true, None), Decision::RedirectToHome);
        assert_eq!(
            evaluate(&policy, true, Some(&Role::Teacher)),
            Decision::Allowed
        );
    }

    #[test]
    fn auth_rule_wins_over_role_rule() {
        let policy = RoutePolicy::authenticated().with_role(Role::Admin);
        assert_eq!(evaluate(&policy, false, None), Decision::RedirectToLogin);
    }

    #[test]
    fn public_route_is_always_allowed() {
        let policy = RoutePolicy::public();
        assert_eq!(evaluate(&policy, false, None), Decision::Allowed);
        assert_eq!(
            evaluate(&policy, true, Some(&Role::Admin)),
            Decision::Allowed
        );
    }

    #[test]
    fn session_evaluation_follows_store_mutations() {
        let session = SessionStore::in_memory();
        let teacher_view = RoutePolicy::authenticated().with_role(Role::Teacher);

        assert_eq!(
            evaluate_session(&teacher_view, &session),
            Decision::RedirectToLogin
        );

        session.set_token("abc");
        session.set_user(user(Role::Teacher));
        assert_eq!(evaluate_session(&teacher_view, &session), Decision::Allowed);

        session.clear_token();
        assert_eq!(
            evaluate_session(&teacher_view, &session),
            Decision::RedirectToLogin
        );
    }
}
