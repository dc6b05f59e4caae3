//! Static route table. Routes and their policies are fixed when the table is
//! built; there is no way to add or change a route afterwards.

use super::guard::{evaluate_session, Decision};
use crate::session::{Role, SessionStore};
use std::collections::BTreeMap;
use thiserror::Error;

/// Name of the route unauthenticated users are sent to.
pub const LOGIN_ROUTE: &str = "login";
/// Name of the route used for guest-only and role redirects.
pub const HOME_ROUTE: &str = "home";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("route path must start with '/': {0}")]
    NotAbsolute(String),
    #[error("empty parameter name in route path: {0}")]
    EmptyParam(String),
    #[error("wildcard must be the last segment: {0}")]
    MisplacedWildcard(String),
    #[error("duplicate route name: {0}")]
    DuplicateName(String),
    #[error("duplicate route path: {0}")]
    DuplicatePath(String),
    #[error("route table has no '{0}' route")]
    MissingRoute(&'static str),
}

/// Access rule attached to a route.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RoutePolicy {
    pub requires_auth: bool,
    pub guest_only: bool,
    pub requires_role: Option<Role>,
}

impl RoutePolicy {
    #[must_use]
    pub fn public() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn authenticated() -> Self {
        Self {
            requires_auth: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn guest_only() -> Self {
        Self {
            guest_only: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_role(mut self, role: Role) -> Self {
        self.requires_role = Some(role);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment {
    Static(String),
    Param(String),
    Rest,
}

fn parse_path(path: &str) -> Result<Vec<Segment>, RouteError> {
    if !path.starts_with('/') {
        return Err(RouteError::NotAbsolute(path.to_string()));
    }

    let parts: Vec<&str> = path.split('/').filter(|part| !part.is_empty()).collect();
    let mut segments = Vec::with_capacity(parts.len());

    for (index, part) in parts.iter().enumerate() {
        let segment = if *part == "*" {
            if index + 1 != parts.len() {
                return Err(RouteError::MisplacedWildcard(path.to_string()));
            }
            Segment::Rest
        } else if let Some(name) = part.strip_prefix(':') {
            if name.is_empty() {
                return Err(RouteError::EmptyParam(path.to_string()));
            }
            Segment::Param(name.to_string())
        } else {
            Segment::Static((*part).to_string())
        };
        segments.push(segment);
    }

    Ok(segments)
}

/// Canonical form used for duplicate detection, so `/exam/:id` and
/// `/exam/:exam_id` count as the same path.
fn path_shape(segments: &[Segment]) -> String {
    let mut shape = String::new();
    for segment in segments {
        shape.push('/');
        match segment {
            Segment::Static(value) => shape.push_str(value),
            Segment::Param(_) => shape.push(':'),
            Segment::Rest => shape.push('*'),
        }
    }
    if shape.is_empty() {
        shape.push('/');
    }
    shape
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Route {
    name: String,
    path: String,
    segments: Vec<Segment>,
    policy: RoutePolicy,
}

impl Route {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn policy(&self) -> &RoutePolicy {
        &self.policy
    }

    fn matches(&self, parts: &[&str]) -> Option<BTreeMap<String, String>> {
        let mut params = BTreeMap::new();
        let mut remaining = parts;

        for segment in &self.segments {
            match segment {
                Segment::Rest => {
                    params.insert("*".to_string(), remaining.join("/"));
                    return Some(params);
                }
                Segment::Static(expected) => {
                    let (first, rest) = remaining.split_first()?;
                    if *first != expected.as_str() {
                        return None;
                    }
                    remaining = rest;
                }
                Segment::Param(name) => {
                    let (first, rest) = remaining.split_first()?;
                    params.insert(name.clone(), (*first).to_string());
                    remaining = rest;
                }
            }
        }

        remaining.is_empty().then_some(params)
    }
}

/// A path matched against the table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteMatch<'a> {
    pub route: &'a Route,
    pub params: BTreeMap<String, String>,
}

/// Result of resolving a navigation through the guard.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Navigation<'a> {
    Allowed(RouteMatch<'a>),
    Redirect {
        decision: Decision,
        requested: &'a Route,
        target: &'a Route,
    },
    NotFound,
}

impl Navigation<'_> {
    /// Name of the route the user ends up on, if any.
    #[must_use]
    pub fn destination(&self) -> Option<&str> {
        match self {
            Navigation::Allowed(matched) => Some(matched.route.name()),
            Navigation::Redirect { target, .. } => Some(target.name()),
            Navigation::NotFound => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct RouteTableBuilder {
    routes: Vec<Route>,
    error: Option<RouteError>,
}

impl RouteTableBuilder {
    /// Registers a route. The first registration error is kept and reported by
    /// [`Self::build`].
    #[must_use]
    pub fn route(mut self, name: &str, path: &str, policy: RoutePolicy) -> Self {
        if self.error.is_some() {
            return self;
        }

        let segments = match parse_path(path) {
            Ok(segments) => segments,
            Err(err) => {
                self.error = Some(err);
                return self;
            }
        };

        if self.routes.iter().any(|route| route.name == name) {
            self.error = Some(RouteError::DuplicateName(name.to_string()));
            return self;
        }

        let shape = path_shape(&segments);
        if self
            .routes
            .iter()
            .any(|route| path_shape(&route.segments) == shape)
        {
            self.error = Some(RouteError::DuplicatePath(path.to_string()));
            return self;
        }

        self.routes.push(Route {
            name: name.to_string(),
            path: path.to_string(),
            segments,
            policy,
        });
        self
    }

    /// # Errors
    /// Returns the first registration error, or `RouteError::MissingRoute` if
    /// the home or login route is absent.
    pub fn build(self) -> Result<RouteTable, RouteError> {
        if let Some(err) = self.error {
            return Err(err);
        }

        let index_of = |name: &'static str| {
            self.routes
                .iter()
                .position(|route| route.name == name)
                .ok_or(RouteError::MissingRoute(name))
        };
        let home = index_of(HOME_ROUTE)?;
        let login = index_of(LOGIN_ROUTE)?;

        Ok(RouteTable {
            routes: self.routes,
            home,
            login,
        })
    }
}

#[derive(Debug)]
pub struct RouteTable {
    routes: Vec<Route>,
    home: usize,
    login: usize,
}

impl RouteTable {
    #[must_use]
    pub fn builder() -> RouteTableBuilder {
        RouteTableBuilder::default()
    }

    /// The platform's views and their access rules.
    ///
    /// # Errors
    /// Only fails if the built-in table itself is inconsistent.
    pub fn default_routes() -> Result<Self, RouteError> {
        Self::builder()
            .route(HOME_ROUTE, "/", RoutePolicy::authenticated())
            .route(LOGIN_ROUTE, "/login", RoutePolicy::guest_only())
            .route("register", "/register", RoutePolicy::guest_only())
            .route("exam", "/exam/:id", RoutePolicy::authenticated())
            .route("exams", "/exams", RoutePolicy::authenticated())
            .route(
                "question-banks",
                "/question-banks",
                RoutePolicy::authenticated(),
            )
            .route(
                "question-bank",
                "/question-banks/:id",
                RoutePolicy::authenticated(),
            )
            .route(
                "learning-plan",
                "/learning-plan",
                RoutePolicy::authenticated(),
            )
            .route("ai-study", "/ai-study", RoutePolicy::authenticated())
            .route("analytics", "/analytics", RoutePolicy::authenticated())
            .route(
                "teacher",
                "/teacher",
                RoutePolicy::authenticated().with_role(Role::Teacher),
            )
            .route("community", "/community", RoutePolicy::authenticated())
            .build()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Route> {
        self.routes.iter().find(|route| route.name == name)
    }

    #[must_use]
    pub fn home(&self) -> &Route {
        &self.routes[self.home]
    }

    #[must_use]
    pub fn login(&self) -> &Route {
        &self.routes[self.login]
    }

    /// Finds the first route matching `path`. Query strings and fragments are
    /// ignored.
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<RouteMatch<'_>> {
        let path = path
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .trim();
        let parts: Vec<&str> = path.split('/').filter(|part| !part.is_empty()).collect();

        self.routes.iter().find_map(|route| {
            route
                .matches(&parts)
                .map(|params| RouteMatch { route, params })
        })
    }

    /// Matches `path` and runs the guard against the current session.
    #[must_use]
    pub fn resolve(&self, path: &str, session: &SessionStore) -> Navigation<'_> {
        let Some(matched) = self.match_path(path) else {
            return Navigation::NotFound;
        };

        match evaluate_session(matched.route.policy(), session) {
            Decision::Allowed => Navigation::Allowed(matched),
            decision @ Decision::RedirectToLogin => Navigation::Redirect {
                decision,
                requested: matched.route,
                target: self.login(),
            },
            decision @ Decision::RedirectToHome => Navigation::Redirect {
                decision,
                requested: matched.route,
                target: self.home(),
            },
        }
    }
}
