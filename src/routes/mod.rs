//! Route table and navigation guard. Each route carries a static
//! [`RoutePolicy`]; [`RouteTable::resolve`] matches a path and decides whether
//! the navigation proceeds or is redirected to the login or home view. This is
//! a UX guard only; the API still enforces authorization.

mod guard;
mod table;

pub use guard::{evaluate, evaluate_session, Decision};
pub use table::{
    Navigation, Route, RouteError, RouteMatch, RoutePolicy, RouteTable, RouteTableBuilder,
    HOME_ROUTE, LOGIN_ROUTE,
};
