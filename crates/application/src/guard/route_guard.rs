//! Role-based route access decisions.

use quoteconnect_domain::navigation::{DASHBOARD, ENTRY_POINT, PRODUCTS, QUOTES};
use quoteconnect_domain::{AccessDecision, Role, Session};

/// Decides whether `session` may see a view restricted to `required_roles`.
///
/// `None` or an empty slice means any signed-in role. An identity without a
/// role never satisfies a non-empty role set.
#[must_use]
pub fn decide(session: &Session, required_roles: Option<&[Role]>) -> AccessDecision {
    decide_with_entry(session, required_roles, ENTRY_POINT)
}

fn decide_with_entry(
    session: &Session,
    required_roles: Option<&[Role]>,
    entry_point: &str,
) -> AccessDecision {
    if session.is_loading() {
        return AccessDecision::Loading;
    }
    if !session.is_authenticated() {
        return AccessDecision::Redirect {
            to: entry_point.to_string(),
        };
    }
    match required_roles {
        Some(roles) if !roles.is_empty() => match session.role() {
            Some(role) if roles.contains(&role) => AccessDecision::Allow,
            _ => AccessDecision::Forbidden,
        },
        _ => AccessDecision::Allow,
    }
}

/// A protected path and the roles allowed on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRule {
    /// Path prefix, starting with `/`.
    pub path: String,
    /// `None` admits any signed-in role.
    pub allowed_roles: Option<Vec<Role>>,
}

impl RouteRule {
    /// Rule open to every signed-in role.
    pub fn any_role(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            allowed_roles: None,
        }
    }

    /// Rule restricted to `roles`.
    pub fn only(path: impl Into<String>, roles: &[Role]) -> Self {
        Self {
            path: path.into(),
            allowed_roles: Some(roles.to_vec()),
        }
    }

    fn matches(&self, path: &str) -> bool {
        let prefix = self.path.trim_end_matches('/');
        if prefix.is_empty() {
            return path.starts_with('/');
        }
        path.strip_prefix(prefix)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    }
}

/// Protected routes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTable {
    rules: Vec<RouteRule>,
}

impl RouteTable {
    /// Empty table: every path is public.
    #[must_use]
    pub const fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Adds or replaces the rule for `rule.path`.
    #[must_use]
    pub fn with_rule(mut self, rule: RouteRule) -> Self {
        self.rules.retain(|existing| existing.path != rule.path);
        self.rules.push(rule);
        self
    }

    /// The most specific rule covering `path`.
    #[must_use]
    pub fn rule_for(&self, path: &str) -> Option<&RouteRule> {
        let path = path.split(['?', '#']).next().unwrap_or(path);
        self.rules
            .iter()
            .filter(|rule| rule.matches(path))
            .max_by_key(|rule| rule.path.trim_end_matches('/').len())
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::empty()
            .with_rule(RouteRule::any_role(DASHBOARD))
            .with_rule(RouteRule::only(PRODUCTS, &[Role::Customer]))
            .with_rule(RouteRule::only(QUOTES, &[Role::Vendor]))
    }
}

/// Applies a [`RouteTable`] to navigation requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteGuard {
    entry_point: String,
    table: RouteTable,
}

impl RouteGuard {
    /// Guard over `table`, redirecting anonymous visitors to `/`.
    #[must_use]
    pub fn new(table: RouteTable) -> Self {
        Self {
            entry_point: ENTRY_POINT.to_string(),
            table,
        }
    }

    /// Changes the redirect target for anonymous visitors.
    #[must_use]
    pub fn with_entry_point(mut self, entry_point: impl Into<String>) -> Self {
        self.entry_point = entry_point.into();
        self
    }

    /// Decides access to `path`. Paths without a rule are public.
    #[must_use]
    pub fn check(&self, session: &Session, path: &str) -> AccessDecision {
        match self.table.rule_for(path) {
            Some(rule) => {
                decide_with_entry(session, rule.allowed_roles.as_deref(), &self.entry_point)
            }
            None => AccessDecision::Allow,
        }
    }
}

impl Default for RouteGuard {
    fn default() -> Self {
        Self::new(RouteTable::default())
    }
}
