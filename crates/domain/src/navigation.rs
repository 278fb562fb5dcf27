//! Role-dependent navigation.
//!
//! Which links a signed-in user sees, which dashboard they land on, and
//! where an anonymous visitor is sent.

use crate::identity::Identity;
use crate::role::Role;
use crate::session::Session;

/// Public landing page with the sign-in form.
pub const ENTRY_POINT: &str = "/";
/// Role-specific dashboard, open to every signed-in role.
pub const DASHBOARD: &str = "/dashboard";
/// Product submission, customers only.
pub const PRODUCTS: &str = "/products";
/// Quote requests, vendors only.
pub const QUOTES: &str = "/quotes";

/// A navigation entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavLink {
    /// Link text.
    pub label: &'static str,
    /// Target route.
    pub path: &'static str,
}

/// Links shown in the navigation bar for `role`.
#[must_use]
pub fn nav_links(role: Option<Role>) -> Vec<NavLink> {
    let mut links = vec![NavLink {
        label: "Dashboard",
        path: DASHBOARD,
    }];
    match role {
        Some(Role::Customer) => links.push(NavLink {
            label: "Products",
            path: PRODUCTS,
        }),
        Some(Role::Vendor) => links.push(NavLink {
            label: "Quotes",
            path: QUOTES,
        }),
        Some(Role::Intern) | None => {}
    }
    links
}

/// Where to send a visitor arriving at the entry point.
#[must_use]
pub const fn landing_route(session: &Session) -> &'static str {
    if session.is_authenticated() {
        DASHBOARD
    } else {
        ENTRY_POINT
    }
}

/// Dashboard content selected by role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardView {
    /// Prompt to submit a product for quotes.
    CustomerHome,
    /// Prompt to review quote requests.
    VendorHome,
    /// Aggregate analytics.
    InternAnalytics,
    /// Signed in without a role.
    Unassigned,
}

impl DashboardView {
    /// Picks the dashboard for `identity`.
    #[must_use]
    pub const fn for_identity(identity: &Identity) -> Self {
        match identity.role {
            Some(Role::Customer) => Self::CustomerHome,
            Some(Role::Vendor) => Self::VendorHome,
            Some(Role::Intern) => Self::InternAnalytics,
            None => Self::Unassigned,
        }
    }

    /// Dashboard heading.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::CustomerHome => "Customer Dashboard",
            Self::VendorHome => "Vendor Dashboard",
            Self::InternAnalytics => "Analytics Dashboard",
            Self::Unassigned => "Unknown user role",
        }
    }

    /// Primary call to action, if the dashboard has one.
    #[must_use]
    pub const fn primary_action(self) -> Option<NavLink> {
        match self {
            Self::CustomerHome => Some(NavLink {
                label: "Submit New Product",
                path: PRODUCTS,
            }),
            Self::VendorHome => Some(NavLink {
                label: "View Quote Requests",
                path: QUOTES,
            }),
            Self::InternAnalytics | Self::Unassigned => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::AuthAccount;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    fn identity(role: Option<Role>) -> Identity {
        let mut identity = Identity::from_parts(
            AuthAccount {
                id: "2".to_string(),
                email: "vendor@example.com".to_string(),
            },
            None,
        );
        identity.role = role;
        identity
    }

    #[test]
    fn test_nav_links_per_role() {
        let paths = |role| nav_links(role).iter().map(|l| l.path).collect::<Vec<_>>();
        assert_eq!(paths(Some(Role::Customer)), vec![DASHBOARD, PRODUCTS]);
        assert_eq!(paths(Some(Role::Vendor)), vec![DASHBOARD, QUOTES]);
        assert_eq!(paths(Some(Role::Intern)), vec![DASHBOARD]);
        assert_eq!(paths(None), vec![DASHBOARD]);
    }

    #[test]
    fn test_landing_route() {
        assert_eq!(landing_route(&Session::signed_out()), ENTRY_POINT);
        let session = Session::signed_in(identity(Some(Role::Vendor)), Utc::now());
        assert_eq!(landing_route(&session), DASHBOARD);
    }

    #[test]
    fn test_dashboard_view_by_role() {
        assert_eq!(
            DashboardView::for_identity(&identity(Some(Role::Intern))),
            DashboardView::InternAnalytics
        );
        let vendor = DashboardView::for_identity(&identity(Some(Role::Vendor)));
        assert_eq!(vendor.title(), "Vendor Dashboard");
        assert_eq!(vendor.primary_action().map(|l| l.path), Some(QUOTES));
        assert_eq!(
            DashboardView::for_identity(&identity(None)),
            DashboardView::Unassigned
        );
    }
}
