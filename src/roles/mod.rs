//! Role labels, slugs and the dashboard route table.
//!
//! Roles travel as human-readable labels ("Sales Co-ordinator") until they are
//! slugified for routing. The super-admin sentinel is never routed through the
//! dashboard table.

use std::collections::HashMap;

/// Sentinel role for the super administrator, matched verbatim
pub const SUPER_ADMIN: &str = "super_admin";

pub const LOGIN_ROUTE: &str = "/login";
pub const ADMIN_ROUTE: &str = "/admin";

/// Known staff emails and the role label each one operates under
const BUILTIN_EMAIL_ROLES: &[(&str, &str)] = &[
    ("9965572625@gmail.com", "Sales Co-ordinator"),
    ("service@qube.com", "Service Engineer"),
    ("store@qube.com", "Store Incharge"),
    ("hr@qube.com", "HR Manager"),
    ("accounts@qube.com", "Accounts Executive"),
    ("production@qube.com", "Production Supervisor"),
];

/// Operational roles that have a dashboard
const DASHBOARD_SLUGS: &[&str] = &[
    "sales-co-ordinator",
    "service-engineer",
    "store-incharge",
    "hr-manager",
    "accounts-executive",
    "production-supervisor",
];

/// Normalize a role label: lowercase, non-alphanumeric runs become one hyphen,
/// no leading or trailing hyphens.
pub fn slugify(label: &str) -> String {
    let mut slug = String::with_capacity(label.len());
    let mut pending_hyphen = false;

    for c in label.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

/// True for the super-admin sentinel, either verbatim or in slug form
pub fn is_super_admin_role(role: &str) -> bool {
    let role = role.trim();
    role == SUPER_ADMIN || slugify(role) == slugify(SUPER_ADMIN)
}

/// Trimmed, lowercased email used as the lookup key everywhere
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Static lookup from a known email address to its role label
#[derive(Debug, Clone)]
pub struct EmailRoleMap {
    entries: HashMap<String, String>,
}

impl EmailRoleMap {
    pub fn builtin() -> Self {
        Self::from_entries(BUILTIN_EMAIL_ROLES.iter().copied())
    }

    pub fn from_entries<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(email, role)| (normalize_email(email), role.to_string()))
                .collect(),
        }
    }

    /// Role label for an email, or None for unknown addresses
    pub fn lookup(&self, email: &str) -> Option<&str> {
        self.entries.get(&normalize_email(email)).map(String::as_str)
    }

    pub fn contains(&self, email: &str) -> bool {
        self.lookup(email).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for EmailRoleMap {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Role slug to dashboard route table
#[derive(Debug, Clone)]
pub struct DashboardRoutes {
    slugs: Vec<String>,
}

impl DashboardRoutes {
    pub fn builtin() -> Self {
        Self {
            slugs: DASHBOARD_SLUGS.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn route_for(&self, slug: &str) -> Option<String> {
        self.slugs
            .iter()
            .find(|known| known.as_str() == slug)
            .map(|known| format!("/dashboard/{}", known))
    }
}

impl Default for DashboardRoutes {
    fn default() -> Self {
        Self::builtin()
    }
}
