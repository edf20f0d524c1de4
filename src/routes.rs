//! Fixed routing table mapping URL patterns to handlers.
//!
//! Built once, consulted by the dispatcher for every request. Path-prefix
//! patterns come before extension patterns so the gated admin prefix claims
//! its subtree even for `.cfm` paths inside it. First match wins; no match
//! means the placeholder handler.

/// Who serves a matched request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteTarget {
    /// Script engine admin interface, loopback-only.
    Admin,
    /// Script engine REST entry point.
    Rest,
    /// Script engine page rendering.
    Page,
    /// Static placeholder for everything unmatched.
    Placeholder,
}

pub struct Route {
    pub pattern: &'static str,
    pub target: RouteTarget,
}

/// Patterns are either `*.<ext>` (case-sensitive suffix) or `/<prefix>/*`
/// (the bare prefix and anything below it).
pub const ROUTES: &[Route] = &[
    Route { pattern: "/lucee/admin/*", target: RouteTarget::Admin },
    Route { pattern: "/rest/*", target: RouteTarget::Rest },
    Route { pattern: "/index.cfc/*", target: RouteTarget::Page },
    Route { pattern: "/index.cfm/*", target: RouteTarget::Page },
    Route { pattern: "/index/cfml/*", target: RouteTarget::Page },
    Route { pattern: "*.cfm", target: RouteTarget::Page },
    Route { pattern: "*.cfc", target: RouteTarget::Page },
    Route { pattern: "*.cfml", target: RouteTarget::Page },
];

/// Resolves a request path against the table.
pub fn resolve_target(path: &str) -> RouteTarget {
    ROUTES
        .iter()
        .find(|route| matches_pattern(route.pattern, path))
        .map(|route| route.target)
        .unwrap_or(RouteTarget::Placeholder)
}

fn matches_pattern(pattern: &str, path: &str) -> bool {
    if let Some(suffix) = pattern.strip_prefix('*') {
        path.ends_with(suffix)
    } else if let Some(prefix) = pattern.strip_suffix("/*") {
        match path.strip_prefix(prefix) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    } else {
        path == pattern
    }
}
