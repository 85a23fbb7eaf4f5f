//! Defines the error types used throughout the `radixmux` crate.

use thiserror::Error;

/// The primary error type for `radixmux` registration operations.
///
/// Every variant is raised at registration time; a router that was built
/// without errors never produces one at lookup. Callers are expected to treat
/// these as fatal and abort setup.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouterError {
    /// The route is empty or does not begin with `/`.
    #[error("path '{path}' must begin with '/'")]
    MalformedPath {
        /// The offending route as given at registration.
        path: String,
    },

    /// A `{}` or `{...}` wildcard was registered without a name.
    #[error("wildcard without a name in path '{path}'")]
    UnnamedWildcard {
        /// The offending route.
        path: String,
    },

    /// A segment contains a `{` but is not a well-formed parameter or
    /// catch-all, or mixes a wildcard with trailing bytes.
    #[error("invalid wildcard segment '{segment}' in path '{path}'")]
    InvalidWildcard {
        /// The malformed segment.
        segment: String,
        /// The offending route.
        path: String,
    },

    /// A `{name...}` catch-all appears somewhere other than the final
    /// segment, or is not a whole segment of its own.
    #[error("catch-all must be the final path segment in path '{path}'")]
    CatchAllNotTerminal {
        /// The offending route.
        path: String,
    },

    /// A wildcard disagrees in name or kind with the wildcard already
    /// registered at the same tree position.
    #[error(
        "wildcard segment '{segment}' in path '{path}' conflicts with existing wildcard in '{existing}'"
    )]
    WildcardConflict {
        /// The wildcard segment being inserted.
        segment: String,
        /// The route being inserted.
        path: String,
        /// A previously registered route owning the conflicting wildcard.
        existing: String,
    },

    /// A static segment collides with a wildcard already claiming this
    /// position.
    #[error("path '{path}' conflicts with existing wildcard route '{existing}'")]
    ChildConflict {
        /// The route being inserted.
        path: String,
        /// The previously registered wildcard route.
        existing: String,
    },

    /// A handler is already bound to this exact path.
    #[error("a handler is already registered for path '{existing}'")]
    DuplicateRoute {
        /// The route being inserted.
        path: String,
        /// The pattern already bound at this terminal node.
        existing: String,
    },

    /// The HTTP method string is empty.
    #[error("method must not be empty for path '{path}'")]
    EmptyMethod {
        /// The route being registered.
        path: String,
    },

    /// Two composed groups overlap: a route of one group is claimed by the
    /// prefix of the other.
    #[error("group '{prefix}' conflicts with route '{route}' of group '{existing_prefix}'")]
    GroupConflict {
        /// The prefix being registered.
        prefix: String,
        /// The prefix of the already registered group.
        existing_prefix: String,
        /// The full route path (prefix + route) producing the overlap.
        route: String,
    },

    /// A default-router route is shadowed by a registered group prefix.
    #[error("route '{path}' is shadowed by group prefix '{prefix}'")]
    RouteConflict {
        /// The route being registered on the default router.
        path: String,
        /// The group prefix claiming it.
        prefix: String,
    },
}
