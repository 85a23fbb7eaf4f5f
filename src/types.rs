//! Contains type definitions used throughout the radixmux router.
//!
//! This module defines the parameter sink filled during lookup, the raw
//! lookup result carrying the trailing-slash-redirect hint, and the outcome
//! a dispatcher acts on for a full request.

/// Reserved parameter name under which the matched route pattern is recorded
/// when [`Router::save_matched_route_path`](crate::Router) is enabled.
pub const MATCHED_ROUTE_PATH_KEY: &str = "$matchedRoutePath";

/// A single captured URL parameter, consisting of a key and a value.
///
/// Keys name the wildcard without braces or the trailing `...`; values are
/// slices of the looked-up path (a catch-all value keeps its leading `/`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Param<'a> {
    /// The wildcard name.
    pub key: &'a str,
    /// The captured path bytes.
    pub value: &'a str,
}

/// The parameter sink filled during lookup.
///
/// A lookup only captures parameters when a sink is provided; the backing
/// store is sized to the tree's maximum parameter count up front, so no
/// growth happens while the tree is walked.
#[derive(Debug, Clone, Default)]
pub struct Params<'a> {
    entries: Vec<Param<'a>>,
}

impl<'a> Params<'a> {
    /// Constructs an empty sink. No allocation happens until the router
    /// reserves room for the captures of a tree.
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Returns the value of the first parameter registered under the given key.
    pub fn get(&self, key: impl AsRef<str>) -> Option<&'a str> {
        let key = key.as_ref();
        self.entries
            .iter()
            .find(|param| param.key == key)
            .map(|param| param.value)
    }

    /// The route pattern that matched, if the owning router records it.
    pub fn matched_route_path(&self) -> Option<&'a str> {
        self.get(MATCHED_ROUTE_PATH_KEY)
    }

    /// Returns the number of captured parameters.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no parameters were captured.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the captured parameters in capture order.
    pub fn iter(&self) -> impl Iterator<Item = Param<'a>> + '_ {
        self.entries.iter().copied()
    }

    /// Drops any captures from a previous lookup and makes room for
    /// `additional` entries, so pushes during the walk never reallocate.
    pub(crate) fn prepare(&mut self, additional: usize) {
        self.entries.clear();
        self.entries.reserve(additional);
    }

    pub(crate) fn push(&mut self, key: &'a str, value: &'a str) {
        self.entries.push(Param { key, value });
    }
}

impl<'a> IntoIterator for Params<'a> {
    type Item = Param<'a>;
    type IntoIter = std::vec::IntoIter<Param<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// The raw result of a manual tree lookup.
///
/// `value` is the handler bound to the path, if any. When `value` is absent,
/// `tsr` reports whether a handler exists for the path with exactly one
/// trailing `/` added or removed.
#[derive(Debug)]
pub struct RouteLookup<'a, T> {
    /// The handler bound to the looked-up path.
    pub value: Option<&'a T>,
    /// The trailing-slash-redirect hint.
    pub tsr: bool,
}

/// What a request dispatcher should do for a (method, path) pair, as decided
/// by [`Router::route`](crate::Router::route).
#[derive(Debug)]
pub enum RouteOutcome<'a, T> {
    /// A handler matched; dispatch to it with the captured parameters.
    Match {
        /// The handler bound to the matched route.
        value: &'a T,
        /// Parameters captured from the path.
        params: Params<'a>,
    },
    /// Respond with a permanent redirect to `location`.
    ///
    /// `code` is 301 for GET and 308 for every other method, so that
    /// non-idempotent requests keep their method and body.
    Redirect {
        /// The canonical path to redirect to.
        location: String,
        /// The HTTP status code to respond with.
        code: u16,
    },
    /// Automatic OPTIONS: answer with the `Allow` header set to `allow`,
    /// or invoke the configured global OPTIONS handler.
    AutoOptions {
        /// Comma-separated allowed methods, lexicographically ordered.
        allow: String,
        /// The global OPTIONS handler, when one is configured.
        handler: Option<&'a T>,
    },
    /// The path is routable under other methods only: respond 405 with the
    /// `Allow` header set to `allow`.
    MethodNotAllowed {
        /// Comma-separated allowed methods, lexicographically ordered.
        allow: String,
        /// The configured 405 handler, when one is set.
        handler: Option<&'a T>,
    },
    /// Nothing matched; respond 404 or invoke the configured handler.
    NotFound {
        /// The configured not-found handler, when one is set.
        handler: Option<&'a T>,
    },
}
