//! Defines the core data structures for the router: `Node`, `Router` and
//! `MultiRouter`.
//!
//! A `Node` is one edge fragment of a compressed trie over path bytes. Each
//! node stores only its own fragment (never the root-to-here prefix), an
//! index byte per child for first-byte dispatch, and a priority counter that
//! keeps popular subtrees early in the child list.
//!
//! The `Router` holds one independent tree per HTTP method plus the redirect
//! and fallback policy applied around lookups. The `MultiRouter` layers
//! several routers behind path prefixes.

use crate::error::RouterError;
use crate::operations;
use crate::types::{Params, RouteLookup, RouteOutcome};
use ahash::AHashMap;
use indexmap::IndexMap;

/// The role a tree node plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NodeType {
    /// Anything else: a literal fragment of one or more path bytes.
    Static,
    /// The root of a per-method tree.
    Root,
    /// A named parameter, e.g. `{id}`. Matches one segment.
    Param,
    /// A catch-all, e.g. `{filepath...}`. Matches the rest of the path and
    /// is always terminal.
    CatchAll,
}

/// A node of the per-method radix tree.
///
/// `path` holds the byte fragment this node consumes; for `Param` and
/// `CatchAll` nodes it holds the bare wildcard name instead. `indices[i]` is
/// the first byte of `children[i].path` for static children and the sentinel
/// `b':'` for the wildcard child, so the two lists always stay aligned.
#[derive(Debug, Clone)]
pub(crate) struct Node<T> {
    pub(crate) path: Vec<u8>,
    pub(crate) indices: Vec<u8>,
    pub(crate) children: Vec<Node<T>>,
    pub(crate) value: Option<T>,
    /// The full route pattern, present on terminal nodes only. Used for
    /// conflict diagnostics and matched-route recording.
    pub(crate) pattern: Option<String>,
    pub(crate) wild_child: bool,
    pub(crate) node_type: NodeType,
    /// Number of handlers reachable through this node.
    pub(crate) priority: u32,
    /// Largest wildcard count of any route in this subtree. Only the root's
    /// value is consulted, to presize parameter sinks.
    pub(crate) max_params: usize,
}

impl<T> Default for Node<T> {
    fn default() -> Self {
        Self {
            path: Vec::new(),
            indices: Vec::new(),
            children: Vec::new(),
            value: None,
            pattern: None,
            wild_child: false,
            node_type: NodeType::Static,
            priority: 0,
            max_params: 0,
        }
    }
}

impl<T> Node<T> {
    /// Walks down to the first registered pattern in this subtree. Used to
    /// name the existing party in conflict diagnostics.
    pub(crate) fn first_pattern(&self) -> &str {
        let mut current = self;
        loop {
            if let Some(ref pattern) = current.pattern {
                return pattern;
            }
            match current.children.first() {
                Some(child) => current = child,
                None => return "",
            }
        }
    }
}

/// A request router dispatching on HTTP method and path.
///
/// One radix tree is kept per method; methods are fully independent except
/// for the allowed-methods computation. All registration happens during
/// setup and may fail fatally; afterwards the router is read-only and safe
/// to share across threads.
#[derive(Debug)]
pub struct Router<T> {
    /// Per-method tree roots.
    pub(crate) trees: AHashMap<String, Node<T>>,
    /// Registered (method, pattern) pairs in registration order.
    pub(crate) registered: Vec<(String, String)>,

    /// Enables automatic redirection if the current route can't be matched
    /// but a handler for the path with (without) the trailing slash exists.
    /// The redirect is 301 for GET requests and 308 for all other methods.
    pub redirect_trailing_slash: bool,

    /// If enabled, the router tries to fix the request path when no handler
    /// is registered for it: superfluous elements like `..` or `//` are
    /// removed and a case-insensitive lookup of the cleaned path is done.
    /// On success the router redirects to the corrected path.
    pub redirect_fixed_path: bool,

    /// If enabled, unroutable requests are answered with 405 and an `Allow`
    /// header whenever another method routes the same path.
    pub handle_method_not_allowed: bool,

    /// If enabled, the router automatically replies to OPTIONS requests.
    /// Custom OPTIONS handlers take priority over automatic replies.
    pub handle_options: bool,

    /// When set, a successful dispatch records the matched route pattern in
    /// the parameter sink under
    /// [`MATCHED_ROUTE_PATH_KEY`](crate::MATCHED_ROUTE_PATH_KEY).
    pub save_matched_route_path: bool,

    /// An optional handler invoked on automatic OPTIONS requests.
    pub global_options: Option<T>,

    /// An optional handler invoked when no route matches.
    pub not_found: Option<T>,

    /// An optional handler invoked for 405 responses.
    pub method_not_allowed: Option<T>,
}

impl<T> Default for Router<T> {
    fn default() -> Self {
        Self {
            trees: AHashMap::default(),
            registered: Vec::new(),
            redirect_trailing_slash: true,
            redirect_fixed_path: true,
            handle_method_not_allowed: true,
            handle_options: true,
            save_matched_route_path: false,
            global_options: None,
            not_found: None,
            method_not_allowed: None,
        }
    }
}

impl<T> Router<T> {
    /// Constructs a router with the default redirect and fallback policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Shortcut for `handle("GET", path, value)`.
    pub fn get(&mut self, path: &str, value: T) -> Result<(), RouterError> {
        self.handle("GET", path, value)
    }

    /// Shortcut for `handle("HEAD", path, value)`.
    pub fn head(&mut self, path: &str, value: T) -> Result<(), RouterError> {
        self.handle("HEAD", path, value)
    }

    /// Shortcut for `handle("OPTIONS", path, value)`.
    pub fn options(&mut self, path: &str, value: T) -> Result<(), RouterError> {
        self.handle("OPTIONS", path, value)
    }

    /// Shortcut for `handle("POST", path, value)`.
    pub fn post(&mut self, path: &str, value: T) -> Result<(), RouterError> {
        self.handle("POST", path, value)
    }

    /// Shortcut for `handle("PUT", path, value)`.
    pub fn put(&mut self, path: &str, value: T) -> Result<(), RouterError> {
        self.handle("PUT", path, value)
    }

    /// Shortcut for `handle("PATCH", path, value)`.
    pub fn patch(&mut self, path: &str, value: T) -> Result<(), RouterError> {
        self.handle("PATCH", path, value)
    }

    /// Shortcut for `handle("DELETE", path, value)`.
    pub fn delete(&mut self, path: &str, value: T) -> Result<(), RouterError> {
        self.handle("DELETE", path, value)
    }

    /// Registers a handler for the given method and path.
    ///
    /// Equivalent to [`add_route`](crate::add_route); see there for the path
    /// grammar and the registration errors.
    pub fn handle(&mut self, method: &str, path: &str, value: T) -> Result<(), RouterError> {
        operations::add_route(self, method, path, value)
    }

    /// Manual lookup of a method + path combination, e.g. to build a
    /// framework around this router. Captured parameters are appended to
    /// `params`; the sink is cleared and presized first.
    pub fn lookup<'a>(
        &'a self,
        method: &str,
        path: &'a str,
        params: &mut Params<'a>,
    ) -> RouteLookup<'a, T> {
        operations::find_route(self, method, path, Some(params))
    }

    /// Decides the outcome for one request, applying the redirect,
    /// automatic-OPTIONS, 405 and not-found policy around the tree lookup.
    pub fn route<'a>(&'a self, method: &str, path: &'a str) -> RouteOutcome<'a, T> {
        operations::route_request(self, method, path)
    }

    /// The registered (method, pattern) pairs, in registration order.
    pub fn routes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.registered
            .iter()
            .map(|(method, pattern)| (method.as_str(), pattern.as_str()))
    }

    /// Comma-separated list of methods routing `path`, lexicographically
    /// ordered, for the `Allow` header. `path = "*"` reports the union over
    /// all registered routes.
    pub fn allowed_methods(&self, path: &str, exclude_method: &str) -> String {
        operations::allowed_methods(self, path, exclude_method)
    }

    /// Repairs letter case (and optionally the trailing slash) of `path` so
    /// it matches a registered route under `method`, returning the canonical
    /// path. See [`find_case_insensitive_path`](crate::find_case_insensitive_path).
    pub fn case_insensitive_path(
        &self,
        method: &str,
        path: &str,
        fix_trailing_slash: bool,
    ) -> Option<String> {
        let root = self.trees.get(method)?;
        operations::repair::case_insensitive_lookup(root, path, fix_trailing_slash)
    }

    #[doc(hidden)]
    /// Test helper that ensures route priorities are consistent.
    pub fn check_priorities(&self) -> Result<(), (u32, u32)> {
        for root in self.trees.values() {
            check_node_priorities(root)?;
        }
        Ok(())
    }
}

fn check_node_priorities<T>(node: &Node<T>) -> Result<u32, (u32, u32)> {
    let mut priority: u32 = 0;
    for child in &node.children {
        priority += check_node_priorities(child)?;
    }

    if node.value.is_some() {
        priority += 1;
    }

    if node.priority != priority {
        return Err((node.priority, priority));
    }

    Ok(priority)
}

impl<T> Router<T> {
    #[doc(hidden)]
    /// Test helper that verifies the structural invariants of every tree:
    /// aligned `indices`/`children`, descending child priorities, a sole
    /// wildcard child where one exists, and terminal catch-alls.
    pub fn check_tree_invariants(&self) -> Result<(), String> {
        for (method, root) in &self.trees {
            check_node_invariants(root).map_err(|e| format!("{method}: {e}"))?;
        }
        Ok(())
    }
}

fn check_node_invariants<T>(node: &Node<T>) -> Result<(), String> {
    if node.indices.len() != node.children.len() {
        return Err(format!(
            "indices/children misaligned at '{}'",
            String::from_utf8_lossy(&node.path)
        ));
    }
    if node.wild_child && node.children.len() != 1 {
        return Err(format!(
            "wildcard child is not the sole child at '{}'",
            String::from_utf8_lossy(&node.path)
        ));
    }
    if node.node_type == NodeType::CatchAll && !node.children.is_empty() {
        return Err(format!(
            "catch-all '{}' is not terminal",
            String::from_utf8_lossy(&node.path)
        ));
    }
    for (i, child) in node.children.iter().enumerate() {
        if i > 0 && node.children[i - 1].priority < child.priority {
            return Err(format!(
                "children out of priority order at '{}'",
                String::from_utf8_lossy(&node.path)
            ));
        }
        if !node.wild_child && node.indices[i] != child.path[0] {
            return Err(format!(
                "index byte does not match child fragment at '{}'",
                String::from_utf8_lossy(&node.path)
            ));
        }
        check_node_invariants(child)?;
    }
    Ok(())
}

/// Composes independent routers behind path prefixes, with registration-time
/// shadowing detection and longest-prefix dispatch.
#[derive(Debug, Default)]
pub struct MultiRouter<T> {
    /// Prefix → router groups, in registration order.
    pub(crate) groups: IndexMap<String, Router<T>>,
    /// Group prefixes sorted by descending length, stable for ties.
    pub(crate) prefix_order: Vec<String>,
    /// Fallback router consulted when no prefix matches.
    pub(crate) default_router: Option<Router<T>>,
}

impl<T> MultiRouter<T> {
    /// Constructs an empty composer.
    pub fn new() -> Self {
        Self {
            groups: IndexMap::new(),
            prefix_order: Vec::new(),
            default_router: None,
        }
    }

    /// Mounts `router` behind `prefix`. See
    /// [`register_group`](crate::register_group).
    pub fn register_group(&mut self, prefix: &str, router: Router<T>) -> Result<(), RouterError> {
        operations::register_group(self, prefix, router)
    }

    /// Installs the fallback router. See [`set_default`](crate::set_default).
    pub fn set_default(&mut self, router: Router<T>) -> Result<(), RouterError> {
        operations::set_default(self, router)
    }

    /// Registers a route on the fallback router, subject to the same
    /// shadowing checks as [`set_default`](crate::set_default).
    pub fn register_default(
        &mut self,
        method: &str,
        path: &str,
        value: T,
    ) -> Result<(), RouterError> {
        operations::register_default(self, method, path, value)
    }

    /// Decides the outcome for one request: longest-prefix group selection,
    /// prefix stripping, then the selected router's own policy.
    pub fn route<'a>(&'a self, method: &str, path: &'a str) -> RouteOutcome<'a, T> {
        operations::route_composed(self, method, path)
    }
}
