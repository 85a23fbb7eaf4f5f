//! # radixmux
//!
//! radixmux is a compressed radix-tree (trie) HTTP request router for Rust.
//! One tree is kept per HTTP method; routes may contain literal segments,
//! named parameters (`/users/{id}`) and a trailing catch-all
//! (`/files/{path...}`), matched with deterministic precedence and without
//! allocation on the lookup hot path.
//!
//! Around the trees sits the dispatch policy of a production router:
//! trailing-slash redirects, case-insensitive path repair with `..`/`//`
//! cleanup, automatic `OPTIONS` answers, `405 Method Not Allowed` with an
//! `Allow` header, and a not-found fallback. Several routers can be composed
//! behind path prefixes with shadowing detection at registration time.
//!
//! ## Features
//!
//! - Static, parameterized, and catch-all route matching with
//!   priority-ordered child dispatch.
//! - Conflict detection at registration: duplicate routes, wildcard
//!   name/kind mismatches, and static segments colliding with wildcards all
//!   fail setup with diagnostics naming both parties.
//! - Trailing-slash-redirect hints and canonical-case path repair.
//! - Prefix composition of independent routers (`MultiRouter`).
//! - Structured error handling with `thiserror`.
//!
//! ## Example
//!
//! ```rust
//! use radixmux::{Params, RouteOutcome, Router};
//!
//! let mut router = Router::new();
//! router.get("/", "index").unwrap();
//! router.get("/hello/{user}", "hello").unwrap();
//! router.get("/files/{path...}", "files").unwrap();
//!
//! // manual lookup with parameter capture
//! let mut params = Params::new();
//! let found = router.lookup("GET", "/hello/gopher", &mut params);
//! assert_eq!(found.value, Some(&"hello"));
//! assert_eq!(params.get("user"), Some("gopher"));
//!
//! // full dispatch, catch-all capture keeps the leading '/'
//! match router.route("GET", "/files/a/b.png") {
//!     RouteOutcome::Match { value, params } => {
//!         assert_eq!(*value, "files");
//!         assert_eq!(params.get("path"), Some("/a/b.png"));
//!     }
//!     outcome => panic!("expected a match, got {outcome:?}"),
//! }
//!
//! // a missing trailing slash becomes a permanent redirect
//! match router.route("GET", "/files") {
//!     RouteOutcome::Redirect { location, code } => {
//!         assert_eq!((location.as_str(), code), ("/files/", 301));
//!     }
//!     outcome => panic!("expected a redirect, got {outcome:?}"),
//! }
//! ```
//!
//! The tree is built once during setup (registration errors are fatal) and
//! is read-only afterwards, so lookups may run concurrently from any number
//! of threads.

pub mod context;
pub mod error;
pub mod operations;
pub mod types;

pub use context::{MultiRouter, Router};
pub use error::RouterError;
pub use operations::add_route;
pub use operations::clean_path;
pub use operations::find_case_insensitive_path;
pub use operations::find_route;
pub use operations::{register_default, register_group, set_default};
pub use types::{MATCHED_ROUTE_PATH_KEY, Param, Params, RouteLookup, RouteOutcome};
