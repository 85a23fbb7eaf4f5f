//! Route lookup: the radix-tree walk with trailing-slash-redirect hints and
//! parameter capture, plus the per-method dispatch policy built on top.

use crate::{
    context::{Node, NodeType, Router},
    operations::repair::case_insensitive_lookup,
    operations::util::clean_path,
    types::{MATCHED_ROUTE_PATH_KEY, Params, RouteLookup, RouteOutcome},
};

/// Looks up `path` in the tree registered for `method`.
///
/// Captured parameters are appended to `params` when a sink is given; pass
/// `None` to skip capture entirely (no allocation happens on that path).
/// When no handler is found, `tsr` reports whether one exists for the path
/// with a single trailing slash added or removed.
pub fn find_route<'a, T>(
    router: &'a Router<T>,
    method: &str,
    path: &'a str,
    mut params: Option<&mut Params<'a>>,
) -> RouteLookup<'a, T> {
    let Some(root) = router.trees.get(method) else {
        return RouteLookup {
            value: None,
            tsr: false,
        };
    };

    if let Some(sink) = params.as_deref_mut() {
        sink.prepare(root.max_params + usize::from(router.save_matched_route_path));
    }

    let (matched, tsr) = tree_lookup(root, path, params.as_deref_mut());
    match matched {
        Some(node) => {
            if router.save_matched_route_path {
                if let (Some(sink), Some(pattern)) = (params, node.pattern.as_deref()) {
                    sink.push(MATCHED_ROUTE_PATH_KEY, pattern);
                }
            }
            RouteLookup {
                value: node.value.as_ref(),
                tsr: false,
            }
        }
        None => RouteLookup { value: None, tsr },
    }
}

/// The tree walk. Returns the terminal node holding the handler, or the
/// trailing-slash-redirect hint.
pub(crate) fn tree_lookup<'a, T>(
    root: &'a Node<T>,
    full: &'a str,
    mut sink: Option<&mut Params<'a>>,
) -> (Option<&'a Node<T>>, bool) {
    let bytes = full.as_bytes();
    let mut current = root;
    let mut pos = 0;

    'walk: loop {
        let rest = &bytes[pos..];

        if rest.len() > current.path.len() {
            if rest[..current.path.len()] == current.path[..] {
                pos += current.path.len();
                let rest = &bytes[pos..];

                if !current.wild_child {
                    let next = rest[0];
                    if let Some(i) = current.indices.iter().position(|&c| c == next) {
                        // an extra trailing slash that no child can consume
                        if rest == b"/" && current.value.is_some() {
                            let child = &current.children[i];
                            if !(child.path == b"/" && child.value.is_some()) {
                                return (None, true);
                            }
                        }
                        current = &current.children[i];
                        continue 'walk;
                    }

                    // nothing deeper matches; the only repair is dropping an
                    // extra trailing slash
                    let tsr = rest == b"/" && current.value.is_some();
                    return (None, tsr);
                }

                let child = &current.children[0];
                match child.node_type {
                    NodeType::Param => {
                        let end = rest
                            .iter()
                            .position(|&c| c == b'/')
                            .unwrap_or(rest.len());

                        if let Some(params) = sink.as_deref_mut() {
                            params.push(wildcard_name(child), &full[pos..pos + end]);
                        }

                        if end < rest.len() {
                            // more segments follow the parameter
                            if child.wild_child {
                                // a catch-all continues this parameter
                                let catch_all = &child.children[0];
                                if catch_all.value.is_some() {
                                    if let Some(params) = sink.as_deref_mut() {
                                        params
                                            .push(wildcard_name(catch_all), &full[pos + end..]);
                                    }
                                    return (Some(catch_all), false);
                                }
                                return (None, false);
                            }

                            if let [next] = child.children.as_slice() {
                                // an extra trailing slash that the
                                // continuation cannot consume
                                if rest[end..] == *b"/" && child.value.is_some() {
                                    if !(next.path == b"/" && next.value.is_some()) {
                                        return (None, true);
                                    }
                                }
                                pos += end;
                                current = next;
                                continue 'walk;
                            }

                            // dead end; only an extra trailing slash can be repaired
                            let tsr = rest.len() == end + 1 && child.value.is_some();
                            return (None, tsr);
                        }

                        // the parameter is the last segment
                        if child.value.is_some() {
                            return (Some(child), false);
                        }

                        // a catch-all child would match the path + '/'
                        if child.wild_child {
                            return (None, true);
                        }
                        if let [next] = child.children.as_slice() {
                            if next.path == b"/" && next.value.is_some() {
                                return (None, true);
                            }
                        }
                        return (None, false);
                    }
                    NodeType::CatchAll => {
                        // a catch-all only claims what follows a '/'
                        if rest[0] != b'/' {
                            return (None, false);
                        }
                        if child.value.is_some() {
                            if let Some(params) = sink.as_deref_mut() {
                                params.push(wildcard_name(child), &full[pos..]);
                            }
                            return (Some(child), false);
                        }
                        return (None, false);
                    }
                    _ => unreachable!("wildcard child must be a param or catch-all"),
                }
            }
        } else if rest == &current.path[..] {
            // the path ends exactly at this node
            if current.value.is_some() {
                return (Some(current), false);
            }

            if full == "/" {
                // the root path is never redirected
                return (None, false);
            }

            if current.wild_child {
                // "/dir" when "/dir/{rest...}" is registered: adding the
                // slash makes the catch-all match
                let tsr = current.children[0].node_type == NodeType::CatchAll;
                return (None, tsr);
            }

            if let Some(i) = current.indices.iter().position(|&c| c == b'/') {
                let child = &current.children[i];
                let tsr = child.path == b"/" && child.value.is_some();
                return (None, tsr);
            }

            return (None, false);
        }

        // mismatch; the only repair is a missing trailing slash
        let tsr = current.path.len() == rest.len() + 1
            && current.path[rest.len()] == b'/'
            && current.path[..rest.len()] == rest[..]
            && current.value.is_some();
        return (None, tsr);
    }
}

/// The wildcard name stored in a param or catch-all node. Names come from
/// `&str` routes and are never split, so they stay valid UTF-8.
fn wildcard_name<T>(node: &Node<T>) -> &str {
    std::str::from_utf8(&node.path).expect("wildcard names are UTF-8")
}

/// Comma-separated methods routing `path`, lexicographically ordered, for
/// the `Allow` header. `exclude_method` is skipped; `OPTIONS` is reported
/// whenever the set is non-empty, since OPTIONS itself is always answered.
pub fn allowed_methods<T>(router: &Router<T>, path: &str, exclude_method: &str) -> String {
    let mut allowed: Vec<&str> = Vec::new();

    if path == "*" {
        for method in router.trees.keys() {
            if method != "OPTIONS" {
                allowed.push(method);
            }
        }
    } else {
        for (method, root) in &router.trees {
            if method == exclude_method || method == "OPTIONS" {
                continue;
            }
            let (matched, _) = tree_lookup(root, path, None);
            if matched.is_some() {
                allowed.push(method);
            }
        }
    }

    if !allowed.is_empty() {
        allowed.push("OPTIONS");
    }
    allowed.sort_unstable();
    allowed.join(", ")
}

/// Decides the outcome for one request.
///
/// Policy, in order: tree lookup for the method; trailing-slash redirect;
/// cleaned-path case-insensitive redirect; automatic OPTIONS; 405 with an
/// `Allow` header; not-found. `CONNECT` requests and the root path are never
/// redirected. Redirects are 301 for GET and 308 for everything else.
pub fn route_request<'a, T>(
    router: &'a Router<T>,
    method: &str,
    path: &'a str,
) -> RouteOutcome<'a, T> {
    if let Some(root) = router.trees.get(method) {
        let mut params = Params::new();
        params.prepare(root.max_params + usize::from(router.save_matched_route_path));

        let (matched, tsr) = tree_lookup(root, path, Some(&mut params));
        if let Some(node) = matched {
            if router.save_matched_route_path {
                if let Some(pattern) = node.pattern.as_deref() {
                    params.push(MATCHED_ROUTE_PATH_KEY, pattern);
                }
            }
            if let Some(value) = node.value.as_ref() {
                return RouteOutcome::Match { value, params };
            }
        }

        if method != "CONNECT" && path != "/" {
            let code = if method == "GET" { 301 } else { 308 };

            if tsr && router.redirect_trailing_slash {
                let location = if path.len() > 1 && path.ends_with('/') {
                    path[..path.len() - 1].to_owned()
                } else {
                    format!("{path}/")
                };
                return RouteOutcome::Redirect { location, code };
            }

            if router.redirect_fixed_path {
                if let Some(fixed) = case_insensitive_lookup(
                    root,
                    &clean_path(path),
                    router.redirect_trailing_slash,
                ) {
                    return RouteOutcome::Redirect {
                        location: fixed,
                        code,
                    };
                }
            }
        }
    }

    if method == "OPTIONS" && router.handle_options {
        let allow = allowed_methods(router, path, "OPTIONS");
        if !allow.is_empty() {
            return RouteOutcome::AutoOptions {
                allow,
                handler: router.global_options.as_ref(),
            };
        }
    } else if router.handle_method_not_allowed {
        let allow = allowed_methods(router, path, method);
        if !allow.is_empty() {
            return RouteOutcome::MethodNotAllowed {
                allow,
                handler: router.method_not_allowed.as_ref(),
            };
        }
    }

    RouteOutcome::NotFound {
        handler: router.not_found.as_ref(),
    }
}
