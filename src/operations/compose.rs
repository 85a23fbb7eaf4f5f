//! Composition of independent routers behind path prefixes: registration
//! with shadowing detection and longest-prefix request dispatch.

use crate::{
    context::{MultiRouter, Router},
    error::RouterError,
    operations::util::is_path_prefix,
    types::RouteOutcome,
};

/// Mounts `router` behind `prefix`.
///
/// The prefix is normalized (a leading `/` is added if missing, a trailing
/// `/` is stripped unless the prefix is `/` itself). Registration fails with
/// a group conflict when a route of one group would be captured by the
/// other group's prefix at dispatch time, or reaches exactly to it.
pub fn register_group<T>(
    multi: &mut MultiRouter<T>,
    prefix: &str,
    router: Router<T>,
) -> Result<(), RouterError> {
    let prefix = normalize_prefix(prefix);

    for (existing_prefix, existing_router) in &multi.groups {
        if *existing_prefix == prefix {
            return Err(RouterError::GroupConflict {
                prefix: prefix.clone(),
                existing_prefix: existing_prefix.clone(),
                route: prefix,
            });
        }

        // mounted routes the longer new prefix would capture, or that reach
        // exactly to it
        for (_, pattern) in existing_router.routes() {
            let full = join_prefix(existing_prefix, pattern);
            if (prefix.len() > existing_prefix.len() && is_path_prefix(&prefix, &full))
                || is_path_prefix(&full, &prefix)
            {
                return Err(RouterError::GroupConflict {
                    prefix,
                    existing_prefix: existing_prefix.clone(),
                    route: full,
                });
            }
        }

        // routes of the new group, seen against the existing prefix
        for (_, pattern) in router.routes() {
            let full = join_prefix(&prefix, pattern);
            if (existing_prefix.len() > prefix.len() && is_path_prefix(existing_prefix, &full))
                || is_path_prefix(&full, existing_prefix)
            {
                return Err(RouterError::GroupConflict {
                    prefix,
                    existing_prefix: existing_prefix.clone(),
                    route: full,
                });
            }
        }
    }

    multi.groups.insert(prefix, router);
    resort_prefixes(multi);
    Ok(())
}

/// Installs the fallback router consulted when no group claims a request.
///
/// Fails with a route conflict when any of its routes is already claimed by
/// a group prefix. The root `/` group does not claim routes here: a miss in
/// it falls through to the default router at dispatch.
pub fn set_default<T>(multi: &mut MultiRouter<T>, router: Router<T>) -> Result<(), RouterError> {
    for (_, pattern) in router.routes() {
        if let Some(prefix) = claiming_prefix(multi, pattern) {
            return Err(RouterError::RouteConflict {
                path: pattern.to_owned(),
                prefix: prefix.to_owned(),
            });
        }
    }
    multi.default_router = Some(router);
    Ok(())
}

/// Registers one route on the fallback router, creating it on first use.
/// Subject to the same shadowing checks as [`set_default`].
pub fn register_default<T>(
    multi: &mut MultiRouter<T>,
    method: &str,
    path: &str,
    value: T,
) -> Result<(), RouterError> {
    if let Some(prefix) = claiming_prefix(multi, path) {
        return Err(RouterError::RouteConflict {
            path: path.to_owned(),
            prefix: prefix.to_owned(),
        });
    }
    multi
        .default_router
        .get_or_insert_with(Router::new)
        .handle(method, path, value)
}

/// Longest-prefix dispatch: the first matching group sees the request with
/// the prefix stripped (never stripped to empty; that becomes `/`) and its
/// outcome is final. When no prefix matches, the root `/` group is tried
/// with the unstripped path; a bare miss there falls through to the default
/// router. The caller's path is borrowed, not rewritten, so the outer
/// observable path is untouched once a group router returns.
pub fn route_composed<'a, T>(
    multi: &'a MultiRouter<T>,
    method: &str,
    path: &'a str,
) -> RouteOutcome<'a, T> {
    for prefix in &multi.prefix_order {
        if prefix == "/" {
            continue;
        }
        if is_path_prefix(prefix, path) {
            let stripped = &path[prefix.len()..];
            let stripped = if stripped.is_empty() { "/" } else { stripped };
            return multi.groups[prefix.as_str()].route(method, stripped);
        }
    }

    if let Some(root_group) = multi.groups.get("/") {
        let outcome = root_group.route(method, path);
        if !matches!(outcome, RouteOutcome::NotFound { handler: None }) {
            return outcome;
        }
    }

    if let Some(default_router) = multi.default_router.as_ref() {
        return default_router.route(method, path);
    }

    RouteOutcome::NotFound { handler: None }
}

fn normalize_prefix(prefix: &str) -> String {
    let mut normalized = if prefix.starts_with('/') {
        prefix.to_owned()
    } else {
        format!("/{prefix}")
    };
    while normalized.len() > 1 && normalized.ends_with('/') {
        normalized.pop();
    }
    normalized
}

fn join_prefix(prefix: &str, pattern: &str) -> String {
    if prefix == "/" {
        pattern.to_owned()
    } else {
        format!("{prefix}{pattern}")
    }
}

/// The group prefix claiming `path` at dispatch, if any. The root group
/// never claims: misses in it fall through.
fn claiming_prefix<'a, T>(multi: &'a MultiRouter<T>, path: &str) -> Option<&'a str> {
    multi
        .prefix_order
        .iter()
        .map(String::as_str)
        .find(|prefix| *prefix != "/" && is_path_prefix(prefix, path))
}

/// Rebuilds the longest-first prefix order; the sort is stable so equal
/// lengths keep registration order.
fn resort_prefixes<T>(multi: &mut MultiRouter<T>) {
    let mut prefixes: Vec<String> = multi.groups.keys().cloned().collect();
    prefixes.sort_by(|a, b| b.len().cmp(&a.len()));
    multi.prefix_order = prefixes;
}
