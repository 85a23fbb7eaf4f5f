//! Route insertion: prefix splitting, wildcard extraction, conflict
//! detection and priority maintenance for the per-method radix trees.

use crate::{
    context::{Node, NodeType, Router},
    error::RouterError,
    operations::util::{WildcardError, find_wildcard},
};

/// Index byte standing in for the wildcard child, so `indices` and
/// `children` stay aligned. `:` can never start a static fragment created by
/// this grammar at a wildcard position, making the sentinel unambiguous.
pub(crate) const WILDCARD_INDEX: u8 = b':';

/// Registers a handler for the given method and path.
///
/// Paths must begin with `/` and may contain `{name}` parameter segments and
/// one final `{name...}` catch-all segment. A parameter may be preceded by
/// literal bytes within its segment (`/user_{name}`); a catch-all must span
/// a whole segment of its own.
///
/// Registration errors are fatal: the route grammar is invalid, the route
/// collides with an existing wildcard, or a handler is already bound to the
/// exact path. See [`RouterError`] for the full taxonomy.
pub fn add_route<T>(
    router: &mut Router<T>,
    method: &str,
    path: &str,
    value: T,
) -> Result<(), RouterError> {
    if method.is_empty() {
        return Err(RouterError::EmptyMethod {
            path: path.to_owned(),
        });
    }
    if !path.starts_with('/') {
        return Err(RouterError::MalformedPath {
            path: path.to_owned(),
        });
    }

    // validate the whole grammar up front so malformed routes never touch
    // the tree
    let param_count = validate_route(path)?;

    let root = router.trees.entry(method.to_owned()).or_default();
    insert(root, path, value)?;
    root.max_params = root.max_params.max(param_count);

    router.registered.push((method.to_owned(), path.to_owned()));
    Ok(())
}

/// Walks the route once, checking the wildcard grammar and counting the
/// wildcards so parameter sinks can be presized.
fn validate_route(path: &str) -> Result<usize, RouterError> {
    let bytes = path.as_bytes();
    let mut offset = 0;
    let mut count = 0;

    while offset < bytes.len() {
        let rest = &bytes[offset..];
        match find_wildcard(rest) {
            Ok(None) => break,
            Ok(Some(w)) => {
                count += 1;
                if w.catch_all {
                    let at = offset + w.start;
                    // a catch-all owns a whole final segment, including the
                    // '/' in front of it
                    if at == 0 || bytes[at - 1] != b'/' || offset + w.end != bytes.len() {
                        return Err(RouterError::CatchAllNotTerminal {
                            path: path.to_owned(),
                        });
                    }
                    break;
                }
                offset += w.end;
            }
            Err(WildcardError::Unnamed) => {
                return Err(RouterError::UnnamedWildcard {
                    path: path.to_owned(),
                });
            }
            Err(WildcardError::Malformed) => {
                let at = offset
                    + rest
                        .iter()
                        .position(|&c| c == b'{')
                        .expect("malformed wildcard contains a brace");
                return Err(RouterError::InvalidWildcard {
                    segment: segment_at(path, at).to_owned(),
                    path: path.to_owned(),
                });
            }
        }
    }

    Ok(count)
}

/// The whole segment surrounding byte `pos` of `path`.
fn segment_at(path: &str, pos: usize) -> &str {
    let bytes = path.as_bytes();
    let start = bytes[..pos]
        .iter()
        .rposition(|&c| c == b'/')
        .map_or(0, |i| i + 1);
    let end = bytes[pos..]
        .iter()
        .position(|&c| c == b'/')
        .map_or(bytes.len(), |i| pos + i);
    &path[start..end]
}

fn longest_common_prefix(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

/// Inserts `route` into the tree rooted at `root`. The grammar has already
/// been validated; only structural conflicts can fail here.
pub(crate) fn insert<T>(root: &mut Node<T>, route: &str, value: T) -> Result<(), RouterError> {
    let route_bytes = route.as_bytes();
    let mut prefix: &[u8] = route_bytes;

    root.priority += 1;

    // the tree is empty
    if root.path.is_empty() && root.children.is_empty() {
        insert_child(root, prefix, route, value)?;
        root.node_type = NodeType::Root;
        return Ok(());
    }

    let mut current = root;

    'walk: loop {
        // split the node when the shared prefix is shorter than its fragment
        let common = longest_common_prefix(prefix, &current.path);
        if common < current.path.len() {
            let child = Node {
                path: current.path[common..].to_owned(),
                indices: std::mem::take(&mut current.indices),
                children: std::mem::take(&mut current.children),
                value: current.value.take(),
                pattern: current.pattern.take(),
                wild_child: current.wild_child,
                node_type: NodeType::Static,
                priority: current.priority - 1,
                max_params: 0,
            };

            current.indices = vec![child.path[0]];
            current.children = vec![child];
            current.path.truncate(common);
            current.wild_child = false;
        }

        // the route ends exactly at this node
        if common == prefix.len() {
            if current.value.is_some() {
                return Err(duplicate(current, route));
            }
            current.value = Some(value);
            current.pattern = Some(route.to_owned());
            return Ok(());
        }

        prefix = &prefix[common..];

        // a wildcard already claims the next position
        if current.wild_child {
            let child = &mut current.children[0];
            match child.node_type {
                NodeType::Param => {
                    match param_token(prefix, &child.path) {
                        Some(token_len) => {
                            child.priority += 1;
                            if prefix.len() == token_len {
                                if child.value.is_some() {
                                    return Err(duplicate(child, route));
                                }
                                child.value = Some(value);
                                child.pattern = Some(route.to_owned());
                                return Ok(());
                            }

                            // the rest starts with '/'
                            prefix = &prefix[token_len..];

                            if child.wild_child {
                                // a catch-all already continues this param
                                return Err(catch_all_conflict(
                                    &child.children[0],
                                    prefix,
                                    route,
                                ));
                            }
                            if child.children.is_empty() {
                                if let Some(name) = catch_all_at_slash(prefix) {
                                    let name = name.to_owned();
                                    attach_catch_all(child, &name, route, value);
                                    return Ok(());
                                }
                                child.indices.push(prefix[0]);
                                child.children.push(Node {
                                    priority: 1,
                                    ..Node::default()
                                });
                                return insert_child(
                                    &mut child.children[0],
                                    prefix,
                                    route,
                                    value,
                                );
                            }

                            child.children[0].priority += 1;
                            current = &mut current.children[0].children[0];
                            continue 'walk;
                        }
                        None if prefix[0] == b'{' => {
                            return Err(RouterError::WildcardConflict {
                                segment: segment_text(prefix),
                                path: route.to_owned(),
                                existing: child.first_pattern().to_owned(),
                            });
                        }
                        None => {
                            return Err(RouterError::ChildConflict {
                                path: route.to_owned(),
                                existing: child.first_pattern().to_owned(),
                            });
                        }
                    }
                }
                NodeType::CatchAll => {
                    return Err(catch_all_conflict(child, prefix, route));
                }
                _ => unreachable!("wildcard child must be a param or catch-all"),
            }
        }

        let next = prefix[0];

        // a catch-all claiming this exact position ("/{name...}")
        if let Some(name) = catch_all_at_slash(prefix) {
            if !current.children.is_empty() {
                return Err(RouterError::WildcardConflict {
                    segment: segment_text(&prefix[1..]),
                    path: route.to_owned(),
                    existing: current.first_pattern().to_owned(),
                });
            }
            attach_catch_all(current, name, route, value);
            return Ok(());
        }

        // a parameter beginning right here, or a catch-all whose leading '/'
        // is already owned by static structure
        if next == b'{' {
            let w = find_wildcard(prefix)
                .expect("grammar validated")
                .expect("brace starts a wildcard");
            if w.catch_all {
                // the segment root is claimed by existing static routes
                return Err(RouterError::WildcardConflict {
                    segment: segment_text(prefix),
                    path: route.to_owned(),
                    existing: current.first_pattern().to_owned(),
                });
            }
            if !current.children.is_empty() {
                return Err(RouterError::WildcardConflict {
                    segment: segment_text(prefix),
                    path: route.to_owned(),
                    existing: current.first_pattern().to_owned(),
                });
            }
            return insert_child(current, prefix, route, value);
        }

        // descend into the static child matching the next byte
        if let Some(i) = current.indices.iter().position(|&c| c == next) {
            let i = bubble_child(current, i);
            current = &mut current.children[i];
            continue 'walk;
        }

        // no matching child: create a new static edge
        current.indices.push(next);
        let i = current.children.len();
        current.children.push(Node::default());
        let i = bubble_child(current, i);
        return insert_child(&mut current.children[i], prefix, route, value);
    }
}

/// Builds the remainder of a route beneath `node`, which is either freshly
/// created (takes the literal head as its fragment) or an existing node the
/// wildcard attaches to directly.
fn insert_child<T>(
    node: &mut Node<T>,
    mut prefix: &[u8],
    route: &str,
    value: T,
) -> Result<(), RouterError> {
    let mut current = node;

    loop {
        let Some(w) = find_wildcard(prefix).expect("grammar validated") else {
            current.path = prefix.to_owned();
            current.value = Some(value);
            current.pattern = Some(route.to_owned());
            return Ok(());
        };

        if w.catch_all {
            // the literal head stops before the '/', which stays part of the
            // catch-all capture
            if w.start > 1 {
                current.path = prefix[..w.start - 1].to_owned();
            }
            let name = w.name.to_owned();
            attach_catch_all(current, &name, route, value);
            return Ok(());
        }

        // named parameter, possibly with a literal head in front
        let name = w.name.to_owned();
        let token_len = w.end - w.start;
        if w.start > 0 {
            current.path = prefix[..w.start].to_owned();
            prefix = &prefix[w.start..];
        }

        current.wild_child = true;
        current.indices = vec![WILDCARD_INDEX];
        current.children = vec![Node {
            path: name,
            node_type: NodeType::Param,
            priority: 1,
            ..Node::default()
        }];
        current = &mut current.children[0];

        if token_len < prefix.len() {
            prefix = &prefix[token_len..];

            if let Some(name) = catch_all_at_slash(prefix) {
                let name = name.to_owned();
                attach_catch_all(current, &name, route, value);
                return Ok(());
            }

            current.indices.push(prefix[0]);
            current.children.push(Node {
                priority: 1,
                ..Node::default()
            });
            current = &mut current.children[0];
            continue;
        }

        current.value = Some(value);
        current.pattern = Some(route.to_owned());
        return Ok(());
    }
}

/// Hangs a terminal catch-all child off `node`. The caller has verified that
/// `node` has no other children.
fn attach_catch_all<T>(node: &mut Node<T>, name: &[u8], route: &str, value: T) {
    node.wild_child = true;
    node.indices = vec![WILDCARD_INDEX];
    node.children = vec![Node {
        path: name.to_owned(),
        node_type: NodeType::CatchAll,
        value: Some(value),
        pattern: Some(route.to_owned()),
        priority: 1,
        ..Node::default()
    }];
}

/// Length of the `{name}` token at the start of `prefix` when its name is
/// exactly `name` and the token fills the segment; `None` otherwise.
fn param_token(prefix: &[u8], name: &[u8]) -> Option<usize> {
    let token_len = name.len() + 2;
    if prefix.len() < token_len
        || prefix[0] != b'{'
        || &prefix[1..1 + name.len()] != name
        || prefix[1 + name.len()] != b'}'
    {
        return None;
    }
    match prefix.get(token_len) {
        None | Some(b'/') => Some(token_len),
        Some(_) => None,
    }
}

/// The catch-all name when `prefix` is exactly `/{name...}`.
fn catch_all_at_slash(prefix: &[u8]) -> Option<&[u8]> {
    if prefix.first() != Some(&b'/') {
        return None;
    }
    match find_wildcard(&prefix[1..]) {
        Ok(Some(w)) if w.catch_all && w.start == 0 && w.end == prefix.len() - 1 => Some(w.name),
        _ => None,
    }
}

/// Diagnoses an insertion that ran into an existing catch-all child.
/// `prefix` starts at the position the catch-all claims (its leading `/`).
fn catch_all_conflict<T>(catch_all: &Node<T>, prefix: &[u8], route: &str) -> RouterError {
    if let Some(name) = catch_all_at_slash(prefix) {
        if name == catch_all.path {
            return RouterError::DuplicateRoute {
                path: route.to_owned(),
                existing: catch_all.first_pattern().to_owned(),
            };
        }
    }
    if prefix.starts_with(b"/{") || prefix.starts_with(b"{") {
        RouterError::WildcardConflict {
            segment: segment_text(prefix.strip_prefix(b"/").unwrap_or(prefix)),
            path: route.to_owned(),
            existing: catch_all.first_pattern().to_owned(),
        }
    } else {
        RouterError::ChildConflict {
            path: route.to_owned(),
            existing: catch_all.first_pattern().to_owned(),
        }
    }
}

fn duplicate<T>(node: &Node<T>, route: &str) -> RouterError {
    RouterError::DuplicateRoute {
        path: route.to_owned(),
        existing: node
            .pattern
            .clone()
            .unwrap_or_else(|| route.to_owned()),
    }
}

/// The leading segment of `prefix`, for conflict diagnostics.
fn segment_text(prefix: &[u8]) -> String {
    let end = prefix
        .iter()
        .position(|&c| c == b'/')
        .unwrap_or(prefix.len());
    String::from_utf8_lossy(&prefix[..end]).into_owned()
}

/// Increments the priority of child `i` and bubbles it toward the front
/// while it outranks its previous sibling, keeping `indices` aligned.
/// Returns the child's new position.
fn bubble_child<T>(node: &mut Node<T>, i: usize) -> usize {
    node.children[i].priority += 1;
    let priority = node.children[i].priority;

    let mut updated = i;
    while updated > 0 && node.children[updated - 1].priority < priority {
        node.children.swap(updated - 1, updated);
        updated -= 1;
    }

    if updated != i {
        let moved = node.indices.remove(i);
        node.indices.insert(updated, moved);
    }

    updated
}
