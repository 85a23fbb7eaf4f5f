//! Case-insensitive path repair: finds the canonically-cased registered
//! route for a path that differs only in letter case (and optionally one
//! trailing slash), emitting the tree's canonical bytes.

use crate::context::{Node, NodeType, Router};

/// Repairs letter case (and optionally the trailing slash) of `path` against
/// the tree registered for `method`, returning the canonical path when one
/// exists.
///
/// Multi-byte characters are matched by trying the lowercase and the
/// uppercase folding of each rune against the tree; wildcard segments accept
/// the input bytes verbatim.
pub fn find_case_insensitive_path<T>(
    router: &Router<T>,
    method: &str,
    path: &str,
    fix_trailing_slash: bool,
) -> Option<String> {
    let root = router.trees.get(method)?;
    case_insensitive_lookup(root, path, fix_trailing_slash)
}

pub(crate) fn case_insensitive_lookup<T>(
    root: &Node<T>,
    path: &str,
    fix_trailing_slash: bool,
) -> Option<String> {
    let mut out = Vec::with_capacity(path.len() + 1);
    if walk(root, path.as_bytes(), &mut out, [0; 4], fix_trailing_slash) {
        // canonical fragments and verbatim input slices recombine into
        // whole runes
        String::from_utf8(out).ok()
    } else {
        None
    }
}

/// The repair walk. `rb` carries the unmatched tail bytes of the folded rune
/// currently being matched, so fragments that split a rune across nodes are
/// handled; recursion covers the case where both foldings exist as children.
fn walk<T>(start: &Node<T>, start_path: &[u8], out: &mut Vec<u8>, mut rb: [u8; 4], fix: bool) -> bool {
    let mut n = start;
    let mut path = start_path;
    let mut np_len = n.path.len();

    'walk: while path.len() >= np_len
        && (np_len == 0 || eq_fold(&path[1..np_len], &n.path[1..np_len]))
    {
        let old_path = path;
        path = &path[np_len..];
        out.extend_from_slice(&n.path);

        if path.is_empty() {
            if n.value.is_some() {
                return true;
            }

            // try fixing the path by adding a trailing slash
            if fix {
                if n.wild_child {
                    let child = &n.children[0];
                    if child.node_type == NodeType::CatchAll && child.value.is_some() {
                        out.push(b'/');
                        return true;
                    }
                } else if let Some(i) = n.indices.iter().position(|&c| c == b'/') {
                    let child = &n.children[i];
                    if child.path.len() == 1 && child.value.is_some() {
                        out.push(b'/');
                        return true;
                    }
                }
            }
            return false;
        }

        if !n.wild_child {
            rb = shift_rune_bytes(rb, np_len);

            if rb[0] != 0 {
                // the rune being matched still has unmatched bytes
                let idxc = rb[0];
                if let Some(i) = n.indices.iter().position(|&c| c == idxc) {
                    n = &n.children[i];
                    np_len = n.path.len();
                    continue 'walk;
                }
            } else {
                // process a new rune; it may have started up to three bytes
                // before the node boundary
                let mut rune = None;
                let mut off = 0;
                let max = np_len.min(3);
                while off < max {
                    let i = np_len - off;
                    if is_rune_start(old_path[i]) {
                        rune = decode_first_char(&old_path[i..]);
                        break;
                    }
                    off += 1;
                }

                if let Some(rune) = rune {
                    let lo = to_lower_char(rune);
                    let lo_rb = shift_rune_bytes(encode_rune(lo), off);
                    if let Some(i) = n.indices.iter().position(|&c| c == lo_rb[0]) {
                        // the uppercase byte may exist as an index as well,
                        // so the lowercase child is tried recursively
                        if path == b"/"
                            && !(n.children[i].path == b"/" && n.children[i].value.is_some())
                        {
                            return fix && n.value.is_some();
                        }
                        let saved = out.len();
                        if walk(&n.children[i], path, out, lo_rb, fix) {
                            return true;
                        }
                        out.truncate(saved);
                    }

                    let up = to_upper_char(rune);
                    if up != lo {
                        let up_rb = shift_rune_bytes(encode_rune(up), off);
                        if let Some(i) = n.indices.iter().position(|&c| c == up_rb[0]) {
                            if path == b"/"
                                && !(n.children[i].path == b"/" && n.children[i].value.is_some())
                            {
                                return fix && n.value.is_some();
                            }
                            rb = up_rb;
                            n = &n.children[i];
                            np_len = n.path.len();
                            continue 'walk;
                        }
                    }
                }
            }

            // nothing deeper matched; dropping an extra trailing slash is
            // the only repair left
            return fix && path == b"/" && n.value.is_some();
        }

        let child = &n.children[0];
        match child.node_type {
            NodeType::Param => {
                let end = path.iter().position(|&c| c == b'/').unwrap_or(path.len());

                // wildcard values are accepted verbatim
                out.extend_from_slice(&path[..end]);

                if end < path.len() {
                    if child.wild_child {
                        // the catch-all takes the rest verbatim
                        if child.children[0].value.is_some() {
                            out.extend_from_slice(&path[end..]);
                            return true;
                        }
                        return false;
                    }
                    if let [next] = child.children.as_slice() {
                        if path[end..] == *b"/" && !(next.path == b"/" && next.value.is_some()) {
                            return fix && child.value.is_some();
                        }
                        n = next;
                        np_len = n.path.len();
                        path = &path[end..];
                        rb = [0; 4];
                        continue 'walk;
                    }
                    // dropping the extra trailing slash
                    return fix && path.len() == end + 1 && child.value.is_some();
                }

                if child.value.is_some() {
                    return true;
                }

                if fix {
                    if child.wild_child {
                        // a catch-all continues this param and matches "/"
                        out.push(b'/');
                        return true;
                    }
                    if let [next] = child.children.as_slice() {
                        if next.path == b"/" && next.value.is_some() {
                            out.push(b'/');
                            return true;
                        }
                    }
                }
                return false;
            }
            NodeType::CatchAll => {
                if path[0] != b'/' {
                    return false;
                }
                if child.value.is_some() {
                    out.extend_from_slice(path);
                    return true;
                }
                return false;
            }
            _ => unreachable!("wildcard child must be a param or catch-all"),
        }
    }

    // the walk stopped short: only a missing trailing slash can be repaired
    if fix
        && !path.is_empty()
        && n.path.len() == path.len() + 1
        && n.path[path.len()] == b'/'
        && eq_fold(&path[1..], &n.path[1..path.len()])
        && n.value.is_some()
    {
        out.extend_from_slice(&n.path);
        return true;
    }
    false
}

/// Single-rune lowercase, keeping the rune unchanged when the full mapping
/// expands to several characters.
fn to_lower_char(c: char) -> char {
    let mut it = c.to_lowercase();
    match (it.next(), it.next()) {
        (Some(lower), None) => lower,
        _ => c,
    }
}

/// Single-rune uppercase, analogous to [`to_lower_char`].
fn to_upper_char(c: char) -> char {
    let mut it = c.to_uppercase();
    match (it.next(), it.next()) {
        (Some(upper), None) => upper,
        _ => c,
    }
}

/// Case folding: uppercase then lowercase, which maps the final sigma `ς`
/// and the capital `Σ` onto `σ` alike.
fn fold_char(c: char) -> char {
    to_lower_char(to_upper_char(c))
}

/// Case-folded byte-sequence equality. Fragments may start or end mid-rune:
/// bytes that do not decode on either side step in lockstep, their rune's
/// lead byte having already been matched through the folded index.
fn eq_fold(mut a: &[u8], mut b: &[u8]) -> bool {
    loop {
        let (Some(&ca), Some(&cb)) = (a.first(), b.first()) else {
            return a.is_empty() && b.is_empty();
        };

        if ca.is_ascii() || cb.is_ascii() {
            if !ca.eq_ignore_ascii_case(&cb) {
                return false;
            }
            a = &a[1..];
            b = &b[1..];
            continue;
        }

        match (decode_first_char(a), decode_first_char(b)) {
            (Some(ra), Some(rb)) => {
                if fold_char(ra) != fold_char(rb) {
                    return false;
                }
                a = &a[ra.len_utf8()..];
                b = &b[rb.len_utf8()..];
            }
            (None, None) => {
                a = &a[1..];
                b = &b[1..];
            }
            _ => return false,
        }
    }
}

fn is_rune_start(b: u8) -> bool {
    b & 0xC0 != 0x80
}

fn decode_first_char(bytes: &[u8]) -> Option<char> {
    let len = match bytes.first()? {
        b if b & 0x80 == 0x00 => 1,
        b if b & 0xE0 == 0xC0 => 2,
        b if b & 0xF0 == 0xE0 => 3,
        b if b & 0xF8 == 0xF0 => 4,
        _ => return None,
    };
    std::str::from_utf8(bytes.get(..len)?).ok()?.chars().next()
}

fn encode_rune(c: char) -> [u8; 4] {
    let mut buf = [0; 4];
    c.encode_utf8(&mut buf);
    buf
}

fn shift_rune_bytes(rb: [u8; 4], n: usize) -> [u8; 4] {
    match n {
        0 => rb,
        1 => [rb[1], rb[2], rb[3], 0],
        2 => [rb[2], rb[3], 0, 0],
        3 => [rb[3], 0, 0, 0],
        _ => [0; 4],
    }
}
