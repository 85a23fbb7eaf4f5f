//! Pure path helpers shared by the routing operations.

/// Normalizes a path: ensures a leading `/`, collapses repeated slashes and
/// resolves `.` and `..` elements.
///
/// Used by the fixed-path repair flow before the case-insensitive lookup, so
/// that `/..//Foo` can be redirected to `/foo`.
///
/// # Examples
/// ```rust
/// assert_eq!(radixmux::clean_path(""), "/");
/// assert_eq!(radixmux::clean_path("abc"), "/abc");
/// assert_eq!(radixmux::clean_path("//a//b/"), "/a/b/");
/// assert_eq!(radixmux::clean_path("/a/b/../c"), "/a/c");
/// ```
pub fn clean_path(path: &str) -> String {
    if path.is_empty() {
        return "/".to_owned();
    }

    let p = path.as_bytes();
    let n = p.len();
    let mut out = Vec::with_capacity(n + 1);
    out.push(b'/');

    let mut r = usize::from(p[0] == b'/');
    let mut trailing = n > 1 && p[n - 1] == b'/';

    while r < n {
        if p[r] == b'/' {
            // empty path element
            r += 1;
        } else if p[r] == b'.' && r + 1 == n {
            trailing = true;
            r += 1;
        } else if p[r] == b'.' && p[r + 1] == b'/' {
            // "." element
            r += 2;
        } else if p[r] == b'.' && p[r + 1] == b'.' && (r + 2 == n || p[r + 2] == b'/') {
            // ".." element: back up one segment, never past the root
            r += 3;
            if out.len() > 1 {
                out.pop();
                while out.len() > 1 && *out.last().unwrap() != b'/' {
                    out.pop();
                }
                if out.len() > 1 {
                    out.pop();
                }
            }
        } else {
            if out.len() > 1 {
                out.push(b'/');
            }
            while r < n && p[r] != b'/' {
                out.push(p[r]);
                r += 1;
            }
        }
    }

    if trailing && out.len() > 1 {
        out.push(b'/');
    }

    // the input was valid UTF-8 and only ASCII bytes were re-arranged
    String::from_utf8(out).expect("cleaned path is valid UTF-8")
}

/// A wildcard found while scanning a route fragment.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct WildcardRef<'a> {
    /// Offset of the `{` within the scanned fragment.
    pub start: usize,
    /// Offset just past the closing `}`.
    pub end: usize,
    /// The wildcard name, without braces or the `...` suffix.
    pub name: &'a [u8],
    /// Whether this is a `{name...}` catch-all.
    pub catch_all: bool,
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum WildcardError {
    /// `{}` or `{...}`.
    Unnamed,
    /// Unterminated brace, a forbidden byte in the name, or bytes between
    /// the `}` and the next `/`.
    Malformed,
}

/// Scans `prefix` for the next `{name}` or `{name...}` wildcard.
///
/// Returns `Ok(None)` when the fragment is purely literal. The positional
/// rules for catch-alls (whole final segment) are checked by the caller,
/// which knows the full route.
pub(crate) fn find_wildcard(prefix: &[u8]) -> Result<Option<WildcardRef<'_>>, WildcardError> {
    let Some(start) = prefix.iter().position(|&c| c == b'{') else {
        return Ok(None);
    };

    let mut close = None;
    for (i, &c) in prefix.iter().enumerate().skip(start + 1) {
        match c {
            b'}' => {
                close = Some(i);
                break;
            }
            b'/' | b'{' => return Err(WildcardError::Malformed),
            _ => {}
        }
    }
    let Some(close) = close else {
        return Err(WildcardError::Malformed);
    };

    // only a '/' (or the end of the route) may follow a wildcard segment
    if prefix.get(close + 1).is_some_and(|&c| c != b'/') {
        return Err(WildcardError::Malformed);
    }

    let raw = &prefix[start + 1..close];
    let (name, catch_all) = match raw.strip_suffix(b"...") {
        Some(name) => (name, true),
        None => (raw, false),
    };

    if name.is_empty() {
        return Err(WildcardError::Unnamed);
    }
    if name.iter().any(|&c| c == b'.') {
        return Err(WildcardError::Malformed);
    }

    Ok(Some(WildcardRef {
        start,
        end: close + 1,
        name,
        catch_all,
    }))
}

/// Whether `prefix` claims `path`: `path` starts with `prefix` and the match
/// ends on a `/` boundary or at the end of `path`. Keeps `/admin` from
/// capturing `/administrator`.
pub(crate) fn is_path_prefix(prefix: &str, path: &str) -> bool {
    if !path.starts_with(prefix) {
        return false;
    }
    prefix == "/" || path.len() == prefix.len() || path.as_bytes()[prefix.len()] == b'/'
}
