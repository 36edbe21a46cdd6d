//! RFC 3986 §5 reference resolution: splitting a URI reference into its
//! five parts, dot-segment normalization, and computing an absolute
//! target from a base and a possibly-relative reference.
//!
//! Grounded in the string-slicing parse style of `hoot::url::Url` but
//! implementing the actual resolution algorithm the way the Python
//! `urllib.parse.urlsplit`-based original (`httpy.url_transform_reference`)
//! does: split eagerly into `(scheme, authority, path, query, fragment)`,
//! then apply RFC 3986 §5.2.2/§5.2.4 directly on those parts.

use crate::error::{Error, Result};

/// A URI reference split into its five RFC 3986 parts. Each part is a
/// plain, unescaped string slice of the input; this type does no
/// percent-decoding or validation beyond the split itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Uri {
    pub scheme: Option<String>,
    pub authority: Option<String>,
    pub path: String,
    pub query: Option<String>,
    pub fragment: Option<String>,
}

impl Uri {
    /// Split `s` the way `urlsplit` does: an optional `scheme:`, an
    /// optional `//authority`, a path, an optional `?query` and an
    /// optional `#fragment`.
    pub fn parse(s: &str) -> Result<Uri> {
        let (fragment, rest) = match s.split_once('#') {
            Some((rest, frag)) => (Some(frag.to_string()), rest),
            None => (None, s),
        };

        let (query, rest) = match rest.split_once('?') {
            Some((rest, q)) => (Some(q.to_string()), rest),
            None => (None, rest),
        };

        let (scheme, rest) = split_scheme(rest);

        let (authority, path) = if let Some(stripped) = rest.strip_prefix("//") {
            match stripped.find('/') {
                Some(i) => (Some(stripped[..i].to_string()), stripped[i..].to_string()),
                None => (Some(stripped.to_string()), String::new()),
            }
        } else {
            (None, rest.to_string())
        };

        Ok(Uri {
            scheme,
            authority,
            path,
            query,
            fragment,
        })
    }

    pub fn has_scheme(&self) -> bool {
        self.scheme.is_some()
    }

    pub fn has_authority(&self) -> bool {
        self.authority.is_some()
    }

    /// Re-assemble the five parts into a URI reference string.
    pub fn to_uri_string(&self) -> String {
        let mut out = String::new();
        if let Some(scheme) = &self.scheme {
            out.push_str(scheme);
            out.push(':');
        }
        if let Some(authority) = &self.authority {
            out.push_str("//");
            out.push_str(authority);
        }
        out.push_str(&self.path);
        if let Some(query) = &self.query {
            out.push('?');
            out.push_str(query);
        }
        if let Some(fragment) = &self.fragment {
            out.push('#');
            out.push_str(fragment);
        }
        out
    }
}

/// `scheme` is `ALPHA *( ALPHA / DIGIT / "+" / "-" / "." )` terminated by
/// `:`; reject a `:` that is part of an authority's `host:port` by
/// requiring the candidate scheme to come before any `/`.
fn split_scheme(s: &str) -> (Option<String>, &str) {
    let Some(colon) = s.find(':') else {
        return (None, s);
    };
    let candidate = &s[..colon];
    if candidate.is_empty() {
        return (None, s);
    }
    let mut chars = candidate.chars();
    let first = chars.next().unwrap();
    if !first.is_ascii_alphabetic() {
        return (None, s);
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '-' || c == '.') {
        return (None, s);
    }
    (Some(candidate.to_string()), &s[colon + 1..])
}

/// RFC 3986 §5.2.4: remove `.` and `..` path segments.
///
/// Output contains no `.` or `..` segments, and never removes a leading
/// `/` that was present in the input.
pub fn remove_dot_segments(path: &str) -> String {
    let mut input: Vec<&str> = split_segments(path);
    let mut output: Vec<&str> = Vec::new();

    let mut i = 0;
    while i < input.len() {
        let seg = input[i];
        match seg {
            "." => {
                i += 1;
            }
            ".." => {
                output.pop();
                i += 1;
            }
            _ => {
                output.push(seg);
                i += 1;
            }
        }
    }

    // split_segments keeps an explicit trailing-empty marker for a
    // trailing slash; nothing further to special-case here because "."
    // and ".." are dropped as whole segments above, matching the RFC's
    // "merge output buffer" description.
    let _ = &mut input;
    join_segments(path, &output)
}

/// Split a path into `/`-delimited segments, preserving whether the path
/// was absolute (leading `/`) and whether it ended in a trailing slash,
/// via the join step rather than embedding sentinels in the segment
/// list itself.
fn split_segments(path: &str) -> Vec<&str> {
    if path.is_empty() {
        return Vec::new();
    }
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    trimmed.split('/').collect()
}

fn join_segments(original: &str, segments: &[&str]) -> String {
    let absolute = original.starts_with('/');
    let mut out = String::new();
    if absolute {
        out.push('/');
    }
    out.push_str(&segments.join("/"));
    out
}

/// RFC 3986 §5.3 path merge, used when the reference has a relative
/// path. If the base has an authority and an empty path, the merge
/// result is `"/" + reference-path`; otherwise the reference path
/// replaces everything after the last `/` of the base path.
fn merge_paths(base: &Uri, reference_path: &str) -> String {
    if base.has_authority() && base.path.is_empty() {
        format!("/{}", reference_path)
    } else {
        match base.path.rfind('/') {
            Some(i) => format!("{}{}", &base.path[..i + 1], reference_path),
            None => reference_path.to_string(),
        }
    }
}

/// RFC 3986 §5.2.2: compute an absolute target URI from `base` and a
/// possibly-relative `reference`. `base` must itself be an absolute URI
/// (it must carry a scheme).
pub fn transform_reference(base: &str, reference: &str) -> Result<String> {
    let base_uri = Uri::parse(base)?;
    if !base_uri.has_scheme() {
        return Err(Error::InvalidUri);
    }
    let reference_uri = Uri::parse(reference)?;

    let target = if reference_uri.has_scheme() {
        Uri {
            scheme: reference_uri.scheme.clone(),
            authority: reference_uri.authority.clone(),
            path: remove_dot_segments(&reference_uri.path),
            query: reference_uri.query.clone(),
            fragment: reference_uri.fragment.clone(),
        }
    } else if reference_uri.has_authority() {
        Uri {
            scheme: base_uri.scheme.clone(),
            authority: reference_uri.authority.clone(),
            path: remove_dot_segments(&reference_uri.path),
            query: reference_uri.query.clone(),
            fragment: reference_uri.fragment.clone(),
        }
    } else if reference_uri.path.is_empty() {
        let query = reference_uri
            .query
            .clone()
            .or_else(|| base_uri.query.clone());
        Uri {
            scheme: base_uri.scheme.clone(),
            authority: base_uri.authority.clone(),
            path: base_uri.path.clone(),
            query,
            fragment: reference_uri.fragment.clone(),
        }
    } else if reference_uri.path.starts_with('/') {
        Uri {
            scheme: base_uri.scheme.clone(),
            authority: base_uri.authority.clone(),
            path: remove_dot_segments(&reference_uri.path),
            query: reference_uri.query.clone(),
            fragment: reference_uri.fragment.clone(),
        }
    } else {
        let merged = merge_paths(&base_uri, &reference_uri.path);
        Uri {
            scheme: base_uri.scheme.clone(),
            authority: base_uri.authority.clone(),
            path: remove_dot_segments(&merged),
            query: reference_uri.query.clone(),
            fragment: reference_uri.fragment.clone(),
        }
    };

    Ok(target.to_uri_string())
}
