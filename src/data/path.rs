//! Slash-separated node paths.
//!
//! Paths are absolute: the root is `/`, a field group is e.g. `/dataset1/data2`.

use std::cmp::Ordering;

/// Root path.
pub const ROOT: &str = "/";

/// Path segments, ignoring leading, trailing and doubled slashes.
pub fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Canonical form of a path: leading slash, no trailing slash.
pub fn normalize(path: &str) -> String {
    from_segments(&segments(path))
}

/// Build a path from segments.
pub fn from_segments(parts: &[&str]) -> String {
    if parts.is_empty() {
        ROOT.to_string()
    } else {
        format!("/{}", parts.join("/"))
    }
}

/// Append a child name to a parent path.
pub fn join(parent: &str, name: &str) -> String {
    let mut parts = segments(parent);
    parts.extend(segments(name));
    from_segments(&parts)
}

/// Strip `trim` trailing segments from `full_path`.
///
/// Used to go from a matching leaf (e.g. `/dataset1/data1/what`) to its field
/// group (`trim = 1`) or to the dataset group above it (`trim = 2`). When no
/// more than `trim` segments exist the root path is returned.
pub fn derive_group_path(full_path: &str, trim: usize) -> String {
    let parts = segments(full_path);
    if parts.len() > trim {
        from_segments(&parts[..parts.len() - trim])
    } else {
        ROOT.to_string()
    }
}

/// Split a name into its alphabetic stem and trailing decimal index.
///
/// `dataset12` gives `("dataset", Some(12))`, `what` gives `("what", None)`.
pub fn numbered(name: &str) -> (&str, Option<u64>) {
    let stem_len = name.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    let (stem, digits) = name.split_at(stem_len);
    (stem, digits.parse().ok())
}

/// Natural ordering of sibling names, so `data2` sorts before `data10`.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let (stem_a, idx_a) = numbered(a);
    let (stem_b, idx_b) = numbered(b);
    stem_a
        .cmp(stem_b)
        .then(idx_a.cmp(&idx_b))
        .then_with(|| a.cmp(b))
}
