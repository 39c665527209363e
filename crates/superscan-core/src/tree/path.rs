//! Backend key construction.

/// Joins a backend path and a child segment with a forward slash.
///
/// Backend keys always use `/`, whatever the host separator is, so object
/// storage keys and drive paths stay valid on every platform. An empty base
/// yields the bare segment; trailing slashes on the base are collapsed.
pub fn join_key(base: &str, name: &str) -> String {
    let trimmed = base.trim_end_matches(['/', '\\']);
    if !trimmed.is_empty() {
        format!("{trimmed}/{name}")
    } else if base.starts_with('/') {
        format!("/{name}")
    } else {
        name.to_string()
    }
}

/// Whether a backend-supplied name can stand as one path component.
///
/// Rejects the empty name, `.`, `..` and anything containing a separator.
/// Such names would resolve outside their parent once joined onto a local
/// destination.
pub fn is_plain_segment(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\', '\0'])
}
