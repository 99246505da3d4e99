//! Slash-separated path joining.

/// Joins `base` and `path` and cleans the result.
///
/// Repeated slashes collapse, `.` segments vanish, `..` removes the previous
/// segment, and a trailing slash is dropped. The result is rooted when `base`
/// is, and never climbs above the root.
///
/// ```text
/// join("/admin", "/identities")   → "/admin/identities"
/// join("/admin", "identities/")   → "/admin/identities"
/// join("/admin", "/")             → "/admin"
/// join("/admin", "../identities") → "/identities"
/// ```
pub fn join(base: &str, path: &str) -> String {
    let rooted = base.starts_with('/') || (base.is_empty() && path.starts_with('/'));

    let mut segments: Vec<&str> = Vec::new();
    for segment in base.split('/').chain(path.split('/')) {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.last().is_some_and(|last| *last != "..") {
                    segments.pop();
                } else if !rooted {
                    segments.push("..");
                }
            }
            segment => segments.push(segment),
        }
    }

    let joined = segments.join("/");
    match (rooted, joined.is_empty()) {
        (true, _) => format!("/{joined}"),
        (false, true) => ".".to_owned(),
        (false, false) => joined,
    }
}

#[cfg(test)]
mod tests {
    use super::join;

    #[test]
    fn joins_under_prefix() {
        assert_eq!(join("/admin", "/identities"), "/admin/identities");
        assert_eq!(join("/admin", "identities"), "/admin/identities");
        assert_eq!(join("/admin/", "//identities//{id}"), "/admin/identities/{id}");
    }

    #[test]
    fn drops_trailing_slash_and_dots() {
        assert_eq!(join("/admin", "/"), "/admin");
        assert_eq!(join("/admin", ""), "/admin");
        assert_eq!(join("/admin", "./identities/"), "/admin/identities");
    }

    #[test]
    fn dot_dot_never_escapes_root() {
        assert_eq!(join("/admin", "../identities"), "/identities");
        assert_eq!(join("/admin", "../../.."), "/");
    }

    #[test]
    fn relative_bases_stay_relative() {
        assert_eq!(join("admin", "identities"), "admin/identities");
        assert_eq!(join("admin", ".."), ".");
        assert_eq!(join("", "../x"), "../x");
    }
}
