//! Path utilities shared by the VFS and the filesystems behind it.

/// Separator used in paths.
pub const SEP: &str = "/";

/// Collapse `.`/`..`, repeated and trailing separators. The result is always
/// absolute.
pub fn normalize_path(path: &str) -> String {
    if path.is_empty() || path == "/" {
        return "/".to_string();
    }
    let mut resolved: Vec<&str> = Vec::new();
    for part in path.split('/').filter(|p| !p.is_empty() && *p != ".") {
        if part == ".." {
            resolved.pop();
        } else {
            resolved.push(part);
        }
    }
    if resolved.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", resolved.join("/"))
    }
}

/// Resolve `path` against the directory `base`.
pub fn resolve_path(base: &str, path: &str) -> String {
    if path.starts_with('/') {
        normalize_path(path)
    } else if base == "/" {
        normalize_path(&format!("/{}", path))
    } else {
        normalize_path(&format!("{}/{}", base, path))
    }
}

pub fn dirname(path: &str) -> String {
    let normalized = normalize_path(path);
    match normalized.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(pos) => normalized[..pos].to_string(),
    }
}

pub fn basename(path: &str) -> String {
    let normalized = normalize_path(path);
    match normalized.rfind('/') {
        Some(pos) => normalized[pos + 1..].to_string(),
        None => normalized,
    }
}

/// Prefix under which the children of `dir` are stored.
pub fn child_prefix(dir: &str) -> String {
    if dir == "/" {
        "/".to_string()
    } else {
        format!("{}/", dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path(""), "/");
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path("/flash/lib"), "/flash/lib");
        assert_eq!(normalize_path("/flash/lib/"), "/flash/lib");
        assert_eq!(normalize_path("flash//lib"), "/flash/lib");
        assert_eq!(normalize_path("/flash/./lib"), "/flash/lib");
        assert_eq!(normalize_path("/flash/../sd"), "/sd");
        assert_eq!(normalize_path("/../.."), "/");
    }

    #[test]
    fn test_resolve_path() {
        assert_eq!(resolve_path("/flash", "main.py"), "/flash/main.py");
        assert_eq!(resolve_path("/flash", "../sd"), "/sd");
        assert_eq!(resolve_path("/", "flash"), "/flash");
        assert_eq!(resolve_path("/flash", "/sd/x"), "/sd/x");
    }

    #[test]
    fn test_dirname_basename() {
        assert_eq!(dirname("/"), "/");
        assert_eq!(dirname("/flash"), "/");
        assert_eq!(dirname("/flash/lib/a.py"), "/flash/lib");
        assert_eq!(basename("/flash/lib/a.py"), "a.py");
        assert_eq!(basename("/"), "");
    }
}
