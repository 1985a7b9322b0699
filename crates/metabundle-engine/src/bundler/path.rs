//! Module path resolution
//!
//! Pure string algebra over `/`-separated module identifiers. No file system access:
//! identifiers starting with `.` are relative to the bundle root, everything else names a
//! module outside the bundle and is passed through untouched.

/// Whether a module specifier refers to a module inside the bundle
pub fn is_relative(specifier: &str) -> bool {
    specifier.starts_with('.')
}

/// Resolve an import specifier against the module containing the import
///
/// # Arguments
/// * `specifier` - The import specifier (e.g., "./utils", "../lib/helper", "@scope/pkg")
/// * `from` - The module containing the import
///
/// # Examples
/// - `resolve_module("./b", "./lib/a")` → `"./lib/b"`
/// - `resolve_module("../b", "./lib/a")` → `"./b"`
/// - `resolve_module("rxjs", "./a")` → `"rxjs"`
pub fn resolve_module(specifier: &str, from: &str) -> String {
    if !is_relative(specifier) {
        return specifier.to_string();
    }
    normalize(&format!("{}/{}", dirname(from), specifier))
}

/// Directory part of a module identifier (`"."` when there is none)
pub fn dirname(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) => "/",
        Some(index) => &path[..index],
        None => ".",
    }
}

/// Last segment of a module identifier
pub fn basename(path: &str) -> &str {
    match path.rfind('/') {
        Some(index) => &path[index + 1..],
        None => path,
    }
}

/// Normalize a `/`-separated path
///
/// Empty and `.` segments are dropped and `..` removes the previous segment (popping past
/// the first segment is a no-op). The result keeps a leading `/` for rooted paths and gets
/// a leading `./` otherwise; an empty result is `"."`.
pub fn normalize(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => continue,
            ".." => {
                segments.pop();
            }
            _ => segments.push(part),
        }
    }

    if segments.is_empty() {
        return ".".to_string();
    }

    let prefix = if path.starts_with('/') { "" } else { "." };
    let mut result = String::from(prefix);
    for segment in segments {
        result.push('/');
        result.push_str(segment);
    }
    result
}
