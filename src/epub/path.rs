//! Archive path algebra

/// Resolve `relative_ref` against the directory of `base_path`
///
/// Both paths are archive-root-relative. `..` never climbs above the archive
/// root; `.` and empty segments are dropped. A leading `/` on the reference
/// is not treated as absolute.
pub fn resolve(base_path: &str, relative_ref: &str) -> String {
    let mut segments: Vec<&str> = base_path.split('/').collect();
    segments.pop();
    // "" from a base without a directory, or from "a//b.html"
    segments.retain(|s| !s.is_empty());

    for part in relative_ref.split('/') {
        match part {
            ".." => {
                segments.pop();
            }
            "." | "" => {}
            other => segments.push(other),
        }
    }

    segments.join("/")
}

/// Directory prefix of a path including its trailing `/`, or empty
pub fn parent_dir(path: &str) -> &str {
    match path.rfind('/') {
        Some(pos) => &path[..=pos],
        None => "",
    }
}
