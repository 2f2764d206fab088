//! Filename extension helpers.
//!
//! Asset names are treated as plain strings: the extension is whatever
//! follows the last `.` of the final path component.

/// Returns the lowercase extension of `filename`, without the leading dot.
///
/// Returns `None` when the final path component has no extension or is a
/// dotfile such as `.gitignore`.
pub fn extension(filename: &str) -> Option<String> {
    let (_, ext) = split_extension(filename)?;
    Some(ext.to_ascii_lowercase())
}

/// Replaces the trailing extension of `filename` with `ext`.
///
/// A bare trailing dot (`name.`) counts as an empty extension and is
/// replaced too. When `filename` has no extension, `.ext` is appended.
pub fn replace_extension(filename: &str, ext: &str) -> String {
    if let Some((stem, _)) = split_extension(filename) {
        return format!("{stem}.{ext}");
    }
    match filename.strip_suffix('.') {
        Some(stem) if !final_component(stem).is_empty() => format!("{stem}.{ext}"),
        _ => format!("{filename}.{ext}"),
    }
}

fn final_component(filename: &str) -> &str {
    let name_start = filename.rfind(['/', '\\']).map_or(0, |i| i + 1);
    &filename[name_start..]
}

fn split_extension(filename: &str) -> Option<(&str, &str)> {
    let name = final_component(filename);
    let name_start = filename.len() - name.len();
    let dot = name.rfind('.')?;
    if dot == 0 || dot + 1 == name.len() {
        return None;
    }
    let split = name_start + dot;
    Some((&filename[..split], &filename[split + 1..]))
}
