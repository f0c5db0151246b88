//! File name helpers shared by the upload pre-filter and the storage layer.

/// Text after the final `.` of `original_name`.
///
/// A name without any `.` yields the whole name, so `"photo"` becomes
/// `"photo"` and the stored file ends up as `<id>.photo`.
pub fn extension_of(original_name: &str) -> &str {
    match original_name.rfind('.') {
        Some(idx) => &original_name[idx + 1..],
        None => original_name,
    }
}

/// Case-sensitive check that `original_name` ends in `.<ext>` for one of `allowed`.
pub fn has_allowed_extension<S: AsRef<str>>(original_name: &str, allowed: &[S]) -> bool {
    allowed.iter().any(|ext| {
        let ext = ext.as_ref();
        !ext.is_empty()
            && original_name.len() > ext.len()
            && original_name.ends_with(ext)
            && original_name[..original_name.len() - ext.len()].ends_with('.')
    })
}

/// True when `name` is a single, plain path component that stays inside
/// whatever directory it is joined onto.
pub fn is_safe_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
        && !name.chars().any(char::is_control)
}
