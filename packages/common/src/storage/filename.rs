/// Maximum length, in characters, of a sanitized filename.
pub const MAX_FILENAME_CHARS: usize = 200;

/// Extensions longer than this are treated as part of the stem when truncating.
const MAX_EXTENSION_CHARS: usize = 16;

const PLACEHOLDER: &str = "_";
const FALLBACK_NAME: &str = "unknown";

/// Make a client-supplied filename safe to use as a single path component.
///
/// Directory components are dropped, `..`, separators, NUL and other control
/// characters are replaced, and the result is truncated to
/// [`MAX_FILENAME_CHARS`] while keeping the extension.
pub fn sanitize_filename(original: &str) -> String {
    let base = original
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    let mut name = base.replace("..", PLACEHOLDER);
    name = name
        .chars()
        .map(|c| {
            if c == '/' || c == '\\' || c == '\0' || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();

    if name.is_empty() || name.chars().all(|c| c == '.') {
        return FALLBACK_NAME.to_string();
    }

    truncate_preserving_extension(&name)
}

fn truncate_preserving_extension(name: &str) -> String {
    if name.chars().count() <= MAX_FILENAME_CHARS {
        return name.to_string();
    }

    let (stem, ext) = match name.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty() && !ext.is_empty() && ext.chars().count() <= MAX_EXTENSION_CHARS =>
        {
            (stem, Some(ext))
        }
        _ => (name, None),
    };

    match ext {
        Some(ext) => {
            let keep = MAX_FILENAME_CHARS - ext.chars().count() - 1;
            let stem: String = stem.chars().take(keep).collect();
            // A dot left at the cut would form `..` with the extension separator.
            let stem = stem.trim_end_matches('.');
            format!("{stem}.{ext}")
        }
        None => name.chars().take(MAX_FILENAME_CHARS).collect(),
    }
}

/// Lowercased extension including the leading dot, e.g. `.jpg`.
pub fn extension_of(filename: &str) -> Option<String> {
    let (stem, ext) = filename.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(format!(".{}", ext.to_ascii_lowercase()))
}
