use std::path::Path;

/// Display title for a video, derived from its file stem.
pub(crate) fn video_title(video_path: &Path) -> String {
    let stem = video_path
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();
    title_from_stem(&stem)
}

pub(crate) fn title_from_stem(stem: &str) -> String {
    title_case(&stem.replace(['_', '-'], " "))
}

// A cased letter is upper-cased when it follows anything that is not a cased
// letter, so apostrophes and digits start a new word ("they're" -> "They'Re").
// std has no titlecase mapping: a multi-char uppercase keeps only its first
// char upper ("ß" -> "Ss"). Single-char titlecase forms such as "ǅ" come out
// as their uppercase ("Ǆ").
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_cased = false;
    for c in text.chars() {
        let cased = c.is_uppercase() || c.is_lowercase();
        if cased {
            if prev_cased {
                out.extend(c.to_lowercase());
            } else {
                let mut upper = c.to_uppercase();
                out.extend(upper.next());
                out.extend(upper.flat_map(char::to_lowercase));
            }
        } else {
            out.push(c);
        }
        prev_cased = cased;
    }
    out
}
