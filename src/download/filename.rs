//! Filesystem-safe filenames from media titles.

use unicode_general_category::{GeneralCategory, get_general_category};

/// Characters that are reserved in filenames on at least one supported OS.
const RESERVED: [char; 9] = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Replacement for reserved characters.
const REPLACEMENT: char = '-';

/// Maps a title to a filename-safe string.
///
/// Reserved characters become `-`, non-printable characters are dropped, and
/// everything else passes through unchanged, including non-ASCII scripts.
/// The mapping is idempotent.
///
/// # Example
///
/// ```
/// use videos_downloader_core::download::sanitize_filename;
///
/// assert_eq!(sanitize_filename("AC/DC: Live?"), "AC-DC- Live-");
/// assert_eq!(sanitize_filename("日本語\u{7}タイトル"), "日本語タイトル");
/// ```
#[must_use]
pub fn sanitize_filename(title: &str) -> String {
    title
        .chars()
        .filter_map(|ch| {
            if RESERVED.contains(&ch) {
                Some(REPLACEMENT)
            } else if is_printable(ch) {
                Some(ch)
            } else {
                None
            }
        })
        .collect()
}

/// Printable means letters, marks, numbers, punctuation, symbols, and the
/// ASCII space. Separators, controls, format characters, surrogates,
/// private-use and unassigned code points are not.
fn is_printable(ch: char) -> bool {
    if ch == ' ' {
        return true;
    }
    !matches!(
        get_general_category(ch),
        GeneralCategory::Control
            | GeneralCategory::Format
            | GeneralCategory::Surrogate
            | GeneralCategory::PrivateUse
            | GeneralCategory::Unassigned
            | GeneralCategory::SpaceSeparator
            | GeneralCategory::LineSeparator
            | GeneralCategory::ParagraphSeparator
    )
}
