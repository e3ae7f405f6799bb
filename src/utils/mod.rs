//! Shared helpers: retry engine, low-level errors, paging and file names

pub mod error;
pub mod retry;

use regex::Regex;
use std::sync::LazyLock;

/// Characters that are not allowed in export file names on common filesystems
static FORBIDDEN_IN_FILE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[<>:"/\\|?*\x00-\x1f]"#).expect("Invalid file name regex"));

/// Replace characters that cannot appear in a file name with `_`.
///
/// Query strings such as `area=113&professional_role=96` pass through
/// unchanged; proxy keys like `10.0.0.1:8080` lose their colon.
pub fn sanitize_filename(name: &str) -> String {
    FORBIDDEN_IN_FILE_NAME.replace_all(name, "_").into_owned()
}

/// Number of pages needed to cover `found` results at `per_page` per page
pub fn page_count(found: u64, per_page: u32) -> u32 {
    if per_page == 0 {
        return 0;
    }
    found.div_ceil(u64::from(per_page)) as u32
}

/// Cut `text` to at most `limit` characters, marking the cut with `...`
pub fn truncate_text(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        None => text.to_string(),
        Some(_) => {
            let kept: String = text.chars().take(limit.saturating_sub(3)).collect();
            kept + "..."
        }
    }
}
