//! SEO keyword and category constants for the orthodontics blog.
//!
//! Centralising the domain vocabulary here serves two purposes:
//!
//! 1. **Single source of truth** — the editorial team's keyword list and
//!    default category change together, in exactly one place.
//!
//! 2. **Testability** — the focus-keyword fallback chain can be exercised
//!    directly against these constants without constructing a pipeline.
//!
//! The terms are Korean because the target site is a Korean orthodontics
//! blog; they are data, not UI strings, and must match the site's existing
//! taxonomy exactly.

/// Clinical terms scanned for in the document title, in priority order,
/// when the header declares no tags.
///
/// 투명교정 (clear aligners), 인비절라인 (Invisalign), 교정 (orthodontics),
/// 치료 (treatment).
pub const TITLE_KEYWORDS: &[&str] = &["투명교정", "인비절라인", "교정", "치료"];

/// Focus keyword used when neither tags nor a title keyword are available.
///
/// 치과교정 — "dental orthodontics", the site's umbrella term.
pub const DEFAULT_FOCUS_KEYWORD: &str = "치과교정";

/// Category assigned when the document header declares none.
///
/// 최신 치과교정학 연구 — "latest orthodontics research".
pub const DEFAULT_CATEGORY: &str = "최신 치과교정학 연구";

/// Derive the SEO focus keyword for a document.
///
/// Priority: first declared tag → first [`TITLE_KEYWORDS`] entry found in
/// the title → [`DEFAULT_FOCUS_KEYWORD`].
pub fn extract_focus_keyword(tags: &[String], title: &str) -> String {
    if let Some(first) = tags.first() {
        return first.clone();
    }
    for kw in TITLE_KEYWORDS {
        if title.contains(kw) {
            return (*kw).to_string();
        }
    }
    DEFAULT_FOCUS_KEYWORD.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_tag_wins() {
        let tags = vec!["투명교정".to_string(), "교정".to_string()];
        assert_eq!(extract_focus_keyword(&tags, "무관한 제목"), "투명교정");
    }

    #[test]
    fn title_scan_when_no_tags() {
        assert_eq!(
            extract_focus_keyword(&[], "인비절라인 치료 결과 분석"),
            "인비절라인"
        );
    }

    #[test]
    fn title_scan_respects_priority_order() {
        // Both 교정 and 치료 appear; 교정 is listed earlier.
        assert_eq!(extract_focus_keyword(&[], "교정 치료 가이드"), "교정");
    }

    #[test]
    fn default_when_nothing_matches() {
        assert_eq!(
            extract_focus_keyword(&[], "A paper about something else"),
            DEFAULT_FOCUS_KEYWORD
        );
    }
}
