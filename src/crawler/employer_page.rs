//! Employer review site scraping helpers
//!
//! The review site is searched by company name; the first result link
//! (`a[data-pjax]`) points at the company, whose numeric id follows a `/`.

use regex::Regex;
use scraper::{Html, Selector};
use std::sync::LazyLock;

static RESULT_LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[data-pjax]").expect("Invalid CSS selector: a[data-pjax]"));

static COMPANY_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/(\d+)").expect("Invalid company id regex"));

/// Href of the first search result on a `search-all` page
pub fn company_link(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    document
        .select(&RESULT_LINK)
        .next()
        .and_then(|a| a.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .map(str::to_string)
}

/// First run of digits preceded by `/` in a company link
pub fn company_id(link: &str) -> Option<String> {
    COMPANY_ID
        .captures(link)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Path of the career page for a company link
pub fn career_path(link: &str) -> String {
    format!("{}/career", link.trim_end_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEARCH_HTML: &str = r#"
        <html><body>
            <a href="/about">About</a>
            <div class="results">
                <a data-pjax="0" href="/employers/48213">Acme</a>
                <a data-pjax="0" href="/employers/999">Other</a>
            </div>
        </body></html>
    "#;

    #[test]
    fn test_company_link_takes_first_result() {
        assert_eq!(
            company_link(SEARCH_HTML).as_deref(),
            Some("/employers/48213")
        );
    }

    #[test]
    fn test_company_link_absent() {
        assert!(company_link("<html><body><a href=\"/x\">x</a></body></html>").is_none());
    }

    #[test]
    fn test_company_id() {
        assert_eq!(company_id("/employers/48213").as_deref(), Some("48213"));
        assert_eq!(company_id("/employers/acme"), None);
    }

    #[test]
    fn test_career_path() {
        assert_eq!(career_path("/employers/1/"), "/employers/1/career");
        assert_eq!(career_path("/employers/1"), "/employers/1/career");
    }
}
