// src/extractors/anchor.rs

// --- Imports ---
use crate::extractors::statement::AnchorPolicy;
use crate::report::models::{Document, TextLine};

/// Result of scanning a document for a statement's opening line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnchorMatch {
    /// Page of the accepted anchor line, `None` when nothing qualified.
    pub page: Option<u32>,
    /// Highest page of the document, `None` for a zero-page document.
    pub max_page: Option<u32>,
}

/// Finds the page of the first line that opens the statement.
///
/// A line is a candidate when it holds a required line keyword and no invalid
/// line keyword; an invalid keyword rejects the line outright. The candidate is
/// confirmed by the windows around it: the post-window (starting at the line
/// itself) must hold at least `min_match_number` of `required_post_keywords`,
/// and neither window may hold its invalid keywords. Scanning stops at the
/// first confirmed line.
pub fn find_match_page(
    document: &Document,
    policy: &AnchorPolicy,
    required_post_keywords: &[&str],
) -> AnchorMatch {
    let max_page = document.max_page();
    let lines = document.text_lines();

    let page = (0..lines.len())
        .find(|&i| {
            is_candidate_line(lines[i].text, policy)
                && window_confirms(&lines, i, policy, required_post_keywords)
        })
        .map(|i| lines[i].page);

    match page {
        Some(p) => tracing::debug!("Anchor for {} found on page {}", document.key, p),
        None => tracing::debug!("No anchor line found in {}", document.key),
    }
    AnchorMatch { page, max_page }
}

fn is_candidate_line(text: &str, policy: &AnchorPolicy) -> bool {
    let mut find = policy.required_line_keywords.iter().any(|k| text.contains(k));
    // An invalid keyword overrides the positive match for this line.
    if let Some(keyword) = policy.invalid_line_keywords.iter().find(|k| text.contains(*k)) {
        tracing::trace!("Filter as invalid line keyword {}", keyword);
        find = false;
    }
    find
}

fn window_confirms(
    lines: &[TextLine<'_>],
    i: usize,
    policy: &AnchorPolicy,
    required_post_keywords: &[&str],
) -> bool {
    let width = policy.max_continuous_lines;
    let start = i.saturating_sub(width);
    let end = lines.len().min(i + width);
    let pre_text = join_lines(&lines[start..i]);
    let post_text = join_lines(&lines[i..end]);

    let num_match = required_post_keywords
        .iter()
        .filter(|k| post_text.contains(*k))
        .count();
    if (num_match as f64) < policy.min_match_number {
        tracing::trace!(
            "Filter page {} as not enough post keywords {}<{}",
            lines[i].page,
            num_match,
            policy.min_match_number
        );
        return false;
    }

    if let Some(keyword) = policy.invalid_pre_keywords.iter().find(|k| pre_text.contains(*k)) {
        tracing::trace!("Filter page {} as invalid pre keyword {}", lines[i].page, keyword);
        return false;
    }
    if let Some(keyword) = policy.invalid_post_keywords.iter().find(|k| post_text.contains(*k)) {
        tracing::trace!("Filter page {} as invalid post keyword {}", lines[i].page, keyword);
        return false;
    }
    true
}

fn join_lines(lines: &[TextLine<'_>]) -> String {
    lines.iter().map(|l| l.text).collect::<Vec<_>>().join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::statement::StatementKind;
    use crate::report::models::RawPage;

    fn doc(pages: &[(u32, &str)]) -> Document {
        Document::from_raw_pages(
            "test",
            pages
                .iter()
                .map(|(page, text)| RawPage { page: *page, text: text.to_string() })
                .collect(),
        )
    }

    fn simple_policy() -> AnchorPolicy {
        AnchorPolicy {
            required_line_keywords: vec!["资产负债表"],
            invalid_line_keywords: vec!["母公司资产负债表"],
            invalid_pre_keywords: vec!["审计意见"],
            invalid_post_keywords: vec!["调整"],
            min_match_number: 1.5,
            max_continuous_lines: 4,
        }
    }

    const ROWS: [&str; 3] = ["货币资金", "存货", "商誉"];

    #[test]
    fn test_accepts_line_with_enough_post_keywords() {
        let d = doc(&[(10, "目录"), (11, "合并资产负债表\n货币资金 100\n存货 20")]);
        let m = find_match_page(&d, &simple_policy(), &ROWS);
        assert_eq!(m, AnchorMatch { page: Some(11), max_page: Some(11) });
    }

    #[test]
    fn test_not_enough_post_keywords_rejects() {
        // Only one row keyword; 1 < 1.5
        let d = doc(&[(11, "合并资产负债表\n货币资金 100\n其他 20")]);
        assert_eq!(find_match_page(&d, &simple_policy(), &ROWS).page, None);
    }

    #[test]
    fn test_invalid_post_keyword_rejects() {
        let d = doc(&[(11, "合并资产负债表\n货币资金\n存货\n调整")]);
        assert_eq!(find_match_page(&d, &simple_policy(), &ROWS).page, None);
    }

    #[test]
    fn test_invalid_pre_keyword_rejects() {
        let d = doc(&[(10, "审计意见"), (11, "合并资产负债表\n货币资金\n存货")]);
        assert_eq!(find_match_page(&d, &simple_policy(), &ROWS).page, None);
    }

    #[test]
    fn test_pre_window_is_bounded() {
        // The invalid pre keyword sits five lines back, outside a window of four.
        let d = doc(&[
            (10, "审计意见\na\nb\nc\nd"),
            (11, "合并资产负债表\n货币资金\n存货"),
        ]);
        assert_eq!(find_match_page(&d, &simple_policy(), &ROWS).page, Some(11));
    }

    #[test]
    fn test_invalid_line_keyword_is_final_for_the_line() {
        // "母公司资产负债表" contains "资产负债表" but the invalid keyword wins.
        let d = doc(&[
            (20, "母公司资产负债表\n货币资金\n存货"),
            (25, "合并资产负债表\n货币资金\n存货"),
        ]);
        let m = find_match_page(&d, &simple_policy(), &ROWS);
        assert_eq!(m.page, Some(25));
        assert_eq!(m.max_page, Some(25));
    }

    #[test]
    fn test_first_confirmed_line_wins() {
        let d = doc(&[
            (30, "资产负债表\n货币资金\n存货"),
            (31, "资产负债表\n货币资金\n存货\n商誉"),
        ]);
        assert_eq!(find_match_page(&d, &simple_policy(), &ROWS).page, Some(30));
    }

    #[test]
    fn test_zero_page_document_is_not_found() {
        let d = doc(&[]);
        assert_eq!(
            find_match_page(&d, &simple_policy(), &ROWS),
            AnchorMatch { page: None, max_page: None }
        );
    }

    #[test]
    fn test_basic_info_anchor_on_page_42() {
        let spec = StatementKind::BasicInfo.spec();
        let d = doc(&[
            (41, "第一节 重要提示、目录和释义"),
            (42, "一、公司信息\n公司简介\n股票简称 某某股份\n股票代码 600000\n法定代表人 张三"),
            (43, "二、联系人和联系方式"),
        ]);
        // Three of nine row keywords clears the 30% threshold (2.7).
        let m = find_match_page(&d, &spec.anchors[0], &spec.required_post_keywords);
        assert_eq!(m, AnchorMatch { page: Some(42), max_page: Some(43) });
    }
}
