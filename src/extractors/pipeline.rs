// src/extractors/pipeline.rs
use std::path::Path;

use crate::extractors::anchor::{find_match_page, AnchorMatch};
use crate::extractors::candidates::fetch_candidates;
use crate::extractors::dedup::{remove_overlap_tables, remove_tables_same_page_by_keywords};
use crate::extractors::filters::{filter_tables, remove_tables_over_pages, sort_tables};
use crate::extractors::statement::StatementSpec;
use crate::report::models::{Document, TableCandidate};
use crate::report::tables::TableExtractor;
use crate::utils::table_debug::StageTrace;

/// Final tables for one (document, statement) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct StatementTables {
    /// Anchor page of the policy that produced the candidates (or the last one tried).
    pub anchor_page: Option<u32>,
    pub tables: Vec<TableCandidate>,
}

/// Runs anchor location, candidate retrieval and every filtering stage the
/// statement enables. Pure apart from the extractor call.
pub fn extract_statement_tables(
    document: &Document,
    pdf_path: &Path,
    spec: &StatementSpec,
    extractor: &dyn TableExtractor,
    trace: &mut StageTrace,
) -> StatementTables {
    tracing::info!("Extract {} ({}) for {}", spec.kind, spec.name, document.key);

    let mut anchor = AnchorMatch { page: None, max_page: document.max_page() };
    let mut tables = Vec::new();
    for (attempt, policy) in spec.anchors.iter().enumerate() {
        if attempt > 0 {
            tracing::debug!("{}: trying fallback anchor policy {} for {}", document.key, attempt, spec.kind);
        }
        anchor = find_match_page(document, policy, &spec.required_post_keywords);
        tables = fetch_candidates(
            extractor,
            &document.key,
            pdf_path,
            anchor,
            spec.prefix_pages,
            spec.post_pages,
            &spec.required_post_keywords,
        );
        if !tables.is_empty() {
            break;
        }
    }
    trace.record("fetched", &tables);

    if let Some(invalid_keywords) = &spec.table_filter {
        tables = filter_tables(&tables, invalid_keywords);
        trace.record("filtered", &tables);
    }

    tables = sort_tables(&tables);
    trace.record("sorted", &tables);

    if let Some(overlap) = &spec.overlap {
        tables = remove_overlap_tables(&tables, overlap);
        trace.record("deduplicated", &tables);
    }

    if spec.resolve_same_page {
        tables = remove_tables_same_page_by_keywords(&tables, &spec.required_post_keywords);
        trace.record("same-page", &tables);
    }

    for pass in 0..spec.cross_page_passes {
        tables = remove_tables_over_pages(&tables);
        trace.record(&format!("cross-page #{}", pass + 1), &tables);
    }

    tracing::info!(
        "{} for {}: {} tables (anchor page {:?})",
        spec.kind,
        document.key,
        tables.len(),
        anchor.page
    );
    StatementTables { anchor_page: anchor.page, tables }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::statement::StatementKind;
    use crate::report::models::RawPage;
    use crate::storage::render_tables;
    use crate::utils::error::ExtractError;
    use std::ops::Range;

    struct FixedExtractor(Vec<TableCandidate>);

    impl TableExtractor for FixedExtractor {
        fn extract_tables(&self, _pdf_path: &Path, pages: Range<u32>) -> Result<Vec<TableCandidate>, ExtractError> {
            Ok(self.0.iter().filter(|t| pages.contains(&t.page)).cloned().collect())
        }
    }

    struct FailingExtractor;

    impl TableExtractor for FailingExtractor {
        fn extract_tables(&self, pdf_path: &Path, _pages: Range<u32>) -> Result<Vec<TableCandidate>, ExtractError> {
            Err(ExtractError::TableExtraction {
                path: pdf_path.display().to_string(),
                reason: "malformed xref".to_string(),
            })
        }
    }

    fn doc(pages: &[(u32, &str)]) -> Document {
        Document::from_raw_pages(
            "report",
            pages.iter().map(|(p, t)| RawPage { page: *p, text: t.to_string() }).collect(),
        )
    }

    fn table(page: u32, y: f64, rows: &[&str]) -> TableCandidate {
        TableCandidate::new(page, y, rows.iter().map(|r| vec![r.to_string(), "1.00".to_string()]).collect())
    }

    const BS_ROWS: &str = "流动资产\n货币资金\n结算备付金\n拆出资金\n交易性金融资产\n应收保费\n\
        应收分保账款\n其他应收款\n存货\n合同资产\n持有待售资产\n非流动资产\n债权投资\n长期应收款";

    fn balance_sheet_doc() -> Document {
        doc(&[
            (1, "目录"),
            (80, format!("母公司资产负债表\n{}", BS_ROWS).as_str()),
            (100, format!("二、财务报表\n1、合并资产负债表\n{}", BS_ROWS).as_str()),
            (101, "负债合计\n股本\n未分配利润"),
            (102, "所有者权益合计"),
            (110, "其他"),
        ])
    }

    fn balance_sheet_tables() -> Vec<TableCandidate> {
        vec![
            // Parent-company statement two pages later repeats the row names.
            table(102, 600.0, &["货币资金", "存货", "长期股权投资"]),
            table(100, 300.0, &["货币资金", "存货", "固定资产", "商誉"]),
            table(101, 700.0, &["应付账款", "负债合计", "股本"]),
            // Same-page note with fewer keyword hits.
            table(101, 200.0, &["股本"]),
            table(105, 500.0, &["资本公积", "未分配利润"]),
        ]
    }

    #[test]
    fn test_balance_sheet_pipeline() {
        let spec = StatementKind::BalanceSheet.spec();
        let extractor = FixedExtractor(balance_sheet_tables());
        let mut trace = StageTrace::new(true);
        let result = extract_statement_tables(&balance_sheet_doc(), Path::new("r.pdf"), spec, &extractor, &mut trace);

        assert_eq!(result.anchor_page, Some(100));
        let kept: Vec<_> = result.tables.iter().map(|t| (t.page, t.y)).collect();
        assert_eq!(kept, vec![(100, 300.0), (101, 700.0)]);
        assert!(trace.render().contains("== cross-page #2"));
    }

    #[test]
    fn test_pipeline_is_deterministic() {
        let spec = StatementKind::BalanceSheet.spec();
        let extractor = FixedExtractor(balance_sheet_tables());
        let document = balance_sheet_doc();

        let first = extract_statement_tables(&document, Path::new("r.pdf"), spec, &extractor, &mut StageTrace::new(false));
        let second = extract_statement_tables(&document, Path::new("r.pdf"), spec, &extractor, &mut StageTrace::new(false));
        assert_eq!(render_tables(&first.tables), render_tables(&second.tables));
    }

    #[test]
    fn test_fallback_anchor_policy_is_tried() {
        let spec = StatementKind::CashFlow.spec();
        // No "合并现金流量表" heading, only the generic one.
        let document = doc(&[(
            90,
            "现金流量表\n经营活动产生的现金流量\n销售商品收到的现金\n客户存款\n收取利息\n\
             税费返还\n经营活动现金流入小计\n支付的现金\n支付给职工\n支付的各项税费\n投资活动现金\n筹资活动",
        )]);
        let extractor = FixedExtractor(vec![table(90, 500.0, &["经营活动产生的现金流量", "收到的现金"])]);
        let result = extract_statement_tables(&document, Path::new("r.pdf"), spec, &extractor, &mut StageTrace::new(false));
        assert_eq!(result.anchor_page, Some(90));
        assert_eq!(result.tables.len(), 1);
    }

    #[test]
    fn test_extraction_failure_yields_no_tables() {
        let spec = StatementKind::BasicInfo.spec();
        let document = doc(&[(42, "公司信息\n股票简称\n股票代码\n电子信箱")]);
        let result = extract_statement_tables(&document, Path::new("r.pdf"), spec, &FailingExtractor, &mut StageTrace::new(false));
        assert_eq!(result.anchor_page, Some(42));
        assert!(result.tables.is_empty());
    }

    #[test]
    fn test_basic_info_keeps_tables_in_window() {
        let spec = StatementKind::BasicInfo.spec();
        let document = doc(&[
            (41, "第一节 重要提示"),
            (42, "公司简介\n股票简称 某某\n股票代码 600000\n法定代表人 张三"),
            (43, "联系人和联系方式"),
            (44, "第三节"),
        ]);
        let extractor = FixedExtractor(vec![
            table(42, 600.0, &["股票简称", "股票代码", "法定代表人"]),
            table(43, 700.0, &["董事会秘书", "电子信箱"]),
            table(43, 300.0, &["办公地址", "邮政编码"]),
            table(44, 700.0, &["注册地址"]),
        ]);
        let result = extract_statement_tables(&document, Path::new("r.pdf"), spec, &extractor, &mut StageTrace::new(false));
        let kept: Vec<_> = result.tables.iter().map(|t| (t.page, t.y)).collect();
        assert_eq!(kept, vec![(42, 600.0), (43, 300.0)]);
    }
}
