// src/extractors/statement.rs
use std::collections::BTreeMap;
use std::fmt;

use clap::ValueEnum;
use once_cell::sync::Lazy;

/// The six data categories pulled out of every annual report.
/// The value names double as file names and aggregate keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, ValueEnum)]
pub enum StatementKind {
    #[value(name = "basic_info")]
    BasicInfo,
    #[value(name = "employee_info")]
    EmployeeInfo,
    #[value(name = "cbs_info")]
    BalanceSheet,
    #[value(name = "cscf_info")]
    CashFlow,
    #[value(name = "cis_info")]
    IncomeStatement,
    #[value(name = "dev_info")]
    RndHeadcount,
}

impl StatementKind {
    /// Processing order of a full run.
    pub const ALL: [StatementKind; 6] = [
        StatementKind::BasicInfo,
        StatementKind::EmployeeInfo,
        StatementKind::BalanceSheet,
        StatementKind::CashFlow,
        StatementKind::IncomeStatement,
        StatementKind::RndHeadcount,
    ];

    pub fn key(self) -> &'static str {
        match self {
            StatementKind::BasicInfo => "basic_info",
            StatementKind::EmployeeInfo => "employee_info",
            StatementKind::BalanceSheet => "cbs_info",
            StatementKind::CashFlow => "cscf_info",
            StatementKind::IncomeStatement => "cis_info",
            StatementKind::RndHeadcount => "dev_info",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.key() == key)
    }

    pub fn spec(self) -> &'static StatementSpec {
        &registry()[&self]
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// How to find the line that opens a statement section.
#[derive(Debug, Clone, PartialEq)]
pub struct AnchorPolicy {
    pub required_line_keywords: Vec<&'static str>,
    pub invalid_line_keywords: Vec<&'static str>,
    pub invalid_pre_keywords: Vec<&'static str>,
    pub invalid_post_keywords: Vec<&'static str>,
    /// Minimum count of required post keywords in the post-window. Fractional;
    /// compared against the integer hit count.
    pub min_match_number: f64,
    pub max_continuous_lines: usize,
}

/// Row-name overlap deduplication settings.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlapPolicy {
    /// Row names containing any of these never count as overlap.
    pub valid_overlap_words: Vec<&'static str>,
    pub max_overlap_words: usize,
}

pub const DEFAULT_MAX_OVERLAP_WORDS: usize = 2;

/// Everything the pipeline needs to know about one statement type.
#[derive(Debug, Clone, PartialEq)]
pub struct StatementSpec {
    pub kind: StatementKind,
    pub name: &'static str,
    /// Tried in order; a later policy only runs when the earlier one produced no candidates.
    pub anchors: Vec<AnchorPolicy>,
    /// Row keywords: confirm anchors, select candidates, arbitrate same-page pairs.
    pub required_post_keywords: Vec<&'static str>,
    pub prefix_pages: u32,
    pub post_pages: u32,
    /// Invalid table keywords; `None` skips the table filter stage entirely.
    pub table_filter: Option<Vec<&'static str>>,
    pub overlap: Option<OverlapPolicy>,
    pub resolve_same_page: bool,
    pub cross_page_passes: usize,
}

// --- Registry ---
static REGISTRY: Lazy<BTreeMap<StatementKind, StatementSpec>> = Lazy::new(|| {
    StatementKind::ALL
        .into_iter()
        .map(|kind| (kind, build_spec(kind)))
        .collect()
});

/// Map from statement type to its configuration.
pub fn registry() -> &'static BTreeMap<StatementKind, StatementSpec> {
    &REGISTRY
}

// int(1.5 * n)
fn window_of(keywords: &[&str]) -> usize {
    keywords.len() * 3 / 2
}

fn ratio_of(keywords: &[&str], ratio: f64) -> f64 {
    ratio * keywords.len() as f64
}

fn policy(
    required_line_keywords: &[&'static str],
    invalid_line_keywords: &[&'static str],
    invalid_post_keywords: &[&'static str],
    min_match_number: f64,
    max_continuous_lines: usize,
) -> AnchorPolicy {
    AnchorPolicy {
        required_line_keywords: required_line_keywords.to_vec(),
        invalid_line_keywords: invalid_line_keywords.to_vec(),
        invalid_pre_keywords: Vec::new(),
        invalid_post_keywords: invalid_post_keywords.to_vec(),
        min_match_number,
        max_continuous_lines,
    }
}

fn overlap(valid_overlap_words: &[&'static str]) -> Option<OverlapPolicy> {
    Some(OverlapPolicy {
        valid_overlap_words: valid_overlap_words.to_vec(),
        max_overlap_words: DEFAULT_MAX_OVERLAP_WORDS,
    })
}

fn build_spec(kind: StatementKind) -> StatementSpec {
    match kind {
        StatementKind::BasicInfo => {
            let rows = vec![
                "股票简称", "股票代码", "中文简称", "外文名称", "法定代表人",
                "注册地址", "邮政编码", "办公地址", "电子信箱",
            ];
            StatementSpec {
                kind,
                name: "basic company information",
                anchors: vec![policy(
                    &["公司简介", "基本情况", "公司信息", "中文简称", "电子信箱"],
                    &[],
                    &[],
                    ratio_of(&rows, 0.3),
                    window_of(&rows),
                )],
                required_post_keywords: rows,
                prefix_pages: 1,
                post_pages: 1,
                table_filter: Some(vec![
                    "会计师事务所", "董事会秘书", "证券事务代表", "保荐机构",
                    "公司股票简况", "持续督导", "变更前股票",
                ]),
                overlap: None,
                resolve_same_page: false,
                cross_page_passes: 0,
            }
        }
        StatementKind::EmployeeInfo => {
            let rows = vec![
                "在职员工", "职工人数", "专业构成", "离退休职",
                "生产人员", "销售人员", "技术人员",
                "行政人员", "管理人员", "业务人员",
                "教育程度", "硕士", "本科", "大专", "研究生",
                "专科",
            ];
            StatementSpec {
                kind,
                name: "employee headcount",
                anchors: vec![policy(
                    &["员工情况", "员工的数量", "员工数量", "专业构成", "离退休职工人数", "员工教育结构"],
                    &[],
                    &[],
                    ratio_of(&rows, 0.3),
                    window_of(&rows),
                )],
                required_post_keywords: rows,
                prefix_pages: 1,
                post_pages: 1,
                table_filter: Some(vec!["其他单位", "董事", "经理", "审议"]),
                overlap: None,
                resolve_same_page: false,
                cross_page_passes: 0,
            }
        }
        StatementKind::BalanceSheet => {
            let rows = vec![
                "流动资产", "货币资金", "结算备付金", "拆出资金", "交易性金融资产",
                "应收保费", "应收分保账款", "应收分保合同准备金", "其他应收款",
                "存货", "合同资产", "持有待售资产", "返售金融资产",
                "非流动资产", "债权投资", "其他债权投资", "长期应收款",
                "固定资产", "油气资产", "商誉", "无形资产",
                "递延所得税资产", "其他非流动资产", "资产合计", "资产总计",
                "应付账款", "预收款项", "合同负债", "应付职工薪酬",
                "持有待售负债", "一年内到期的非流动负债", "其他流动负债", "流动负债合计",
                "长期应付职工薪酬", "预计负债", "递延收益", "递延所得税负债",
                "其他权益工具", "优先股", "资本公积", "负债合计", "股本",
                "未分配利润", "股东权益合计",
                "所有者权益", "少数股东权益",
            ];
            StatementSpec {
                kind,
                name: "consolidated balance sheet",
                anchors: vec![
                    policy(
                        &["资产负债表"],
                        &["母公司资产负债表"],
                        &["调整", "变动比例", "变更"],
                        ratio_of(&rows, 0.3),
                        window_of(&rows),
                    ),
                    // Consolidated and parent statements printed under one heading.
                    policy(
                        &["合并及母公司资产负债表"],
                        &[],
                        &["调整", "变更"],
                        ratio_of(&rows, 0.2),
                        window_of(&rows),
                    ),
                    policy(
                        &["合并资产负债表和资产负债表"],
                        &[],
                        &["调整", "变更"],
                        ratio_of(&rows, 0.2),
                        rows.len() * 2,
                    ),
                ],
                required_post_keywords: rows,
                prefix_pages: 0,
                post_pages: 5,
                table_filter: Some(vec!["非流动资产处置损益"]),
                overlap: overlap(&["优先股", "永续债", "金额单位", "年度报告"]),
                resolve_same_page: true,
                cross_page_passes: 2,
            }
        }
        StatementKind::CashFlow => {
            let rows = vec![
                "经营活动产生的", "收到的现金", "客户存款",
                "其他金融机构", "中央银行", "原保险合同",
                "收取利息", "拆入资金", "买卖证券",
                "税费返还", "经营活动有关",
                "经营活动现金", "支付的现金",
                "客户贷款及垫款", "原保险合同",
                "拆出资金", "手续费及佣金",
                "支付给职工", "支付的各项税费",
                "投资活动现金", "收回投资",
                "处置固定资产", "处置子公司",
                "投资支付", "筹资活动",
                "汇率变动", "现金及现金等价物",
                "现金等价物余额",
            ];
            let invalid_post = ["变动比例", "调整", "变更"];
            StatementSpec {
                kind,
                name: "consolidated cash flow statement",
                anchors: vec![
                    policy(&["合并现金流量表"], &["母公司现金流量表"], &invalid_post, ratio_of(&rows, 0.3), 50),
                    policy(&["现金流量表"], &["母公司现金流量表"], &invalid_post, ratio_of(&rows, 0.3), 50),
                ],
                required_post_keywords: rows,
                prefix_pages: 0,
                post_pages: 3,
                table_filter: None,
                overlap: overlap(&["净额", "人民币"]),
                resolve_same_page: true,
                cross_page_passes: 1,
            }
        }
        StatementKind::IncomeStatement => {
            let rows = vec![
                "营业总收入", "营业收入", "利息收入", "已赚保费",
                "手续费及佣金收入", "营业总成本", "营业成本", "利息支出",
                "保单红利支出", "分保费用", "营业税金及附加", "销售费用",
                "管理费用", "研发费用", "财务费用", "利息费用",
                "以摊余成本计量", "汇兑收益", "净敞口套期收益", "公允价值变动收益",
                "营业外收入", "营业外支出", "利润总额", "所得税费用",
                "少数股东损益", "其他综合收益的税后净额", "收益的税后净额", "不能重分类进损益",
                "权益法下可转损益", "其他债权投资公允价值", "可供出售金融资产", "金融资产重分类计入",
                "外币财务报表", "归属于少数股东的",
                "归属于少数股东的",
                "基本每股收益", "稀释每股收益",
            ];
            StatementSpec {
                kind,
                name: "consolidated income statement",
                anchors: vec![policy(
                    &["利润表"],
                    &["母公司利润表"],
                    &["变动比例", "变更", "调整"],
                    ratio_of(&rows, 0.3),
                    window_of(&rows),
                )],
                required_post_keywords: rows,
                prefix_pages: 0,
                post_pages: 3,
                table_filter: None,
                overlap: overlap(&["利息收入", "项目"]),
                resolve_same_page: true,
                cross_page_passes: 1,
            }
        }
        StatementKind::RndHeadcount => {
            let rows = vec!["研发人员数量", "研发人员的数量"];
            StatementSpec {
                kind,
                name: "R&D headcount",
                anchors: vec![policy(
                    &["研发人员数量", "研发人员的数量"],
                    &[],
                    &[],
                    ratio_of(&rows, 0.2),
                    window_of(&rows),
                )],
                required_post_keywords: rows,
                prefix_pages: 0,
                post_pages: 2,
                table_filter: None,
                overlap: None,
                resolve_same_page: false,
                cross_page_passes: 0,
            }
        }
    }
}
