//! Console report rendering.
//!
//! Produces the fixed-width result table, the run banner and the summary
//! statistics block printed by the CLI.

use zero_common::util::{pad_decimal, pad_right};

use crate::error::{Result, ScreenError};
use crate::frame::{ResultFrame, REQUIRED_COLUMNS};
use crate::request::ScreeningRequest;

/// Width of the rule lines framing every block.
pub const RULE_WIDTH: usize = 120;

/// Message rendered instead of a table when nothing matched.
pub const NO_MATCHES: &str = "\n未找到符合条件的股票。\n";

/// Column headers and their widths, in render order.
const TABLE_COLUMNS: [(&str, usize); 9] = [
    ("排名", 6),
    ("代码", 10),
    ("名称", 12),
    ("综合评分", 12),
    ("技术面", 12),
    ("基本面", 12),
    ("资金面", 12),
    ("当前价格", 12),
    ("入选理由", 20),
];

fn rule(ch: char) -> String {
    ch.to_string().repeat(RULE_WIDTH)
}

// ============================================================================
// Result Table
// ============================================================================

/// Render the result table.
///
/// An empty frame renders [`NO_MATCHES`]; this is checked before the column
/// check, so an empty frame with no columns is not an error. Rank is the
/// 1-based position in the frame.
pub fn format_results_table(frame: &ResultFrame) -> Result<String> {
    if frame.is_empty() {
        return Ok(NO_MATCHES.to_string());
    }

    let missing = frame.missing_required_columns();
    if !missing.is_empty() {
        return Err(ScreenError::MissingColumns {
            missing,
            required: REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect(),
        });
    }

    let mut lines = Vec::with_capacity(frame.len() + 8);
    lines.push(rule('='));
    lines.push(format!("{}筛选结果", " ".repeat(36)));
    lines.push(rule('='));
    lines.push(String::new());

    lines.push(
        TABLE_COLUMNS
            .iter()
            .map(|(title, width)| pad_right(title, *width))
            .collect(),
    );
    lines.push(rule('-'));

    for (idx, row) in frame.rows().iter().enumerate() {
        let w = |i: usize| TABLE_COLUMNS[i].1;
        lines.push(format!(
            "{}{}{}{}{}{}{}{}{}",
            pad_right(&(idx + 1).to_string(), w(0)),
            pad_right(&row.code, w(1)),
            pad_right(&row.name, w(2)),
            pad_decimal(row.score, w(3)),
            pad_decimal(row.tech_score, w(4)),
            pad_decimal(row.fundamental_score, w(5)),
            pad_decimal(row.capital_score, w(6)),
            pad_decimal(row.current_price, w(7)),
            pad_right(&row.reason, w(8)),
        ));
    }

    lines.push(rule('='));
    lines.push(format!("总计: {} 只股票", frame.len()));
    lines.push(rule('='));

    Ok(lines.join("\n"))
}

// ============================================================================
// Summary Statistics
// ============================================================================

/// Composite score statistics for a non-empty result set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreeningStats {
    pub count: usize,
    pub mean: f64,
    pub max: f64,
    pub min: f64,
}

impl ScreeningStats {
    /// Statistics over the frame's composite scores; `None` when empty.
    pub fn from_frame(frame: &ResultFrame) -> Option<Self> {
        if frame.is_empty() {
            return None;
        }

        let scores = frame.rows().iter().map(|r| r.score);
        let sum: f64 = scores.clone().sum();
        let max = scores.clone().fold(f64::NEG_INFINITY, f64::max);
        let min = scores.fold(f64::INFINITY, f64::min);

        Some(Self {
            count: frame.len(),
            mean: sum / frame.len() as f64,
            max,
            min,
        })
    }

    /// Console block with two-decimal values.
    pub fn render(&self) -> String {
        format!(
            "\n筛选统计:\n  平均综合评分: {:.2}\n  最高综合评分: {:.2}\n  最低综合评分: {:.2}",
            self.mean, self.max, self.min
        )
    }
}

// ============================================================================
// Banner
// ============================================================================

/// Banner printed before a run starts.
pub fn render_banner(request: &ScreeningRequest, output: Option<&str>) -> String {
    let preset = request.preset;
    let mut lines = vec![
        rule('='),
        format!("{}A股批量筛选系统", " ".repeat(32)),
        rule('='),
        format!("预设条件: {} - {}", preset.name(), preset.label()),
        format!("说明: {}", preset.description()),
        format!("返回数量: TOP {}", request.top_n),
        format!("最低分数: {}", request.min_score),
        format!("并行处理: {}", if request.parallel { "是" } else { "否" }),
    ];
    if let Some(pool) = &request.stock_pool {
        lines.push(format!("股票池: {} 只", pool.len()));
    }
    if let Some(output) = output {
        lines.push(format!("输出文件: {output}"));
    }
    lines.push(rule('='));
    lines.join("\n")
}
