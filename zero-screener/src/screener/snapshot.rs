//! Snapshot-backed screener.
//!
//! Ranks a pre-scored universe stored as JSON:
//!
//! ```json
//! {
//!   "as_of": "2024-06-28",
//!   "stocks": [
//!     {"code": "600519.SH", "name": "贵州茅台", "tech_score": 72.0,
//!      "fundamental_score": 88.0, "capital_score": 65.0, "current_price": 1520.3}
//!   ]
//! }
//! ```
//!
//! Optional per-stock metrics (`pe`, `roe`, `dividend_yield`,
//! `institutional_ratio`, `high_20d`, `volume_ratio`, `rsi`, `rsi_min`) feed
//! the preset entry rules; a stock lacking a metric its preset needs is
//! dropped.
//!
//! Per screen: restrict to the pool, drop ST stocks, apply the preset entry
//! rule, blend sub-scores with the preset profile, apply the score floor,
//! sort, keep the top N.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::code::{is_special_treatment, normalize_stock_code};
use crate::frame::{deserialize_code, ResultFrame, ScreenedStock};
use crate::preset::{EntryRule, Preset, PresetProfile};

use super::{ScreenerError, StockScreener};

/// Sub-score at or above which a component is called out in the reason.
const STRONG_COMPONENT_SCORE: f64 = 70.0;

// ============================================================================
// Snapshot Types
// ============================================================================

/// A pre-scored universe of stocks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UniverseSnapshot {
    /// Date the scores were computed (informational)
    #[serde(default)]
    pub as_of: Option<String>,
    /// Every stock in the universe
    #[serde(default)]
    pub stocks: Vec<SnapshotStock>,
}

/// One stock in a universe snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotStock {
    /// Stock code, with or without market suffix
    #[serde(deserialize_with = "deserialize_code")]
    pub code: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Technical sub-score (0-100)
    #[serde(default)]
    pub tech_score: f64,
    /// Fundamental sub-score (0-100)
    #[serde(default)]
    pub fundamental_score: f64,
    /// Capital-flow sub-score (0-100)
    #[serde(default)]
    pub capital_score: f64,
    /// Latest price
    #[serde(default)]
    pub current_price: f64,
    /// Special Treatment flag
    #[serde(default)]
    pub is_st: bool,
    /// Price-to-earnings ratio (TTM)
    #[serde(default)]
    pub pe: Option<f64>,
    /// Return on equity (%)
    #[serde(default)]
    pub roe: Option<f64>,
    /// Dividend yield (%)
    #[serde(default)]
    pub dividend_yield: Option<f64>,
    /// Institutional holding ratio (%)
    #[serde(default)]
    pub institutional_ratio: Option<f64>,
    /// Highest close of the 20 sessions before today
    #[serde(default)]
    pub high_20d: Option<f64>,
    /// Today's volume over the prior 20-session average
    #[serde(default)]
    pub volume_ratio: Option<f64>,
    /// Current RSI
    #[serde(default)]
    pub rsi: Option<f64>,
    /// Lowest RSI over the lookback window
    #[serde(default)]
    pub rsi_min: Option<f64>,
}

impl SnapshotStock {
    /// Whether the stock meets `rule`. Missing metrics fail the rule.
    pub fn meets(&self, rule: &EntryRule) -> bool {
        match *rule {
            EntryRule::None => true,
            EntryRule::PeRoe { pe_max, roe_min } => matches!(
                (self.pe, self.roe),
                (Some(pe), Some(roe)) if pe < pe_max && roe > roe_min
            ),
            EntryRule::DividendYield { yield_min } => {
                self.dividend_yield.is_some_and(|y| y >= yield_min)
            }
            EntryRule::Breakout { volume_ratio_min } => matches!(
                (self.high_20d, self.volume_ratio),
                (Some(high), Some(ratio)) if self.current_price > high && ratio >= volume_ratio_min
            ),
            EntryRule::OversoldRebound {
                rsi_oversold,
                rsi_rebound_min,
            } => matches!(
                (self.rsi, self.rsi_min),
                (Some(rsi), Some(low)) if low < rsi_oversold && rsi >= rsi_rebound_min
            ),
            EntryRule::InstitutionalHolding { ratio_min } => {
                self.institutional_ratio.is_some_and(|r| r >= ratio_min)
            }
        }
    }
}

impl UniverseSnapshot {
    /// Load a snapshot from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ScreenerError> {
        let content = std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ScreenerError::DataNotAvailable(format!(
                    "universe snapshot not found at {}",
                    path.display()
                ))
            } else {
                ScreenerError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;

        serde_json::from_str(&content).map_err(|source| ScreenerError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

// ============================================================================
// Snapshot Screener
// ============================================================================

#[derive(Debug, Clone)]
enum SnapshotSource {
    File(PathBuf),
    Loaded(UniverseSnapshot),
}

/// Screener that ranks a [`UniverseSnapshot`].
#[derive(Debug, Clone)]
pub struct SnapshotScreener {
    source: SnapshotSource,
    exclude_st: bool,
}

impl SnapshotScreener {
    /// Screener reading the snapshot from `path` on every screen.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            source: SnapshotSource::File(path.into()),
            exclude_st: true,
        }
    }

    /// Screener over an in-memory snapshot.
    pub fn from_snapshot(snapshot: UniverseSnapshot) -> Self {
        Self {
            source: SnapshotSource::Loaded(snapshot),
            exclude_st: true,
        }
    }

    /// Whether ST stocks are dropped (default: true).
    pub fn with_exclude_st(mut self, exclude_st: bool) -> Self {
        self.exclude_st = exclude_st;
        self
    }

    fn snapshot(&self) -> Result<Cow<'_, UniverseSnapshot>, ScreenerError> {
        match &self.source {
            SnapshotSource::File(path) => {
                debug!(path = %path.display(), "Loading universe snapshot");
                UniverseSnapshot::load(path).map(Cow::Owned)
            }
            SnapshotSource::Loaded(snapshot) => Ok(Cow::Borrowed(snapshot)),
        }
    }

    /// Pool, ST and entry-rule filtering.
    fn candidates<'a>(
        &self,
        stocks: &'a [SnapshotStock],
        stock_pool: Option<&[String]>,
        entry: &EntryRule,
    ) -> Vec<&'a SnapshotStock> {
        let pool: Option<HashSet<String>> =
            stock_pool.map(|codes| codes.iter().map(|c| normalize_stock_code(c)).collect());

        stocks
            .iter()
            .filter(|s| {
                pool.as_ref()
                    .map_or(true, |p| p.contains(&normalize_stock_code(&s.code)))
            })
            .filter(|s| {
                !(self.exclude_st && (s.is_st || is_special_treatment(&s.code, &s.name)))
            })
            .filter(|s| s.meets(entry))
            .collect()
    }
}

/// Score one snapshot entry under a preset profile.
fn score_stock(stock: &SnapshotStock, profile: &PresetProfile) -> ScreenedStock {
    let fundamental_score = if profile.use_fundamental {
        stock.fundamental_score
    } else {
        crate::preset::NEUTRAL_SCORE
    };
    let capital_score = if profile.use_capital {
        stock.capital_score
    } else {
        crate::preset::NEUTRAL_SCORE
    };

    ScreenedStock {
        code: stock.code.clone(),
        name: if stock.name.is_empty() {
            stock.code.clone()
        } else {
            stock.name.clone()
        },
        score: profile.blend(stock.tech_score, fundamental_score, capital_score),
        tech_score: stock.tech_score,
        fundamental_score,
        capital_score,
        current_price: stock.current_price,
        reason: selection_reason(stock.tech_score, fundamental_score, capital_score),
    }
}

/// Human-readable reason built from the strong components.
pub fn selection_reason(tech_score: f64, fundamental_score: f64, capital_score: f64) -> String {
    let mut reasons = Vec::new();

    if tech_score >= STRONG_COMPONENT_SCORE {
        reasons.push("技术面强势");
    }
    if fundamental_score >= STRONG_COMPONENT_SCORE {
        reasons.push("基本面优秀");
    }
    if capital_score >= STRONG_COMPONENT_SCORE {
        reasons.push("主力资金流入");
    }

    if reasons.is_empty() {
        "综合评分达标".to_string()
    } else {
        reasons.join("、")
    }
}

impl StockScreener for SnapshotScreener {
    fn name(&self) -> &'static str {
        "snapshot"
    }

    fn screen(
        &self,
        stock_pool: Option<&[String]>,
        preset: Preset,
        top_n: usize,
        min_score: f64,
        parallel: bool,
        max_workers: usize,
    ) -> Result<ResultFrame, ScreenerError> {
        if stock_pool.is_some_and(|p| p.is_empty()) {
            warn!("Empty stock pool provided");
            return Ok(ResultFrame::empty());
        }

        let snapshot = self.snapshot()?;
        info!(
            universe = snapshot.stocks.len(),
            as_of = snapshot.as_of.as_deref().unwrap_or("unknown"),
            "Universe snapshot ready"
        );

        let profile = preset.profile();
        let candidates = self.candidates(&snapshot.stocks, stock_pool, &profile.entry);
        info!(
            candidates = candidates.len(),
            rule = ?profile.entry,
            "Stocks after quick filters"
        );

        if candidates.is_empty() {
            warn!("No stocks passed quick filters");
            return Ok(ResultFrame::empty());
        }

        let mut scored: Vec<ScreenedStock> = if parallel {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(max_workers.max(1))
                .thread_name(|i| format!("screener-worker-{i}"))
                .build()
                .map_err(|e| ScreenerError::Internal(format!("failed to start workers: {e}")))?;
            debug!(workers = max_workers, "Scoring in parallel");
            pool.install(|| {
                candidates
                    .par_iter()
                    .map(|s| score_stock(s, &profile))
                    .collect()
            })
        } else {
            debug!("Scoring sequentially");
            candidates.iter().map(|s| score_stock(s, &profile)).collect()
        };

        scored.retain(|s| s.score >= min_score);
        if scored.is_empty() {
            warn!(min_score, "No stocks meet the criteria");
            return Ok(ResultFrame::empty());
        }

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        scored.truncate(top_n);

        info!(found = scored.len(), "Screening complete");
        Ok(ResultFrame::from_rows(scored))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use test_case::test_case;

    fn stock(code: &str, name: &str, tech: f64, fundamental: f64, capital: f64) -> SnapshotStock {
        SnapshotStock {
            code: code.to_string(),
            name: name.to_string(),
            tech_score: tech,
            fundamental_score: fundamental,
            capital_score: capital,
            current_price: 10.0,
            ..Default::default()
        }
    }

    fn universe() -> UniverseSnapshot {
        UniverseSnapshot {
            as_of: Some("2024-06-28".into()),
            stocks: vec![
                stock("600519.SH", "贵州茅台", 60.0, 95.0, 60.0),
                stock("000001.SZ", "平安银行", 90.0, 40.0, 85.0),
                stock("300750.SZ", "宁德时代", 75.0, 80.0, 75.0),
                stock("000004.SZ", "*ST国华", 99.0, 99.0, 99.0),
                stock("600036", "招商银行", 50.0, 50.0, 50.0),
            ],
        }
    }

    fn codes(frame: &ResultFrame) -> Vec<&str> {
        frame.rows().iter().map(|r| r.code.as_str()).collect()
    }

    #[test]
    fn test_screen_sorts_by_score_and_drops_st() {
        let screener = SnapshotScreener::from_snapshot(universe());
        let frame = screener
            .screen(None, Preset::StrongMomentum, 20, 0.0, false, 1)
            .unwrap();

        assert_eq!(codes(&frame), ["000001.SZ", "300750.SZ", "600519.SH", "600036"]);
        let scores: Vec<f64> = frame.rows().iter().map(|r| r.score).collect();
        assert!(scores.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_screen_keeps_st_when_configured() {
        let screener = SnapshotScreener::from_snapshot(universe()).with_exclude_st(false);
        let frame = screener
            .screen(None, Preset::ValueGrowth, 1, 0.0, false, 1)
            .unwrap();
        assert_eq!(codes(&frame), ["000004.SZ"]);
    }

    #[test]
    fn test_screen_respects_top_n_and_min_score() {
        let screener = SnapshotScreener::from_snapshot(universe());
        let frame = screener
            .screen(None, Preset::ValueGrowth, 2, 0.0, false, 1)
            .unwrap();
        assert_eq!(frame.len(), 2);
        assert_eq!(frame.rows()[0].code, "600519.SH");

        let frame = screener
            .screen(None, Preset::ValueGrowth, 20, 99.0, false, 1)
            .unwrap();
        assert!(frame.is_empty());
    }

    #[test]
    fn test_screen_pool_matches_with_or_without_suffix() {
        let screener = SnapshotScreener::from_snapshot(universe());
        let pool = vec!["600519".to_string(), "600036.SH".to_string()];
        let frame = screener
            .screen(Some(pool.as_slice()), Preset::CapitalInflow, 20, 0.0, false, 1)
            .unwrap();

        let mut got = codes(&frame);
        got.sort_unstable();
        assert_eq!(got, ["600036", "600519.SH"]);
    }

    #[test]
    fn test_screen_empty_pool_returns_empty_frame() {
        let screener = SnapshotScreener::from_snapshot(universe());
        let frame = screener
            .screen(Some(&[][..]), Preset::Breakout, 20, 0.0, true, 5)
            .unwrap();
        assert!(frame.is_empty());
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let screener = SnapshotScreener::from_snapshot(universe());
        let sequential = screener
            .screen(None, Preset::CapitalInflow, 20, 0.0, false, 1)
            .unwrap();
        let parallel = screener
            .screen(None, Preset::CapitalInflow, 20, 0.0, true, 4)
            .unwrap();
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_unused_components_are_neutral() {
        let screener = SnapshotScreener::from_snapshot(universe());
        let frame = screener
            .screen(None, Preset::StrongMomentum, 20, 0.0, false, 1)
            .unwrap();
        assert!(frame.rows().iter().all(|r| r.fundamental_score == 50.0));
    }

    fn with_metrics(metrics: SnapshotStock) -> SnapshotStock {
        SnapshotStock {
            code: "600000.SH".into(),
            name: "浦发银行".into(),
            current_price: 10.0,
            ..metrics
        }
    }

    #[test_case(Preset::LowPeValue, SnapshotStock { pe: Some(8.0), roe: Some(12.0), ..Default::default() }, true ; "low pe high roe")]
    #[test_case(Preset::LowPeValue, SnapshotStock { pe: Some(15.0), roe: Some(12.0), ..Default::default() }, false ; "pe at cap")]
    #[test_case(Preset::LowPeValue, SnapshotStock { pe: Some(8.0), roe: Some(10.0), ..Default::default() }, false ; "roe at floor")]
    #[test_case(Preset::LowPeValue, SnapshotStock { pe: Some(8.0), ..Default::default() }, false ; "roe missing")]
    #[test_case(Preset::HighDividend, SnapshotStock { dividend_yield: Some(3.0), ..Default::default() }, true ; "yield at floor")]
    #[test_case(Preset::HighDividend, SnapshotStock { dividend_yield: Some(2.9), ..Default::default() }, false ; "yield below floor")]
    #[test_case(Preset::HighDividend, SnapshotStock::default(), false ; "yield missing")]
    #[test_case(Preset::Breakout, SnapshotStock { high_20d: Some(9.5), volume_ratio: Some(1.2), ..Default::default() }, true ; "new high on volume")]
    #[test_case(Preset::Breakout, SnapshotStock { high_20d: Some(10.0), volume_ratio: Some(2.0), ..Default::default() }, false ; "equals prior high")]
    #[test_case(Preset::Breakout, SnapshotStock { high_20d: Some(9.5), volume_ratio: Some(1.1), ..Default::default() }, false ; "thin volume")]
    #[test_case(Preset::Breakout, SnapshotStock { high_20d: Some(9.5), ..Default::default() }, false ; "volume missing")]
    #[test_case(Preset::OversoldRebound, SnapshotStock { rsi: Some(35.0), rsi_min: Some(22.0), ..Default::default() }, true ; "rebounded from oversold")]
    #[test_case(Preset::OversoldRebound, SnapshotStock { rsi: Some(25.0), rsi_min: Some(22.0), ..Default::default() }, false ; "still oversold")]
    #[test_case(Preset::OversoldRebound, SnapshotStock { rsi: Some(55.0), rsi_min: Some(30.0), ..Default::default() }, false ; "never oversold")]
    #[test_case(Preset::OversoldRebound, SnapshotStock { rsi: Some(35.0), ..Default::default() }, false ; "rsi history missing")]
    #[test_case(Preset::InstitutionalFavorite, SnapshotStock { institutional_ratio: Some(30.0), ..Default::default() }, true ; "ratio at floor")]
    #[test_case(Preset::InstitutionalFavorite, SnapshotStock { institutional_ratio: Some(12.5), ..Default::default() }, false ; "ratio below floor")]
    #[test_case(Preset::InstitutionalFavorite, SnapshotStock::default(), false ; "ratio missing")]
    #[test_case(Preset::StrongMomentum, SnapshotStock::default(), true ; "no rule keeps all")]
    fn test_entry_rule(preset: Preset, metrics: SnapshotStock, kept: bool) {
        let screener = SnapshotScreener::from_snapshot(UniverseSnapshot {
            as_of: None,
            stocks: vec![with_metrics(metrics)],
        });
        let frame = screener.screen(None, preset, 20, 0.0, false, 1).unwrap();
        assert_eq!(frame.len(), usize::from(kept));
    }

    #[test]
    fn test_value_and_dividend_presets_pick_different_stocks() {
        let cheap = SnapshotStock {
            pe: Some(7.5),
            roe: Some(14.0),
            dividend_yield: Some(1.2),
            ..stock("601398.SH", "工商银行", 50.0, 80.0, 50.0)
        };
        let yielder = SnapshotStock {
            pe: Some(22.0),
            roe: Some(9.0),
            dividend_yield: Some(5.1),
            ..stock("600900.SH", "长江电力", 50.0, 70.0, 50.0)
        };
        let screener = SnapshotScreener::from_snapshot(UniverseSnapshot {
            as_of: None,
            stocks: vec![cheap, yielder],
        });

        let value = screener
            .screen(None, Preset::LowPeValue, 20, 0.0, false, 1)
            .unwrap();
        let dividend = screener
            .screen(None, Preset::HighDividend, 20, 0.0, false, 1)
            .unwrap();
        assert_eq!(codes(&value), ["601398.SH"]);
        assert_eq!(codes(&dividend), ["600900.SH"]);
    }

    #[test]
    fn test_optional_metrics_load_from_json() {
        let stock: SnapshotStock = serde_json::from_str(
            r#"{"code": "600900", "pe": 18.2, "dividend_yield": 4.0, "rsi_min": null}"#,
        )
        .unwrap();
        assert_eq!(stock.pe, Some(18.2));
        assert_eq!(stock.dividend_yield, Some(4.0));
        assert_eq!(stock.rsi_min, None);
        assert_eq!(stock.roe, None);
    }

    #[test]
    fn test_selection_reason() {
        assert_eq!(selection_reason(80.0, 75.0, 90.0), "技术面强势、基本面优秀、主力资金流入");
        assert_eq!(selection_reason(70.0, 10.0, 10.0), "技术面强势");
        assert_eq!(selection_reason(10.0, 10.0, 10.0), "综合评分达标");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"as_of": "2024-06-28", "stocks": [{{"code": 1, "name": "平安银行", "tech_score": 80}}]}}"#
        )
        .unwrap();

        let screener = SnapshotScreener::from_path(file.path());
        let frame = screener
            .screen(None, Preset::StrongMomentum, 20, 0.0, false, 1)
            .unwrap();
        assert_eq!(frame.rows()[0].code, "000001");
    }

    #[test]
    fn test_missing_snapshot_is_data_not_available() {
        let dir = tempfile::tempdir().unwrap();
        let screener = SnapshotScreener::from_path(dir.path().join("universe.json"));
        let err = screener
            .screen(None, Preset::Breakout, 20, 0.0, false, 1)
            .unwrap_err();
        assert!(matches!(err, ScreenerError::DataNotAvailable(_)));
    }

    #[test]
    fn test_malformed_snapshot_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[not a snapshot").unwrap();
        let screener = SnapshotScreener::from_path(file.path());
        let err = screener
            .screen(None, Preset::Breakout, 20, 0.0, false, 1)
            .unwrap_err();
        assert!(matches!(err, ScreenerError::Parse { .. }));
    }
}
