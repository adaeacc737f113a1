//! Screening presets.
//!
//! Each preset is a named, fixed strategy. The screener collaborator maps it
//! to its own filter definition; the bundled snapshot screener uses the
//! [`PresetProfile`] weights below.

use serde::{Deserialize, Serialize};

// ============================================================================
// Preset
// ============================================================================

/// Named screening strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    /// Strong technicals and short-term momentum
    StrongMomentum,
    /// Solid fundamentals with growth at a fair price
    ValueGrowth,
    /// Main-force capital flowing in
    CapitalInflow,
    /// PE < 15 and ROE > 10%
    LowPeValue,
    /// Dividend yield > 3% with a stable payout history
    HighDividend,
    /// New 20-day high confirmed by volume
    Breakout,
    /// RSI rebound out of oversold territory
    OversoldRebound,
    /// Institutional holding > 30%
    InstitutionalFavorite,
}

impl Preset {
    /// All presets in catalogue order.
    pub const ALL: [Preset; 8] = [
        Preset::StrongMomentum,
        Preset::ValueGrowth,
        Preset::CapitalInflow,
        Preset::LowPeValue,
        Preset::HighDividend,
        Preset::Breakout,
        Preset::OversoldRebound,
        Preset::InstitutionalFavorite,
    ];

    /// Identifier accepted on the command line.
    pub const fn name(self) -> &'static str {
        match self {
            Self::StrongMomentum => "strong_momentum",
            Self::ValueGrowth => "value_growth",
            Self::CapitalInflow => "capital_inflow",
            Self::LowPeValue => "low_pe_value",
            Self::HighDividend => "high_dividend",
            Self::Breakout => "breakout",
            Self::OversoldRebound => "oversold_rebound",
            Self::InstitutionalFavorite => "institutional_favorite",
        }
    }

    /// Short display label.
    pub const fn label(self) -> &'static str {
        match self {
            Self::StrongMomentum => "强势动量股",
            Self::ValueGrowth => "价值成长股",
            Self::CapitalInflow => "资金流入股",
            Self::LowPeValue => "低PE价值股",
            Self::HighDividend => "高股息率股",
            Self::Breakout => "突破新高股",
            Self::OversoldRebound => "超卖反弹股",
            Self::InstitutionalFavorite => "机构重仓股",
        }
    }

    /// One-line description of what the preset looks for.
    pub const fn description(self) -> &'static str {
        match self {
            Self::StrongMomentum => "技术面强势，短期动量充足，资金面良好，适合短线交易",
            Self::ValueGrowth => "基本面优秀，成长性良好，估值合理，适合价值投资",
            Self::CapitalInflow => "主力资金流入，资金面活跃，适合资金驱动型投资",
            Self::LowPeValue => "PE<15，ROE>10%，寻找被低估的优质公司，适合价值投资",
            Self::HighDividend => "股息率>3%，稳定分红历史，追求稳定现金流，适合长期持有",
            Self::Breakout => "突破20日新高，放量确认，动量延续机会，适合趋势跟踪",
            Self::OversoldRebound => "RSI超卖后反弹，均值回归机会，适合短期交易",
            Self::InstitutionalFavorite => "机构持仓>30%，跟随聪明钱，适合中长期投资",
        }
    }

    /// Scoring profile used when blending sub-scores.
    pub const fn profile(self) -> PresetProfile {
        match self {
            Self::StrongMomentum => PresetProfile::new(false, true, 0.6, 0.2, 0.2, EntryRule::None),
            Self::ValueGrowth => PresetProfile::new(true, false, 0.3, 0.6, 0.1, EntryRule::None),
            Self::CapitalInflow => PresetProfile::new(false, true, 0.4, 0.2, 0.4, EntryRule::None),
            Self::LowPeValue => PresetProfile::new(
                true,
                false,
                0.2,
                0.7,
                0.1,
                EntryRule::PeRoe {
                    pe_max: 15.0,
                    roe_min: 10.0,
                },
            ),
            Self::HighDividend => PresetProfile::new(
                true,
                false,
                0.2,
                0.7,
                0.1,
                EntryRule::DividendYield { yield_min: 3.0 },
            ),
            Self::Breakout => PresetProfile::new(
                false,
                true,
                0.6,
                0.1,
                0.3,
                EntryRule::Breakout {
                    volume_ratio_min: 1.2,
                },
            ),
            Self::OversoldRebound => PresetProfile::new(
                false,
                true,
                0.7,
                0.1,
                0.2,
                EntryRule::OversoldRebound {
                    rsi_oversold: 30.0,
                    rsi_rebound_min: 30.0,
                },
            ),
            Self::InstitutionalFavorite => PresetProfile::new(
                true,
                true,
                0.2,
                0.4,
                0.4,
                EntryRule::InstitutionalHolding { ratio_min: 30.0 },
            ),
        }
    }

    /// Comma-separated list of every preset name.
    pub fn available() -> String {
        Self::ALL
            .iter()
            .map(|p| p.name())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl std::fmt::Display for Preset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| format!("Unknown preset: {s} (available: {})", Self::available()))
    }
}

/// Returns `true` when `name` is a recognized preset identifier.
///
/// Empty or unknown names yield `false`; this never errors.
pub fn is_valid_preset(name: &str) -> bool {
    !name.is_empty() && name.parse::<Preset>().is_ok()
}

// ============================================================================
// Entry Rules
// ============================================================================

/// Preset-specific hard criteria. Percentages are in percent (3.0 = 3%).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum EntryRule {
    /// No criteria beyond the score floor
    None,
    /// PE below `pe_max` and ROE above `roe_min`
    PeRoe { pe_max: f64, roe_min: f64 },
    /// Dividend yield at or above `yield_min`
    DividendYield { yield_min: f64 },
    /// Price above the prior 20-day high with volume at least
    /// `volume_ratio_min` times the prior 20-day average
    Breakout { volume_ratio_min: f64 },
    /// RSI dipped below `rsi_oversold` within the lookback window and is now
    /// back at or above `rsi_rebound_min`
    OversoldRebound {
        rsi_oversold: f64,
        rsi_rebound_min: f64,
    },
    /// Institutional holding ratio at or above `ratio_min`
    InstitutionalHolding { ratio_min: f64 },
}

// ============================================================================
// Preset Profile
// ============================================================================

/// Neutral score used for components a preset does not consider.
pub const NEUTRAL_SCORE: f64 = 50.0;

/// Component weights and switches for composite scoring.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PresetProfile {
    /// Whether the fundamental sub-score is taken into account
    pub use_fundamental: bool,
    /// Whether the capital-flow sub-score is taken into account
    pub use_capital: bool,
    /// Technical weight
    pub technical: f64,
    /// Fundamental weight
    pub fundamental: f64,
    /// Capital-flow weight
    pub capital: f64,
    /// Hard criteria a stock must meet before it is scored
    pub entry: EntryRule,
}

impl PresetProfile {
    const fn new(
        use_fundamental: bool,
        use_capital: bool,
        technical: f64,
        fundamental: f64,
        capital: f64,
        entry: EntryRule,
    ) -> Self {
        Self {
            use_fundamental,
            use_capital,
            technical,
            fundamental,
            capital,
            entry,
        }
    }

    /// Composite score from the three sub-scores, clamped to 0-100.
    ///
    /// Components the profile ignores count as [`NEUTRAL_SCORE`].
    pub fn blend(&self, tech: f64, fundamental: f64, capital: f64) -> f64 {
        let fundamental = if self.use_fundamental {
            fundamental
        } else {
            NEUTRAL_SCORE
        };
        let capital = if self.use_capital { capital } else { NEUTRAL_SCORE };

        let score =
            tech * self.technical + fundamental * self.fundamental + capital * self.capital;
        score.clamp(0.0, 100.0)
    }
}
