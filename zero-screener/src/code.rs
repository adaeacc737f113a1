//! A-share stock code helpers.
//!
//! Codes are six digits with an optional market suffix: `600519.SH`,
//! `000001.SZ`, `830799.BJ`.

use regex::Regex;
use std::sync::LazyLock;

/// Codes accepted in an explicit instrument pool.
static POOL_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{6}(\.SH|\.SZ)?$").unwrap());

/// Shanghai main board + STAR market prefixes.
const SH_PREFIXES: &[&str] = &["600", "601", "603", "605", "688"];
/// Shenzhen main board + ChiNext prefixes.
const SZ_PREFIXES: &[&str] = &["000", "001", "300"];
/// Beijing Stock Exchange prefixes.
const BJ_PREFIXES: &[&str] = &["82", "83", "87"];

/// Returns `true` when `code` is six digits with an optional `.SH`/`.SZ` suffix.
pub fn is_valid_stock_code(code: &str) -> bool {
    POOL_CODE_RE.is_match(code)
}

/// Normalize a stock code by attaching the market suffix.
///
/// `600519` → `600519.SH`, `300750` → `300750.SZ`. Codes that already carry a
/// suffix are uppercased; unknown prefixes are returned trimmed.
pub fn normalize_stock_code(code: &str) -> String {
    let code = code.trim();

    if code.contains('.') {
        return code.to_uppercase();
    }

    let has_prefix = |prefixes: &[&str]| prefixes.iter().any(|p| code.starts_with(p));

    if has_prefix(SH_PREFIXES) {
        format!("{code}.SH")
    } else if has_prefix(SZ_PREFIXES) {
        format!("{code}.SZ")
    } else if has_prefix(BJ_PREFIXES) {
        format!("{code}.BJ")
    } else {
        code.to_string()
    }
}

/// Returns `true` for ST / *ST / S*ST / SST names or codes.
pub fn is_special_treatment(code: &str, name: &str) -> bool {
    code.contains("ST") || code.contains('*') || name.contains("ST") || name.contains('*')
}
