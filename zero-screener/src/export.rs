//! Result export to CSV and spreadsheet files.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use rust_xlsxwriter::Workbook;
use serde_json::json;
use tracing::{error, info};
use zero_common::logging::{LifecycleEventType, RunContext};
use zero_common::{log_entry, log_exit};

use crate::error::{Result, ScreenError};
use crate::frame::{ResultFrame, EXPORT_COLUMNS};
use crate::validation::OutputPathPolicy;

/// UTF-8 byte-order mark, so spreadsheet tools detect the encoding.
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Sheet name used for spreadsheet exports.
const SHEET_NAME: &str = "筛选结果";

/// Export file format, picked from the validated extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Spreadsheet,
}

impl ExportFormat {
    /// Format for an already-validated path.
    fn for_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("csv") => Self::Csv,
            _ => Self::Spreadsheet,
        }
    }
}

/// Write `frame` to `path`.
///
/// The path is validated against `policy` first; nothing is written when that
/// fails. Returns the canonical path actually written.
pub fn export_results(
    frame: &ResultFrame,
    path: &str,
    policy: &OutputPathPolicy,
    ctx: &RunContext,
) -> Result<PathBuf> {
    let ctx = ctx.child_span();
    let span = ctx.span("export");
    let _guard = span.enter();
    log_entry!(ctx, "export_results", "path": path, "rows": frame.len());

    let safe_path = policy.validate(path)?;
    let format = ExportFormat::for_path(&safe_path);

    let written = match format {
        ExportFormat::Csv => write_csv(frame, &safe_path),
        ExportFormat::Spreadsheet => write_spreadsheet(frame, &safe_path),
    };

    if let Err(e) = written {
        error!(path = %safe_path.display(), error = %e, "Failed to export results");
        return Err(e);
    }

    ctx.log_event(
        LifecycleEventType::FileWrite,
        json!({
            "path": safe_path.display().to_string(),
            "format": format!("{format:?}").to_lowercase(),
            "rows": frame.len(),
        }),
    );
    info!(path = %safe_path.display(), rows = frame.len(), "Results exported");
    log_exit!(ctx, "export_results");

    Ok(safe_path)
}

fn write_csv(frame: &ResultFrame, path: &Path) -> Result<()> {
    let file = File::create(path).map_err(ScreenError::export)?;
    let mut out = BufWriter::new(file);
    out.write_all(UTF8_BOM).map_err(ScreenError::export)?;

    let mut writer = csv::Writer::from_writer(out);
    writer
        .write_record(EXPORT_COLUMNS)
        .map_err(ScreenError::export)?;
    for row in frame.rows() {
        writer
            .write_record(row.to_record())
            .map_err(ScreenError::export)?;
    }
    writer.flush().map_err(ScreenError::export)?;
    Ok(())
}

fn write_spreadsheet(frame: &ResultFrame, path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME).map_err(ScreenError::export)?;

    for (col, title) in EXPORT_COLUMNS.iter().enumerate() {
        sheet
            .write_string(0, col as u16, *title)
            .map_err(ScreenError::export)?;
    }

    for (idx, row) in frame.rows().iter().enumerate() {
        let r = idx as u32 + 1;
        // Codes stay text so leading zeros survive.
        sheet.write_string(r, 0, &row.code).map_err(ScreenError::export)?;
        sheet.write_string(r, 1, &row.name).map_err(ScreenError::export)?;
        let numbers = [
            row.score,
            row.tech_score,
            row.fundamental_score,
            row.capital_score,
            row.current_price,
        ];
        for (offset, value) in numbers.into_iter().enumerate() {
            sheet
                .write_number(r, 2 + offset as u16, value)
                .map_err(ScreenError::export)?;
        }
        sheet.write_string(r, 7, &row.reason).map_err(ScreenError::export)?;
    }

    workbook.save(path).map_err(ScreenError::export)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::ScreenedStock;

    fn one_row() -> ResultFrame {
        ResultFrame::from_rows(vec![ScreenedStock {
            code: "000001".into(),
            name: "平安银行".into(),
            score: 82.3,
            tech_score: 80.0,
            fundamental_score: 50.0,
            capital_score: 90.0,
            current_price: 10.5,
            reason: "技术面强势、主力资金流入".into(),
        }])
    }

    fn policy_for(dir: &Path) -> OutputPathPolicy {
        OutputPathPolicy::new([dir])
    }

    #[test]
    fn test_csv_has_bom_and_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("result.csv");
        let ctx = RunContext::new("test");

        let written = export_results(
            &one_row(),
            path.to_str().unwrap(),
            &policy_for(dir.path()),
            &ctx,
        )
        .unwrap();

        let bytes = std::fs::read(&written).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));
        let text = String::from_utf8(bytes[UTF8_BOM.len()..].to_vec()).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("code,name,score,tech_score,fundamental_score,capital_score,current_price,reason")
        );
        assert!(lines.next().unwrap().starts_with("000001,平安银行,82.3,"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_unsupported_extension_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("result.json");

        let err = export_results(
            &one_row(),
            path.to_str().unwrap(),
            &policy_for(dir.path()),
            &RunContext::new("test"),
        )
        .unwrap_err();

        assert!(err.is_validation());
        assert!(!path.exists());
    }

    #[test]
    fn test_outside_allowed_dirs_rejected() {
        let allowed = tempfile::tempdir().unwrap();
        let other = tempfile::tempdir().unwrap();
        let path = other.path().join("result.csv");

        let err = export_results(
            &one_row(),
            path.to_str().unwrap(),
            &policy_for(allowed.path()),
            &RunContext::new("test"),
        )
        .unwrap_err();

        assert!(err.is_validation());
        assert!(!path.exists());
    }

    #[test]
    fn test_spreadsheet_is_zip_container() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["result.xlsx", "RESULT.XLS"] {
            let path = dir.path().join(name);
            let written = export_results(
                &one_row(),
                path.to_str().unwrap(),
                &policy_for(dir.path()),
                &RunContext::new("test"),
            )
            .unwrap();
            let bytes = std::fs::read(written).unwrap();
            assert!(bytes.starts_with(b"PK"), "{name} is not a zip container");
        }
    }

    #[test]
    fn test_empty_frame_exports_header_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        export_results(
            &ResultFrame::empty(),
            path.to_str().unwrap(),
            &policy_for(dir.path()),
            &RunContext::new("test"),
        )
        .unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.trim_start_matches('\u{feff}').lines().count(), 1);
    }

    #[test]
    fn test_write_failure_is_export_error() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["taken.csv", "taken.xlsx"] {
            // A directory squats on the target name, so the path validates but the write fails.
            let path = dir.path().join(name);
            std::fs::create_dir(&path).unwrap();

            let err = export_results(
                &one_row(),
                path.to_str().unwrap(),
                &policy_for(dir.path()),
                &RunContext::new("test"),
            )
            .unwrap_err();

            assert!(matches!(err, ScreenError::Export { .. }), "{name}: {err:?}");
            assert!(!err.is_validation());
            assert!(std::error::Error::source(&err).is_some(), "{name} lost its cause");
            assert!(path.is_dir());
        }
    }

    #[test]
    fn test_format_for_path() {
        assert_eq!(ExportFormat::for_path(Path::new("a.CSV")), ExportFormat::Csv);
        assert_eq!(ExportFormat::for_path(Path::new("a.xls")), ExportFormat::Spreadsheet);
    }
}
