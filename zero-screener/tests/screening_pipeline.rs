//! End-to-end tests for the screening pipeline: request validation, engine,
//! table rendering, statistics and export.

use std::error::Error as _;

use serde_json::{json, Map, Value};
use zero_common::logging::RunContext;
use zero_screener::report::ScreeningStats;
use zero_screener::screener::{SnapshotStock, UniverseSnapshot};
use zero_screener::{
    export_results, format_results_table, run_screening, OutputPathPolicy, Preset, ResultFrame,
    ScreenError, ScreenedStock, ScreenerError, ScreeningParams, SnapshotScreener, StockScreener,
};

/// Screener returning a canned frame or error.
struct FixedScreener {
    result: fn() -> Result<ResultFrame, ScreenerError>,
}

impl StockScreener for FixedScreener {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn screen(
        &self,
        _stock_pool: Option<&[String]>,
        _preset: Preset,
        _top_n: usize,
        _min_score: f64,
        _parallel: bool,
        _max_workers: usize,
    ) -> Result<ResultFrame, ScreenerError> {
        (self.result)()
    }
}

fn momentum_rows() -> Result<ResultFrame, ScreenerError> {
    Ok(ResultFrame::from_rows(vec![
        ScreenedStock {
            code: "600519.SH".into(),
            name: "贵州茅台".into(),
            score: 85.5,
            tech_score: 88.0,
            fundamental_score: 50.0,
            capital_score: 80.0,
            current_price: 1520.3,
            reason: "技术面强势、主力资金流入".into(),
        },
        ScreenedStock {
            code: "000001.SZ".into(),
            name: "平安银行".into(),
            score: 82.3,
            tech_score: 84.0,
            fundamental_score: 50.0,
            capital_score: 78.0,
            current_price: 10.5,
            reason: "技术面强势、主力资金流入".into(),
        },
    ]))
}

fn ctx() -> RunContext {
    RunContext::new("zero-screener-test")
}

#[test]
fn strong_momentum_run_ranks_and_summarizes() {
    let request = ScreeningParams {
        top_n: 20,
        ..ScreeningParams::new("strong_momentum")
    }
    .validate()
    .unwrap();
    let screener = FixedScreener {
        result: momentum_rows,
    };

    let frame = run_screening(&screener, &request, &ctx()).unwrap();
    let table = format_results_table(&frame).unwrap();

    let first = table.find("1     600519.SH").unwrap();
    let second = table.find("2     000001.SZ").unwrap();
    assert!(first < second);
    assert!(table.contains("总计: 2 只股票"));

    let stats = ScreeningStats::from_frame(&frame).unwrap();
    assert_eq!(format!("{:.2}", stats.mean), "83.90");
    assert_eq!(format!("{:.2}", stats.max), "85.50");
    assert_eq!(format!("{:.2}", stats.min), "82.30");
}

#[test]
fn screener_failure_is_wrapped() {
    let screener = FixedScreener {
        result: || Err(ScreenerError::DataNotAvailable("no quotes for today".into())),
    };
    let request = ScreeningParams::new("value_growth").validate().unwrap();

    let err = run_screening(&screener, &request, &ctx()).unwrap_err();
    assert!(!err.is_validation());
    assert!(err.to_string().contains("no quotes for today"));
    let source = err.source().unwrap();
    assert!(source.downcast_ref::<ScreenerError>().is_some());
}

#[test]
fn frame_missing_columns_is_rejected_by_renderer() {
    let screener = FixedScreener {
        result: || {
            let record: Map<String, Value> = match json!({"code": "600519", "tech_score": 70.0}) {
                Value::Object(map) => map,
                _ => unreachable!(),
            };
            Ok(ResultFrame::from_records(vec![record]).unwrap())
        },
    };
    let request = ScreeningParams::new("breakout").validate().unwrap();
    let frame = run_screening(&screener, &request, &ctx()).unwrap();

    let err = format_results_table(&frame).unwrap_err();
    assert!(matches!(err, ScreenError::MissingColumns { .. }));
    let msg = err.to_string();
    for column in ["name", "score", "current_price"] {
        assert!(msg.contains(column), "{column} not named in: {msg}");
    }
}

#[test]
fn empty_result_renders_no_matches() {
    let screener = FixedScreener {
        result: || Ok(ResultFrame::empty()),
    };
    let request = ScreeningParams::new("oversold_rebound").validate().unwrap();
    let frame = run_screening(&screener, &request, &ctx()).unwrap();

    assert!(format_results_table(&frame)
        .unwrap()
        .contains("未找到符合条件的股票。"));
    assert!(ScreeningStats::from_frame(&frame).is_none());
}

#[test]
fn csv_export_reloads_code_as_text() {
    let dir = tempfile::tempdir().unwrap();
    let policy = OutputPathPolicy::new([dir.path()]);
    let frame = ResultFrame::from_rows(vec![ScreenedStock {
        code: "000001".into(),
        name: "平安银行".into(),
        score: 82.3,
        current_price: 10.5,
        ..Default::default()
    }]);

    let path = dir.path().join("result.csv");
    let written = export_results(&frame, path.to_str().unwrap(), &policy, &ctx()).unwrap();

    let mut reader = csv::Reader::from_path(&written).unwrap();
    let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(records.len(), 1);
    assert_eq!(&records[0][0], "000001");
    assert_eq!(&records[0][1], "平安银行");
}

#[test]
fn export_outside_allow_list_fails_before_writing() {
    let allowed = tempfile::tempdir().unwrap();
    let elsewhere = tempfile::tempdir().unwrap();
    let policy = OutputPathPolicy::new([allowed.path()]);

    let escape = allowed.path().join("..").join(
        elsewhere
            .path()
            .file_name()
            .unwrap()
            .to_str()
            .unwrap(),
    );
    let target = escape.join("result.csv");

    let frame = momentum_rows().unwrap();
    let err = export_results(&frame, target.to_str().unwrap(), &policy, &ctx()).unwrap_err();
    assert!(err.is_validation());
    assert!(!elsewhere.path().join("result.csv").exists());
}

#[test]
fn snapshot_screener_runs_through_pipeline() {
    let snapshot = UniverseSnapshot {
        as_of: None,
        stocks: vec![
            SnapshotStock {
                code: "600519.SH".into(),
                name: "贵州茅台".into(),
                tech_score: 60.0,
                fundamental_score: 95.0,
                capital_score: 55.0,
                current_price: 1520.3,
                ..Default::default()
            },
            SnapshotStock {
                code: "000001.SZ".into(),
                name: "平安银行".into(),
                tech_score: 85.0,
                fundamental_score: 45.0,
                capital_score: 90.0,
                current_price: 10.5,
                ..Default::default()
            },
        ],
    };
    let screener = SnapshotScreener::from_snapshot(snapshot);

    let request = ScreeningParams {
        stock_pool: Some(vec!["000001".into()]),
        ..ScreeningParams::new("capital_inflow")
    }
    .validate()
    .unwrap();
    let frame = run_screening(&screener, &request, &ctx()).unwrap();

    assert_eq!(frame.len(), 1);
    assert_eq!(frame.rows()[0].code, "000001.SZ");
    assert_eq!(frame.rows()[0].reason, "技术面强势、主力资金流入");
}
