//! Integration tests for the PHA decoder over JSON snapshots on disk
//!
//! These tests write small Type I and Type II snapshots to a temporary
//! directory and decode them through the filesystem adapters, the way the
//! pha-inspect binary does.

use ogip_pha::app::adapters::filesystem::{JsonResponseLoader, JsonTableReader};
use ogip_pha::app::models::diagnostics::DiagnosticKind;
use ogip_pha::app::models::{QualityFlag, SpectrumRole};
use ogip_pha::cli::commands::InspectReport;
use ogip_pha::{DecoderConfig, Error, PhaDecoder};
use serde_json::json;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const EBOUNDS: [f64; 4] = [10.0, 20.0, 40.0, 80.0];

fn write_json(dir: &Path, name: &str, value: serde_json::Value) {
    fs::write(dir.join(name), serde_json::to_string_pretty(&value).unwrap()).unwrap();
}

/// Header cards shared by every observed snapshot
fn observed_header(backfile: &str) -> serde_json::Value {
    json!({
        "TELESCOP": "GLAST",
        "INSTRUME": "GBM",
        "FILTER": "NONE",
        "EXPOSURE": 4.0,
        "BACKFILE": backfile,
        "RESPFILE": "det.rsp.json",
        "ANCRFILE": "NONE",
        "HDUCLASS": "OGIP",
        "HDUCLAS1": "SPECTRUM",
        "POISSERR": true,
        "CHANTYPE": "PHA",
        "DETCHANS": 3,
        "BACKSCAL": 1.0
    })
}

/// Observed Type I file, its background and the response, in one directory
fn write_type_i_fixture(dir: &Path) {
    write_json(dir, "det.rsp.json", json!({ "ebounds": EBOUNDS }));

    write_json(
        dir,
        "obs.json",
        json!({
            "extensions": {
                "SPECTRUM": {
                    "header": observed_header("bkg.json"),
                    "columns": {
                        "CHANNEL": [1, 2, 3],
                        "RATE": [2.0, 4.0, 6.0],
                        "QUALITY": [0, 2, 1]
                    }
                }
            }
        }),
    );

    write_json(
        dir,
        "bkg.json",
        json!({
            "extensions": {
                "SPECTRUM": {
                    "header": {
                        "TELESCOP": "GLAST",
                        "INSTRUME": "GBM",
                        "FILTER": "NONE",
                        "EXPOSURE": 40.0,
                        "ANCRFILE": "NONE",
                        "HDUCLASS": "OGIP",
                        "HDUCLAS1": "SPECTRUM",
                        "CHANTYPE": "PHA",
                        "DETCHANS": 3,
                        "BACKSCAL": 3.5,
                        "QUALITY": 0
                    },
                    "columns": {
                        "COUNTS": [4.0, 8.0, 12.0],
                        "STAT_ERR": [2.0, 2.0, 4.0]
                    }
                }
            }
        }),
    );
}

/// Decode an observed Type I snapshot with a background from disk
///
/// Purpose: Validate the full path from JSON snapshots to a linked spectrum
/// Benefit: Ensures references resolve next to the observed file and that rate files are normalized
#[test]
fn test_decode_type_i_snapshot_with_background() {
    let dir = TempDir::new().unwrap();
    write_type_i_fixture(dir.path());

    let reader = JsonTableReader::new().with_base_dir(dir.path());
    let responses = JsonResponseLoader::new().with_base_dir(dir.path());
    let decoder = PhaDecoder::new(&reader, &responses)
        .with_config(DecoderConfig::default().without_diagnostic_logging());

    let result = decoder.decode_observed("obs.json", None).unwrap();
    let spectrum = &result.spectrum;

    assert_eq!(spectrum.n_channels(), 3);
    assert_eq!(spectrum.ebounds(), &EBOUNDS);
    assert_eq!(spectrum.counts(), vec![8.0, 16.0, 24.0]);
    assert_eq!(
        spectrum.quality().flags(),
        &[QualityFlag::Good, QualityFlag::Warn, QualityFlag::Bad]
    );

    let background = spectrum.background().expect("background should be linked");
    assert_eq!(background.role(), SpectrumRole::Background);
    assert_eq!(background.ebounds(), spectrum.ebounds());
    assert_eq!(background.source_file(), Some(Path::new("obs.json")));
    assert!(!background.is_poisson());
    assert_eq!(background.count_errors().unwrap(), vec![2.0, 2.0, 4.0]);

    // Background lacks POISSERR but carries STAT_ERR
    assert_eq!(result.diagnostics.len(), 1);
    assert_eq!(result.diagnostics[0].kind, DiagnosticKind::AssumedNonPoisson);
    assert_eq!(result.diagnostics[0].file, "bkg.json");
}

/// Decode one row of a Type II snapshot using the suffix and the selector
///
/// Purpose: Validate Type II row selection and per-row keyword columns from JSON
/// Benefit: Ensures `file{n}` and an explicit selector are interchangeable
#[test]
fn test_decode_type_ii_snapshot() {
    let dir = TempDir::new().unwrap();
    write_json(dir.path(), "det.rsp.json", json!({ "ebounds": EBOUNDS }));
    write_json(
        dir.path(),
        "multi.json",
        json!({
            "extensions": {
                "SPECTRUM": {
                    "header": observed_header("NONE"),
                    "columns": {
                        "SPEC_NUM": [1, 2],
                        "COUNTS": [[1.0, 2.0, 3.0], [10.0, 20.0, 30.0]],
                        "EXPOSURE": [1.0, 10.0],
                        "QUALITY": [[0, 0, 0], [0, 5, 0]]
                    }
                }
            }
        }),
    );

    let reader = JsonTableReader::new().with_base_dir(dir.path());
    let responses = JsonResponseLoader::new().with_base_dir(dir.path());
    let decoder = PhaDecoder::new(&reader, &responses);

    let missing = decoder.decode_observed("multi.json", None);
    assert!(matches!(missing, Err(Error::MissingSelector { .. })));

    let by_suffix = decoder.decode_observed("multi.json{2}", None).unwrap();
    let by_selector = decoder.decode_observed("multi.json", Some(2)).unwrap();

    assert_eq!(by_suffix.spectrum.exposure(), 10.0);
    assert_eq!(by_suffix.spectrum.rates(), &[1.0, 2.0, 3.0]);
    assert_eq!(by_suffix.spectrum.rates(), by_selector.spectrum.rates());
    assert_eq!(by_suffix.spectrum.quality().count(QualityFlag::Bad), 1);
    assert!(by_suffix.spectrum.background().is_none());
}

/// Report a correction spectrum as unsupported
///
/// Purpose: Validate that CORRFILE is rejected rather than silently ignored
/// Benefit: Users learn that the decoded spectrum would otherwise be wrong
#[test]
fn test_snapshot_with_correction_file() {
    let dir = TempDir::new().unwrap();
    write_type_i_fixture(dir.path());

    let mut header = observed_header("NONE");
    header["CORRFILE"] = json!("corr.json");
    write_json(
        dir.path(),
        "corr_obs.json",
        json!({
            "extensions": {
                "SPECTRUM": { "header": header, "columns": { "COUNTS": [1.0, 1.0, 1.0] } }
            }
        }),
    );

    let reader = JsonTableReader::new().with_base_dir(dir.path());
    let responses = JsonResponseLoader::new().with_base_dir(dir.path());
    let result = PhaDecoder::new(&reader, &responses).decode_observed("corr_obs.json", None);

    assert!(matches!(result, Err(Error::UnsupportedFeature { .. })));
}

/// Surface malformed and missing snapshots as typed errors
///
/// Purpose: Validate adapter error mapping end to end
/// Benefit: CLI users get a precise message instead of a generic failure
#[test]
fn test_broken_snapshots() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("broken.json"), "{ not json").unwrap();
    write_json(dir.path(), "ebounds_only.json", json!({ "extensions": {} }));

    let reader = JsonTableReader::new().with_base_dir(dir.path());
    let responses = JsonResponseLoader::new().with_base_dir(dir.path());
    let decoder = PhaDecoder::new(&reader, &responses);

    assert!(matches!(
        decoder.decode_observed("broken.json", None),
        Err(Error::Snapshot { .. })
    ));
    assert!(matches!(
        decoder.decode_observed("absent.json", None),
        Err(Error::FileNotFound { .. })
    ));
    assert!(matches!(
        decoder.decode_observed("ebounds_only.json", None),
        Err(Error::Format { .. })
    ));
}

/// Serialize a decode result the way `pha-inspect --format json` prints it
///
/// Purpose: Validate the machine-readable report structure
/// Benefit: Scripts consuming the CLI output rely on these field names
#[test]
fn test_json_report() {
    let dir = TempDir::new().unwrap();
    write_type_i_fixture(dir.path());

    let reader = JsonTableReader::new().with_base_dir(dir.path());
    let responses = JsonResponseLoader::new().with_base_dir(dir.path());
    let result = PhaDecoder::new(&reader, &responses)
        .decode_observed("obs.json", None)
        .unwrap();

    let report = serde_json::to_value(InspectReport::from_result(&result)).unwrap();

    assert_eq!(report["spectrum"]["n_channels"], 3);
    assert_eq!(report["spectrum"]["quality"]["warn"], 1);
    assert_eq!(report["spectrum"]["background"]["role"], "background");
    assert_eq!(report["spectrum"]["background"]["scale_factor"], serde_json::Value::Null);
    assert_eq!(report["diagnostics"][0]["kind"], "assumed_non_poisson");
}
