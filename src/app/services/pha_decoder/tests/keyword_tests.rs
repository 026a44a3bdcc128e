//! Tests for keyword resolution, NONE normalization and fallbacks

use super::*;
use crate::Error;
use crate::app::models::SpectrumRole;
use crate::app::models::diagnostics::{Diagnostic, DiagnosticKind};
use crate::app::services::pha_decoder::keywords::{
    Field, KeywordResolver, KeywordValue, ResolvedKeywords, is_column_overridable,
};
use crate::app::services::pha_decoder::layout::Layout;

fn resolve(
    table: &MemoryTable,
    role: SpectrumRole,
    spectrum_number: Option<usize>,
) -> crate::Result<(ResolvedKeywords, Vec<Diagnostic>)> {
    let layout = Layout::dispatch(table, "test.pha", spectrum_number)?;
    let mut diagnostics = Vec::new();
    let resolved = KeywordResolver::new(table, &layout, role, "test.pha").resolve(&mut diagnostics)?;
    Ok((resolved, diagnostics))
}

#[test]
fn test_header_keywords_resolve() {
    let (resolved, diagnostics) =
        resolve(&type_i_counts_table(), SpectrumRole::Observed, None).unwrap();

    assert!(diagnostics.is_empty());
    assert_eq!(resolved.len(), Field::required_for(SpectrumRole::Observed).len());
    assert_eq!(resolved.text(Field::Telescope).as_deref(), Some("GLAST"));
    assert_eq!(resolved.require_number(Field::Exposure).unwrap(), 10.0);
    assert_eq!(resolved.flag(Field::PoissonErrors).unwrap(), Some(true));
    assert_eq!(resolved.text(Field::ResponseFile).as_deref(), Some(RESPONSE_FILE));
    assert_eq!(resolved.file(), "test.pha");

    let order: Vec<Field> = resolved.iter().map(|(field, _)| field).collect();
    assert_eq!(order.first(), Some(&Field::Telescope));
    assert_eq!(order.last(), Some(&Field::ScaleFactor));
}

#[test]
fn test_none_token_normalizes_to_absent() {
    let table = type_i_counts_table().with_header("BACKFILE", "  None ");
    let (resolved, _) = resolve(&table, SpectrumRole::Observed, None).unwrap();

    assert_eq!(resolved.get(Field::BackgroundFile), Some(&KeywordValue::Absent));
    assert_eq!(resolved.get(Field::AncillaryFile), Some(&KeywordValue::Absent));
    assert_eq!(resolved.text(Field::BackgroundFile), None);
    assert_eq!(resolved.get(Field::Filter), Some(&KeywordValue::Absent));
}

#[test]
fn test_text_values_are_trimmed() {
    let raw = Value::Text("  bkg.pha ".to_string());
    assert_eq!(KeywordValue::from_raw(&raw), KeywordValue::Present(text("bkg.pha")));
    assert!(KeywordValue::from_raw(&Value::Int(3)).is_present());
}

#[test]
fn test_background_role_skips_linking_keywords() {
    let (resolved, _) = resolve(&background_table(), SpectrumRole::Background, None).unwrap();

    assert!(!resolved.contains(Field::BackgroundFile));
    assert!(!resolved.contains(Field::ResponseFile));
    assert_eq!(resolved.require_number(Field::ScaleFactor).unwrap(), 2.0);
}

#[test]
fn test_type_ii_column_overrides_header() {
    let table = type_ii_table().with_column("BACKFILE", Column::text(["bkg_a.pha", "NONE", "bkg_c.pha"]));

    let (resolved, _) = resolve(&table, SpectrumRole::Observed, Some(1)).unwrap();
    assert_eq!(resolved.require_number(Field::Exposure).unwrap(), 10.0);
    assert_eq!(resolved.text(Field::BackgroundFile).as_deref(), Some("bkg_a.pha"));

    let (resolved, _) = resolve(&table, SpectrumRole::Observed, Some(2)).unwrap();
    assert_eq!(resolved.require_number(Field::Exposure).unwrap(), 5.0);
    assert_eq!(resolved.get(Field::BackgroundFile), Some(&KeywordValue::Absent));
}

#[test]
fn test_type_i_ignores_keyword_columns() {
    let table = type_i_counts_table().with_column("EXPOSURE", Column::numeric([1.0, 2.0, 3.0, 4.0]));

    let (resolved, _) = resolve(&table, SpectrumRole::Observed, None).unwrap();
    assert_eq!(resolved.require_number(Field::Exposure).unwrap(), 10.0);
}

#[test]
fn test_only_listed_keywords_are_overridable() {
    assert!(is_column_overridable(SpectrumRole::Observed, "RESPFILE"));
    assert!(!is_column_overridable(SpectrumRole::Background, "RESPFILE"));
    assert!(!is_column_overridable(SpectrumRole::Observed, "TELESCOP"));

    let table = type_ii_table().with_column("TELESCOP", Column::text(["A", "B", "C"]));
    let (resolved, _) = resolve(&table, SpectrumRole::Observed, Some(3)).unwrap();
    assert_eq!(resolved.text(Field::Telescope).as_deref(), Some("GLAST"));
}

#[test]
fn test_override_column_without_header_card() {
    let table = type_ii_table().without_header("RESPFILE").with_column(
        "RESPFILE",
        Column::text(["a.rsp", "b.rsp", "c.rsp"]),
    );

    let (resolved, _) = resolve(&table, SpectrumRole::Observed, Some(2)).unwrap();
    assert_eq!(resolved.text(Field::ResponseFile).as_deref(), Some("b.rsp"));
}

#[test]
fn test_missing_poisserr_with_stat_err_assumes_gaussian() {
    let table = type_i_counts_table()
        .without_header("POISSERR")
        .with_column("STAT_ERR", Column::numeric([1.0, 1.0, 1.0, 1.0]));

    let (resolved, diagnostics) = resolve(&table, SpectrumRole::Observed, None).unwrap();

    assert_eq!(resolved.flag(Field::PoissonErrors).unwrap(), Some(false));
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].kind, DiagnosticKind::AssumedNonPoisson);
    assert_eq!(diagnostics[0].file, "test.pha");
}

#[test]
fn test_poisserr_none_falls_back_like_missing() {
    let table = type_i_counts_table()
        .with_header("POISSERR", " none ")
        .with_column("STAT_ERR", Column::numeric([1.0, 1.0, 1.0, 1.0]));

    let (resolved, diagnostics) = resolve(&table, SpectrumRole::Observed, None).unwrap();

    assert_eq!(resolved.flag(Field::PoissonErrors).unwrap(), Some(false));
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].kind, DiagnosticKind::AssumedNonPoisson);

    let without_stat_err = type_i_counts_table().with_header("POISSERR", "NONE");
    assert!(matches!(
        resolve(&without_stat_err, SpectrumRole::Observed, None),
        Err(Error::MissingKeyword { .. })
    ));
}

#[test]
fn test_missing_poisserr_without_stat_err_fails() {
    let table = type_i_counts_table().without_header("POISSERR");

    match resolve(&table, SpectrumRole::Observed, None) {
        Err(Error::MissingKeyword { file, keyword }) => {
            assert_eq!(file, "test.pha");
            assert_eq!(keyword, "POISSERR");
        }
        other => panic!("expected MissingKeyword, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_missing_ancrfile_is_recovered() {
    let table = type_i_counts_table().without_header("ANCRFILE");

    let (resolved, diagnostics) = resolve(&table, SpectrumRole::Observed, None).unwrap();

    assert_eq!(resolved.get(Field::AncillaryFile), Some(&KeywordValue::Absent));
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].kind, DiagnosticKind::MissingAncillaryFile);
}

#[test]
fn test_missing_required_keyword_names_keyword() {
    for keyword in ["TELESCOP", "EXPOSURE", "BACKSCAL", "DETCHANS", "HDUCLAS1"] {
        let table = type_i_counts_table().without_header(keyword);

        match resolve(&table, SpectrumRole::Observed, None) {
            Err(Error::MissingKeyword { keyword: missing, .. }) => assert_eq!(missing, keyword),
            other => panic!("expected MissingKeyword for {}, got {:?}", keyword, other.map(|_| ())),
        }
    }
}

#[test]
fn test_background_does_not_need_backfile() {
    let table = background_table().without_header("BACKFILE");
    assert!(resolve(&table, SpectrumRole::Background, None).is_ok());

    let result = resolve(&table, SpectrumRole::Observed, None);
    assert!(matches!(result, Err(Error::MissingKeyword { .. })));
}

#[test]
fn test_typed_accessors_reject_wrong_types() {
    let table = type_i_counts_table()
        .with_header("EXPOSURE", "long")
        .with_header("POISSERR", "maybe");

    let (resolved, _) = resolve(&table, SpectrumRole::Observed, None).unwrap();
    assert!(matches!(resolved.number(Field::Exposure), Err(Error::Validation { .. })));
    assert!(matches!(resolved.flag(Field::PoissonErrors), Err(Error::Validation { .. })));
    assert_eq!(resolved.number(Field::BackgroundFile).unwrap(), None);
}
