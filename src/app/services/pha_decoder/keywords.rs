//! OGIP keyword resolution
//!
//! Every required keyword is looked up in the SPECTRUM header first. In a
//! Type II file some keywords may also appear as columns, and the value at the
//! selected row then overrides the header. Two keywords have fallbacks when
//! missing (POISSERR, ANCRFILE); any other missing keyword is an error.

use super::layout::Layout;
use crate::app::adapters::table::{PhaTable, Value};
use crate::app::models::SpectrumRole;
use crate::app::models::diagnostics::{Diagnostic, DiagnosticKind};
use crate::constants::{columns, is_none_token, keywords};
use crate::{Error, Result};
use std::collections::BTreeMap;
use tracing::debug;

// =============================================================================
// Logical Fields
// =============================================================================

/// Logical field resolved from a keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Telescope,
    Instrument,
    Filter,
    Exposure,
    BackgroundFile,
    ResponseFile,
    AncillaryFile,
    HduClass,
    HduClass1,
    PoissonErrors,
    ChannelType,
    DetectorChannels,
    ScaleFactor,
}

const OBSERVED_FIELDS: &[Field] = &[
    Field::Telescope,
    Field::Instrument,
    Field::Filter,
    Field::Exposure,
    Field::BackgroundFile,
    Field::ResponseFile,
    Field::AncillaryFile,
    Field::HduClass,
    Field::HduClass1,
    Field::PoissonErrors,
    Field::ChannelType,
    Field::DetectorChannels,
    Field::ScaleFactor,
];

const BACKGROUND_FIELDS: &[Field] = &[
    Field::Telescope,
    Field::Instrument,
    Field::Filter,
    Field::Exposure,
    Field::AncillaryFile,
    Field::HduClass,
    Field::HduClass1,
    Field::PoissonErrors,
    Field::ChannelType,
    Field::DetectorChannels,
    Field::ScaleFactor,
];

impl Field {
    /// Header keyword (and column name) carrying the field
    pub fn keyword(self) -> &'static str {
        match self {
            Field::Telescope => keywords::TELESCOP,
            Field::Instrument => keywords::INSTRUME,
            Field::Filter => keywords::FILTER,
            Field::Exposure => keywords::EXPOSURE,
            Field::BackgroundFile => keywords::BACKFILE,
            Field::ResponseFile => keywords::RESPFILE,
            Field::AncillaryFile => keywords::ANCRFILE,
            Field::HduClass => keywords::HDUCLASS,
            Field::HduClass1 => keywords::HDUCLAS1,
            Field::PoissonErrors => keywords::POISSERR,
            Field::ChannelType => keywords::CHANTYPE,
            Field::DetectorChannels => keywords::DETCHANS,
            Field::ScaleFactor => keywords::BACKSCAL,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Field::Telescope => "telescope",
            Field::Instrument => "instrument",
            Field::Filter => "filter",
            Field::Exposure => "exposure",
            Field::BackgroundFile => "backfile",
            Field::ResponseFile => "response_file",
            Field::AncillaryFile => "ancrfile",
            Field::HduClass => "hduclass",
            Field::HduClass1 => "hduclas1",
            Field::PoissonErrors => "poisserr",
            Field::ChannelType => "chantype",
            Field::DetectorChannels => "detchans",
            Field::ScaleFactor => "scale_factor",
        }
    }

    /// Fields that must resolve for a file of the given role
    pub fn required_for(role: SpectrumRole) -> &'static [Field] {
        match role {
            SpectrumRole::Observed => OBSERVED_FIELDS,
            SpectrumRole::Background => BACKGROUND_FIELDS,
        }
    }
}

/// Whether a Type II column named `keyword` overrides the header for `role`
pub fn is_column_overridable(role: SpectrumRole, keyword: &str) -> bool {
    match role {
        SpectrumRole::Observed => keywords::OBSERVED_COLUMN_OVERRIDES.contains(&keyword),
        SpectrumRole::Background => keywords::BACKGROUND_COLUMN_OVERRIDES.contains(&keyword),
    }
}

// =============================================================================
// Resolved Values
// =============================================================================

/// A resolved keyword: a value, or an explicit NONE
#[derive(Debug, Clone, PartialEq)]
pub enum KeywordValue {
    Present(Value),
    Absent,
}

impl KeywordValue {
    /// Normalize a raw card or cell; the NONE token becomes [`KeywordValue::Absent`]
    pub fn from_raw(value: &Value) -> Self {
        match value {
            Value::Text(text) if is_none_token(text) => KeywordValue::Absent,
            Value::Text(text) => KeywordValue::Present(Value::Text(text.trim().to_string())),
            other => KeywordValue::Present(other.clone()),
        }
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            KeywordValue::Present(value) => Some(value),
            KeywordValue::Absent => None,
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, KeywordValue::Present(_))
    }
}

/// Resolved values of every required field of one file
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedKeywords {
    file: String,
    values: BTreeMap<Field, KeywordValue>,
}

impl ResolvedKeywords {
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            values: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, field: Field, value: KeywordValue) {
        self.values.insert(field, value);
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn get(&self, field: Field) -> Option<&KeywordValue> {
        self.values.get(&field)
    }

    pub fn contains(&self, field: Field) -> bool {
        self.values.contains_key(&field)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Resolved fields in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (Field, &KeywordValue)> {
        self.values.iter().map(|(field, value)| (*field, value))
    }

    /// Text of a present value
    pub fn text(&self, field: Field) -> Option<String> {
        self.get(field)
            .and_then(KeywordValue::value)
            .map(|value| value.to_string())
    }

    /// Number of a present value; a non-numeric value is an error
    pub fn number(&self, field: Field) -> Result<Option<f64>> {
        match self.get(field).and_then(KeywordValue::value) {
            Some(value) => value.as_f64().map(Some).ok_or_else(|| {
                Error::validation(format!(
                    "Invalid numeric value for {} in '{}': '{}'",
                    field.keyword(),
                    self.file,
                    value
                ))
            }),
            None => Ok(None),
        }
    }

    /// Number that must be present
    pub fn require_number(&self, field: Field) -> Result<f64> {
        self.number(field)?
            .ok_or_else(|| Error::missing_keyword(&self.file, field.keyword()))
    }

    /// Logical value of a present value; a non-logical value is an error
    pub fn flag(&self, field: Field) -> Result<Option<bool>> {
        match self.get(field).and_then(KeywordValue::value) {
            Some(value) => value.as_bool().map(Some).ok_or_else(|| {
                Error::validation(format!(
                    "Invalid logical value for {} in '{}': '{}'",
                    field.keyword(),
                    self.file,
                    value
                ))
            }),
            None => Ok(None),
        }
    }
}

// =============================================================================
// Resolver
// =============================================================================

/// Resolves keywords of one opened table
pub struct KeywordResolver<'a> {
    table: &'a dyn PhaTable,
    layout: &'a Layout,
    role: SpectrumRole,
    file: &'a str,
}

impl<'a> KeywordResolver<'a> {
    pub fn new(table: &'a dyn PhaTable, layout: &'a Layout, role: SpectrumRole, file: &'a str) -> Self {
        Self {
            table,
            layout,
            role,
            file,
        }
    }

    /// Header value, overridden by the selected row of a same-named column
    ///
    /// Returns `None` when neither source holds the keyword. Column overrides
    /// apply only to Type II files and to keywords overridable for the role.
    pub fn lookup(&self, keyword: &str) -> Result<Option<KeywordValue>> {
        let mut resolved = self.table.header(keyword).map(KeywordValue::from_raw);

        if let Some(row) = self.layout.row {
            if is_column_overridable(self.role, keyword) {
                if let Some(column) = self.table.column(keyword) {
                    let cell = column.cell(row).ok_or_else(|| {
                        Error::format(
                            self.file,
                            format!(
                                "keyword column {} has no scalar value for spectrum {}",
                                keyword,
                                row + 1
                            ),
                        )
                    })?;

                    debug!("{} taken from column at spectrum {}", keyword, row + 1);
                    resolved = Some(KeywordValue::from_raw(cell));
                }
            }
        }

        Ok(resolved)
    }

    /// Resolve every required field for the role
    ///
    /// POISSERR set to NONE counts as missing. Recoveries are appended to
    /// `diagnostics`; an unresolvable field is a [`Error::MissingKeyword`].
    pub fn resolve(&self, diagnostics: &mut Vec<Diagnostic>) -> Result<ResolvedKeywords> {
        let mut resolved = ResolvedKeywords::new(self.file);

        for &field in Field::required_for(self.role) {
            let value = match self.lookup(field.keyword())? {
                // An explicit NONE carries no logical value
                Some(KeywordValue::Absent) if field == Field::PoissonErrors => None,
                other => other,
            };

            let value = match value {
                Some(value) => value,
                None => self
                    .fallback(field, diagnostics)
                    .ok_or_else(|| Error::missing_keyword(self.file, field.keyword()))?,
            };

            debug!("Resolved {} = {:?}", field.keyword(), value);
            resolved.insert(field, value);
        }

        Ok(resolved)
    }

    fn fallback(&self, field: Field, diagnostics: &mut Vec<Diagnostic>) -> Option<KeywordValue> {
        match field {
            Field::PoissonErrors if self.table.has_column(columns::STAT_ERR) => {
                diagnostics.push(Diagnostic::new(DiagnosticKind::AssumedNonPoisson, self.file));
                Some(KeywordValue::Present(Value::Bool(false)))
            }
            Field::AncillaryFile => {
                diagnostics.push(Diagnostic::new(DiagnosticKind::MissingAncillaryFile, self.file));
                Some(KeywordValue::Absent)
            }
            _ => None,
        }
    }
}
