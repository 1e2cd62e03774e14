use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

use crate::error::ProjectionError;
use crate::types::{PerYear, YEARS};
use crate::ProjectionResult;

/// Where the current value of a field came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldSource {
    #[default]
    BrandDefault,
    UserEntry,
    AiPopulated,
}

/// Advisory typical-value range from the franchise disclosure document.
/// Used for warnings only, never for clamping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Item7Range<T> {
    pub min: T,
    pub max: T,
}

impl<T: PartialOrd> Item7Range<T> {
    pub fn contains(&self, value: &T) -> bool {
        *value >= self.min && *value <= self.max
    }
}

/// A single plan input together with its provenance metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldValue<T> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_value: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_default: Option<T>,
    #[serde(default)]
    pub source: FieldSource,
    #[serde(default)]
    pub is_custom: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item7_range: Option<Item7Range<T>>,
}

impl<T: Copy + Default + PartialEq> FieldValue<T> {
    /// A field seeded from the brand with no user value yet.
    pub fn brand(value: T) -> Self {
        FieldValue {
            current_value: None,
            brand_default: Some(value),
            source: FieldSource::BrandDefault,
            is_custom: false,
            last_modified_at: None,
            item7_range: None,
        }
    }

    /// A field carrying a user-entered value and no brand default.
    pub fn user(value: T) -> Self {
        FieldValue {
            current_value: Some(value),
            brand_default: None,
            source: FieldSource::UserEntry,
            is_custom: true,
            last_modified_at: None,
            item7_range: None,
        }
    }

    pub fn with_item7_range(mut self, min: T, max: T) -> Self {
        self.item7_range = Some(Item7Range { min, max });
        self
    }

    /// Resolution order: current value, inline brand default, the supplied
    /// fallback, then `T::default()` (zero for every numeric input).
    pub fn resolve(&self, fallback: Option<T>) -> T {
        self.current_value
            .or(self.brand_default)
            .or(fallback)
            .unwrap_or_default()
    }

    pub fn user_edit(&mut self, value: T, at: DateTime<Utc>) {
        self.current_value = Some(value);
        self.source = FieldSource::UserEntry;
        self.is_custom = self.brand_default != Some(value);
        self.last_modified_at = Some(at);
    }

    pub fn ai_populate(&mut self, value: T, at: DateTime<Utc>) {
        self.current_value = Some(value);
        self.source = FieldSource::AiPopulated;
        self.is_custom = self.brand_default != Some(value);
        self.last_modified_at = Some(at);
    }

    pub fn reset_to_default(&mut self, at: DateTime<Utc>) {
        self.current_value = self.brand_default;
        self.source = FieldSource::BrandDefault;
        self.is_custom = false;
        self.last_modified_at = Some(at);
    }
}

impl<T: PartialOrd + Display> FieldValue<T> {
    /// Advisory text when `value` falls outside this field's item 7 range.
    pub fn item7_advisory(&self, label: &str, value: &T) -> Option<String> {
        let range = self.item7_range.as_ref()?;
        if range.contains(value) {
            None
        } else {
            Some(format!(
                "{label}: {value} is outside the Item 7 range {}..{}",
                range.min, range.max
            ))
        }
    }
}

/// A per-year input: either one value broadcast to every year, or exactly
/// one value per projection year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged, bound(deserialize = "T: Deserialize<'de> + Default"))]
pub enum PerYearField<T> {
    PerYear(Vec<FieldValue<T>>),
    Uniform(FieldValue<T>),
}

impl<T: Default> Default for PerYearField<T> {
    fn default() -> Self {
        PerYearField::Uniform(FieldValue {
            current_value: None,
            brand_default: None,
            source: FieldSource::BrandDefault,
            is_custom: false,
            last_modified_at: None,
            item7_range: None,
        })
    }
}

impl<T: Copy + Default + PartialEq> PerYearField<T> {
    pub fn uniform(field: FieldValue<T>) -> Self {
        PerYearField::Uniform(field)
    }

    pub fn user_years(values: PerYear<T>) -> Self {
        PerYearField::PerYear(values.iter().map(|v| FieldValue::user(*v)).collect())
    }

    pub fn brand_years(values: PerYear<T>) -> Self {
        PerYearField::PerYear(values.iter().map(|v| FieldValue::brand(*v)).collect())
    }

    /// Field metadata governing year `idx` (0-based).
    pub fn field_for_year(&self, idx: usize) -> Option<&FieldValue<T>> {
        match self {
            PerYearField::Uniform(field) => (idx < YEARS).then_some(field),
            PerYearField::PerYear(fields) => fields.get(idx),
        }
    }

    /// Check the per-year shape: an explicit array must hold exactly one
    /// value per projection year.
    pub fn validate_shape(&self, field: &str) -> ProjectionResult<()> {
        if let PerYearField::PerYear(fields) = self {
            if fields.len() != YEARS {
                return Err(ProjectionError::LengthMismatch {
                    field: field.into(),
                    expected: YEARS,
                    actual: fields.len(),
                });
            }
        }
        Ok(())
    }

    /// Resolve every year, falling back to `fallback[year]` when a year
    /// carries neither a current value nor a brand default.
    pub fn resolve(&self, field: &str, fallback: Option<&PerYear<T>>) -> ProjectionResult<PerYear<T>> {
        self.validate_shape(field)?;
        let mut out = [T::default(); YEARS];
        for (idx, slot) in out.iter_mut().enumerate() {
            let year_fallback = fallback.map(|f| f[idx]);
            *slot = self
                .field_for_year(idx)
                .map(|f| f.resolve(year_fallback))
                .unwrap_or_default();
        }
        Ok(out)
    }

    /// Edit exactly one year. A broadcast field is first expanded into
    /// independent per-year values so the other years keep their value.
    pub fn set_year(&mut self, idx: usize, value: T, at: DateTime<Utc>) -> ProjectionResult<()> {
        if idx >= YEARS {
            return Err(ProjectionError::InvalidInput {
                field: "year".into(),
                reason: format!("Year index {idx} is outside 0..{YEARS}"),
            });
        }
        let expanded = match &*self {
            PerYearField::Uniform(field) => Some(vec![field.clone(); YEARS]),
            PerYearField::PerYear(_) => None,
        };
        if let Some(fields) = expanded {
            *self = PerYearField::PerYear(fields);
        }
        if let PerYearField::PerYear(fields) = self {
            let actual = fields.len();
            let Some(field) = fields.get_mut(idx) else {
                return Err(ProjectionError::LengthMismatch {
                    field: "per_year".into(),
                    expected: YEARS,
                    actual,
                });
            };
            field.user_edit(value, at);
        }
        Ok(())
    }

    /// Copy year 1's effective value into years 2..5 as user entries.
    pub fn copy_first_year_to_all(&mut self, at: DateTime<Utc>) {
        if let PerYearField::PerYear(fields) = self {
            let Some(first) = fields.first().and_then(|f| f.current_value.or(f.brand_default))
            else {
                return;
            };
            for field in fields.iter_mut().skip(1) {
                field.user_edit(first, at);
            }
        }
    }
}
