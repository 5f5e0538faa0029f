//! Typed shape of an extraction result.
//!
//! The model's JSON is an untrusted proposal. [`Extraction::from_value`] decodes
//! it into per-entity records, applying the defaulting rules the reconciler
//! relies on (truthy ids, `"present"` end dates, list-wrapped profiles).
//! Anything that does not fit is rejected with a [`RecordError`] naming the
//! entity kind and record index.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{de::Error as _, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::store::Table;

/// Primary key type shared by all five tables.
pub type RowId = i32;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("extraction must be a JSON object, got {0}")]
    NotAnObject(&'static str),

    #[error("'{table}' must be {expected}, got {found}")]
    UnexpectedShape {
        table: Table,
        expected: &'static str,
        found: &'static str,
    },

    #[error("{table}[{index}]: {source}")]
    Invalid {
        table: Table,
        index: usize,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRecord {
    #[serde(default, deserialize_with = "truthy_id")]
    pub id: Option<RowId>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub about_me: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub social_links: BTreeMap<String, String>,
    /// Never persisted; kept only so a proposed value can be reported.
    #[serde(default, skip_serializing)]
    pub resume_url: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperienceRecord {
    #[serde(default, deserialize_with = "truthy_id")]
    pub id: Option<RowId>,
    pub company: String,
    pub role: String,
    #[serde(default, deserialize_with = "optional_date")]
    pub start_date: Option<NaiveDate>,
    /// `None` means the position is ongoing.
    #[serde(default, deserialize_with = "end_date")]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub achievements: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectRecord {
    #[serde(default, deserialize_with = "truthy_id")]
    pub id: Option<RowId>,
    pub title: String,
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tech_stack: Vec<String>,
    #[serde(default)]
    pub repo_link: Option<String>,
    #[serde(default)]
    pub live_link: Option<String>,
    #[serde(default)]
    pub featured: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillRecord {
    #[serde(default, deserialize_with = "truthy_id")]
    pub id: Option<RowId>,
    pub category: String,
    pub items: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CertificationRecord {
    #[serde(default, deserialize_with = "truthy_id")]
    pub id: Option<RowId>,
    pub name: String,
    pub issuer: String,
    #[serde(default, deserialize_with = "optional_date")]
    pub issue_date: Option<NaiveDate>,
    #[serde(default)]
    pub credential_url: Option<String>,
}

/// A fully decoded extraction result, ready for reconciliation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub profile: Option<ProfileRecord>,
    pub experience: Vec<ExperienceRecord>,
    pub projects: Vec<ProjectRecord>,
    pub skills: Vec<SkillRecord>,
    pub certifications: Vec<CertificationRecord>,
}

impl Extraction {
    pub fn from_value(value: &Value) -> Result<Self, RecordError> {
        let obj = value
            .as_object()
            .ok_or_else(|| RecordError::NotAnObject(json_type(value)))?;

        Ok(Extraction {
            profile: decode_profile(obj.get(Table::Profile.as_str()))?,
            experience: decode_list(Table::Experience, obj.get(Table::Experience.as_str()))?,
            projects: decode_list(Table::Projects, obj.get(Table::Projects.as_str()))?,
            skills: decode_list(Table::Skills, obj.get(Table::Skills.as_str()))?,
            certifications: decode_list(
                Table::Certifications,
                obj.get(Table::Certifications.as_str()),
            )?,
        })
    }
}

/// The model sometimes wraps the profile in a list; take the first element.
/// A missing, null or empty profile means "no change".
fn decode_profile(value: Option<&Value>) -> Result<Option<ProfileRecord>, RecordError> {
    let value = match value {
        Some(Value::Array(items)) => items.first(),
        other => other,
    };
    let value = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Object(fields)) if fields.is_empty() => return Ok(None),
        Some(v @ Value::Object(_)) => v,
        Some(other) => {
            return Err(RecordError::UnexpectedShape {
                table: Table::Profile,
                expected: "an object or a list of objects",
                found: json_type(other),
            })
        }
    };

    let profile: ProfileRecord =
        serde_json::from_value(value.clone()).map_err(|source| RecordError::Invalid {
            table: Table::Profile,
            index: 0,
            source,
        })?;

    if profile.resume_url.is_some() {
        warn!("Model proposed a resume_url for the profile; discarding it");
    }

    Ok(Some(profile))
}

fn decode_list<T>(table: Table, value: Option<&Value>) -> Result<Vec<T>, RecordError>
where
    T: for<'de> Deserialize<'de>,
{
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                serde_json::from_value(item.clone())
                    .map_err(|source| RecordError::Invalid { table, index, source })
            })
            .collect(),
        Some(other) => Err(RecordError::UnexpectedShape {
            table,
            expected: "a list of objects",
            found: json_type(other),
        }),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

/// Maps an end-date token to a date, treating `"present"` (any case) as ongoing.
pub fn normalize_end_date(raw: Option<&str>) -> Result<Option<NaiveDate>, chrono::ParseError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) if s.eq_ignore_ascii_case("present") => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, DATE_FORMAT).map(Some),
    }
}

// ─── Field deserializers ─────────────────────────────────────────────────────

/// Accepts a positive integer or a numeric string. `null`, `0`, `""` and
/// `false` all mean "no id".
fn truthy_id<'de, D>(deserializer: D) -> Result<Option<RowId>, D::Error>
where
    D: Deserializer<'de>,
{
    let parsed = match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) | Some(Value::Bool(false)) => return Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .ok_or_else(|| D::Error::custom(format!("id must be an integer, got {n}")))?,
        Some(Value::String(s)) if s.trim().is_empty() => return Ok(None),
        Some(Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| D::Error::custom(format!("id must be numeric, got {s:?}")))?,
        Some(other) => {
            return Err(D::Error::custom(format!(
                "id must be an integer, got {}",
                json_type(&other)
            )))
        }
    };

    if parsed == 0 {
        return Ok(None);
    }
    RowId::try_from(parsed)
        .map(Some)
        .map_err(|_| D::Error::custom(format!("id {parsed} is out of range")))
}

fn optional_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
            .map(Some)
            .map_err(|e| D::Error::custom(format!("invalid date {s:?}: {e}"))),
    }
}

fn end_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    normalize_end_date(raw.as_deref())
        .map_err(|e| D::Error::custom(format!("invalid end_date {raw:?}: {e}")))
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
