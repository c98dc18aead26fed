use crate::error::{Result, RubricError};
use crate::validator::{Informational, Strict, SumPolicy};
use crate::weight;
use chrono::NaiveDate;
use log::warn;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use uuid::Uuid;

/// Prefix reserved for ids generated on the client for rows that were never persisted.
pub const TEMPORARY_ID_PREFIX: &str = "tmp-";

/// Identity of a rubric row.
///
/// The backend hands out numeric or textual keys; rows added in the editor get a
/// `tmp-<uuid>` key until the next sync so the server can tell them apart.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RubricId {
    Number(u64),
    Key(String),
    Temporary(String),
}

impl RubricId {
    /// Generates a fresh temporary id (`tmp-<uuid v4>`).
    pub fn temporary() -> Self {
        RubricId::Temporary(format!("{}{}", TEMPORARY_ID_PREFIX, Uuid::new_v4()))
    }

    pub fn is_temporary(&self) -> bool {
        matches!(self, RubricId::Temporary(_))
    }
}

impl From<u64> for RubricId {
    fn from(id: u64) -> Self {
        RubricId::Number(id)
    }
}

impl From<&str> for RubricId {
    fn from(key: &str) -> Self {
        if key.starts_with(TEMPORARY_ID_PREFIX) {
            RubricId::Temporary(key.to_string())
        } else {
            RubricId::Key(key.to_string())
        }
    }
}

impl fmt::Display for RubricId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RubricId::Number(id) => write!(f, "{}", id),
            RubricId::Key(key) | RubricId::Temporary(key) => f.write_str(key),
        }
    }
}

impl Serialize for RubricId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            RubricId::Number(id) => serializer.serialize_u64(*id),
            RubricId::Key(key) | RubricId::Temporary(key) => serializer.serialize_str(key),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(u64),
    Text(String),
}

impl<'de> Deserialize<'de> for RubricId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Ok(match RawId::deserialize(deserializer)? {
            RawId::Number(id) => RubricId::Number(id),
            RawId::Text(key) => RubricId::from(key.as_str()),
        })
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredNumber {
    Number(f64),
    Text(String),
}

/// Reads a weight the backend may store as a number, a numeric string or null.
fn deserialize_weight<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<StoredNumber>::deserialize(deserializer)? {
        None => 0.0,
        Some(StoredNumber::Number(value)) => value,
        Some(StoredNumber::Text(text)) => weight::parse_stored(&text).unwrap_or_else(|| {
            warn!("Stored weight {:?} is not numeric, using 0", text);
            0.0
        }),
    })
}

/// Reads `YYYY-MM-DD`, a full timestamp starting with a date, or null.
fn deserialize_due_date<'de, D>(deserializer: D) -> std::result::Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(text) if text.trim().is_empty() => Ok(None),
        Some(text) => {
            let date_part = text.trim().get(..10).unwrap_or(text.trim());
            NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
                .map(Some)
                .map_err(serde::de::Error::custom)
        }
    }
}

/// One edit made in the rubric editor.
///
/// Percentages arrive as the raw text typed by the user and are normalized once, when
/// the edit is applied.
#[derive(Debug, Clone, PartialEq)]
pub enum RubricField {
    Name(String),
    WeightPercent(String),
    DueDate(Option<NaiveDate>),
    LatePenaltyPercent(String),
}

impl RubricField {
    pub fn name(&self) -> &'static str {
        match self {
            RubricField::Name(_) => "name",
            RubricField::WeightPercent(_) => "weight",
            RubricField::DueDate(_) => "dueDate",
            RubricField::LatePenaltyPercent(_) => "latePenalty",
        }
    }
}

/// Variant-specific part of a rubric row, together with the sum policy that applies
/// to a list of such rows.
pub trait RubricVariant:
    Clone + fmt::Debug + Default + PartialEq + Serialize + DeserializeOwned
{
    /// Name used in error messages and logs.
    const NAME: &'static str;

    type Policy: SumPolicy + Default;

    /// Applies an edit that is not part of the common base.
    fn apply(&mut self, field: &RubricField) -> Result<()>;
}

/// Standard grade-weight rubric. Weights of a list must total 100%.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Standard {}

impl RubricVariant for Standard {
    const NAME: &'static str = "standard";

    type Policy = Strict;

    fn apply(&mut self, field: &RubricField) -> Result<()> {
        Err(RubricError::UnsupportedField {
            field: field.name(),
            variant: Self::NAME,
        })
    }
}

/// Daily-work ("trabajos cotidianos") rubric: a due date and a late penalty per day.
/// Any total is accepted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyWork {
    #[serde(
        rename = "fechaEntrega",
        default,
        deserialize_with = "deserialize_due_date"
    )]
    pub due_date: Option<NaiveDate>,
    #[serde(
        rename = "penalizacion",
        default,
        deserialize_with = "deserialize_weight"
    )]
    pub late_penalty: f64,
}

impl DailyWork {
    /// Fraction deducted for a delivery made on `delivered`.
    ///
    /// Each day past the due date costs `late_penalty`; the total is clamped to `[0, 1]`.
    /// Rows without a due date are never penalized.
    pub fn penalty_for(&self, delivered: NaiveDate) -> f64 {
        let Some(due) = self.due_date else {
            return 0.0;
        };
        let days_late = (delivered - due).num_days();
        if days_late <= 0 {
            return 0.0;
        }
        (days_late as f64 * self.late_penalty).clamp(0.0, 1.0)
    }
}

impl RubricVariant for DailyWork {
    const NAME: &'static str = "daily work";

    type Policy = Informational;

    fn apply(&mut self, field: &RubricField) -> Result<()> {
        match field {
            RubricField::DueDate(date) => {
                self.due_date = *date;
                Ok(())
            }
            RubricField::LatePenaltyPercent(raw) => {
                self.late_penalty = weight::from_display(raw)?;
                Ok(())
            }
            other => Err(RubricError::UnsupportedField {
                field: other.name(),
                variant: Self::NAME,
            }),
        }
    }
}

/// A single weighted grading component of a subject.
///
/// Fields:
/// - `id`: server key, or a temporary key for rows added in the editor.
/// - `name`: free-text label, e.g. "Exam 1".
/// - `weight`: fractional contribution to the final grade (0.25 is shown as 25%).
/// - `subject_key`: the subject ("materia") the row belongs to.
/// - `fields`: variant-specific fields, flattened into the same JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RubricItem<V> {
    pub id: RubricId,
    #[serde(rename = "nombre", default)]
    pub name: String,
    #[serde(
        rename = "ponderacion",
        default,
        deserialize_with = "deserialize_weight"
    )]
    pub weight: f64,
    #[serde(rename = "materiaClave", default)]
    pub subject_key: String,
    #[serde(flatten)]
    pub fields: V,
}

pub type StandardRubricItem = RubricItem<Standard>;
pub type TimeBoxedRubricItem = RubricItem<DailyWork>;

impl<V: RubricVariant> RubricItem<V> {
    /// A new unsaved row with a temporary id and an empty name.
    pub fn blank(subject_key: &str, weight: f64) -> Self {
        RubricItem {
            id: RubricId::temporary(),
            name: String::new(),
            weight,
            subject_key: subject_key.to_string(),
            fields: V::default(),
        }
    }

    pub fn is_new(&self) -> bool {
        self.id.is_temporary()
    }

    /// Weight as shown in the editor.
    pub fn display_weight(&self) -> f64 {
        weight::to_display(self.weight)
    }

    /// Applies one edit. On error the row is left unchanged.
    pub fn apply(&mut self, field: &RubricField) -> Result<()> {
        match field {
            RubricField::Name(name) => {
                self.name = name.clone();
                Ok(())
            }
            RubricField::WeightPercent(raw) => {
                self.weight = weight::from_display(raw)?;
                Ok(())
            }
            other => self.fields.apply(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_standard_item_with_string_weight() {
        let item: StandardRubricItem = serde_json::from_value(json!({
            "id": 7,
            "nombre": "Exam",
            "ponderacion": "0.35",
            "materiaClave": "MAT-101"
        }))
        .unwrap();

        assert_eq!(item.id, RubricId::Number(7));
        assert_eq!(item.name, "Exam");
        assert_eq!(item.weight, 0.35);
        assert_eq!(item.subject_key, "MAT-101");
        assert!(!item.is_new());
    }

    #[test]
    fn test_unparsable_stored_weight_becomes_zero() {
        let item: StandardRubricItem = serde_json::from_value(json!({
            "id": "abc",
            "nombre": "Project",
            "ponderacion": "n/a",
            "materiaClave": "MAT-101"
        }))
        .unwrap();

        assert_eq!(item.id, RubricId::Key("abc".to_string()));
        assert_eq!(item.weight, 0.0);
    }

    #[test]
    fn test_deserialize_daily_work_item() {
        let item: TimeBoxedRubricItem = serde_json::from_value(json!({
            "id": 3,
            "nombre": "Homework 1",
            "ponderacion": 0.1,
            "materiaClave": "MAT-101",
            "fechaEntrega": "2024-03-01T00:00:00.000Z",
            "penalizacion": "0.05"
        }))
        .unwrap();

        assert_eq!(
            item.fields.due_date,
            Some(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
        );
        assert_eq!(item.fields.late_penalty, 0.05);
    }

    #[test]
    fn test_serialize_temporary_item() {
        let item = TimeBoxedRubricItem::blank("MAT-101", 0.2);
        let value = serde_json::to_value(&item).unwrap();

        assert!(value["id"].as_str().unwrap().starts_with(TEMPORARY_ID_PREFIX));
        assert_eq!(value["nombre"], "");
        assert_eq!(value["ponderacion"], 0.2);
        assert_eq!(value["materiaClave"], "MAT-101");
        assert_eq!(value["fechaEntrega"], serde_json::Value::Null);
        assert_eq!(value["penalizacion"], 0.0);
    }

    #[test]
    fn test_temporary_ids_are_unique_and_recognized() {
        let first = RubricId::temporary();
        let second = RubricId::temporary();
        assert_ne!(first, second);
        assert!(first.is_temporary());
        assert_eq!(RubricId::from(first.to_string().as_str()), first);
    }

    #[test]
    fn test_apply_weight_normalizes_percentage() {
        let mut item = StandardRubricItem::blank("MAT-101", 0.0);
        item.apply(&RubricField::WeightPercent("25".to_string())).unwrap();
        assert_eq!(item.weight, 0.25);
        assert_eq!(item.display_weight(), 25.0);
    }

    #[test]
    fn test_invalid_weight_leaves_item_unchanged() {
        let mut item = StandardRubricItem::blank("MAT-101", 0.4);
        let before = item.clone();
        let result = item.apply(&RubricField::WeightPercent("forty".to_string()));
        assert_eq!(result, Err(RubricError::InvalidNumber("forty".to_string())));
        assert_eq!(item, before);
    }

    #[test]
    fn test_standard_item_rejects_daily_work_fields() {
        let mut item = StandardRubricItem::blank("MAT-101", 0.4);
        let result = item.apply(&RubricField::DueDate(None));
        assert_eq!(
            result,
            Err(RubricError::UnsupportedField {
                field: "dueDate",
                variant: "standard"
            })
        );
    }

    #[test]
    fn test_late_penalty_per_day() {
        let mut item = TimeBoxedRubricItem::blank("MAT-101", 0.1);
        let due = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        item.apply(&RubricField::DueDate(Some(due))).unwrap();
        item.apply(&RubricField::LatePenaltyPercent("10".to_string()))
            .unwrap();

        assert_eq!(item.fields.penalty_for(due), 0.0);
        let three_days_late = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        assert!((item.fields.penalty_for(three_days_late) - 0.3).abs() < 1e-9);
        let a_month_late = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
        assert_eq!(item.fields.penalty_for(a_month_late), 1.0);
    }

    #[test]
    fn test_no_due_date_means_no_penalty() {
        let item = TimeBoxedRubricItem::blank("MAT-101", 0.1);
        let any_day = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();
        assert_eq!(item.fields.penalty_for(any_day), 0.0);
    }
}
