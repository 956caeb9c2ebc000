//! Commodity ledger entry model.

use super::lenient;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use validator::{Validate, ValidationError};

/// Actor recorded in audit columns when the caller does not identify itself.
pub const SYSTEM_ACTOR: &str = "system";

/// Item recorded on rows created before the item column existed.
pub const LEGACY_ITEM: &str = "N/A";

/// One `(a, b)` sub-weighment. Serialized as plain JSON numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BhartiPair {
    #[serde(
        default,
        serialize_with = "rust_decimal::serde::float::serialize",
        deserialize_with = "lenient::decimal"
    )]
    pub a: Decimal,
    #[serde(
        default,
        serialize_with = "rust_decimal::serde::float::serialize",
        deserialize_with = "lenient::decimal"
    )]
    pub b: Decimal,
}

impl BhartiPair {
    pub fn new(a: Decimal, b: Decimal) -> Self {
        Self { a, b }
    }

    /// `(a×b)` with trailing zeros trimmed, e.g. `(2×3.5)`.
    pub fn display(&self) -> String {
        format!("({}×{})", self.a.normalize(), self.b.normalize())
    }
}

/// Stored ledger entry with its derived fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: i64,
    pub entry_date: NaiveDate,
    pub name: String,
    pub bags: i32,
    pub bharti_pairs: Vec<BhartiPair>,
    pub weight: Decimal,
    pub rate: Decimal,
    pub lessrate: Decimal,
    pub amount: Decimal,
    pub commission: Decimal,
    pub other_amount: i32,
    pub total: Decimal,
    pub quality: String,
    pub item: String,
    pub market_fee: i32,
    pub is_marked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: String,
    pub updated_by: String,
}

/// A fully derived entry ready to be written. Produced by the calculator from
/// an [`EntryInput`]; the repository assigns id and timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEntry {
    pub entry_date: NaiveDate,
    pub name: String,
    pub bags: i32,
    pub bharti_pairs: Vec<BhartiPair>,
    pub weight: Decimal,
    pub rate: Decimal,
    pub lessrate: Decimal,
    pub amount: Decimal,
    pub commission: Decimal,
    pub other_amount: i32,
    pub total: Decimal,
    pub quality: String,
    pub item: String,
    pub market_fee: i32,
    pub actor: String,
}

/// Create/update request body.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct EntryInput {
    #[serde(default, alias = "entryDate", deserialize_with = "lenient::optional_text")]
    pub entry_date: Option<String>,

    #[serde(default)]
    #[validate(custom(function = "validate_name"))]
    pub name: String,

    #[serde(default, deserialize_with = "lenient::int")]
    #[validate(range(min = 0, message = "Bags cannot be negative"))]
    pub bags: i64,

    #[serde(default, alias = "bhartiPairs")]
    pub bharti_pairs: Vec<BhartiPair>,

    /// Only used when no pairs are supplied.
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub weight: Decimal,

    #[serde(default, deserialize_with = "lenient::decimal")]
    pub rate: Decimal,

    #[serde(default, alias = "lessRate", deserialize_with = "lenient::decimal")]
    pub lessrate: Decimal,

    #[serde(default, alias = "otherAmount", deserialize_with = "lenient::int")]
    pub other_amount: i64,

    #[serde(default)]
    #[validate(length(equal = 1, message = "Quality must be a single character"))]
    pub quality: String,

    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub item: Option<String>,

    #[serde(default, alias = "marketFee", deserialize_with = "lenient::int")]
    pub market_fee: i64,
}

/// Names are stored trimmed, so whitespace alone counts as blank.
fn validate_name(name: &str) -> Result<(), ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new("required").with_message(Cow::Borrowed("Name is required")));
    }
    if trimmed.chars().count() > 255 {
        return Err(ValidationError::new("length")
            .with_message(Cow::Borrowed("Name must be at most 255 characters")));
    }
    Ok(())
}

/// Listing projection: the entry plus its name+date group attribution.
#[derive(Debug, Clone, Serialize)]
pub struct EntryView {
    #[serde(flatten)]
    pub entry: LedgerEntry,
    pub all_amount: Option<Decimal>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;
    use validator::Validate;

    #[test]
    fn pair_display_trims_trailing_zeros() {
        assert_eq!(BhartiPair::new(dec!(2.00), dec!(3.50)).display(), "(2×3.5)");
    }

    #[test]
    fn pairs_round_trip_as_numbers() {
        let pair = BhartiPair::new(dec!(2), dec!(3.5));
        let value = serde_json::to_value(pair).unwrap();
        assert_eq!(value, json!({"a": 2.0, "b": 3.5}));
    }

    #[test]
    fn input_accepts_form_shaped_body() {
        let input: EntryInput = serde_json::from_value(json!({
            "entry_date": "2024-01-01",
            "name": "A",
            "bags": "3",
            "bharti_pairs": [{"a": "2", "b": 3}, {"a": null, "b": 4}],
            "rate": "100",
            "lessRate": "",
            "quality": "A",
            "market_fee": 12
        }))
        .unwrap();

        assert_eq!(input.bags, 3);
        assert_eq!(input.bharti_pairs[1].a, Decimal::ZERO);
        assert_eq!(input.lessrate, Decimal::ZERO);
        assert_eq!(input.item, None);
        assert!(input.validate().is_ok());
    }

    #[test]
    fn whitespace_name_is_blank() {
        let input = EntryInput {
            name: "   ".into(),
            quality: "A".into(),
            ..Default::default()
        };
        let errors = input.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("name"));
    }

    #[test]
    fn quality_must_be_one_character() {
        let input = EntryInput {
            name: "A".into(),
            quality: "AB".into(),
            ..Default::default()
        };
        assert!(input.validate().is_err());
    }
}
