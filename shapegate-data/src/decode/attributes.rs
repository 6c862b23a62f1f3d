//! Conversion of dBASE records into attribute maps.

use std::collections::HashMap;

use shapefile::dbase::{FieldValue, Record};
use shapegate_core::{AttributeValue, Attributes};

/// Convert one dBASE record into an ordered attribute map.
pub fn record_to_attributes(record: Record) -> Attributes {
    HashMap::<String, FieldValue>::from(record)
        .into_iter()
        .map(|(name, value)| (name, field_value(value)))
        .collect()
}

/// Convert one dBASE field value.
///
/// Empty character fields and unset values become [`AttributeValue::Null`].
pub fn field_value(value: FieldValue) -> AttributeValue {
    match value {
        FieldValue::Character(Some(text)) | FieldValue::Memo(text) => text_value(&text),
        FieldValue::Numeric(Some(number))
        | FieldValue::Double(number)
        | FieldValue::Currency(number) => AttributeValue::Number(number),
        FieldValue::Float(Some(number)) => AttributeValue::Number(f64::from(number)),
        FieldValue::Integer(number) => AttributeValue::Integer(i64::from(number)),
        FieldValue::Logical(Some(flag)) => AttributeValue::Boolean(flag),
        FieldValue::Date(Some(date)) => AttributeValue::Text(format!(
            "{:04}-{:02}-{:02}",
            date.year(),
            date.month(),
            date.day()
        )),
        FieldValue::Character(None)
        | FieldValue::Numeric(None)
        | FieldValue::Float(None)
        | FieldValue::Logical(None)
        | FieldValue::Date(None) => AttributeValue::Null,
        other => AttributeValue::Text(format!("{other:?}")),
    }
}

fn text_value(text: &str) -> AttributeValue {
    let trimmed = text.trim_end();
    if trimmed.is_empty() {
        AttributeValue::Null
    } else {
        AttributeValue::Text(trimmed.to_owned())
    }
}
