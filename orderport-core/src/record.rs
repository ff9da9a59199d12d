//! The raw line-item record shared by every source.
//!
//! Sources disagree on value types (a CSV cell is always text, a JSON API may
//! send `2` or `"2"`), so every value is coerced to text before it lands in a
//! [`RawRecord`]. Typed interpretation happens later, in the aggregator.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One line-item row, with the order-level fields duplicated on every row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawRecord {
    pub email: String,
    pub phone: String,
    pub billing_name: String,
    pub company: String,
    pub billing_address1: String,
    pub billing_address2: Option<String>,
    pub billing_city: String,
    pub billing_zip: String,
    pub billing_province: Option<String>,
    pub billing_country: String,
    pub lineitem_title: String,
    pub lineitem_sku: String,
    pub lineitem_quantity: String,
    pub shipping_method: String,
    pub note_attributes: Option<String>,
}

impl RawRecord {
    /// Build a record from `(field name, value)` pairs.
    ///
    /// Names are matched case-sensitively; unknown names are ignored. Empty
    /// values count as absent for the optional fields.
    pub fn from_fields<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, Option<String>)>,
        K: AsRef<str>,
    {
        let mut record = RawRecord::default();
        for (name, value) in fields {
            let optional = value.clone().filter(|v| !v.is_empty());
            let text = value.unwrap_or_default();
            match name.as_ref() {
                "email" => record.email = text,
                "phone" => record.phone = text,
                "billing_name" => record.billing_name = text,
                "company" => record.company = text,
                "billing_address1" => record.billing_address1 = text,
                "billing_address2" => record.billing_address2 = optional,
                "billing_city" => record.billing_city = text,
                "billing_zip" => record.billing_zip = text,
                "billing_province" => record.billing_province = optional,
                "billing_country" => record.billing_country = text,
                "lineitem_title" => record.lineitem_title = text,
                "lineitem_sku" => record.lineitem_sku = text,
                "lineitem_quantity" => record.lineitem_quantity = text,
                "shipping_method" => record.shipping_method = text,
                "note_attributes" => record.note_attributes = optional,
                _ => {}
            }
        }
        record
    }

    /// Build a record from one element of a JSON API response.
    pub fn from_json_object(object: &Map<String, Value>) -> Self {
        Self::from_fields(
            object
                .iter()
                .map(|(key, value)| (key.as_str(), coerce_json_value(value))),
        )
    }
}

/// Render a JSON value as field text. `null` is absent; nested arrays and
/// objects keep their compact JSON form.
pub fn coerce_json_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
    }
}
