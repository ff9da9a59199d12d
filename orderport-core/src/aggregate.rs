//! Grouping of raw line-item rows into order aggregates.
//!
//! Rows are keyed by an identity derived from the customer email. The first
//! row seen for an identity supplies every order-level field; later rows only
//! contribute line items.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

use crate::config::OrderDefaults;
use crate::record::RawRecord;

/// A single product line within an order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineItem {
    pub title: String,
    pub sku: String,
    pub price: f64,
    /// `None` when the source quantity was not an integer.
    pub quantity: Option<i64>,
}

/// The order-level view of every row sharing one identity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderAggregate {
    pub order_name: String,
    /// Reserved for skipping orders already imported by an earlier run.
    /// Nothing sets it yet.
    pub imported: bool,
    pub email: String,
    pub phone: String,
    pub billing_name: String,
    pub billing_company: String,
    pub billing_address1: String,
    pub billing_address2: Option<String>,
    pub billing_city: String,
    pub billing_zip: String,
    pub billing_province: Option<String>,
    pub billing_country: String,
    pub line_items: Vec<LineItem>,
    pub shipping_method: String,
    pub tags: String,
    pub note_attributes: Option<String>,
}

impl OrderAggregate {
    pub fn has_invalid_quantity(&self) -> bool {
        self.line_items.iter().any(|item| item.quantity.is_none())
    }
}

/// A malformed field noticed while aggregating. Never fatal.
#[derive(Debug, Clone, PartialEq)]
pub enum DataQualityIssue {
    /// The row has no email and therefore no identity; it was skipped.
    MissingEmail { row: usize },
    /// The email has no letters or digits, so unrelated customers may share
    /// this identity.
    DegenerateIdentity { row: usize, email: String },
    /// The line item quantity is not an integer.
    InvalidQuantity {
        row: usize,
        order_name: String,
        raw: String,
    },
}

impl fmt::Display for DataQualityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataQualityIssue::MissingEmail { row } => {
                write!(f, "row {row}: missing email, record skipped")
            }
            DataQualityIssue::DegenerateIdentity { row, email } => {
                write!(f, "row {row}: email '{email}' yields a degenerate order identity")
            }
            DataQualityIssue::InvalidQuantity {
                row,
                order_name,
                raw,
            } => write!(
                f,
                "row {row}: order '{order_name}' has non-integer quantity '{raw}'"
            ),
        }
    }
}

/// Derive the order identity key: every character outside `[A-Za-z0-9_]`
/// becomes `_`.
pub fn order_identity(email: &str) -> String {
    email
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Keep a province code only when it is exactly two characters.
pub fn normalize_province(province: Option<&str>) -> Option<String> {
    province
        .filter(|p| p.chars().count() == 2)
        .map(str::to_string)
}

/// Parse the leading integer of `raw`: optional leading whitespace, an
/// optional sign, then digits. Anything after the digits is ignored, so
/// `"2.5"` is 2 and `"3 units"` is 3. No digits at all yields `None`.
pub fn parse_quantity(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 {
        return None;
    }
    let magnitude: i64 = rest[..digits_len].parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

/// Incremental aggregator. Keys keep their first-seen order.
pub struct OrderAggregator {
    tag: String,
    line_item_price: f64,
    orders: Vec<OrderAggregate>,
    index: HashMap<String, usize>,
    issues: Vec<DataQualityIssue>,
    rows: usize,
}

impl OrderAggregator {
    pub fn new(defaults: &OrderDefaults) -> Self {
        Self {
            tag: defaults.tag.clone(),
            line_item_price: defaults.line_item_price,
            orders: Vec::new(),
            index: HashMap::new(),
            issues: Vec::new(),
            rows: 0,
        }
    }

    /// Fold one record into its order.
    pub fn push(&mut self, record: RawRecord) {
        self.rows += 1;
        let row = self.rows;

        if record.email.is_empty() {
            self.issues.push(DataQualityIssue::MissingEmail { row });
            return;
        }

        let order_name = order_identity(&record.email);
        let quantity = parse_quantity(&record.lineitem_quantity);
        if quantity.is_none() {
            self.issues.push(DataQualityIssue::InvalidQuantity {
                row,
                order_name: order_name.clone(),
                raw: record.lineitem_quantity.clone(),
            });
        }
        let item = LineItem {
            title: record.lineitem_title.clone(),
            sku: record.lineitem_sku.clone(),
            price: self.line_item_price,
            quantity,
        };

        if let Some(&position) = self.index.get(&order_name) {
            self.orders[position].line_items.push(item);
            return;
        }

        if !record.email.chars().any(|c| c.is_ascii_alphanumeric()) {
            self.issues.push(DataQualityIssue::DegenerateIdentity {
                row,
                email: record.email.clone(),
            });
        }

        self.index.insert(order_name.clone(), self.orders.len());
        self.orders.push(OrderAggregate {
            order_name,
            imported: false,
            billing_province: normalize_province(record.billing_province.as_deref()),
            email: record.email,
            phone: record.phone,
            billing_name: record.billing_name,
            billing_company: record.company,
            billing_address1: record.billing_address1,
            billing_address2: record.billing_address2,
            billing_city: record.billing_city,
            billing_zip: record.billing_zip,
            billing_country: record.billing_country,
            line_items: vec![item],
            shipping_method: record.shipping_method,
            tags: self.tag.clone(),
            note_attributes: record.note_attributes,
        });
    }

    pub fn issues(&self) -> &[DataQualityIssue] {
        &self.issues
    }

    /// Number of records pushed so far, including skipped ones.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// The orders not yet imported, in first-seen order.
    pub fn finish(self) -> Vec<OrderAggregate> {
        self.orders
            .into_iter()
            .filter(|order| !order.imported)
            .collect()
    }
}

/// Group `records` into orders. Data-quality issues are logged, never raised.
pub fn aggregate<I>(records: I, defaults: &OrderDefaults) -> Vec<OrderAggregate>
where
    I: IntoIterator<Item = RawRecord>,
{
    let mut aggregator = OrderAggregator::new(defaults);
    for record in records {
        aggregator.push(record);
    }
    for issue in aggregator.issues() {
        tracing::warn!(%issue, "Data quality issue");
    }
    let rows = aggregator.rows();
    let orders = aggregator.finish();
    tracing::debug!(rows, orders = orders.len(), "Aggregated records into orders");
    orders
}
