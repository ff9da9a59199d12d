//! Shopify Admin API order payloads.
//!
//! Maps an [`OrderAggregate`] onto the `POST /orders.json` request body and
//! parses the order returned on success.

use serde::{Deserialize, Serialize};

use crate::aggregate::OrderAggregate;
use crate::config::OrderDefaults;

/// Request body: `{"order": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateOrderRequest {
    pub order: OrderPayload,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderPayload {
    pub customer: Customer,
    pub billing_address: Address,
    pub shipping_address: Address,
    pub financial_status: String,
    /// Always serialized as `null` (unfulfilled).
    pub fulfillment_status: Option<String>,
    pub processing_method: String,
    pub send_fulfillment_receipt: bool,
    pub send_receipt: bool,
    pub line_items: Vec<LineItemPayload>,
    pub shipping_lines: Vec<ShippingLine>,
    pub tags: String,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Customer {
    pub name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Address {
    pub name: String,
    pub address1: String,
    pub address2: Option<String>,
    pub phone: String,
    pub city: String,
    pub zip: String,
    pub province_code: Option<String>,
    pub country_code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineItemPayload {
    pub title: String,
    pub sku: String,
    pub price: f64,
    pub quantity: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShippingLine {
    pub title: String,
    pub code: String,
    pub price: f64,
}

/// Map an aggregate onto the order-creation request.
pub fn build_order_request(order: &OrderAggregate, defaults: &OrderDefaults) -> CreateOrderRequest {
    let address = Address {
        name: order.billing_name.clone(),
        address1: order.billing_address1.clone(),
        address2: order.billing_address2.clone(),
        phone: order.phone.clone(),
        city: order.billing_city.clone(),
        zip: order.billing_zip.clone(),
        province_code: order.billing_province.clone(),
        country_code: order.billing_country.clone(),
    };

    let note = match &order.note_attributes {
        Some(attrs) => format!("{}{}", defaults.note_prefix, attrs),
        None => String::new(),
    };

    CreateOrderRequest {
        order: OrderPayload {
            customer: Customer {
                name: order.billing_name.clone(),
                email: order.email.clone(),
                phone: order.phone.clone(),
            },
            billing_address: address.clone(),
            shipping_address: address,
            financial_status: "paid".to_string(),
            fulfillment_status: None,
            processing_method: "manual".to_string(),
            send_fulfillment_receipt: false,
            send_receipt: false,
            line_items: order
                .line_items
                .iter()
                .map(|item| LineItemPayload {
                    title: item.title.clone(),
                    sku: item.sku.clone(),
                    price: defaults.line_item_price,
                    quantity: item.quantity,
                })
                .collect(),
            shipping_lines: vec![ShippingLine {
                title: order.shipping_method.clone(),
                code: order.shipping_method.clone(),
                price: defaults.shipping_price,
            }],
            tags: order.tags.clone(),
            note,
        },
    }
}

/// Success response body: `{"order": {"id": ..., "name": "#1001", ...}}`.
#[derive(Debug, Deserialize)]
pub struct CreateOrderResponse {
    pub order: CreatedOrder,
}

/// The platform's view of a newly created order.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CreatedOrder {
    #[serde(default)]
    pub id: Option<u64>,
    /// Empty when the platform omits it; the order was still created.
    #[serde(default)]
    pub name: String,
}
