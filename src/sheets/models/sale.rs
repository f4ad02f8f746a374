use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{cell, format_timestamp, parse_decimal, parse_timestamp, parse_u32, required};
use crate::sheets::table::SheetRow;

/// One line of an order. An order is every line sharing an `order_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleLine {
    pub order_id: Uuid,
    pub sold_at: DateTime<Utc>,
    pub username: String,
    pub product_id: u32,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

impl SheetRow for SaleLine {
    const COLUMNS: &'static [&'static str] = &[
        "order_id",
        "sold_at",
        "username",
        "product_id",
        "product_name",
        "quantity",
        "unit_price",
        "line_total",
    ];

    fn from_cells(cells: &[String]) -> Result<Self, String> {
        let order_id = required(cells, 0, "order_id")?;
        let quantity = parse_u32(required(cells, 5, "quantity")?, "quantity")?;
        let unit_price = parse_decimal(required(cells, 6, "unit_price")?, "unit_price")?;
        let line_total = match cell(cells, 7) {
            "" => unit_price * Decimal::from(quantity),
            value => parse_decimal(value, "line_total")?,
        };

        Ok(Self {
            order_id: Uuid::parse_str(order_id).map_err(|_| format!("invalid order_id '{}'", order_id))?,
            sold_at: parse_timestamp(required(cells, 1, "sold_at")?, "sold_at")?,
            username: cell(cells, 2).to_string(),
            product_id: parse_u32(required(cells, 3, "product_id")?, "product_id")?,
            product_name: cell(cells, 4).to_string(),
            quantity,
            unit_price,
            line_total,
        })
    }

    fn to_cells(&self) -> Vec<String> {
        vec![
            self.order_id.to_string(),
            format_timestamp(&self.sold_at),
            self.username.clone(),
            self.product_id.to_string(),
            self.product_name.clone(),
            self.quantity.to_string(),
            self.unit_price.to_string(),
            self.line_total.to_string(),
        ]
    }
}
