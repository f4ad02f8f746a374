use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{cell, parse_bool, parse_decimal, parse_u32, required};
use crate::sheets::table::SheetRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: u32,
    pub name: String,
    pub category: String,
    pub price: Decimal,
    pub stock: u32,
    pub active: bool,
}

impl SheetRow for Product {
    const COLUMNS: &'static [&'static str] = &["id", "name", "category", "price", "stock", "active"];

    fn from_cells(cells: &[String]) -> Result<Self, String> {
        Ok(Self {
            id: parse_u32(required(cells, 0, "id")?, "id")?,
            name: required(cells, 1, "name")?.to_string(),
            category: cell(cells, 2).to_string(),
            price: parse_decimal(required(cells, 3, "price")?, "price")?,
            stock: match cell(cells, 4) {
                "" => 0,
                value => parse_u32(value, "stock")?,
            },
            active: parse_bool(cell(cells, 5), true)?,
        })
    }

    fn to_cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.name.clone(),
            self.category.clone(),
            self.price.to_string(),
            self.stock.to_string(),
            if self.active { "TRUE" } else { "FALSE" }.to_string(),
        ]
    }
}
