use std::collections::{HashMap, HashSet};

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

use super::ServiceError;
use crate::sheets::{Located, Product, SaleLine, Table};

#[derive(Debug, Clone, Deserialize)]
pub struct OrderItem {
    pub product_id: u32,
    pub quantity: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct Receipt {
    pub order_id: Uuid,
    pub sold_at: DateTime<Utc>,
    pub username: String,
    pub lines: Vec<SaleLine>,
    pub item_count: u32,
    pub total: Decimal,
}

/// Filters for history and summary. Dates are inclusive, in UTC.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SalesQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub username: Option<String>,
    pub order_id: Option<Uuid>,
    pub limit: Option<usize>,
}

impl SalesQuery {
    fn accepts(&self, line: &SaleLine) -> bool {
        let day = line.sold_at.date_naive();
        if self.from.is_some_and(|from| day < from) {
            return false;
        }
        if self.to.is_some_and(|to| day > to) {
            return false;
        }
        if let Some(username) = &self.username {
            if !line.username.trim().eq_ignore_ascii_case(username.trim()) {
                return false;
            }
        }
        if let Some(order_id) = self.order_id {
            if line.order_id != order_id {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductTotal {
    pub product_id: u32,
    pub product_name: String,
    pub quantity: u32,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct SalesSummary {
    pub order_count: usize,
    pub item_count: u32,
    pub revenue: Decimal,
    pub products: Vec<ProductTotal>,
}

#[derive(Clone)]
pub struct SalesService {
    products: Table<Product>,
    sales: Table<SaleLine>,
}

impl SalesService {
    pub fn new(products: Table<Product>, sales: Table<SaleLine>) -> Self {
        Self { products, sales }
    }

    /// Validates every line against one snapshot of the Products tab, then
    /// decrements stock and records the lines under a new order id.
    ///
    /// Stock is written before the sale lines. If the append fails the stock
    /// is already gone; the error is logged with the order id so the lines can
    /// be entered by hand.
    pub async fn place_order(&self, username: &str, items: &[OrderItem]) -> Result<Receipt, ServiceError> {
        let quantities = merge_items(items)?;
        let catalog = self.products.all().await?;

        let too_large = || ServiceError::Validation("Order total is too large".to_string());
        let mut picked: Vec<(Located<Product>, u32, Decimal)> = Vec::with_capacity(quantities.len());
        let mut total = Decimal::ZERO;
        let mut item_count = 0u32;
        for (product_id, quantity) in quantities {
            let located = catalog
                .iter()
                .find(|l| l.record.id == product_id)
                .ok_or_else(|| ServiceError::NotFound(format!("Product {}", product_id)))?;
            let product = &located.record;

            if !product.active {
                return Err(ServiceError::Validation(format!("'{}' is not on sale", product.name)));
            }
            if product.stock < quantity {
                return Err(ServiceError::InsufficientStock {
                    product: product.name.clone(),
                    available: product.stock,
                    requested: quantity,
                });
            }

            // All arithmetic happens here, before any stock is written
            let line_total = product.price.checked_mul(Decimal::from(quantity)).ok_or_else(too_large)?;
            total = total.checked_add(line_total).ok_or_else(too_large)?;
            item_count = item_count.checked_add(quantity).ok_or_else(too_large)?;
            picked.push((located.clone(), quantity, line_total));
        }

        let order_id = Uuid::new_v4();
        let sold_at = Utc::now();
        let mut lines = Vec::with_capacity(picked.len());

        for (Located { row, mut record }, quantity, line_total) in picked {
            record.stock -= quantity;
            self.products.update(row, &record).await?;

            lines.push(SaleLine {
                order_id,
                sold_at,
                username: username.to_string(),
                product_id: record.id,
                product_name: record.name.clone(),
                quantity,
                unit_price: record.price,
                line_total,
            });
        }

        if let Err(e) = self.sales.insert_many(&lines).await {
            error!("Stock already taken for order {} but sale lines were not recorded: {}", order_id, e);
            return Err(e.into());
        }

        info!("Order {} by '{}': {} items, total {}", order_id, username, item_count, total);

        Ok(Receipt {
            order_id,
            sold_at,
            username: username.to_string(),
            lines,
            item_count,
            total,
        })
    }

    /// Matching sale lines, newest first.
    pub async fn history(&self, query: &SalesQuery) -> Result<Vec<SaleLine>, ServiceError> {
        let mut lines: Vec<SaleLine> = self
            .sales
            .all()
            .await?
            .into_iter()
            .map(|l| l.record)
            .filter(|line| query.accepts(line))
            .collect();

        // Stable, so the lines of one order keep their sheet order
        lines.sort_by(|a, b| b.sold_at.cmp(&a.sold_at));
        if let Some(limit) = query.limit {
            lines.truncate(limit);
        }
        Ok(lines)
    }

    /// Totals over every matching line. `limit` is ignored.
    pub async fn summary(&self, query: &SalesQuery) -> Result<SalesSummary, ServiceError> {
        let query = SalesQuery {
            limit: None,
            ..query.clone()
        };
        let lines = self.history(&query).await?;
        Ok(summarize(&lines))
    }
}

fn merge_items(items: &[OrderItem]) -> Result<Vec<(u32, u32)>, ServiceError> {
    if items.is_empty() {
        return Err(ServiceError::Validation("Order has no items".to_string()));
    }

    let mut merged: Vec<(u32, u32)> = Vec::with_capacity(items.len());
    for item in items {
        if item.quantity == 0 {
            return Err(ServiceError::Validation(format!(
                "Quantity for product {} must be at least 1",
                item.product_id
            )));
        }
        match merged.iter_mut().find(|(id, _)| *id == item.product_id) {
            Some((_, quantity)) => {
                *quantity = quantity
                    .checked_add(item.quantity)
                    .ok_or_else(|| ServiceError::Validation("Quantity is too large".to_string()))?;
            }
            None => merged.push((item.product_id, item.quantity)),
        }
    }
    Ok(merged)
}

fn summarize(lines: &[SaleLine]) -> SalesSummary {
    let mut orders = HashSet::new();
    let mut per_product: HashMap<u32, ProductTotal> = HashMap::new();
    let mut item_count = 0u32;
    let mut revenue = Decimal::ZERO;

    for line in lines {
        orders.insert(line.order_id);
        item_count = item_count.saturating_add(line.quantity);
        revenue = revenue.saturating_add(line.line_total);

        let entry = per_product.entry(line.product_id).or_insert_with(|| ProductTotal {
            product_id: line.product_id,
            product_name: line.product_name.clone(),
            quantity: 0,
            revenue: Decimal::ZERO,
        });
        entry.quantity = entry.quantity.saturating_add(line.quantity);
        entry.revenue = entry.revenue.saturating_add(line.line_total);
    }

    let mut products: Vec<ProductTotal> = per_product.into_values().collect();
    products.sort_by(|a, b| b.revenue.cmp(&a.revenue).then(a.product_id.cmp(&b.product_id)));

    SalesSummary {
        order_count: orders.len(),
        item_count,
        revenue,
        products,
    }
}
