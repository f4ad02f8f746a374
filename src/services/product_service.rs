use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;

use super::ServiceError;
use crate::sheets::{Located, Product, SaleLine, Table};

#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub category: String,
    pub price: Decimal,
    #[serde(default)]
    pub stock: u32,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub category: Option<String>,
    pub price: Option<Decimal>,
    pub stock: Option<u32>,
    pub active: Option<bool>,
}

#[derive(Clone)]
pub struct ProductService {
    products: Table<Product>,
    sales: Table<SaleLine>,
}

/// Largest accepted unit price.
pub const MAX_PRICE: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 2);

impl ProductService {
    pub fn new(products: Table<Product>, sales: Table<SaleLine>) -> Self {
        Self { products, sales }
    }

    /// One past the highest id seen on either tab, so a deleted product's id
    /// is never handed out again while its sales remain.
    async fn next_id(&self, existing: &[Located<Product>]) -> Result<u32, ServiceError> {
        let sold = self.sales.all().await?;
        let highest = existing
            .iter()
            .map(|l| l.record.id)
            .chain(sold.iter().map(|l| l.record.product_id))
            .max()
            .unwrap_or(0);
        highest
            .checked_add(1)
            .ok_or_else(|| ServiceError::Validation("No product ids left".to_string()))
    }

    async fn locate(&self, id: u32) -> Result<Located<Product>, ServiceError> {
        self.products
            .find(|product| product.id == id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {}", id)))
    }

    pub async fn list(&self, include_inactive: bool) -> Result<Vec<Product>, ServiceError> {
        Ok(self
            .products
            .all()
            .await?
            .into_iter()
            .map(|l| l.record)
            .filter(|product| include_inactive || product.active)
            .collect())
    }

    pub async fn get(&self, id: u32) -> Result<Product, ServiceError> {
        Ok(self.locate(id).await?.record)
    }

    pub async fn create(&self, new_product: NewProduct) -> Result<Product, ServiceError> {
        let name = validate_name(&new_product.name)?;
        validate_price(new_product.price)?;

        let existing = self.products.all().await?;
        if existing.iter().any(|l| l.record.name.eq_ignore_ascii_case(&name)) {
            return Err(ServiceError::AlreadyExists(format!("Product '{}'", name)));
        }
        let id = self.next_id(&existing).await?;

        let product = Product {
            id,
            name,
            category: new_product.category.trim().to_string(),
            price: new_product.price,
            stock: new_product.stock,
            active: new_product.active,
        };
        self.products.insert(&product).await?;

        info!("Created product {} '{}'", product.id, product.name);
        Ok(product)
    }

    pub async fn update(&self, id: u32, update: ProductUpdate) -> Result<Product, ServiceError> {
        let Located { row, mut record } = self.locate(id).await?;

        if let Some(name) = update.name {
            record.name = validate_name(&name)?;
        }
        if let Some(category) = update.category {
            record.category = category.trim().to_string();
        }
        if let Some(price) = update.price {
            validate_price(price)?;
            record.price = price;
        }
        if let Some(stock) = update.stock {
            record.stock = stock;
        }
        if let Some(active) = update.active {
            record.active = active;
        }

        self.products.update(row, &record).await?;
        Ok(record)
    }

    pub async fn delete(&self, id: u32) -> Result<(), ServiceError> {
        let Located { row, record } = self.locate(id).await?;
        self.products.delete(row).await?;

        info!("Deleted product {} '{}'", record.id, record.name);
        Ok(())
    }

    /// Restock (positive) or correction (negative). Stock never goes below zero.
    pub async fn adjust_stock(&self, id: u32, delta: i64) -> Result<Product, ServiceError> {
        let Located { row, mut record } = self.locate(id).await?;

        let stock = i64::from(record.stock)
            .checked_add(delta)
            .ok_or_else(|| ServiceError::Validation(format!("Stock for '{}' is too large", record.name)))?;
        if stock < 0 {
            return Err(ServiceError::InsufficientStock {
                product: record.name,
                available: record.stock,
                requested: delta.unsigned_abs().min(u64::from(u32::MAX)) as u32,
            });
        }
        record.stock = u32::try_from(stock)
            .map_err(|_| ServiceError::Validation(format!("Stock for '{}' is too large", record.name)))?;

        self.products.update(row, &record).await?;
        info!("Stock for {} '{}' adjusted by {} to {}", record.id, record.name, delta, record.stock);
        Ok(record)
    }
}

fn validate_name(name: &str) -> Result<String, ServiceError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ServiceError::Validation("Product name cannot be empty".to_string()));
    }
    Ok(name.to_string())
}

fn validate_price(price: Decimal) -> Result<(), ServiceError> {
    if price.is_sign_negative() {
        return Err(ServiceError::Validation("Price cannot be negative".to_string()));
    }
    if price > MAX_PRICE {
        return Err(ServiceError::Validation(format!("Price cannot exceed {}", MAX_PRICE)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestStand;

    #[tokio::test]
    async fn ids_continue_after_the_highest_existing_id() {
        let stand = TestStand::new().await;
        stand.seed_product_row(&["7", "Cold Brew", "Coffee", "4.00", "3"]).await;

        let product = stand.create_product("Latte", "4.25", 10).await;
        assert_eq!(product.id, 8);
        assert_eq!(stand.products.get(8).await.unwrap().name, "Latte");
    }

    #[tokio::test]
    async fn first_product_gets_id_one() {
        let stand = TestStand::new().await;
        assert_eq!(stand.create_product("Drip", "2.50", 5).await.id, 1);
    }

    #[tokio::test]
    async fn inactive_products_are_hidden_by_default() {
        let stand = TestStand::new().await;
        let product = stand.create_product("Pumpkin Spice", "5.00", 2).await;
        stand
            .products
            .update(
                product.id,
                ProductUpdate {
                    active: Some(false),
                    ..ProductUpdate::default()
                },
            )
            .await
            .unwrap();

        assert!(stand.products.list(false).await.unwrap().is_empty());
        assert_eq!(stand.products.list(true).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn rejects_negative_price_and_duplicate_names() {
        let stand = TestStand::new().await;
        stand.create_product("Mocha", "4.50", 1).await;

        let negative = NewProduct {
            name: "Refund".to_string(),
            category: String::new(),
            price: Decimal::new(-100, 2),
            stock: 0,
            active: true,
        };
        assert!(matches!(stand.products.create(negative).await, Err(ServiceError::Validation(_))));

        let duplicate = NewProduct {
            name: "mocha".to_string(),
            category: String::new(),
            price: Decimal::new(450, 2),
            stock: 0,
            active: true,
        };
        assert!(matches!(stand.products.create(duplicate).await, Err(ServiceError::AlreadyExists(_))));

        let priceless = NewProduct {
            name: "Gold Leaf Latte".to_string(),
            category: String::new(),
            price: Decimal::MAX,
            stock: 1,
            active: true,
        };
        assert!(matches!(stand.products.create(priceless).await, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn ids_of_deleted_products_with_sales_are_not_reused() {
        let stand = TestStand::new().await;
        let first = stand.create_product("Cortado", "3.50", 4).await;
        let item = crate::services::OrderItem {
            product_id: first.id,
            quantity: 1,
        };
        stand.sales.place_order("sam", &[item]).await.unwrap();
        stand.products.delete(first.id).await.unwrap();

        let second = stand.create_product("Flat White", "4.00", 4).await;
        assert_eq!(second.id, first.id + 1);
    }

    #[tokio::test]
    async fn adjust_stock_never_goes_negative() {
        let stand = TestStand::new().await;
        let product = stand.create_product("Americano", "3.00", 2).await;

        assert_eq!(stand.products.adjust_stock(product.id, 5).await.unwrap().stock, 7);
        assert!(matches!(
            stand.products.adjust_stock(product.id, -8).await,
            Err(ServiceError::InsufficientStock { available: 7, requested: 8, .. })
        ));
        assert_eq!(stand.products.adjust_stock(product.id, -7).await.unwrap().stock, 0);
        assert!(matches!(
            stand.products.adjust_stock(product.id, i64::MAX).await,
            Err(ServiceError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn deleted_product_is_gone() {
        let stand = TestStand::new().await;
        let product = stand.create_product("Chai", "3.75", 4).await;
        stand.products.delete(product.id).await.unwrap();
        assert!(matches!(stand.products.get(product.id).await, Err(ServiceError::NotFound(_))));
    }
}
