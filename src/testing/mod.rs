use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::config::SheetsConfig;
use crate::services::{NewProduct, NewUser, ProductService, SalesService, UserService};
use crate::sheets::store::Rows;
use crate::sheets::{MemoryStore, Product, SheetStore, SheetsError, User, Workbook};
use crate::types::Role;

/// Services over a fresh in-memory workbook with header rows in place
pub struct TestStand {
    pub store: MemoryStore,
    pub workbook: Workbook,
    pub users: UserService,
    pub products: ProductService,
    pub sales: SalesService,
}

impl TestStand {
    pub async fn new() -> Self {
        let store = MemoryStore::new();
        let workbook = Workbook::new(Arc::new(store.clone()), &SheetsConfig::default());
        workbook.ensure_headers().await.expect("write headers");

        Self {
            users: UserService::new(workbook.users.clone()),
            products: ProductService::new(workbook.products.clone(), workbook.sales.clone()),
            sales: SalesService::new(workbook.products.clone(), workbook.sales.clone()),
            store,
            workbook,
        }
    }

    /// Appends raw cells, the way a hand-edited sheet would hold them
    async fn seed_row(&self, tab: &str, cells: &[&str]) {
        let row = cells.iter().map(|c| c.to_string()).collect();
        self.store
            .append(&format!("{}!A2:Z", tab), vec![row])
            .await
            .expect("seed row");
    }

    pub async fn seed_user_row(&self, cells: &[&str]) {
        self.seed_row(self.workbook.users.tab(), cells).await;
    }

    pub async fn seed_product_row(&self, cells: &[&str]) {
        self.seed_row(self.workbook.products.tab(), cells).await;
    }

    pub async fn seed_sale_row(&self, cells: &[&str]) {
        self.seed_row(self.workbook.sales.tab(), cells).await;
    }

    /// The same sheets behind a store that rejects every change
    pub fn read_only(&self) -> Arc<dyn SheetStore> {
        Arc::new(ReadOnlyStore(self.store.clone()))
    }

    pub async fn create_user(&self, username: &str, password: &str, role: Role) -> User {
        self.users
            .create(NewUser {
                username: username.to_string(),
                password: password.to_string(),
                role,
                display_name: None,
            })
            .await
            .expect("create user")
    }

    pub async fn create_product(&self, name: &str, price: &str, stock: u32) -> Product {
        self.products
            .create(NewProduct {
                name: name.to_string(),
                category: "Coffee".to_string(),
                price: Decimal::from_str(price).expect("price"),
                stock,
                active: true,
            })
            .await
            .expect("create product")
    }
}

struct ReadOnlyStore(MemoryStore);

fn rejected() -> SheetsError {
    SheetsError::Api {
        status: 403,
        message: "The caller does not have permission".to_string(),
    }
}

#[async_trait]
impl SheetStore for ReadOnlyStore {
    async fn read(&self, range: &str) -> Result<Rows, SheetsError> {
        self.0.read(range).await
    }

    async fn write(&self, _range: &str, _rows: Rows) -> Result<(), SheetsError> {
        Err(rejected())
    }

    async fn append(&self, _range: &str, _rows: Rows) -> Result<(), SheetsError> {
        Err(rejected())
    }

    async fn clear(&self, _range: &str) -> Result<(), SheetsError> {
        Err(rejected())
    }

    async fn ping(&self) -> Result<(), SheetsError> {
        self.0.ping().await
    }
}
