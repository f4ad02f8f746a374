pub mod client;
pub mod memory;
pub mod models;
pub mod range;
pub mod store;
pub mod table;

use std::sync::Arc;

use tracing::info;

pub use client::SheetsClient;
pub use memory::MemoryStore;
pub use models::{Product, SaleLine, User};
pub use store::{SheetStore, SheetsError};
pub use table::{Located, SheetRow, Table};

use crate::config::{SheetsBackend, SheetsConfig};

/// Opens the configured backend.
pub fn connect(config: &SheetsConfig) -> Result<Arc<dyn SheetStore>, SheetsError> {
    match config.backend {
        SheetsBackend::Google => {
            info!("Using spreadsheet {}", config.spreadsheet_id);
            Ok(Arc::new(SheetsClient::new(config)?))
        }
        SheetsBackend::Memory => {
            info!("Using in-memory spreadsheet; data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

/// The three tabs the stand keeps, over one store.
#[derive(Clone)]
pub struct Workbook {
    pub store: Arc<dyn SheetStore>,
    pub products: Table<Product>,
    pub users: Table<User>,
    pub sales: Table<SaleLine>,
}

impl Workbook {
    pub fn new(store: Arc<dyn SheetStore>, config: &SheetsConfig) -> Self {
        Self {
            products: Table::new(config.products_tab.clone(), store.clone()),
            users: Table::new(config.users_tab.clone(), store.clone()),
            sales: Table::new(config.sales_tab.clone(), store.clone()),
            store,
        }
    }

    pub async fn ensure_headers(&self) -> Result<(), SheetsError> {
        for (tab, written) in [
            (self.products.tab(), self.products.ensure_header().await?),
            (self.users.tab(), self.users.ensure_header().await?),
            (self.sales.tab(), self.sales.ensure_header().await?),
        ] {
            if written {
                info!("Wrote header row for {}", tab);
            }
        }
        Ok(())
    }

    pub async fn health_check(&self) -> Result<(), SheetsError> {
        self.store.ping().await
    }
}
