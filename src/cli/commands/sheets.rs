use serde_json::json;

use crate::auth::hash_password as argon2_hash;
use crate::cli::utils::output_success;
use crate::cli::{OutputFormat, Stand};

pub fn hash_password(password: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    let hash = argon2_hash(password)?;

    match output_format {
        OutputFormat::Json => output_success(output_format, "Password hashed", Some(json!({ "hash": hash }))),
        OutputFormat::Text => {
            println!("{}", hash);
            Ok(())
        }
    }
}

pub async fn init(stand: &Stand, output_format: OutputFormat) -> anyhow::Result<()> {
    stand.workbook.health_check().await?;
    stand.workbook.ensure_headers().await?;

    let tabs = [
        stand.workbook.products.tab(),
        stand.workbook.users.tab(),
        stand.workbook.sales.tab(),
    ];
    output_success(
        output_format,
        &format!("Header rows in place on {}", tabs.join(", ")),
        Some(json!({ "tabs": tabs })),
    )
}
