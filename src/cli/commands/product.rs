use clap::Subcommand;

use crate::cli::utils::{output_empty_collection, output_json};
use crate::cli::{OutputFormat, Stand};

#[derive(Subcommand)]
pub enum ProductCommands {
    #[command(about = "List products")]
    List {
        #[arg(long, help = "Include inactive products")]
        all: bool,
    },
}

pub async fn handle(cmd: ProductCommands, stand: &Stand, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        ProductCommands::List { all } => {
            let products = stand.products.list(all).await?;
            if products.is_empty() {
                return output_empty_collection(output_format, "products", "No products");
            }

            match output_format {
                OutputFormat::Json => output_json("products", &products),
                OutputFormat::Text => {
                    println!("{:<5} {:<25} {:<12} {:>8} {:>6} {}", "ID", "NAME", "CATEGORY", "PRICE", "STOCK", "ACTIVE");
                    println!("{}", "-".repeat(70));
                    for product in &products {
                        println!(
                            "{:<5} {:<25} {:<12} {:>8} {:>6} {}",
                            product.id,
                            product.name,
                            product.category,
                            product.price.round_dp(2),
                            product.stock,
                            if product.active { "yes" } else { "no" }
                        );
                    }
                    Ok(())
                }
            }
        }
    }
}
