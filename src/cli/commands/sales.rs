use chrono::NaiveDate;
use clap::Subcommand;

use crate::cli::utils::output_json;
use crate::cli::{OutputFormat, Stand};
use crate::services::SalesQuery;

#[derive(Subcommand)]
pub enum SalesCommands {
    #[command(about = "Totals per product over a date range")]
    Summary {
        #[arg(long, help = "First day, YYYY-MM-DD (inclusive)")]
        from: Option<NaiveDate>,

        #[arg(long, help = "Last day, YYYY-MM-DD (inclusive)")]
        to: Option<NaiveDate>,

        #[arg(long, help = "Only sales rung up by this user")]
        username: Option<String>,
    },
}

pub async fn handle(cmd: SalesCommands, stand: &Stand, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        SalesCommands::Summary { from, to, username } => {
            let query = SalesQuery {
                from,
                to,
                username,
                ..SalesQuery::default()
            };
            let summary = stand.sales.summary(&query).await?;

            match output_format {
                OutputFormat::Json => output_json("summary", &summary),
                OutputFormat::Text => {
                    println!(
                        "{} orders, {} items, revenue {}",
                        summary.order_count,
                        summary.item_count,
                        summary.revenue.round_dp(2)
                    );
                    if summary.products.is_empty() {
                        return Ok(());
                    }
                    println!();
                    println!("{:<5} {:<25} {:>6} {:>10}", "ID", "PRODUCT", "QTY", "REVENUE");
                    println!("{}", "-".repeat(50));
                    for line in &summary.products {
                        println!(
                            "{:<5} {:<25} {:>6} {:>10}",
                            line.product_id,
                            line.product_name,
                            line.quantity,
                            line.revenue.round_dp(2)
                        );
                    }
                    Ok(())
                }
            }
        }
    }
}
