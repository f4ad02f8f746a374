pub mod commands;
pub mod utils;

use anyhow::Context;
use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::services::{ProductService, SalesService, UserService};
use crate::sheets::{self, Workbook};

#[derive(Parser)]
#[command(name = "stand")]
#[command(about = "Coffee stand operator tools: users, products, sales and sheet setup")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Print the Argon2 hash of a password, for pasting into the Users tab")]
    HashPassword {
        #[arg(long, env = "STAND_HASH_PASSWORD", hide_env_values = true, help = "Plaintext password")]
        password: String,
    },

    #[command(about = "Write the header row on every tab")]
    InitSheets,

    #[command(about = "Staff accounts")]
    User {
        #[command(subcommand)]
        cmd: commands::user::UserCommands,
    },

    #[command(about = "Products on the menu")]
    Product {
        #[command(subcommand)]
        cmd: commands::product::ProductCommands,
    },

    #[command(about = "Sales history")]
    Sales {
        #[command(subcommand)]
        cmd: commands::sales::SalesCommands,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

/// Services over the configured spreadsheet
pub struct Stand {
    pub workbook: Workbook,
    pub users: UserService,
    pub products: ProductService,
    pub sales: SalesService,
}

impl Stand {
    pub fn open(config: &AppConfig) -> anyhow::Result<Self> {
        let store = sheets::connect(&config.sheets).context("failed to open spreadsheet")?;
        let workbook = Workbook::new(store, &config.sheets);

        Ok(Self {
            users: UserService::new(workbook.users.clone()),
            products: ProductService::new(workbook.products.clone(), workbook.sales.clone()),
            sales: SalesService::new(workbook.products.clone(), workbook.sales.clone()),
            workbook,
        })
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::HashPassword { password } => commands::sheets::hash_password(&password, output_format),
        Commands::InitSheets => commands::sheets::init(&open()?, output_format).await,
        Commands::User { cmd } => commands::user::handle(cmd, &open()?, output_format).await,
        Commands::Product { cmd } => commands::product::handle(cmd, &open()?, output_format).await,
        Commands::Sales { cmd } => commands::sales::handle(cmd, &open()?, output_format).await,
    }
}

fn open() -> anyhow::Result<Stand> {
    Stand::open(crate::config::config())
}
