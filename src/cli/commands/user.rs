use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::{output_empty_collection, output_json, output_success};
use crate::cli::{OutputFormat, Stand};
use crate::services::NewUser;
use crate::types::Role;

#[derive(Subcommand)]
pub enum UserCommands {
    #[command(about = "Add a user")]
    Add {
        #[arg(help = "Login name")]
        username: String,

        #[arg(long, default_value = "staff", help = "admin or staff")]
        role: Role,

        #[arg(long, help = "Name shown on receipts")]
        display_name: Option<String>,

        #[arg(long, env = "STAND_NEW_PASSWORD", hide_env_values = true, help = "Initial password")]
        password: String,
    },

    #[command(about = "List users")]
    List,
}

pub async fn handle(cmd: UserCommands, stand: &Stand, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        UserCommands::Add {
            username,
            role,
            display_name,
            password,
        } => {
            let user = stand
                .users
                .create(NewUser {
                    username,
                    password,
                    role,
                    display_name,
                })
                .await?;

            output_success(
                output_format,
                &format!("User '{}' created as {}", user.username, user.role),
                Some(json!({ "user": user })),
            )
        }
        UserCommands::List => {
            let users = stand.users.list().await?;
            if users.is_empty() {
                return output_empty_collection(output_format, "users", "No users");
            }

            match output_format {
                OutputFormat::Json => output_json("users", &users),
                OutputFormat::Text => {
                    println!("{:<20} {:<8} {:<25} {}", "USERNAME", "ROLE", "DISPLAY NAME", "CREATED");
                    println!("{}", "-".repeat(70));
                    for user in &users {
                        println!(
                            "{:<20} {:<8} {:<25} {}",
                            user.username,
                            user.role,
                            user.display_name,
                            user.created_at.format("%Y-%m-%d %H:%M")
                        );
                    }
                    Ok(())
                }
            }
        }
    }
}
