//! Database CLI subcommands for merxd.
//!
//! Provides `db migrate`, `db status`, and `db init` commands.

use anyhow::{anyhow, Result};
use std::env;
use tracing::info;

use merx_db::{init_minimal_data, migrate, status};

/// Run database CLI subcommands.
///
/// Supported commands:
/// - `merxd db migrate` - Run pending migrations
/// - `merxd db status` - Check migration status
/// - `merxd db init [--admin-email EMAIL]` - Seed the admin user
pub async fn run_db_command(args: Vec<String>) -> Result<()> {
    if args.len() < 3 {
        return Err(anyhow!("Usage: merxd db <migrate|status|init> [options]"));
    }

    let database_url = env::var("DATABASE_URL")
        .map_err(|_| anyhow!("DATABASE_URL environment variable is required for db commands"))?;

    let pool = sqlx::PgPool::connect(&database_url).await?;

    match args[2].as_str() {
        "migrate" => {
            migrate(&pool).await?;
        },
        "status" => {
            status(&pool).await?;
        },
        "init" => {
            let mut admin_email = None;

            let mut i = 3;
            while i < args.len() {
                match args[i].as_str() {
                    "--admin-email" => {
                        if i + 1 < args.len() {
                            admin_email = Some(args[i + 1].clone());
                            i += 2;
                        } else {
                            return Err(anyhow!("--admin-email requires a value"));
                        }
                    },
                    _ => {
                        return Err(anyhow!("Unknown option: {}", args[i]));
                    },
                }
            }

            let user_id = init_minimal_data(&pool, admin_email).await?;
            info!("Initialized: admin user_id={}", user_id);
        },
        _ => {
            return Err(anyhow!(
                "Unknown db command: {}. Use migrate, status, or init",
                args[2]
            ));
        },
    }

    Ok(())
}
