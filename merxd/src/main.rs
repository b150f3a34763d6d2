//! Merx Daemon
//!
//! REST backend for users, products, and orders.
//!
//! # Usage
//!
//! ```bash
//! # Start against PostgreSQL
//! cargo run -p merxd --features postgres
//!
//! # Development mode over the in-memory store
//! cargo run -p merxd
//!
//! # Database management (requires the postgres feature)
//! cargo run -p merxd --features postgres -- db migrate
//! cargo run -p merxd --features postgres -- db status
//! cargo run -p merxd --features postgres -- db init --admin-email admin@example.com
//! ```
//!
//! # Environment Variables
//!
//! - `MERX_ENV`: Environment (test, development, production)
//! - `MERX_API_HOST`: API host (default: 0.0.0.0)
//! - `MERX_API_PORT`: API port (default: 8080)
//! - `DATABASE_URL`: PostgreSQL connection URL (required with postgres)
//! - `MERX_DB_MAX_CONNECTIONS`: Pool size (default: 10)
//! - `MERX_PAGE_SIZE_DEFAULT`: Default page size (default: 20)
//! - `MERX_PAGE_SIZE_MAX`: Maximum page size (default: 100)

use merxd::config::Config;
use merxd::server;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("merxd=info".parse()?))
        .init();

    // Database subcommands bypass the server
    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 && args[1] == "db" {
        #[cfg(feature = "postgres")]
        return merxd::db::run_db_command(args).await;

        #[cfg(not(feature = "postgres"))]
        anyhow::bail!("db commands require building with --features postgres");
    }

    // Load configuration
    let config = Config::from_env()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.environment,
        api_host = %config.api.host,
        api_port = config.api.port,
        "Merx Daemon"
    );

    server::run(config).await
}
