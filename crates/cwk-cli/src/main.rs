use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "cwk")]
#[command(about = "Coursework catalog and progress CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Database commands
    Db {
        #[command(subcommand)]
        cmd: DbCmd,
    },

    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (base -> env -> local ...)
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Consistency checks over stored data
    Audit {
        #[command(subcommand)]
        cmd: AuditCmd,
    },

    /// Load sample data
    Seed {
        #[command(subcommand)]
        cmd: SeedCmd,
    },
}

#[derive(Subcommand)]
enum DbCmd {
    Status,
    /// Apply SQL migrations.
    Migrate,
}

#[derive(Subcommand)]
enum AuditCmd {
    /// Check that every course's units and every unit's lessons are ordered
    /// exactly 1..N. Exits non-zero when any set is not.
    Ordering,
}

#[derive(Subcommand)]
enum SeedCmd {
    /// Demo accounts, courses, units, lessons and enrollments.
    Demo,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let cli = Cli::parse();

    match cli.cmd {
        Commands::ConfigHash { paths } => {
            let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
            let loaded = cwk_config::load_layered_yaml(&path_refs)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }

        Commands::Db { cmd } => {
            let settings = commands::load_settings()?;
            let pool = commands::connect(&settings).await?;
            match cmd {
                DbCmd::Status => {
                    let s = cwk_db::status(&pool).await?;
                    println!("db_ok={} has_catalog_tables={}", s.ok, s.has_catalog_tables);
                }
                DbCmd::Migrate => {
                    cwk_db::migrate(&pool).await?;
                    println!("migrations_applied=true");
                }
            }
        }

        Commands::Audit { cmd } => match cmd {
            AuditCmd::Ordering => {
                let settings = commands::load_settings()?;
                let store = commands::store(&settings).await?;
                let violations = commands::audit::ordering(&store).await?;
                if violations > 0 {
                    anyhow::bail!("ORDERING_AUDIT_FAILED: {violations} sibling set(s) not dense");
                }
            }
        },

        Commands::Seed { cmd } => match cmd {
            SeedCmd::Demo => {
                let settings = commands::load_settings()?;
                let store = commands::store(&settings).await?;
                let summary = commands::seed::demo(&store).await?;
                println!("{summary}");
            }
        },
    }

    Ok(())
}
