use anyhow::Result;
use clap::{Parser, Subcommand};
use mts_audit::VerifyResult;
use mts_reconcile::StationSpec;
use mts_store::DirTextStore;

mod commands;

use commands::mounts::{self, MountsTarget};

#[derive(Parser)]
#[command(name = "mts")]
#[command(about = "Caster mount-table sync CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Mount table (clientmounts.aut) maintenance
    Mounts {
        /// Directory holding the caster's auth files
        #[arg(long, default_value = ".")]
        root: String,

        /// Mount table file name inside --root
        #[arg(long = "mounts-file", default_value = "clientmounts.aut")]
        mounts_file: String,

        /// Compute and print the result without writing
        #[arg(long)]
        dry_run: bool,

        #[command(subcommand)]
        cmd: MountsCmd,
    },

    /// Print the merged config's hash and canonical JSON
    ConfigHash {
        /// YAML layers, later ones overriding earlier ones
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Audit log checks
    Audit {
        #[command(subcommand)]
        cmd: AuditCmd,
    },
}

#[derive(Subcommand)]
enum MountsCmd {
    /// Attach a group to station/format pairs (additive)
    Grant {
        #[arg(long)]
        group: String,

        /// NAME:FMT[,FMT...]; repeatable
        #[arg(long = "station", required = true, value_parser = commands::parse_station_arg)]
        stations: Vec<StationSpec>,
    },

    /// Remove a group from every station
    Revoke {
        #[arg(long)]
        group: String,
    },

    /// Converge a group onto a complete desired station snapshot
    Sync {
        #[arg(long)]
        group: String,

        /// JSON file: array of { "code": "#NAME", "formats": [...] }
        #[arg(long = "desired-json")]
        desired_json: String,
    },

    /// Rewrite legacy format keys (/CMRP, CMRP:) into bare form
    Normalize,
}

#[derive(Subcommand)]
enum AuditCmd {
    /// Verify the hash chain of a JSONL audit log
    Verify {
        #[arg(long)]
        path: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    init_tracing();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::Mounts {
            root,
            mounts_file,
            dry_run,
            cmd,
        } => {
            let target = MountsTarget {
                store: DirTextStore::new(&root),
                mounts_file,
                dry_run,
            };
            match cmd {
                MountsCmd::Grant { group, stations } => {
                    mounts::grant_cmd(&target, &stations, &group).await?
                }
                MountsCmd::Revoke { group } => mounts::revoke_cmd(&target, &group).await?,
                MountsCmd::Sync {
                    group,
                    desired_json,
                } => {
                    let desired = commands::load_desired(&desired_json)?;
                    mounts::sync_cmd(&target, &desired, &group).await?
                }
                MountsCmd::Normalize => mounts::normalize_cmd(&target).await?,
            }
        }

        Commands::ConfigHash { paths } => {
            let layers: Vec<&str> = paths.iter().map(String::as_str).collect();
            let loaded = mts_config::load_layered_yaml(&layers)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }

        Commands::Audit { cmd } => match cmd {
            AuditCmd::Verify { path } => match mts_audit::verify_hash_chain(&path)? {
                VerifyResult::Valid { lines } => {
                    println!("audit_valid=true lines={lines}");
                }
                VerifyResult::Broken { line, kind } => {
                    println!("audit_valid=false line={line} reason={kind}");
                    anyhow::bail!("audit hash chain broken at line {line}");
                }
            },
        },
    }

    Ok(())
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .init();
}
