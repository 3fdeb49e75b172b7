use std::sync::Arc;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use log::info;

use common::config::{load_config, ClusterConfig, PitrConfig, SshConfig};
use common::NameGenerator;
use postgres::{db, BackupTool, Controller, PgBackRest, RestoreTarget, WalG};
use ssh::{Runner, SshRunner};

#[derive(Parser, Debug)]
#[clap(
    name = "pitrctl",
    about = "Point-in-time recovery orchestration for PostgreSQL clusters",
    version
)]
struct Cli {
    /// Path to the configuration file
    #[clap(long, default_value = "config.yml")]
    config: String,

    /// Operate on the standby cluster instead of the master
    #[clap(long)]
    standby: bool,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Tool {
    Pgbackrest,
    Walg,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a new backup
    Backup {
        /// Backup tool to use
        #[clap(long, value_enum, default_value = "pgbackrest")]
        tool: Tool,
    },

    /// Restore the cluster, by default to the latest backup
    Restore {
        /// Backup tool to use
        #[clap(long, value_enum, default_value = "pgbackrest")]
        tool: Tool,

        /// RFC 3339 timestamp to restore to
        #[clap(long, conflicts_with_all = ["savepoint", "xid", "backup_name"])]
        time: Option<DateTime<Utc>>,

        /// Savepoint created with pg_create_restore_point
        #[clap(long, conflicts_with_all = ["xid", "backup_name"])]
        savepoint: Option<String>,

        /// Transaction id whose effects the restore includes
        #[clap(long, conflicts_with = "backup_name")]
        xid: Option<u64>,

        /// Base backup to fetch by name (wal-g only)
        #[clap(long)]
        backup_name: Option<String>,
    },

    /// Show the pgBackRest backup status for the configured stanza
    Info,

    /// List the wal-g base backups
    List,

    /// Start the cluster
    Start,

    /// Stop the cluster
    Stop,

    /// Show whether the cluster is running
    Status,

    /// Remove all files from the cluster's data directory
    Clear,

    /// Connect to the database and report the server version
    Check,

    /// Create a named restore point on the live cluster
    Savepoint {
        /// Name for the restore point; generated when omitted
        name: Option<String>,

        /// Seed for the name generator
        #[clap(long)]
        seed: Option<u64>,
    },

    /// Print the current transaction id
    Txid,
}

fn build_runner(ssh_config: &SshConfig) -> Arc<dyn Runner> {
    let mut runner = SshRunner::new(
        ssh_config.host.clone(),
        ssh_config.user.clone(),
        Some(ssh_config.port),
    );

    if let Some(private_key) = &ssh_config.private_key {
        runner = runner.with_private_key_path(private_key.clone());
    }

    if let Some(password) = &ssh_config.password {
        runner = runner.with_password(password.clone());
    }

    Arc::new(runner)
}

fn target_cluster(config: &PitrConfig, standby: bool) -> Result<&ClusterConfig> {
    if standby {
        config
            .standby
            .as_ref()
            .ok_or_else(|| anyhow!("no standby cluster is configured"))
    } else {
        Ok(&config.master)
    }
}

#[allow(clippy::too_many_arguments)]
async fn restore(
    tool: Tool,
    runner: Arc<dyn Runner>,
    cluster: Controller,
    config: &PitrConfig,
    time: Option<DateTime<Utc>>,
    savepoint: Option<String>,
    xid: Option<u64>,
    backup_name: Option<String>,
) -> Result<()> {
    if let Some(name) = backup_name {
        return match tool {
            Tool::Walg => {
                WalG::new(runner, cluster).restore(&name).await?;
                Ok(())
            }
            Tool::Pgbackrest => Err(anyhow!("--backup-name is only supported by wal-g")),
        };
    }

    let target = if let Some(time) = time {
        RestoreTarget::PointInTime(time)
    } else if let Some(name) = savepoint {
        RestoreTarget::NamedSavepoint(name)
    } else if let Some(xid) = xid {
        RestoreTarget::TransactionId(xid)
    } else {
        RestoreTarget::Latest
    };

    info!("restoring to {target}");

    match tool {
        Tool::Pgbackrest => {
            PgBackRest::new(runner, cluster, config.pgbackrest.stanza.clone())
                .restore_to(&target)
                .await?
        }
        Tool::Walg => WalG::new(runner, cluster).restore_to(&target).await?,
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .format_timestamp(None)
        .format_level(true)
        .format_module_path(false)
        .format_indent(Some(4))
        .filter_level(log::LevelFilter::Info)
        .try_init()?;

    let cli = Cli::parse();
    let config = load_config(&cli.config)?;
    let cluster_config = target_cluster(&config, cli.standby)?;

    let runner = build_runner(&config.ssh);
    let cluster = Controller::new(
        runner.clone(),
        cluster_config.version.clone(),
        cluster_config.cluster_name.clone(),
    );

    match cli.command {
        Commands::Backup { tool } => match tool {
            Tool::Pgbackrest => {
                PgBackRest::new(runner, cluster, config.pgbackrest.stanza.clone())
                    .backup()
                    .await?
            }
            Tool::Walg => WalG::new(runner, cluster).backup().await?,
        },

        Commands::Restore {
            tool,
            time,
            savepoint,
            xid,
            backup_name,
        } => {
            restore(
                tool,
                runner,
                cluster,
                &config,
                time,
                savepoint,
                xid,
                backup_name,
            )
            .await?
        }

        Commands::Info => {
            let tool = PgBackRest::new(runner, cluster, config.pgbackrest.stanza.clone());
            let infos = tool.info().await?;
            println!("{}", serde_json::to_string_pretty(&infos)?);
        }

        Commands::List => {
            let catalog = WalG::new(runner, cluster).list().await?;
            println!("Path: {}", catalog.storage_path);
            for backup in &catalog.backups {
                println!(
                    "{} {} {}",
                    backup.name,
                    backup.last_modified.to_rfc3339(),
                    backup.wal_segment_backup_start
                );
            }
        }

        Commands::Start => cluster.start().await?,

        Commands::Stop => cluster.stop().await?,

        Commands::Status => {
            if cluster.is_running().await? {
                println!("running");
            } else {
                println!("stopped");
            }
        }

        Commands::Clear => cluster.clear().await?,

        Commands::Check => {
            let client = db::connect(&cluster_config.database_url()?).await?;
            let version = db::server_version(&client).await?;
            println!("server version {version}");
        }

        Commands::Savepoint { name, seed } => {
            let name = match name {
                Some(name) => name,
                None => match seed {
                    Some(seed) => NameGenerator::from_seed(seed).next_name(),
                    None => NameGenerator::from_entropy().next_name(),
                },
            };

            let client = db::connect(&cluster_config.database_url()?).await?;
            db::create_restore_point(&client, &name).await?;
            println!("{name}");
        }

        Commands::Txid => {
            let client = db::connect(&cluster_config.database_url()?).await?;
            println!("{}", db::current_transaction_id(&client).await?);
        }
    }

    Ok(())
}
