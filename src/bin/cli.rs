//! nodestore CLI
//!
//! Drives a content-keyed file store in a node data directory.

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use nodestore::blocks::{ContentBlock, ContentCallback, DEFAULT_DATA_LENGTH};
use nodestore::{BlockStore, FetchOptions, FileStore, StorableBlock, StoreConfig, StoreError};
use tracing_subscriber::{fmt, EnvFilter};

/// nodestore CLI
#[derive(Parser, Debug)]
#[command(name = "nodestore")]
#[command(about = "Inspect and manipulate a node's on-disk block store")]
#[command(version)]
struct Args {
    /// Node data directory
    #[arg(short, long, default_value = "./nodestore_data")]
    base_dir: PathBuf,

    /// Store name below datastore-files/
    #[arg(short, long, default_value = "chk")]
    store: String,

    /// Fixed block payload size in bytes
    #[arg(short = 'l', long, default_value_t = DEFAULT_DATA_LENGTH)]
    data_length: usize,

    /// Advisory capacity
    #[arg(short, long, default_value = "1000000")]
    max_keys: u64,

    /// fsync every record
    #[arg(long)]
    sync: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Store a file's contents as one block and print its routing key
    Put {
        /// File to store (at most data-length bytes)
        file: PathBuf,
    },

    /// Write a block's payload to stdout
    Get {
        /// Routing key (hex)
        key: String,

        /// Also return blocks stored as old blocks
        #[arg(long)]
        include_old: bool,
    },

    /// Delete a block
    Remove {
        /// Routing key (hex)
        key: String,
    },

    /// List routing keys
    Keys,

    /// Print access statistics
    Stats,

    /// Copy every block into another store
    Migrate {
        /// Target node data directory
        #[arg(long)]
        to: PathBuf,

        /// Target store name (defaults to the source name)
        #[arg(long)]
        to_store: Option<String>,
    },

    /// Delete every block
    Clear,
}

fn main() -> ExitCode {
    // Logs go to stderr, command output to stdout
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,nodestore=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match run(args) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> nodestore::Result<ExitCode> {
    let callback = Arc::new(ContentCallback::new(args.data_length));

    let config = StoreConfig::builder()
        .base_dir(&args.base_dir)
        .name(&args.store)
        .max_keys(args.max_keys)
        .sync_writes(args.sync)
        .build();
    let store = FileStore::open(config, Arc::clone(&callback))?;
    store.start(false)?;

    let code = match args.command {
        Commands::Put { file } => {
            let payload = std::fs::read(&file)?;
            let block = ContentBlock::encode(&payload, args.data_length)?;
            store.put(&block, block.data(), block.header(), false, false)?;
            println!("{}", hex::encode_upper(block.routing_key()));
            ExitCode::SUCCESS
        }

        Commands::Get { key, include_old } => {
            let routing_key = parse_key(&key)?;
            let options = FetchOptions {
                ignore_old_blocks: !include_old,
                ..FetchOptions::default()
            };
            match store.fetch(&routing_key, None, options)? {
                Some(fetched) => {
                    if fetched.old_block {
                        tracing::warn!("returning old block");
                    }
                    std::io::stdout().write_all(fetched.block.payload())?;
                    ExitCode::SUCCESS
                }
                None => {
                    eprintln!("not found");
                    ExitCode::FAILURE
                }
            }
        }

        Commands::Remove { key } => {
            if store.remove(&parse_key(&key)?)? {
                ExitCode::SUCCESS
            } else {
                eprintln!("not found");
                ExitCode::FAILURE
            }
        }

        Commands::Keys => {
            for key in store.routing_keys()? {
                println!("{}", hex::encode_upper(key));
            }
            ExitCode::SUCCESS
        }

        Commands::Stats => {
            let stats = store.session_access_stats();
            println!("keys:      {}", stats.key_count);
            println!("max keys:  {}", store.max_keys());
            println!("hits:      {}", stats.hits);
            println!("misses:    {}", stats.misses);
            println!("writes:    {}", stats.writes);
            match store.total_access_stats() {
                Ok(total) => println!("lifetime:  {:?}", total),
                Err(e) => println!("lifetime:  {}", e),
            }
            ExitCode::SUCCESS
        }

        Commands::Migrate { to, to_store } => {
            let target_config = StoreConfig::builder()
                .base_dir(to)
                .name(to_store.unwrap_or_else(|| args.store.clone()))
                .max_keys(args.max_keys)
                .sync_writes(args.sync)
                .build();
            let target = FileStore::open(target_config, Arc::clone(&callback))?;
            let report = store.migrate_to(&target, false)?;
            target.close();
            println!(
                "migrated {} (invalid {}, collisions {}, unreadable {})",
                report.migrated, report.invalid, report.collisions, report.unreadable
            );
            ExitCode::SUCCESS
        }

        Commands::Clear => {
            println!("removed {}", store.clear()?);
            ExitCode::SUCCESS
        }
    };

    store.close();
    Ok(code)
}

fn parse_key(key: &str) -> nodestore::Result<Vec<u8>> {
    hex::decode(key).map_err(|e| StoreError::Config(format!("invalid hex routing key {:?}: {}", key, e)))
}
