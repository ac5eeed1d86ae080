//! revtree CLI Client
//!
//! Command-line interface for interacting with a revtree store.

use std::process;
use std::time::Duration;

use clap::{Parser, Subcommand};
use revtree::cluster::dial_uri_with_config;
use revtree::protocol::REV_CLOBBER;
use revtree::{Config, Conn, Event, FileRev};
use tracing_subscriber::{fmt, EnvFilter};

/// revtree CLI
#[derive(Parser, Debug)]
#[command(name = "revtree-cli")]
#[command(about = "CLI for a revtree store")]
#[command(version)]
struct Args {
    /// Connection URI
    #[arg(short, long, default_value = "revtree:?ca=127.0.0.1:8046")]
    uri: String,

    /// Bootstrap URI, used when the connection URI names a cluster
    #[arg(short, long)]
    bootstrap: Option<String>,

    /// Dial timeout in milliseconds
    #[arg(short, long)]
    timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the body of a file
    Get {
        path: String,
        /// Store revision to read at
        #[arg(short, long)]
        rev: Option<i64>,
    },

    /// Write a file
    Set {
        path: String,
        body: String,
        /// Expected revision; omit to overwrite unconditionally
        #[arg(short, long)]
        rev: Option<i64>,
    },

    /// Delete a file
    Del {
        path: String,
        /// Expected revision
        rev: i64,
    },

    /// Show length and revision of an entry
    Stat { path: String },

    /// List a directory
    Ls { dir: String },

    /// List entries matching a glob
    Find { glob: String },

    /// Wait for the next change matching a glob
    Wait {
        glob: String,
        /// Revision to start waiting from; defaults to the next one
        #[arg(short, long)]
        rev: Option<i64>,
    },

    /// Print the current store revision
    Rev,

    /// Check the connection
    Nop,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,revtree=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = Config::builder();
    if let Some(ms) = args.timeout_ms {
        config = config.dial_timeout(Duration::from_millis(ms));
    }
    let config = config.build();

    let conn = match dial_uri_with_config(&args.uri, args.bootstrap.as_deref(), &config) {
        Ok(conn) => conn,
        Err(e) => {
            tracing::error!("Failed to connect: {}", e);
            process::exit(1);
        }
    };

    tracing::debug!("Connected to {}", conn.addr());

    if let Err(e) = execute(&conn, args.command) {
        tracing::error!("{}", e);
        process::exit(1);
    }
}

fn execute(conn: &Conn, command: Commands) -> revtree::Result<()> {
    match command {
        Commands::Get { path, rev } => {
            let (body, file_rev) = conn.get(&path, rev)?;
            tracing::debug!("{} at revision {}", path, file_rev);
            println!("{}", String::from_utf8_lossy(&body));
        }
        Commands::Set { path, body, rev } => {
            let new_rev = conn.set(&path, rev.unwrap_or(REV_CLOBBER), body.as_bytes())?;
            println!("{}", new_rev);
        }
        Commands::Del { path, rev } => conn.del(&path, rev)?,
        Commands::Stat { path } => match conn.stat(&path, None)? {
            (_, FileRev::Missing) => println!("{}: missing", path),
            (len, FileRev::Dir) => println!("{}: directory, {} entries", path, len),
            (len, FileRev::Rev(rev)) => println!("{}: {} bytes, revision {}", path, len, rev),
        },
        Commands::Ls { dir } => {
            let rev = conn.rev()?;
            for info in conn.getdirinfo(&dir, rev, 0, -1)? {
                let suffix = if info.is_dir { "/" } else { "" };
                println!("{}{}", info.name, suffix);
            }
        }
        Commands::Find { glob } => {
            let rev = conn.rev()?;
            for event in conn.walk(&glob, rev, 0, -1)? {
                print_event(&event);
            }
        }
        Commands::Wait { glob, rev } => {
            let rev = match rev {
                Some(rev) => rev,
                None => conn.rev()? + 1,
            };
            print_event(&conn.wait(&glob, rev)?);
        }
        Commands::Rev => println!("{}", conn.rev()?),
        Commands::Nop => conn.nop()?,
    }

    Ok(())
}

fn print_event(event: &Event) {
    let kind = if event.is_del() { "del" } else { "set" };
    println!(
        "{} {} {} {}",
        event.rev,
        kind,
        event.path,
        String::from_utf8_lossy(&event.body)
    );
}
