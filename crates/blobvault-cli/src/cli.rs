use std::net::IpAddr;
use std::path::PathBuf;

use blobvault_crypto::HashAlgorithm;
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "blobvault", about = "BlobVault: owner-scoped blob storage service", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP server
    Serve(ServeArgs),
    /// Print digests of a local file
    Hash(HashArgs),
}

#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// TOML configuration file; flags below override its values
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    #[arg(short, long)]
    pub port: Option<u16>,
    /// Address to listen on
    #[arg(short, long)]
    pub listening: Option<IpAddr>,
    /// Blob metadata database file
    #[arg(short, long)]
    pub db: Option<PathBuf>,
    /// Directory holding blob contents
    #[arg(short, long)]
    pub storage: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct HashArgs {
    pub file: PathBuf,
    /// Restrict output to these algorithms (repeatable)
    #[arg(short, long = "algorithm")]
    pub algorithms: Vec<HashAlgorithm>,
}
