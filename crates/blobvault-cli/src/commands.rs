use std::fs::File;
use std::net::SocketAddr;

use anyhow::Context;
use blobvault_crypto::{BlobDigest, DigestEngine};
use blobvault_server::{BlobVaultServer, ServerConfig};
use colored::Colorize;

use crate::cli::{Cli, Command, HashArgs, ServeArgs};

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Serve(args) => cmd_serve(args),
        Command::Hash(args) => cmd_hash(args),
    }
}

/// Load the config file, if any, then apply flag overrides.
pub fn resolve_config(args: &ServeArgs) -> anyhow::Result<ServerConfig> {
    let mut config = match &args.config {
        Some(path) => ServerConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ServerConfig::default(),
    };
    if let Some(ip) = args.listening {
        config.bind_addr = SocketAddr::new(ip, config.bind_addr.port());
    }
    if let Some(port) = args.port {
        config.bind_addr.set_port(port);
    }
    if let Some(db) = &args.db {
        config.db_file = db.clone();
    }
    if let Some(storage) = &args.storage {
        config.storage_root = storage.clone();
    }
    Ok(config)
}

fn cmd_serve(args: ServeArgs) -> anyhow::Result<()> {
    let config = resolve_config(&args)?;
    println!(
        "{} BlobVault on {} (storage: {}, db: {})",
        "✓".green().bold(),
        config.base_uri().bold(),
        config.storage_root.display(),
        config.db_file.display()
    );
    let runtime = tokio::runtime::Runtime::new().context("starting async runtime")?;
    runtime.block_on(BlobVaultServer::new(config).serve())?;
    Ok(())
}

fn cmd_hash(args: HashArgs) -> anyhow::Result<()> {
    let digests = hash_file(&args)?;
    println!("{}", args.file.display().to_string().bold());
    for digest in digests {
        println!("  {:<7} {}", digest.algorithm.to_string().cyan(), digest.hexdigest);
    }
    Ok(())
}

fn hash_file(args: &HashArgs) -> anyhow::Result<Vec<BlobDigest>> {
    let engine = if args.algorithms.is_empty() {
        DigestEngine::all()
    } else {
        DigestEngine::only(&args.algorithms)
    };
    let file = File::open(&args.file)
        .with_context(|| format!("opening {}", args.file.display()))?;
    tracing::debug!(file = %args.file.display(), algorithms = engine.algorithms().len(), "hashing");
    Ok(engine.digest_reader(file)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use blobvault_crypto::HashAlgorithm;
    use std::path::PathBuf;

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blobvault.toml");
        std::fs::write(&path, "bind_addr = \"10.0.0.1:4000\"\ndb_file = \"from-file.json\"\n").unwrap();

        let args = ServeArgs {
            config: Some(path),
            port: Some(5000),
            storage: Some(PathBuf::from("/data")),
            ..ServeArgs::default()
        };
        let config = resolve_config(&args).unwrap();
        assert_eq!(config.bind_addr, "10.0.0.1:5000".parse().unwrap());
        assert_eq!(config.db_file, PathBuf::from("from-file.json"));
        assert_eq!(config.storage_root, PathBuf::from("/data"));
    }

    #[test]
    fn listening_keeps_default_port() {
        let args = ServeArgs {
            listening: Some("127.0.0.1".parse().unwrap()),
            ..ServeArgs::default()
        };
        let config = resolve_config(&args).unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:3002".parse().unwrap());
    }

    #[test]
    fn missing_config_file_errors() {
        let args = ServeArgs {
            config: Some(PathBuf::from("/nonexistent/blobvault.toml")),
            ..ServeArgs::default()
        };
        assert!(resolve_config(&args).is_err());
    }

    #[test]
    fn hash_file_with_selected_algorithm() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("hello.txt");
        std::fs::write(&file, b"hello").unwrap();

        let args = HashArgs { file, algorithms: vec![HashAlgorithm::Md5] };
        let digests = hash_file(&args).unwrap();
        assert_eq!(digests.len(), 1);
        assert_eq!(digests[0].hexdigest, "5d41402abc4b2a76b9719d911017c592");
    }
}
