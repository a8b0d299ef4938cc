//! EntiKV CLI
//!
//! Inspect and mutate a Redis-backed collection of JSON documents.
//!
//! # Commands
//!
//! - `get` - Print a document
//! - `set` - Write a document, optionally with an expiry
//! - `update` - Overwrite fields of a stored document
//! - `delete` - Delete a document (optionally with its index entries)
//! - `persist` - Remove a document's expiry
//! - `lookup` - List documents by an indexed field value

mod commands;
mod document;

use clap::{Args, Parser, Subcommand};
use entikv_codec::{CipherSecret, CodecError};
use entikv_core::CollectionConfig;
use entikv_storage::RedisStore;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// EntiKV command-line tools.
#[derive(Parser)]
#[command(name = "entikv")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Redis connection URL
    #[arg(global = true, long, env = "ENTIKV_REDIS_URL", default_value = "redis://127.0.0.1/")]
    redis_url: String,

    #[command(flatten)]
    collection: CollectionArgs,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct CollectionArgs {
    /// Key prefix of the collection
    #[arg(global = true, short, long, env = "ENTIKV_PREFIX", default_value = "")]
    prefix: String,

    /// Cipher key (64 hex digits or 32 bytes of text)
    #[arg(global = true, long, env = "ENTIKV_KEY", hide_env_values = true)]
    key: Option<String>,

    /// Cipher IV (32 hex digits or 16 bytes of text)
    #[arg(global = true, long, env = "ENTIKV_IV", hide_env_values = true)]
    iv: Option<String>,

    /// Indexed field (repeatable)
    #[arg(global = true, short, long = "index", value_name = "FIELD")]
    indexes: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a document as JSON
    Get {
        /// Document id
        id: String,
    },

    /// Write a document given as a JSON object with an "id" field
    Set {
        /// Document JSON
        json: String,

        /// Expire after this many seconds
        #[arg(long, value_name = "SECONDS")]
        ex: Option<u64>,
    },

    /// Overwrite fields of a stored document
    Update {
        /// Document id
        id: String,

        /// JSON object of fields to overwrite
        json: String,
    },

    /// Delete a document
    Delete {
        /// Document id
        id: String,

        /// Also remove the document from its indexes
        #[arg(long)]
        purge: bool,
    },

    /// Remove a document's expiry
    Persist {
        /// Document id
        id: String,
    },

    /// List documents whose indexed field has a value
    Lookup {
        /// Indexed field
        field: String,

        /// Field value
        value: String,
    },
}

fn cipher_secret(key: Option<&str>, iv: Option<&str>) -> Result<Option<CipherSecret>, CodecError> {
    match (key, iv) {
        (None, None) => Ok(None),
        (Some(key), Some(iv)) => CipherSecret::parse(key, iv).map(Some),
        (None, Some(_)) => Err(CodecError::MissingKeyMaterial { what: "key" }),
        (Some(_), None) => Err(CodecError::MissingKeyMaterial { what: "iv" }),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = &cli.collection;
    let mut config = CollectionConfig::new().prefix(args.prefix.as_str());
    if let Some(secret) = cipher_secret(args.key.as_deref(), args.iv.as_deref())? {
        config = config.encryption(secret);
    }

    let store = RedisStore::connect(&cli.redis_url).await?;
    tracing::debug!(url = %cli.redis_url, prefix = %args.prefix, "connected");
    let collection = document::open(Arc::new(store), config, &args.indexes)?;

    let output = match cli.command {
        Commands::Get { id } => commands::read::get(&collection, &id).await?,
        Commands::Set { json, ex } => commands::write::set(&collection, &json, ex).await?,
        Commands::Update { id, json } => commands::write::update(&collection, &id, &json).await?,
        Commands::Delete { id, purge } => commands::write::delete(&collection, &id, purge).await?,
        Commands::Persist { id } => commands::write::persist(&collection, &id).await?,
        Commands::Lookup { field, value } => {
            commands::read::lookup(&collection, &field, &value).await?
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_global_collection_flags() {
        let cli = Cli::try_parse_from([
            "entikv", "--prefix", "customers", "--index", "stripeCustomerId", "lookup",
            "stripeCustomerId", "s1",
        ])
        .unwrap();
        assert_eq!(cli.collection.prefix, "customers");
        assert_eq!(cli.collection.indexes, vec!["stripeCustomerId"]);
        assert!(matches!(cli.command, Commands::Lookup { .. }));
    }

    #[test]
    fn key_material_must_come_in_pairs() {
        assert!(cipher_secret(None, None).unwrap().is_none());
        assert!(matches!(
            cipher_secret(Some("k"), None),
            Err(CodecError::MissingKeyMaterial { what: "iv" })
        ));
        let key = "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f";
        let iv = "f0f1f2f3f4f5f6f7f8f9fafbfcfdfeff";
        assert!(cipher_secret(Some(key), Some(iv)).unwrap().is_some());
    }
}
