//! apikey-gate - credential issuing and verification service
//!
//! ```text
//! request ─▶ gateway ─▶ Authenticator ─▶ cache? ─▶ CredentialStore (PostgreSQL)
//!                              │
//!                              └─▶ AlgorithmRegistry ─▶ ES256 | ES256K | EdDSA | RS256 | RS512
//! ```
//!
//! Subcommands `gen`, `sign` and `verify` are offline key tools for clients.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

use apikey_gate::algo::pem;
use apikey_gate::auth::{Authenticator, VerificationCache};
use apikey_gate::config::AppConfig;
use apikey_gate::gateway::{self, state::AppState};
use apikey_gate::logging;
use apikey_gate::store::{Database, PgCredentialStore};
use apikey_gate::{AlgorithmRegistry, SignAlgorithm};

#[derive(Parser)]
#[command(name = "apikey-gate")]
#[command(about = "Issue API credentials and verify signed requests")]
#[command(version = apikey_gate::VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config environment, loads config/<env>.yaml
    #[arg(long, default_value = "dev", global = true)]
    env: String,

    /// Log level for the key tool subcommands
    #[arg(long, default_value = "warn", global = true)]
    log: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP gateway
    Server {
        /// Listen address, overrides server.host/server.port
        #[arg(long)]
        addr: Option<String>,
    },
    /// Apply database migrations
    Migrate,
    /// Generate a keypair as PEM
    Gen {
        #[arg(long)]
        alg: String,
        /// Private key output file (stdout if omitted)
        #[arg(long)]
        private: Option<PathBuf>,
        /// Public key output file (stdout if omitted)
        #[arg(long)]
        public: Option<PathBuf>,
    },
    /// Sign data, print the base64 signature
    Sign {
        #[arg(long)]
        alg: String,
        /// PEM private key file
        #[arg(long)]
        private: PathBuf,
        /// Data file (stdin if omitted)
        #[arg(long)]
        data: Option<PathBuf>,
    },
    /// Verify a base64 signature over data
    Verify {
        #[arg(long)]
        alg: String,
        /// PEM public key file
        #[arg(long)]
        public: PathBuf,
        #[arg(long)]
        signature: String,
        /// Data file (stdin if omitted)
        #[arg(long)]
        data: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Server { addr } => {
            let config = AppConfig::load(&cli.env)?;
            let _guard = logging::init_logging(&config);
            run_server(config, addr).await
        }
        Commands::Migrate => {
            let config = AppConfig::load(&cli.env)?;
            let _guard = logging::init_logging(&config);
            let db = Database::connect(&config.postgres_url)
                .await
                .context("Failed to connect to PostgreSQL")?;
            db.migrate().await?;
            Ok(())
        }
        Commands::Gen {
            alg,
            private,
            public,
        } => {
            logging::init_cli_logging(&cli.log);
            let algorithm = lookup_algorithm(&alg)?;
            let pair = algorithm.generate()?;
            write_output(
                private.as_deref(),
                &pem::encode(pem::PRIVATE_KEY_LABEL, &pair.private_key),
            )?;
            write_output(
                public.as_deref(),
                &pem::encode(pem::PUBLIC_KEY_LABEL, &pair.public_key),
            )?;
            Ok(())
        }
        Commands::Sign { alg, private, data } => {
            logging::init_cli_logging(&cli.log);
            let algorithm = lookup_algorithm(&alg)?;
            let key = read_pem(&private, pem::PRIVATE_KEY_LABEL)?;
            let data = read_data(data.as_deref())?;
            let signature = algorithm.sign(&key, &data)?;
            println!("{}", pem::to_base64(&signature));
            Ok(())
        }
        Commands::Verify {
            alg,
            public,
            signature,
            data,
        } => {
            logging::init_cli_logging(&cli.log);
            let algorithm = lookup_algorithm(&alg)?;
            let key = read_pem(&public, pem::PUBLIC_KEY_LABEL)?;
            let signature = pem::from_base64(&signature).context("Signature is not base64")?;
            let data = read_data(data.as_deref())?;
            algorithm.validate_signature(&key, &signature, &data)?;
            println!("OK");
            Ok(())
        }
    }
}

async fn run_server(config: AppConfig, addr: Option<String>) -> Result<()> {
    tracing::info!(version = apikey_gate::VERSION, "Starting apikey-gate");

    let registry = Arc::new(AlgorithmRegistry::with_defaults());
    tracing::info!(algorithms = ?registry.names(), "Algorithms registered");

    let db = Database::connect(&config.postgres_url)
        .await
        .context("Failed to connect to PostgreSQL")?;
    let store = Arc::new(PgCredentialStore::new(db));

    let cache = VerificationCache::from_config(&config.cache);
    match &cache {
        Some(cache) => tracing::info!(
            capacity = config.cache.capacity,
            ttl_secs = cache.ttl().as_secs(),
            "Verification cache enabled"
        ),
        None => tracing::warn!("Verification cache disabled"),
    }

    let authenticator = Authenticator::new(
        registry,
        store,
        cache,
        Duration::from_secs(config.auth.timestamp_threshold_secs),
    );
    let state = Arc::new(AppState::new(authenticator, config.auth.clone()));

    let addr = addr.unwrap_or_else(|| config.server.addr());
    gateway::run_server(&addr, state, &config.server.base_path).await
}

fn lookup_algorithm(name: &str) -> Result<Arc<dyn SignAlgorithm>> {
    let registry = AlgorithmRegistry::with_defaults();
    match registry.lookup(name) {
        Some(algorithm) => Ok(algorithm),
        None => bail!(
            "Unknown algorithm {:?}, expected one of: {}",
            name,
            registry.names().join(", ")
        ),
    }
}

fn read_pem(path: &Path, label: &str) -> Result<Vec<u8>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(pem::decode(label, &text)?)
}

fn read_data(path: Option<&Path>) -> Result<Vec<u8>> {
    match path {
        Some(path) => {
            std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
        }
        None => {
            let mut data = Vec::new();
            std::io::stdin()
                .read_to_end(&mut data)
                .context("Failed to read stdin")?;
            Ok(data)
        }
    }
}

fn write_output(path: Option<&Path>, text: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))
        }
        None => {
            print!("{}", text);
            Ok(())
        }
    }
}
