//! namesys CLI — `nsys` command.
//!
//! Creates identities, publishes signed name records and resolves names
//! through a directory-backed routing substrate under the namesys home.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context as _, Result};
use clap::{Parser, Subcommand};
use log::debug;
use namesys::time::micros_to_rfc3339;

use namesys::storage::{load_identity, read_summary, save_identity};
use namesys::{
    Context, FileSequenceStore, FsRouting, Identity, InspectedAnswer, Name, NamesysConfig,
    NamesysError, PointerPath, Publisher, Resolver, RoutingSubstrate,
};

// ── Directory helpers ─────────────────────────────────────────────────────────

fn default_home() -> Result<PathBuf> {
    let home = std::env::var("HOME").map_err(|_| anyhow!("HOME not set; pass --home"))?;
    Ok(PathBuf::from(home).join(".namesys"))
}

struct Layout {
    home: PathBuf,
}

impl Layout {
    fn keys_dir(&self) -> PathBuf {
        self.home.join("keys")
    }

    fn key_path(&self, label: &str) -> PathBuf {
        self.keys_dir().join(format!("{label}.key"))
    }

    fn routing_dir(&self) -> PathBuf {
        self.home.join("routing")
    }

    fn sequence_path(&self) -> PathBuf {
        self.home.join("sequence.json")
    }

    fn config_path(&self) -> PathBuf {
        self.home.join("config.json")
    }
}

// ── Passphrase helper ─────────────────────────────────────────────────────────

fn read_passphrase(prompt: &str) -> Result<String> {
    eprint!("{prompt}");
    let mut passphrase = String::new();
    std::io::stdin()
        .read_line(&mut passphrase)
        .context("failed to read passphrase")?;
    Ok(passphrase.trim().to_string())
}

// ── Argument helpers ──────────────────────────────────────────────────────────

fn parse_duration_arg(s: &str) -> Result<Duration> {
    namesys::time::parse_duration(s)
        .filter(|d| !d.is_zero())
        .ok_or_else(|| anyhow!("invalid duration '{s}' (use e.g. 500ms, 30s, 24h, 7d)"))
}

// ── CLI structure ─────────────────────────────────────────────────────────────

/// namesys CLI — publish and resolve signed mutable names.
#[derive(Parser, Debug)]
#[command(
    name = "nsys",
    about = "namesys CLI",
    version,
    long_about = "nsys — namesys CLI\n\nCreate identities, publish signed name records and resolve names\nthrough a local directory-backed routing substrate."
)]
struct Cli {
    /// namesys home directory (default: ~/.namesys)
    #[arg(long, global = true)]
    home: Option<PathBuf>,

    /// Configuration file (default: <home>/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Key to use (default: default)
    #[arg(long, global = true, default_value = "default")]
    key: String,

    /// Peer label this node writes under in the routing directory
    #[arg(long, global = true, default_value = "local")]
    peer: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a new identity
    Init {
        /// Label for the new key (overrides --key)
        #[arg(long)]
        name: Option<String>,
    },

    /// Display the name and public key of an identity
    Show,

    /// Publish a pointer path under the identity's name
    Publish {
        /// Target path, e.g. /ipfs/Qm.../index.html
        path: String,

        /// Record lifetime (e.g. 24h, 7d)
        #[arg(long, conflicts_with = "no_expiry")]
        lifetime: Option<String>,

        /// Publish a record that never expires
        #[arg(long)]
        no_expiry: bool,
    },

    /// Resolve a name to its current pointer path
    Resolve {
        /// Name to resolve, with or without the /ipns/ prefix
        name: String,

        /// Give up after this long
        #[arg(long, default_value = "10s")]
        timeout: String,
    },

    /// List every candidate record stored for a name
    Inspect {
        /// Name to inspect
        name: String,

        /// Give up after this long
        #[arg(long, default_value = "10s")]
        timeout: String,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

// ── Main entry point ──────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let layout = Layout {
        home: match cli.home {
            Some(home) => home,
            None => default_home()?,
        },
    };
    let config_path = cli.config.unwrap_or_else(|| layout.config_path());
    let config = NamesysConfig::load_or_default(&config_path)
        .with_context(|| format!("failed to load config {}", config_path.display()))?;
    debug!("home: {}", layout.home.display());
    debug!("config: {} {:?}", config_path.display(), config);
    let verbose = cli.verbose;

    match cli.command {
        Commands::Init { name } => cmd_init(&layout, &name.unwrap_or(cli.key), verbose),
        Commands::Show => cmd_show(&layout, &cli.key, verbose),
        Commands::Publish {
            path,
            lifetime,
            no_expiry,
        } => {
            cmd_publish(
                &layout,
                config,
                &cli.key,
                &cli.peer,
                &path,
                lifetime.as_deref(),
                no_expiry,
                verbose,
            )
            .await
        }
        Commands::Resolve { name, timeout } => {
            cmd_resolve(&layout, config, &cli.peer, &name, &timeout, verbose).await
        }
        Commands::Inspect {
            name,
            timeout,
            json,
        } => cmd_inspect(&layout, config, &cli.peer, &name, &timeout, json).await,
    }
}

fn routing(layout: &Layout, peer: &str) -> Arc<dyn RoutingSubstrate> {
    debug!("routing: {} as peer '{peer}'", layout.routing_dir().display());
    Arc::new(FsRouting::new(layout.routing_dir(), peer))
}

fn parse_name(s: &str) -> Result<Name> {
    s.parse::<Name>()
        .map_err(|e| anyhow!("'{s}' is not a valid name: {e}"))
}

fn require_key(path: &Path, label: &str) -> Result<()> {
    if !path.exists() {
        return Err(anyhow!(
            "key '{label}' not found (expected at {}); run `nsys init` first",
            path.display()
        ));
    }
    Ok(())
}

// ── Command implementations ───────────────────────────────────────────────────

/// `nsys init [--name LABEL]`
fn cmd_init(layout: &Layout, label: &str, verbose: bool) -> Result<()> {
    let path = layout.key_path(label);
    if path.exists() {
        return Err(anyhow!(
            "key '{label}' already exists at {}",
            path.display()
        ));
    }

    let passphrase = read_passphrase("Enter passphrase for new key: ")?;
    if passphrase.is_empty() {
        return Err(anyhow!("passphrase cannot be empty"));
    }
    let confirm = read_passphrase("Confirm passphrase: ")?;
    if passphrase != confirm {
        return Err(anyhow!("passphrases do not match"));
    }

    let identity = Identity::generate(Some(label.to_string()));
    save_identity(&identity, &path, &passphrase).context("failed to save key")?;

    println!("Created key '{label}'");
    println!("  Name: {}", identity.name().to_path_string());
    println!("  File: {}", path.display());
    if verbose {
        println!("  Key:  {}", identity.public_key().to_base64());
        println!("  Created: {}", micros_to_rfc3339(identity.created_at));
    }
    Ok(())
}

/// `nsys show [--key LABEL]`
fn cmd_show(layout: &Layout, label: &str, _verbose: bool) -> Result<()> {
    let path = layout.key_path(label);
    require_key(&path, label)?;
    let summary = read_summary(&path).context("failed to read key file")?;

    println!("Key: {label}");
    println!("  Name:       {}", summary.name.to_path_string());
    println!("  Public Key: {}", summary.public_key);
    println!("  Created:    {}", micros_to_rfc3339(summary.created_at));
    if let Some(ref l) = summary.label {
        println!("  Label:      {l}");
    }
    Ok(())
}

/// `nsys publish PATH [--lifetime D | --no-expiry]`
#[allow(clippy::too_many_arguments)]
async fn cmd_publish(
    layout: &Layout,
    config: NamesysConfig,
    label: &str,
    peer: &str,
    path: &str,
    lifetime: Option<&str>,
    no_expiry: bool,
    verbose: bool,
) -> Result<()> {
    let value = PointerPath::parse(path)?;
    let key_path = layout.key_path(label);
    require_key(&key_path, label)?;

    let passphrase = read_passphrase(&format!("Passphrase for key '{label}': "))?;
    let identity = load_identity(&key_path, &passphrase).context("failed to unlock key")?;

    let mut publisher_config = config.publisher;
    if no_expiry {
        publisher_config.record_lifetime = None;
    } else if let Some(lifetime) = lifetime {
        publisher_config.record_lifetime = Some(parse_duration_arg(lifetime)?);
    }

    let routing = routing(layout, peer);
    let resolver = Resolver::new(Arc::clone(&routing), config.resolver);
    let sequences = Arc::new(FileSequenceStore::new(layout.sequence_path()));
    let publisher = Publisher::with_resolver(routing, resolver, sequences, publisher_config);

    let record = publisher
        .publish(&identity, value, &Context::background())
        .await
        .context("publish failed")?;

    println!("Published {}", identity.name().to_path_string());
    println!("  Value:    {}", record.value());
    println!("  Sequence: {}", record.sequence());
    println!("  Validity: {}", record.validity());
    if verbose {
        println!("  Key:      {}", record.public_key().to_base64());
        println!("  Issued:   {}", micros_to_rfc3339(namesys::time::now_micros()));
    }
    Ok(())
}

/// `nsys resolve NAME [--timeout D]`
async fn cmd_resolve(
    layout: &Layout,
    config: NamesysConfig,
    peer: &str,
    name: &str,
    timeout: &str,
    verbose: bool,
) -> Result<()> {
    let name = parse_name(name)?;
    let ctx = Context::with_timeout(parse_duration_arg(timeout)?);
    let resolver = Resolver::new(routing(layout, peer), config.resolver);

    match resolver.resolve_record(&name, &ctx).await {
        Ok(record) => {
            println!("{}", record.value());
            if verbose {
                eprintln!("  Sequence: {}", record.sequence());
                eprintln!("  Validity: {}", record.validity());
            }
            Ok(())
        }
        Err(NamesysError::SearchIncomplete) => Err(anyhow!(
            "{} is known to the routing directory but no valid record was found",
            name.to_path_string()
        )),
        Err(e) => Err(anyhow!("could not resolve {}: {e}", name.to_path_string())),
    }
}

/// `nsys inspect NAME [--timeout D] [--json]`
async fn cmd_inspect(
    layout: &Layout,
    config: NamesysConfig,
    peer: &str,
    name: &str,
    timeout: &str,
    json: bool,
) -> Result<()> {
    let name = parse_name(name)?;
    let ctx = Context::with_timeout(parse_duration_arg(timeout)?);
    let resolver = Resolver::new(routing(layout, peer), config.resolver);
    let answers = resolver.inspect(&name, &ctx).await;

    if json {
        let entries: Vec<serde_json::Value> = answers.iter().map(answer_to_json).collect();
        let out = serde_json::json!({
            "name": name.to_path_string(),
            "candidates": entries,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("Candidates for {} ({} answers)", name.to_path_string(), answers.len());
    for answer in &answers {
        match answer {
            InspectedAnswer::Accepted { peer, record } => println!(
                "  {peer:<16} valid    seq={} {} ({})",
                record.sequence(),
                record.value(),
                record.validity()
            ),
            InspectedAnswer::Rejected { peer, reason } => {
                println!("  {peer:<16} REJECTED {}", reason.as_str())
            }
            InspectedAnswer::Presence { peer } => println!("  {peer:<16} present  (no value)"),
            InspectedAnswer::PeerFailed { peer, error } => {
                println!("  {peer:<16} FAILED   {error}")
            }
        }
    }
    Ok(())
}

fn answer_to_json(answer: &InspectedAnswer) -> serde_json::Value {
    match answer {
        InspectedAnswer::Accepted { peer, record } => serde_json::json!({
            "peer": peer.0,
            "status": "valid",
            "sequence": record.sequence(),
            "value": record.value().as_str(),
            "expires_at": record.validity().deadline().map(micros_to_rfc3339),
        }),
        InspectedAnswer::Rejected { peer, reason } => serde_json::json!({
            "peer": peer.0,
            "status": "rejected",
            "reason": reason.as_str(),
        }),
        InspectedAnswer::Presence { peer } => serde_json::json!({
            "peer": peer.0,
            "status": "present",
        }),
        InspectedAnswer::PeerFailed { peer, error } => serde_json::json!({
            "peer": peer.0,
            "status": "failed",
            "error": error,
        }),
    }
}
