//! tarn-probe — end-to-end transaction lifecycle probe.
//!
//! Derives the spending address from a seed, checks its funds, sends one
//! transaction to a destination address, and watches the node until the
//! transaction confirms, reporting the elapsed wall time and block count.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;

use tarn_client::{HttpNodeClient, NodeClient};
use tarn_core::address::{Address, Network};
use tarn_core::types::{format_drops, parse_drops};
use tarn_monitor::{ConfirmationMonitor, MonitorConfig};
use tarn_wallet::balance::aggregate;
use tarn_wallet::coin_selection::SpendableOutput;
use tarn_wallet::{TransactionBuilder, Wallet};

/// Measure how long one Tarn transaction takes to confirm.
#[derive(Parser)]
#[command(name = "tarn-probe")]
#[command(version, about = "Measure how long one Tarn transaction takes to confirm.")]
struct Cli {
    /// Seed phrase for the source wallet (mnemonic, hex, or passphrase).
    #[arg(long)]
    seed: String,

    /// Destination address.
    #[arg(long)]
    dest: String,

    /// Amount to send in TARN (e.g. 0.1).
    #[arg(long, default_value = "0.1")]
    amount: String,

    /// RPC endpoint URL.
    #[arg(long, default_value = "http://127.0.0.1:18332")]
    rpc_endpoint: String,

    /// Network (mainnet or testnet).
    #[arg(long, default_value = "testnet")]
    network: String,

    /// Seconds between confirmation polls.
    #[arg(long, default_value = "1")]
    poll_interval_secs: u64,

    /// Abort if unconfirmed after this many seconds (0 waits forever).
    #[arg(long, default_value = "600")]
    timeout_secs: u64,

    /// Password for the temporary wallet file
    /// (default: $TARN_PROBE_WALLET_PASSWORD, else empty).
    #[arg(long)]
    wallet_password: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    run(Cli::parse()).await
}

async fn run(cli: Cli) -> Result<()> {
    let network = parse_network(&cli.network)?;

    let amount = parse_drops(&cli.amount)
        .map_err(|e| anyhow::anyhow!("Invalid --amount: {e}"))?;
    if amount == 0 {
        bail!("Amount must be greater than zero");
    }

    let dest: Address = cli.dest.parse().context("Invalid destination address")?;
    if dest.network() != network {
        bail!(
            "Destination address is for {}, expected {}",
            network_name(dest.network()),
            network_name(network)
        );
    }

    // Derive the source wallet; index 0 is the spending address.
    let mut wallet =
        Wallet::from_phrase(&cli.seed, network).context("Failed to derive wallet from seed")?;
    let source = wallet.primary_address();
    info!(address = %source, "derived source address");

    // Persist the wallet the way a real send flow would. The directory is
    // removed when the probe exits.
    let password = cli
        .wallet_password
        .or_else(|| std::env::var("TARN_PROBE_WALLET_PASSWORD").ok())
        .unwrap_or_default();
    let wallet_dir = tempfile::tempdir().context("Failed to create wallet directory")?;
    let wallet_path = wallet_dir.path().join("probe.wlt");
    wallet
        .save_to_file(&wallet_path, password.as_bytes())
        .context("Failed to save wallet file")?;
    info!(file = %wallet_path.display(), "wallet file saved");

    let client = HttpNodeClient::new(&cli.rpc_endpoint)
        .with_context(|| format!("Failed to build RPC client for {}", cli.rpc_endpoint))?;

    // Pre-check: the source address must hold enough confirmed coins.
    let outputs = client
        .get_unspent_outputs(&[source.encode()])
        .await
        .context("Failed to query unspent outputs")?;
    let confirmed = aggregate(&outputs.head_outputs)?;
    let incoming = aggregate(&outputs.incoming_outputs)?;
    info!(
        address = %source,
        confirmed_coins = %format_drops(confirmed.coins),
        confirmed_hours = confirmed.hours,
        unconfirmed_coins = %format_drops(incoming.coins),
        unconfirmed_hours = incoming.hours,
        "source balance"
    );
    if confirmed.coins < amount {
        bail!(
            "Insufficient confirmed funds: have {} TARN, need {} TARN",
            format_drops(confirmed.coins),
            format_drops(amount)
        );
    }

    // Build and sign the transaction; change (coins and hours) returns to
    // the source address.
    let spendable = SpendableOutput::parse_all(&outputs.head_outputs)?;
    let mut builder = TransactionBuilder::new();
    builder.add_recipient(dest, amount);
    let unsigned = builder.build(&spendable, &source)?;
    let tx = TransactionBuilder::sign(unsigned, wallet.keychain())?;
    info!(
        txid = %tx.txid()?,
        inputs = tx.inputs.len(),
        outputs = tx.outputs.len(),
        amount = %format_drops(amount),
        "transaction built"
    );

    let config = MonitorConfig {
        poll_interval: Duration::from_secs(cli.poll_interval_secs.max(1)),
        timeout: (cli.timeout_secs > 0).then(|| Duration::from_secs(cli.timeout_secs)),
    };
    let monitor = ConfirmationMonitor::new(&client, config);
    let record = monitor
        .submit_and_await(&tx, &source.encode(), &cli.dest)
        .await?;

    println!("txid:            {}", record.txid);
    println!("submitted at:    {}", record.submitted_at);
    println!("confirmed at:    {}", record.confirmed_at);
    println!(
        "blocks elapsed:  {} ({} -> {})",
        record.blocks_elapsed(),
        record.submit_block,
        record.confirm_block
    );
    println!(
        "time to confirm: {:.3}s over {} polls",
        record.elapsed.as_secs_f64(),
        record.polls
    );

    Ok(())
}

/// Parse network string to Network enum.
fn parse_network(s: &str) -> Result<Network> {
    match s.to_lowercase().as_str() {
        "mainnet" => Ok(Network::Mainnet),
        "testnet" => Ok(Network::Testnet),
        _ => bail!("Invalid network (must be 'mainnet' or 'testnet')"),
    }
}

/// Human-readable network name.
fn network_name(network: Network) -> &'static str {
    match network {
        Network::Mainnet => "Mainnet",
        Network::Testnet => "Testnet",
    }
}
