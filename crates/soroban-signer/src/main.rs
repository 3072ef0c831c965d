//! soroban-signer: wallet session and transaction submission from the command line.

use clap::{Parser, Subcommand};
use eyre::{bail, WrapErr};

use soroban_signing_adapters::AdapterConfig;
use soroban_signing_core::{
    format_stroops, max_contribution, to_stroops, ConnectOutcome, SubmissionOutcome,
    STROOPS_PER_UNIT,
};

mod bridge;

use bridge::SignerBridge;

#[derive(Debug, Parser)]
#[command(name = "soroban-signer", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show the restored wallet session and its native balance.
    Status {
        /// Remaining goal in XLM; prints the largest contribution the wallet can make.
        #[arg(long)]
        goal_remaining: Option<String>,
    },
    /// Run wallet selection and persist the choice.
    Connect {
        /// Preferred wallet id, passed to the selection flow.
        #[arg(long)]
        wallet: Option<String>,
    },
    Disconnect,
    /// Sign, submit and confirm a base64 transaction envelope.
    Submit {
        #[arg(long)]
        envelope: String,
    },
    /// Convert a decimal XLM amount to stroops.
    Convert { amount: String },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    match Cli::parse().command {
        Command::Convert { amount } => convert(&amount),
        command => run(command).await,
    }
}

fn convert(amount: &str) -> eyre::Result<()> {
    let stroops = to_stroops(amount).wrap_err_with(|| format!("cannot convert {amount:?}"))?;
    println!("{stroops}");
    Ok(())
}

async fn run(command: Command) -> eyre::Result<()> {
    let config = AdapterConfig::from_env().wrap_err("invalid adapter configuration")?;
    let mut bridge = SignerBridge::new(&config).wrap_err("failed to initialize adapters")?;
    bridge.restore().await.wrap_err("failed to restore session")?;

    match command {
        Command::Status { goal_remaining } => {
            let Some(identity) = bridge.identity() else {
                println!("disconnected");
                return Ok(());
            };
            println!("connected {} ({})", identity.address, identity.provider_id);
            let balance = bridge.balance().await;
            match balance {
                Some(stroops) => println!("balance {} XLM", format_stroops(stroops)),
                None => println!("balance unknown"),
            }
            if let Some(goal) = goal_remaining {
                let remaining = to_stroops(&goal).wrap_err("invalid --goal-remaining")?;
                let max = max_contribution(remaining, balance.unwrap_or_default(), STROOPS_PER_UNIT);
                println!("max contribution {} XLM", format_stroops(max));
            }
        }
        Command::Connect { wallet } => match bridge.connect(wallet.as_deref()).await? {
            ConnectOutcome::Connected(identity) => {
                println!("connected {} ({})", identity.address, identity.provider_id)
            }
            ConnectOutcome::Dismissed => println!("selection dismissed"),
            ConnectOutcome::Failed(reason) => bail!("connect failed: {reason}"),
        },
        Command::Disconnect => {
            bridge.disconnect().await?;
            println!("disconnected");
        }
        Command::Submit { envelope } => match bridge.submit(&envelope).await {
            SubmissionOutcome::Success { hash } => println!("confirmed {hash}"),
            SubmissionOutcome::Timeout { hash } => bail!("not confirmed in time: {hash}"),
            SubmissionOutcome::Failed(reason) => bail!("submission failed: {reason}"),
        },
        Command::Convert { amount } => convert(&amount)?,
    }
    Ok(())
}
