// CLI commands

use clap::{Args, Parser, Subcommand};
use crate::config::{check_difficulty, BalancePolicy, ConfigError, LedgerConfig};
use crate::consensus::{CancelToken, Miner};
use crate::core::{now_nanos, Block, Transaction};
use crate::ledger::{
    ChainResponse, Ledger, LedgerError, LedgerService, MineOutcome, TransactionRequest,
};
use crate::wallet::{sign_transaction, Address, KeyError, KeyPair};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Parser)]
#[command(name = "edu-ledger")]
#[command(about = "Single-node educational ledger with proof-of-work mining", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a key pair and print it as JSON
    Wallet,

    /// Sign a transfer and print the submission JSON
    Sign {
        /// Sender private key (hex)
        #[arg(long)]
        private_key: String,
        /// Recipient address
        #[arg(long)]
        recipient: String,
        /// Amount to transfer
        #[arg(long)]
        value: f32,
    },

    /// Check that an address decodes and its checksum matches
    Address {
        address: String,
    },

    /// Run an in-memory session: transfers between fresh wallets, mined into blocks
    Simulate(SimulateArgs),

    /// Time a proof-of-work search
    Bench {
        /// Leading zero hex digits
        #[arg(short, long, default_value = "4")]
        difficulty: usize,
    },
}

#[derive(Args)]
pub struct SimulateArgs {
    /// TOML file with difficulty, reward and balance_policy
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Override the configured difficulty
    #[arg(short, long)]
    pub difficulty: Option<usize>,
    /// Override the configured mining reward
    #[arg(short, long)]
    pub reward: Option<f32>,
    /// Reject transfers the sender cannot cover
    #[arg(long)]
    pub enforce_balance: bool,
    /// Number of wallets besides the owner
    #[arg(short, long, default_value = "3")]
    pub wallets: usize,
    /// Number of mining rounds
    #[arg(long, default_value = "3")]
    pub rounds: usize,
    /// Give up on a round after this many milliseconds
    #[arg(long)]
    pub mine_timeout_ms: Option<u64>,
    /// Print the final chain as JSON
    #[arg(long)]
    pub print_chain: bool,
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Key(#[from] KeyError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("failed to start runtime: {0}")]
    Runtime(#[from] std::io::Error),

    #[error("failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("chain failed validation: {0}")]
    Validation(#[from] crate::consensus::ValidationError),
}

/// CLI handler
pub struct CliHandler;

impl CliHandler {
    /// Handle CLI command
    pub fn handle(cli: Cli) -> Result<(), CliError> {
        match cli.command {
            Commands::Wallet => Self::wallet(),
            Commands::Sign { private_key, recipient, value } => {
                Self::sign(&private_key, &recipient, value)
            }
            Commands::Address { address } => Self::address(&address),
            Commands::Simulate(args) => Self::simulate(args),
            Commands::Bench { difficulty } => {
                check_difficulty(difficulty)?;
                Self::bench(difficulty);
                Ok(())
            }
        }
    }

    fn wallet() -> Result<(), CliError> {
        let key_pair = KeyPair::generate();
        println!("{}", serde_json::to_string_pretty(&key_pair.export())?);
        Ok(())
    }

    fn sign(private_key: &str, recipient: &str, value: f32) -> Result<(), CliError> {
        let key_pair = KeyPair::from_private_hex(private_key)?;
        let request = TransactionRequest::from_signed(&sign_transaction(&key_pair, recipient, value));
        println!("{}", serde_json::to_string_pretty(&request)?);
        Ok(())
    }

    fn address(address: &str) -> Result<(), CliError> {
        let address = Address::parse(address)?;
        println!("✓ Valid address {}", address);
        println!("  pubkey hash: {}", hex::encode(address.pubkey_hash()?));
        Ok(())
    }

    fn simulate(args: SimulateArgs) -> Result<(), CliError> {
        let mut config = match &args.config {
            Some(path) => LedgerConfig::load(path)?,
            None => LedgerConfig::default(),
        };
        if let Some(difficulty) = args.difficulty {
            config.difficulty = difficulty;
        }
        if let Some(reward) = args.reward {
            config.reward = reward;
        }
        if args.enforce_balance {
            config.balance_policy = BalancePolicy::Enforced;
        }
        config.validate()?;

        // Composition root: the one ledger of this process
        let owner = KeyPair::generate();
        let ledger = Arc::new(Ledger::new(owner.address.as_str(), config));
        let service = LedgerService::new(Arc::clone(&ledger));
        let wallets: Vec<KeyPair> = (0..args.wallets).map(|_| KeyPair::generate()).collect();

        println!("Owner address: {}", owner.address);
        for (i, wallet) in wallets.iter().enumerate() {
            println!("Wallet {}:      {}", i, wallet.address);
        }

        let runtime = tokio::runtime::Runtime::new()?;
        runtime.block_on(async {
            for round in 0..args.rounds {
                // The owner funds wallet 0, then each wallet pays the next
                let mut transfers = vec![(&owner, wallets.first(), 1.0f32)];
                for (i, sender) in wallets.iter().enumerate().skip(1) {
                    transfers.push((sender, wallets.get((i + 1) % wallets.len()), 0.5));
                }

                for (sender, recipient, value) in transfers {
                    let Some(recipient) = recipient else { continue };
                    let request = TransactionRequest::from_signed(&sign_transaction(
                        sender,
                        recipient.address.as_str(),
                        value,
                    ));
                    if let Err(e) = service.submit(request).await {
                        println!("  round {}: rejected {} -> {}: {}", round, sender.address, recipient.address, e);
                    }
                }

                let outcome = match args.mine_timeout_ms {
                    Some(ms) => service.mine_with_timeout(Duration::from_millis(ms)).await?,
                    None => service.mine().await?,
                };
                match outcome {
                    MineOutcome::Sealed(block) => println!(
                        "✓ Round {}: sealed block {} with {} transactions (nonce {})",
                        round,
                        block.hash(),
                        block.transactions().len(),
                        block.nonce()
                    ),
                    MineOutcome::EmptyPool => println!("  Round {}: nothing to mine", round),
                    MineOutcome::Cancelled => println!("✗ Round {}: mining timed out", round),
                }
            }
            Ok::<(), CliError>(())
        })?;

        ledger.validate()?;

        println!("\nChain height: {}", ledger.chain_len() - 1);
        println!("Pending:      {}", ledger.pool_len());
        println!("Balances:");
        println!("  owner    {:>10.2}", ledger.derive_balance(owner.address.as_str()));
        for (i, wallet) in wallets.iter().enumerate() {
            println!("  wallet {} {:>10.2}", i, ledger.derive_balance(wallet.address.as_str()));
        }

        if args.print_chain {
            println!("{}", serde_json::to_string_pretty(&ChainResponse::from_ledger(&ledger))?);
        }

        Ok(())
    }

    fn bench(difficulty: usize) {
        println!("Mining at difficulty {}...\n", difficulty);

        let transactions = vec![Transaction::reward("bench", 1.0)];
        let miner = Miner::new(difficulty);
        let result = miner.mine(now_nanos(), &Block::zero().hash(), &transactions, &CancelToken::new());

        println!("Nonce: {}", result.nonce);
        println!("Hash: {}", result.hash);
        println!("Attempts: {} (expected ~{:.0})", result.attempts, miner.difficulty.expected_attempts());
        println!("Duration: {:?}", result.duration);
        println!("Hash rate: {:.2} H/s", result.hash_rate());
    }
}
