use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// cryptopass: buy, return and manage event tickets on chain.
#[derive(Parser, Debug)]
#[command(name = "cryptopass", version)]
pub struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,

    /// Output as JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    /// Chain node JSON-RPC URL (overrides RPC_URL)
    #[arg(long, global = true)]
    pub rpc_url: Option<String>,

    /// Hosted wallet JSON-RPC URL (overrides WALLET_URL)
    #[arg(long, global = true)]
    pub wallet_url: Option<String>,

    /// Ticket contract address (overrides CONTRACT_ADDRESS)
    #[arg(long, global = true)]
    pub contract: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create or open keystore wallets
    #[command(subcommand)]
    Wallet(WalletCommand),

    /// Buy tickets (at most 2 per purchase)
    Buy(AmountArgs),

    /// Return tickets for a refund
    Return(AmountArgs),

    /// Show native and ticket balances
    Balance(IdentityArgs),

    /// Show ticket token details
    Details,

    /// List upcoming shows
    Shows,

    /// Doorman actions
    #[command(subcommand)]
    Doorman(DoormanCommand),

    /// Vendor and owner actions
    #[command(subcommand)]
    Vendor(VendorCommand),
}

/// Which identity signs: a hosted wallet or a local keystore file.
#[derive(Args, Debug, Clone)]
pub struct IdentityArgs {
    /// Use the account exposed by the hosted wallet
    #[arg(long, conflicts_with = "keystore")]
    pub hosted: bool,

    /// Path to a keystore JSON file
    #[arg(long)]
    pub keystore: Option<PathBuf>,

    /// Keystore password
    #[arg(long, env = "KEYSTORE_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

#[derive(Args, Debug)]
pub struct AmountArgs {
    /// Number of tickets
    #[arg(allow_negative_numbers = true)]
    pub amount: i64,

    #[command(flatten)]
    pub identity: IdentityArgs,
}

#[derive(Subcommand, Debug)]
pub enum WalletCommand {
    /// Generate a new account and write its keystore file
    Create {
        /// Password protecting the keystore
        #[arg(long, env = "KEYSTORE_PASSWORD", hide_env_values = true)]
        password: String,

        /// Directory the keystore file is written to
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,

        /// Print the private key
        #[arg(long)]
        show_private_key: bool,
    },

    /// Decrypt a keystore file and print its address
    Decrypt {
        /// Path to the keystore JSON file
        #[arg(long)]
        keystore: PathBuf,

        /// Keystore password
        #[arg(long, env = "KEYSTORE_PASSWORD", hide_env_values = true)]
        password: String,

        /// Print the private key
        #[arg(long)]
        show_private_key: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum DoormanCommand {
    /// Burn tickets held by an account
    Burn {
        /// Account whose tickets are burned
        target: String,

        /// Number of tickets to burn
        amount: u64,

        #[command(flatten)]
        identity: IdentityArgs,
    },

    /// Grant or revoke the doorman role
    Set {
        /// Doorman account
        address: String,

        /// Revoke instead of grant
        #[arg(long)]
        disable: bool,

        #[command(flatten)]
        identity: IdentityArgs,
    },
}

#[derive(Subcommand, Debug)]
pub enum VendorCommand {
    /// Pay accumulated sale proceeds to the vendor
    WithdrawEarnings(IdentityArgs),

    /// Move the contract balance to the owner
    Withdraw(IdentityArgs),

    /// Set the ticket price
    SetPrice {
        /// New price in wei
        wei: String,

        #[command(flatten)]
        identity: IdentityArgs,
    },

    /// Set the vendor account
    SetVendor {
        /// New vendor account
        address: String,

        #[command(flatten)]
        identity: IdentityArgs,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_buy_with_keystore() {
        let cli = Cli::try_parse_from([
            "cryptopass",
            "--json",
            "buy",
            "2",
            "--keystore",
            "wallet.json",
            "--password",
            "pw",
        ])
        .unwrap();
        assert!(cli.json);
        match cli.command {
            Command::Buy(args) => {
                assert_eq!(args.amount, 2);
                assert_eq!(args.identity.keystore, Some(PathBuf::from("wallet.json")));
                assert_eq!(args.identity.password.as_deref(), Some("pw"));
                assert!(!args.identity.hosted);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_hosted_conflicts_with_keystore() {
        let res = Cli::try_parse_from([
            "cryptopass",
            "balance",
            "--hosted",
            "--keystore",
            "w.json",
        ]);
        assert!(res.is_err());
    }

    #[test]
    fn test_negative_amount_reaches_validation() {
        let cli = Cli::try_parse_from(["cryptopass", "return", "-1", "--hosted"]).unwrap();
        match cli.command {
            Command::Return(args) => assert_eq!(args.amount, -1),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_doorman_set_disable() {
        let cli = Cli::try_parse_from([
            "cryptopass",
            "doorman",
            "set",
            "0x2c7536E3605D9C16a7a3D7b1898e529396a65c23",
            "--disable",
            "--hosted",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Command::Doorman(DoormanCommand::Set { disable: true, .. })
        ));
    }
}
