mod cli;
mod client;
mod error;
mod output;
mod shows;

use alloy_primitives::U256;
use clap::Parser;
use cli::{Cli, Command, DoormanCommand, VendorCommand, WalletCommand};
use error::CliError;
use ticketkit::{create_wallet, decrypt_wallet, TicketFlowController};
use tokio_util::sync::CancellationToken;
use tracing::info;

#[tokio::main]
async fn main() {
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("failed to install rustls crypto provider");

    let cli = Cli::parse();

    // Initialize tracing
    let filter = cli
        .log_level
        .parse::<tracing_subscriber::filter::LevelFilter>()
        .unwrap_or(tracing_subscriber::filter::LevelFilter::INFO);

    tracing_subscriber::fmt()
        .with_max_level(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cancel = setup_signal_handlers();

    // A transaction already handed to the wallet or node stays sent; this only
    // stops waiting for it.
    let result = tokio::select! {
        res = run(&cli) => res,
        _ = cancel.cancelled() => Err(CliError::Interrupted),
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "command failed");
        std::process::exit(1);
    }
}

async fn run(cli: &Cli) -> Result<(), CliError> {
    let json = cli.json;
    match &cli.command {
        Command::Wallet(cmd) => run_wallet(cmd, json).await,

        Command::Shows => output::write_shows(shows::SHOWS, json, &mut std::io::stdout()),

        Command::Details => {
            let controller = client::create_controller(cli)?;
            let details = controller.ticket_details().await?;
            output::write_details(&details, json, &mut std::io::stdout())
        }

        Command::Balance(identity) => {
            let controller = client::create_controller(cli)?;
            client::select_identity(&controller, identity).await?;
            let report = controller.check_balances().await?;
            output::write_balances(&report, json, &mut std::io::stdout())
        }

        Command::Buy(args) => {
            let controller = client::create_controller(cli)?;
            client::select_identity(&controller, &args.identity).await?;
            info!(amount = args.amount, "buying tickets");
            let outcome = controller.buy(args.amount).await?;
            output::write_outcome(&outcome, json, &mut std::io::stdout())
        }

        Command::Return(args) => {
            let controller = client::create_controller(cli)?;
            client::select_identity(&controller, &args.identity).await?;
            info!(amount = args.amount, "returning tickets");
            let outcome = controller.return_tickets(args.amount).await?;
            output::write_outcome(&outcome, json, &mut std::io::stdout())
        }

        Command::Doorman(cmd) => {
            let controller = client::create_controller(cli)?;
            let outcome = run_doorman(&controller, cmd).await?;
            output::write_outcome(&outcome, json, &mut std::io::stdout())
        }

        Command::Vendor(cmd) => {
            let controller = client::create_controller(cli)?;
            let outcome = run_vendor(&controller, cmd).await?;
            output::write_outcome(&outcome, json, &mut std::io::stdout())
        }
    }
}

async fn run_wallet(cmd: &WalletCommand, json: bool) -> Result<(), CliError> {
    match cmd {
        WalletCommand::Create {
            password,
            out_dir,
            show_private_key,
        } => {
            let password = password.clone();
            let wallet = tokio::task::spawn_blocking(move || create_wallet(&password)).await??;

            tokio::fs::create_dir_all(out_dir).await?;
            let path = out_dir.join(wallet.file_name());
            tokio::fs::write(&path, &wallet.keystore_json).await?;
            info!(address = %wallet.address, path = %path.display(), "keystore written");

            let key = show_private_key.then(|| wallet.private_key());
            output::write_wallet(wallet.address, key, Some(&path), json, &mut std::io::stdout())
        }

        WalletCommand::Decrypt {
            keystore,
            password,
            show_private_key,
        } => {
            let blob = tokio::fs::read_to_string(keystore).await?;
            let password = password.clone();
            let account = tokio::task::spawn_blocking(move || decrypt_wallet(&blob, &password)).await??;

            let key = account.private_key_hex();
            let key = show_private_key.then(|| key.as_str());
            output::write_wallet(account.address, key, None, json, &mut std::io::stdout())
        }
    }
}

async fn run_doorman(
    controller: &TicketFlowController,
    cmd: &DoormanCommand,
) -> Result<ticketkit::TransactionOutcome, CliError> {
    let outcome = match cmd {
        DoormanCommand::Burn {
            target,
            amount,
            identity,
        } => {
            client::select_identity(controller, identity).await?;
            controller.burn(target, U256::from(*amount)).await?
        }
        DoormanCommand::Set {
            address,
            disable,
            identity,
        } => {
            client::select_identity(controller, identity).await?;
            controller.set_doorman(address, !disable).await?
        }
    };
    Ok(outcome)
}

async fn run_vendor(
    controller: &TicketFlowController,
    cmd: &VendorCommand,
) -> Result<ticketkit::TransactionOutcome, CliError> {
    let outcome = match cmd {
        VendorCommand::WithdrawEarnings(identity) => {
            client::select_identity(controller, identity).await?;
            controller.withdraw_earnings().await?
        }
        VendorCommand::Withdraw(identity) => {
            client::select_identity(controller, identity).await?;
            controller.withdraw().await?
        }
        VendorCommand::SetPrice { wei, identity } => {
            let price: U256 = wei
                .parse()
                .map_err(|_| CliError::Usage(format!("invalid wei amount: {wei}")))?;
            client::select_identity(controller, identity).await?;
            controller.set_ticket_price(price).await?
        }
        VendorCommand::SetVendor { address, identity } => {
            client::select_identity(controller, identity).await?;
            controller.set_vendor(address).await?
        }
    };
    Ok(outcome)
}

/// Register SIGINT and SIGTERM handlers that trigger the returned token.
fn setup_signal_handlers() -> CancellationToken {
    let cancel = CancellationToken::new();

    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        info!("received SIGINT, shutting down");
        cancel_clone.cancel();
    });

    #[cfg(unix)]
    {
        let cancel_clone = cancel.clone();
        tokio::spawn(async move {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut sig) => {
                    sig.recv().await;
                    info!("received SIGTERM, shutting down");
                    cancel_clone.cancel();
                }
                Err(e) => tracing::warn!(error = %e, "failed to register SIGTERM handler"),
            }
        });
    }

    cancel
}
