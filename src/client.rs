//! Controller factory: environment config plus command-line overrides.

use std::sync::Arc;

use ticketkit::{ContractClient, IdentitySource, TicketConfig, TicketFlowController};
use tracing::info;

use crate::cli::{Cli, IdentityArgs};
use crate::error::CliError;

/// Build the config from the environment and apply any URL or contract flags.
pub fn load_config(cli: &Cli) -> Result<TicketConfig, CliError> {
    let _ = dotenvy::dotenv(); // load .env if present

    let overrides = [
        ("CONTRACT_ADDRESS", cli.contract.clone()),
        ("RPC_URL", cli.rpc_url.clone()),
        ("WALLET_URL", cli.wallet_url.clone()),
    ];
    let override_for = |key: &str| {
        overrides
            .iter()
            .find(|(k, _)| *k == key)
            .and_then(|(_, v)| v.clone())
    };
    let config =
        TicketConfig::from_lookup(|key| override_for(key).or_else(|| std::env::var(key).ok()))?;
    Ok(config)
}

/// Create the shared contract client and a controller on top of it.
pub fn create_controller(cli: &Cli) -> Result<TicketFlowController, CliError> {
    let config = load_config(cli)?;
    info!(
        contract = %config.contract_address,
        rpc = %config.rpc_url,
        wallet = %config.wallet_url,
        "ticket contract configured"
    );
    let contract = Arc::new(ContractClient::new(&config)?);
    Ok(TicketFlowController::new(contract))
}

/// Resolve the identity flags into a source for `select_identity`.
///
/// Returns `None` when neither `--hosted` nor `--keystore` is given.
pub async fn identity_source(
    controller: &TicketFlowController,
    args: &IdentityArgs,
) -> Result<Option<IdentitySource>, CliError> {
    if args.hosted {
        let signer = controller.connect_hosted().await?;
        return Ok(Some(IdentitySource::Hosted(signer)));
    }
    let Some(path) = &args.keystore else {
        return Ok(None);
    };
    let json = tokio::fs::read_to_string(path).await?;
    Ok(Some(IdentitySource::Keystore {
        json,
        password: args.password.clone().unwrap_or_default(),
    }))
}

/// Select the identity described by `args` on `controller`.
///
/// Without identity flags nothing is selected, so the operation itself
/// reports the missing identity.
pub async fn select_identity(
    controller: &TicketFlowController,
    args: &IdentityArgs,
) -> Result<(), CliError> {
    let Some(source) = identity_source(controller, args).await? else {
        return Ok(());
    };
    let address = controller.select_identity(Some(source)).await?;
    info!(%address, "identity ready");
    Ok(())
}
