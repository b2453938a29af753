//! `namesync credentials` — provider bearer-token provisioning.
//!
//! Tokens are obtained out of band (the OAuth handshake is not this tool's
//! job) and stored at `~/.namesync/credentials.json` with mode 0600.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use namesync_core::types::{Credentials, UserId};
use namesync_core::JsonRuleStore;

use crate::ProviderArg;

#[derive(Subcommand, Debug)]
pub enum CredentialsCommand {
    /// Store a bearer token for one of a user's providers.
    Set(SetArgs),
    /// Remove a stored token.
    Remove(RemoveArgs),
}

pub fn run(command: CredentialsCommand) -> Result<()> {
    let home: PathBuf = dirs::home_dir().context("could not determine home directory")?;
    let store = JsonRuleStore::at(&home);

    match command {
        CredentialsCommand::Set(args) => {
            let user_id = UserId::from(args.user.as_str());
            store
                .set_credentials(
                    &user_id,
                    args.provider.into(),
                    Credentials::new(args.token),
                )
                .context("failed to store credentials")?;
            println!("✓ {} token stored for '{user_id}'", args.provider);
        }
        CredentialsCommand::Remove(args) => {
            let user_id = UserId::from(args.user.as_str());
            store
                .remove_credentials(&user_id, args.provider.into())
                .context("failed to remove credentials")?;
            println!("✓ {} token removed for '{user_id}'", args.provider);
        }
    }
    Ok(())
}

#[derive(Args, Debug)]
pub struct SetArgs {
    /// User the token belongs to.
    pub user: String,

    /// Which provider the token authenticates against.
    #[arg(long)]
    pub provider: ProviderArg,

    /// The opaque bearer token.
    #[arg(long)]
    pub token: String,
}

#[derive(Args, Debug)]
pub struct RemoveArgs {
    /// User the token belongs to.
    pub user: String,

    /// Which provider to clear.
    #[arg(long)]
    pub provider: ProviderArg,
}
