//! `tarifa import` - overwrite the local catalog from the provider.

use crate::cli::ImportArgs;
use crate::context::ProjectContext;
use crate::{progress, ui};
use anyhow::{Context, Result};
use catalog::store;
use provider::Client;
use reconcile::fetch_all;

pub fn run(ctx: &ProjectContext, args: &ImportArgs) -> Result<()> {
    let client = Client::from_env()?;

    if !args.yes && ctx.config.exists() {
        ui::warn(&format!(
            "This will overwrite {} with the provider's current state.",
            ctx.config.display()
        ));
        let confirmed = confirm_overwrite()?;
        if !confirmed {
            ui::info("Aborted. The local catalog was not touched.");
            return Ok(());
        }
    }

    let spinner = progress::spinner("Fetching remote catalog...", ctx.quiet);
    let remote = fetch_all(&client);
    spinner.finish_and_clear();
    let remote = remote?;

    store::save(&ctx.config, &remote)?;
    ui::success(&format!(
        "Imported {} products, {} prices, {} tax rates, {} coupons into {}.",
        remote.products.len(),
        remote.prices.len(),
        remote.taxes.len(),
        remote.coupons.len(),
        ctx.config.display()
    ));
    Ok(())
}

fn confirm_overwrite() -> Result<bool> {
    dialoguer::Confirm::new()
        .with_prompt("Continue?")
        .default(false)
        .interact()
        .context("Failed to read confirmation")
}
