//! `tarifa sync` - diff, confirm, apply, then capture assigned ids.

use crate::cli::SyncArgs;
use crate::context::ProjectContext;
use crate::{progress, render, ui};
use anyhow::{Context, Result};
use catalog::store;
use dialoguer::Confirm;
use provider::Client;
use reconcile::{apply, diff, fetch_all};

pub fn run(ctx: &ProjectContext, args: &SyncArgs) -> Result<()> {
    let local = store::load(&ctx.config)?;
    let client = Client::from_env()?;

    let spinner = progress::spinner("Fetching remote catalog...", ctx.quiet);
    let remote = fetch_all(&client);
    spinner.finish_and_clear();
    let remote = remote?;

    let result = diff(&local, &remote);
    render::warnings(&result.warnings);

    if result.changes.is_empty() {
        ui::success("Catalog is in sync with the provider; nothing to apply.");
        return Ok(());
    }

    render::changes(&result.changes);
    println!();
    println!("{}", render::summary(&result.changes));
    println!();

    if !args.yes {
        let confirmed = Confirm::new()
            .with_prompt("Apply these changes?")
            .default(false)
            .interact()
            .context("Failed to read confirmation")?;
        if !confirmed {
            ui::info("Aborted. Nothing was sent to the provider.");
            return Ok(());
        }
    }

    let total = result.changes.count_operations();
    let bar = progress::bar(total as u64, "Applying", ctx.quiet);
    let outcome = apply(&result.changes, &client, || bar.inc(1));
    if outcome.is_ok() {
        bar.finish_and_clear();
    } else {
        bar.abandon();
    }
    // The local file is not rewritten on a partial apply; re-running sync
    // diffs against the partially-updated remote state and picks up where
    // this run stopped.
    outcome?;
    ui::success(&format!("Applied {total} change(s)."));

    let spinner = progress::spinner("Refreshing local catalog...", ctx.quiet);
    let refreshed = fetch_all(&client);
    spinner.finish_and_clear();
    store::save(&ctx.config, &refreshed?)?;
    ui::success(&format!(
        "Wrote {} with the provider's current state.",
        ctx.config.display()
    ));
    Ok(())
}
