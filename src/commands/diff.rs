//! `tarifa diff` - show what sync would change.

use crate::context::ProjectContext;
use crate::{progress, render, ui};
use anyhow::Result;
use catalog::store;
use provider::Client;
use reconcile::{diff, fetch_all};

pub fn run(ctx: &ProjectContext) -> Result<()> {
    let local = store::load(&ctx.config)?;
    let client = Client::from_env()?;

    let spinner = progress::spinner("Fetching remote catalog...", ctx.quiet);
    let remote = fetch_all(&client);
    spinner.finish_and_clear();
    let remote = remote?;

    let result = diff(&local, &remote);
    render::warnings(&result.warnings);

    if result.changes.is_empty() {
        ui::success("Catalog is in sync with the provider.");
        return Ok(());
    }

    render::changes(&result.changes);
    println!();
    println!("{}", render::summary(&result.changes));
    Ok(())
}
