//! `nova deps`: bring the SDL2 dependencies up to date

use super::Session;
use crate::output::DownloadBar;
use anyhow::{Context, Result};
use nova_deps::manager::force_clear;
use nova_deps::{DependencyManager, DependencyTable, HttpFetcher};

pub fn run(session: &Session) -> Result<i32> {
    ensure(session)?;
    Ok(0)
}

/// Check the deps directory and download whatever is missing
pub fn ensure(session: &Session) -> Result<DependencyTable> {
    let root = &session.paths.deps;

    if session.settings.force_deps {
        force_clear(root)?;
        session.out.info("Removed all dependencies");
    }

    let mut table = DependencyTable::builtin(root, session.platform.is_windows());
    table.check();

    let missing = table.missing(None);
    if missing == 0 {
        session.out.info("All dependencies are satisfied.");
        return Ok(table);
    }
    session
        .out
        .info(format!("Missing {missing} dependency files."));

    let manager = DependencyManager::new(HttpFetcher::new()?);
    let mut progress = DownloadBar::new(session.out);
    let report = manager
        .satisfy(&mut table, &mut progress)
        .context("Failed to download dependencies")?;

    session.out.done(format!(
        "Dependencies are satisfied ({} downloads, {} components) in {:.2}s",
        report.downloads,
        report.extracted.len(),
        report.elapsed.as_secs_f64()
    ));
    Ok(table)
}
