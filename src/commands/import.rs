use anyhow::Result;
use log::info;
use std::path::Path;

use crate::context::DigimallContext;

pub fn run(context: &DigimallContext, file: &Path) -> Result<()> {
    info!("import start (file={})", file.display());
    let backend = context.backend()?;
    let store = backend.file_store()?;
    let summary = store.import_file(file)?;
    println!(
        "Imported {} reviews ({} new, {} updated) into {}",
        summary.added + summary.updated,
        summary.added,
        summary.updated,
        store.db_path().display()
    );
    Ok(())
}
