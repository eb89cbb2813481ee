//! cli::commands::import_cmd
//!
//! Import commands: copying files into the project and ingesting database
//! dumps.

use std::fs;
use std::io;
use std::path::{Component, Path};

use crate::config::files;
use crate::context::CliContext;
use crate::error::CliError;
use crate::ui::output;

/// Names registered for the import group.
pub const COMMAND_NAMES: &[&str] = &["import files", "import db"];

/// Copy a file or directory tree into the project folder.
pub fn files(ctx: &CliContext, source: &Path, target: &str) -> Result<(), CliError> {
    let project = ctx.require_project()?;

    if !source.exists() {
        return Err(CliError::new(
            format!("Source path '{}' does not exist.", source.display()),
            ctx,
        ));
    }

    let target_rel = Path::new(target);
    let escapes = target_rel.is_absolute()
        || target_rel
            .components()
            .any(|c| matches!(c, Component::ParentDir));
    if escapes {
        return Err(CliError::new(
            "The target must be a relative path inside the project folder.",
            ctx,
        ));
    }

    let destination = project.folder().join(target_rel);
    let copied = copy_tree(source, &destination).map_err(|err| {
        CliError::with_cause(
            format!("Failed to copy into '{}'.", destination.display()),
            ctx,
            err,
        )
    })?;

    output::plain(format!(
        "Imported {} file(s) into {}.",
        copied,
        destination.display()
    ));
    Ok(())
}

/// Import a database dump into the database service.
pub fn db(ctx: &CliContext, dump: &Path) -> Result<(), CliError> {
    let project = ctx.require_project()?;
    let engine = ctx.require_engine()?;
    let Some((service, _)) = project.db_service() else {
        return Err(CliError::new(
            "The app does not define a service with the 'db' role.",
            ctx,
        ));
    };

    if !dump.is_file() {
        return Err(CliError::new(
            format!("Dump file '{}' does not exist.", dump.display()),
            ctx,
        ));
    }
    let Some(file_name) = dump.file_name() else {
        return Err(CliError::new(
            format!("'{}' is not a usable dump path.", dump.display()),
            ctx,
        ));
    };

    // Stage the dump inside the project so the engine never reads from
    // arbitrary host paths.
    let staging_dir = files::imports_dir(project.folder());
    fs::create_dir_all(&staging_dir).map_err(|err| {
        CliError::with_cause("Failed to create the import staging directory.", ctx, err)
    })?;
    let staged = staging_dir.join(file_name);
    fs::copy(dump, &staged).map_err(|err| {
        CliError::with_cause("Failed to stage the dump file.", ctx, err)
    })?;

    output::plain(format!(
        "Importing '{}' into service '{}'...",
        file_name.to_string_lossy(),
        service
    ));
    ctx.block_on(engine.import_db(project, service, &staged))?
        .map_err(|err| {
            CliError::with_cause("Failed to import the database dump.", ctx, err)
        })?;

    output::plain("Database import finished.");
    Ok(())
}

/// Recursively copy `source` into `destination`, returning the number of
/// files copied. Directories are created as needed; symlinks are skipped.
fn copy_tree(source: &Path, destination: &Path) -> io::Result<usize> {
    let metadata = fs::symlink_metadata(source)?;
    if metadata.file_type().is_symlink() {
        return Ok(0);
    }
    if metadata.is_file() {
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(source, destination)?;
        return Ok(1);
    }

    fs::create_dir_all(destination)?;
    let mut copied = 0;
    for entry in fs::read_dir(source)? {
        let entry = entry?;
        copied += copy_tree(&entry.path(), &destination.join(entry.file_name()))?;
    }
    Ok(copied)
}
