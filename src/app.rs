use std::io::Write;

use log::info;

use crate::domain::filter::{FilterSpec, build_filter};
use crate::error::{Error, Result};
use crate::mail::folders::find_folder_recursive;
use crate::processor::{BatchSummary, ProcessOptions, process_batch};
use crate::store::repo::{MailFolder, MailStore};

pub struct RunRequest {
    pub folder_name: String,
    /// Only check that the folder can be found, then report its size.
    pub test_connection: bool,
    pub filter: FilterSpec,
    pub options: ProcessOptions,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    ConnectionOk { folder: String, items: usize },
    Batch(BatchSummary),
}

pub fn run<S: MailStore, W: Write>(store: &S, request: &RunRequest, out: &mut W) -> Result<RunOutcome> {
    info!(
        "Attempting to find folder '{}' in default mailbox...",
        request.folder_name
    );
    let root = store
        .root_folder()
        .map_err(|e| Error::FolderAccess(format!("{e:#}")))?;
    let folder = find_folder_recursive(root, &request.folder_name)
        .map_err(|e| Error::FolderAccess(format!("{e:#}")))?
        .ok_or_else(|| Error::FolderNotFound(request.folder_name.clone()))?;
    info!(
        "Successfully accessed folder: '{}' (Full Path: {})",
        folder.name(),
        folder.folder_path()
    );

    if request.test_connection {
        let items = store
            .item_count(&folder)
            .map_err(|e| Error::FolderAccess(format!("{e:#}")))?;
        writeln!(
            out,
            "SUCCESS: Successfully connected to the mail store and found folder '{}'. It contains {items} total items.",
            folder.name()
        )?;
        return Ok(RunOutcome::ConnectionOk {
            folder: folder.name().to_string(),
            items,
        });
    }

    let restriction = build_filter(&request.filter);
    info!("Using filter: {restriction}");

    let messages = store
        .query_sorted(&folder, &restriction)
        .map_err(|e| Error::FilterApplication(format!("{e:#}")))?;
    info!("Found {} item(s) matching filter.", messages.len());

    let summary = process_batch(messages, &request.options, out);
    info!("Finished. Processed {} emails.", summary.processed);
    Ok(RunOutcome::Batch(summary))
}
