//! Mail store backed by the Maildir tree a desktop client keeps on disk.
//!
//! Every folder is a directory. A folder that holds mail has `cur/`, `new/`
//! and `tmp/` inside; any other directory below it is a subfolder. Listing,
//! flags and the move into `cur/` go through the `maildir` crate. The nested
//! layout is walked here because the crate only knows Maildir++ dot folders.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Local, NaiveDateTime};
use log::{debug, warn};
use maildir::{MailEntry, Maildir};

use crate::domain::filter::Restriction;
use crate::error::Error;
use crate::mail::decoders::{extract_body_text, read_headers};
use crate::store::repo::{MailFolder, MailMessage, MailStore};

const MAILDIR_SUBDIRS: [&str; 3] = ["cur", "new", "tmp"];

/// Flag for a message the user has seen.
const SEEN: &str = "S";

pub struct MaildirStore {
    root: PathBuf,
}

impl MaildirStore {
    pub fn connect(root: impl Into<PathBuf>) -> Result<Self, Error> {
        let root = root.into();
        let connection_error = |reason: String| Error::Connection {
            root: root.display().to_string(),
            reason,
        };
        let meta = fs::metadata(&root).map_err(|e| connection_error(e.to_string()))?;
        if !meta.is_dir() {
            return Err(connection_error("not a directory".to_string()));
        }
        fs::read_dir(&root).map_err(|e| connection_error(e.to_string()))?;
        Ok(Self { root })
    }
}

#[derive(Debug, Clone)]
pub struct MaildirFolder {
    name: String,
    path: PathBuf,
    display_path: String,
}

impl MaildirFolder {
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn maildir(&self) -> Maildir {
        Maildir::from(self.path.clone())
    }

    fn holds_mail(&self) -> bool {
        self.path.join("cur").is_dir() || self.path.join("new").is_dir()
    }
}

impl MailFolder for MaildirFolder {
    fn name(&self) -> &str {
        &self.name
    }

    fn folder_path(&self) -> String {
        self.display_path.clone()
    }

    /// Child directories, sorted by name. Symlinks are not followed, so a
    /// link pointing back up the tree cannot make the walk revisit it.
    fn subfolders(&self) -> Result<Vec<Self>> {
        let entries = fs::read_dir(&self.path)
            .with_context(|| format!("listing folder {}", self.path.display()))?;

        let mut children = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let path = entry.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if MAILDIR_SUBDIRS.contains(&name) || name.starts_with('.') {
                continue;
            }
            children.push(MaildirFolder {
                name: name.to_string(),
                display_path: format!("{}\\{}", self.display_path, name),
                path: path.clone(),
            });
        }
        children.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(children)
    }
}

#[derive(Debug, Clone)]
pub struct MaildirMessage {
    folder: PathBuf,
    id: String,
    path: PathBuf,
    in_new: bool,
    subject: String,
    received: NaiveDateTime,
    unread: bool,
}

impl MaildirMessage {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MailMessage for MaildirMessage {
    fn subject(&self) -> &str {
        &self.subject
    }

    fn body(&self) -> Result<String> {
        let raw = fs::read(&self.path).with_context(|| format!("reading {}", self.path.display()))?;
        extract_body_text(&raw)
    }

    fn received(&self) -> NaiveDateTime {
        self.received
    }

    fn is_unread(&self) -> bool {
        self.unread
    }

    /// Sets the Seen flag, moving mail out of `new/` first.
    fn mark_read(&mut self) -> Result<()> {
        if !self.unread {
            return Ok(());
        }
        let maildir = Maildir::from(self.folder.clone());
        let flagged = if self.in_new {
            maildir.move_new_to_cur_with_flags(&self.id, SEEN)
        } else {
            maildir.add_flags(&self.id, SEEN)
        };
        flagged.with_context(|| format!("marking {} as read", self.path.display()))?;

        let moved = maildir
            .find(&self.id)
            .ok_or_else(|| anyhow!("message {} vanished after marking it read", self.id))?;
        self.path = moved.path().to_path_buf();
        self.in_new = false;
        self.unread = false;
        Ok(())
    }
}

impl MailStore for MaildirStore {
    type Folder = MaildirFolder;
    type Message = MaildirMessage;

    fn root_folder(&self) -> Result<MaildirFolder> {
        let name = self
            .root
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| anyhow!("mailbox root {} has no usable name", self.root.display()))?
            .to_string();
        Ok(MaildirFolder {
            display_path: format!("\\\\{name}"),
            name,
            path: self.root.clone(),
        })
    }

    fn item_count(&self, folder: &MaildirFolder) -> Result<usize> {
        if !folder.holds_mail() {
            return Ok(0);
        }
        let maildir = folder.maildir();
        Ok(maildir.count_new() + maildir.count_cur())
    }

    fn restrict(
        &self,
        folder: &MaildirFolder,
        restriction: &Restriction,
    ) -> Result<Vec<MaildirMessage>> {
        if !folder.holds_mail() {
            debug!("'{}' holds no mail directories", folder.display_path);
            return Ok(Vec::new());
        }

        let maildir = folder.maildir();
        let new = maildir.list_new().map(|entry| (entry, true));
        let cur = maildir.list_cur().map(|entry| (entry, false));

        let mut out = Vec::new();
        for (entry, in_new) in new.chain(cur) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unrecognised file in {}: {e}", folder.path.display());
                    continue;
                }
            };
            let unread = in_new || !entry.is_seen();
            if restriction.unread_only && !unread {
                continue;
            }
            let message = match load_message(&folder.path, &entry, in_new, unread) {
                Ok(m) => m,
                Err(e) => {
                    warn!(
                        "Skipping unreadable message file {}: {e:#}",
                        entry.path().display()
                    );
                    continue;
                }
            };
            if restriction.matches(message.unread, message.received, &message.subject) {
                out.push(message);
            }
        }
        Ok(out)
    }
}

fn load_message(
    folder: &Path,
    entry: &MailEntry,
    in_new: bool,
    unread: bool,
) -> Result<MaildirMessage> {
    let path = entry.path();
    let raw = fs::read(path)?;
    let headers = read_headers(&raw)?;
    let received = match headers.date_epoch.and_then(local_time) {
        Some(t) => t,
        None => {
            let modified = fs::metadata(path)?.modified()?;
            DateTime::<Local>::from(modified).naive_local()
        }
    };
    Ok(MaildirMessage {
        folder: folder.to_path_buf(),
        id: entry.id().to_string(),
        path: path.to_path_buf(),
        in_new,
        subject: headers.subject,
        received,
        unread,
    })
}

fn local_time(epoch: i64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp(epoch, 0).map(|utc| utc.with_timezone(&Local).naive_local())
}
