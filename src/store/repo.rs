use anyhow::Result;
use chrono::NaiveDateTime;

use crate::domain::filter::Restriction;

pub trait MailFolder: Sized {
    fn name(&self) -> &str;
    /// Full path for display, e.g. `\\mailbox\Inbox\Imaging`.
    fn folder_path(&self) -> String;
    fn subfolders(&self) -> Result<Vec<Self>>;
}

pub trait MailMessage {
    fn subject(&self) -> &str;
    fn body(&self) -> Result<String>;
    /// Local time the message was received.
    fn received(&self) -> NaiveDateTime;
    fn is_unread(&self) -> bool;
    fn mark_read(&mut self) -> Result<()>;
}

/// A desktop mail store: one default mailbox, queried folder by folder.
pub trait MailStore {
    type Folder: MailFolder;
    type Message: MailMessage;

    /// Root of the default mailbox.
    fn root_folder(&self) -> Result<Self::Folder>;

    fn item_count(&self, folder: &Self::Folder) -> Result<usize>;

    /// Items of `folder` matching `restriction`, in no particular order.
    fn restrict(
        &self,
        folder: &Self::Folder,
        restriction: &Restriction,
    ) -> Result<Vec<Self::Message>>;

    /// Matching items, newest first.
    fn query_sorted(
        &self,
        folder: &Self::Folder,
        restriction: &Restriction,
    ) -> Result<Vec<Self::Message>> {
        let mut items = self.restrict(folder, restriction)?;
        items.sort_by(|a, b| b.received().cmp(&a.received()));
        Ok(items)
    }
}
