//! Fatal errors. Each one ends the run with exit status 1; anything that
//! only affects a single message is logged and recovered instead.

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Could not connect to the mail store at '{root}'. Is it available? Error: {reason}")]
    Connection { root: String, reason: String },

    #[error("Could not find the folder named '{0}' anywhere in your default mailbox.")]
    FolderNotFound(String),

    #[error("An unexpected error occurred while trying to access mail folders. Error: {0}")]
    FolderAccess(String),

    #[error("Invalid {field} '{value}': expected YYYY-MM-DD or 'none'")]
    InvalidDate { field: &'static str, value: String },

    #[error("Failed to apply filter to folder items. Error: {0}")]
    FilterApplication(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Could not write output: {0}")]
    Output(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
