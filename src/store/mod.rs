pub mod maildir;
pub mod repo;
