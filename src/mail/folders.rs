use anyhow::Result;
use log::warn;

use crate::store::repo::MailFolder;

/// Deepest level the resolver descends to below the root.
pub const MAX_FOLDER_DEPTH: usize = 256;

/// Case-insensitive depth-first search: the folder itself first, then its
/// children in the order the store lists them. Returns the first match.
pub fn find_folder_recursive<F: MailFolder>(root: F, target_name: &str) -> Result<Option<F>> {
    let target = target_name.to_lowercase();
    let mut stack = vec![(root, 0usize)];
    let mut depth_warned = false;

    while let Some((folder, depth)) = stack.pop() {
        if folder.name().to_lowercase() == target {
            return Ok(Some(folder));
        }
        if depth >= MAX_FOLDER_DEPTH {
            if !depth_warned {
                warn!(
                    "Folder tree deeper than {MAX_FOLDER_DEPTH} levels; not descending below '{}'",
                    folder.folder_path()
                );
                depth_warned = true;
            }
            continue;
        }
        // reversed so the first child is popped first
        for child in folder.subfolders()?.into_iter().rev() {
            stack.push((child, depth + 1));
        }
    }

    Ok(None)
}
