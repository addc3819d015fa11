//! Deterministic directory walk.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{PackError, Result};
use crate::io::{EntryKind, FileSystem};

use super::filter::ExclusionRules;

/// A file that will become one archive entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectedFile {
    /// Where to read the bytes from.
    pub source: PathBuf,
    /// `root/relative/path`, always `/`-separated.
    pub archive_name: String,
}

/// Directory still to be listed, with its path relative to the root.
struct Pending {
    path: PathBuf,
    relative: String,
}

enum Step {
    Visit(Pending),
    Emit(CollectedFile),
}

/// Walk `source_dir` and return every file that survives `rules`, named
/// `root_name/<relative path>`.
///
/// Children are visited in byte order of their names, depth first, so a
/// given tree always yields the same sequence. Excluded directories are not
/// entered. Symbolic links and special files are skipped.
pub async fn collect<F>(
    fs: &F,
    source_dir: &Path,
    root_name: &str,
    rules: &ExclusionRules,
) -> Result<Vec<CollectedFile>>
where
    F: FileSystem + ?Sized,
{
    let mut files = Vec::new();
    let mut stack = vec![Step::Visit(Pending {
        path: source_dir.to_path_buf(),
        relative: String::new(),
    })];

    while let Some(step) = stack.pop() {
        let dir = match step {
            Step::Emit(file) => {
                files.push(file);
                continue;
            }
            Step::Visit(dir) => dir,
        };

        let mut children = fs
            .read_dir(&dir.path)
            .await
            .map_err(|e| PackError::source_not_found(&dir.path, e))?;
        children.sort_by(|a, b| a.name.cmp(&b.name));

        let mut steps = Vec::with_capacity(children.len());
        for child in children {
            let relative = if dir.relative.is_empty() {
                child.name.clone()
            } else {
                format!("{}/{}", dir.relative, child.name)
            };

            match child.kind {
                EntryKind::Dir if rules.is_excluded_dir(&child.name) => {
                    debug!(path = %relative, "skipping excluded directory");
                }
                EntryKind::Dir => steps.push(Step::Visit(Pending {
                    path: child.path,
                    relative,
                })),
                EntryKind::File if rules.should_exclude_in(root_name, &relative) => {
                    debug!(path = %relative, "excluded");
                }
                EntryKind::File => steps.push(Step::Emit(CollectedFile {
                    source: child.path,
                    archive_name: format!("{}/{}", root_name, relative),
                })),
                EntryKind::Other => {
                    debug!(path = %relative, "skipping link or special file");
                }
            }
        }

        // Reverse so the smallest name is popped first.
        stack.extend(steps.into_iter().rev());
    }

    Ok(files)
}
