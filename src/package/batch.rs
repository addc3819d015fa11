//! Packaging every skill of a skills directory.
//!
//! A skill is a directory directly under the skills directory that does not
//! start with `.` and has a `SKILL.md` at its root. Each one becomes
//! `<outdir>/<name>.skill`. Skills are built concurrently and independently:
//! one failure never stops the others.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use crate::error::{PackError, Result};
use crate::io::{EntryKind, FileSystem};

use super::builder::{ArchiveStats, build_archive_with_stats, write_archive};

/// File that marks a directory as a skill.
pub const MANIFEST: &str = "SKILL.md";
/// Extension of written archives.
pub const ARCHIVE_EXTENSION: &str = "skill";

/// One skill to package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageTarget {
    pub name: String,
    pub source_dir: PathBuf,
}

/// A successfully written archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagedArchive {
    pub path: PathBuf,
    pub stats: ArchiveStats,
}

/// Outcome for one target.
#[derive(Debug)]
pub struct PackageReport {
    pub name: String,
    pub outcome: Result<PackagedArchive>,
}

/// Outcome of a whole batch, in target name order.
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub reports: Vec<PackageReport>,
}

impl BatchSummary {
    pub fn succeeded(&self) -> impl Iterator<Item = (&str, &PackagedArchive)> {
        self.reports
            .iter()
            .filter_map(|r| r.outcome.as_ref().ok().map(|a| (r.name.as_str(), a)))
    }

    pub fn failed(&self) -> impl Iterator<Item = (&str, &PackError)> {
        self.reports
            .iter()
            .filter_map(|r| r.outcome.as_ref().err().map(|e| (r.name.as_str(), e)))
    }

    pub fn is_success(&self) -> bool {
        self.failed().next().is_none()
    }
}

/// List the candidate skills under `skills_dir`, sorted by name.
pub async fn discover<F>(fs: &F, skills_dir: &Path) -> Result<Vec<PackageTarget>>
where
    F: FileSystem + ?Sized,
{
    let mut targets: Vec<PackageTarget> = fs
        .read_dir(skills_dir)
        .await
        .map_err(|e| PackError::source_not_found(skills_dir, e))?
        .into_iter()
        .filter(|e| e.kind == EntryKind::Dir && !e.name.starts_with('.'))
        .map(|e| PackageTarget {
            name: e.name,
            source_dir: e.path,
        })
        .collect();

    targets.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(targets)
}

/// Keep only the target called `name`, or all of them when `name` is `None`.
pub fn select(targets: Vec<PackageTarget>, name: Option<&str>) -> Result<Vec<PackageTarget>> {
    let Some(name) = name else {
        return Ok(targets);
    };

    let selected: Vec<_> = targets.into_iter().filter(|t| t.name == name).collect();
    if selected.is_empty() {
        return Err(PackError::SkillNotFound {
            name: name.to_string(),
        });
    }
    Ok(selected)
}

/// Where the archive for `name` goes.
pub fn archive_path(out_dir: &Path, name: &str) -> PathBuf {
    out_dir.join(format!("{}.{}", name, ARCHIVE_EXTENSION))
}

/// Build and write the archive for one target.
pub async fn package_one<F>(fs: &F, target: &PackageTarget, out_dir: &Path) -> Result<PackagedArchive>
where
    F: FileSystem + ?Sized,
{
    // A linked SKILL.md would be skipped by the collector, so only a
    // regular file counts.
    let has_manifest = fs
        .read_dir(&target.source_dir)
        .await
        .map_err(|e| PackError::source_not_found(&target.source_dir, e))?
        .iter()
        .any(|e| e.name == MANIFEST && e.kind == EntryKind::File);
    if !has_manifest {
        return Err(PackError::MissingManifest {
            path: target.source_dir.clone(),
        });
    }

    let (bytes, stats) = build_archive_with_stats(fs, &target.source_dir, &target.name).await?;
    let path = archive_path(out_dir, &target.name);
    write_archive(fs, &bytes, &path).await?;

    info!(
        skill = %target.name,
        path = %path.display(),
        entries = stats.entries,
        bytes = stats.bytes,
        "wrote archive"
    );
    Ok(PackagedArchive { path, stats })
}

/// Package every target concurrently and collect the outcomes.
pub async fn package_all<F>(fs: Arc<F>, targets: Vec<PackageTarget>, out_dir: &Path) -> BatchSummary
where
    F: FileSystem + ?Sized + 'static,
{
    let handles: Vec<_> = targets
        .into_iter()
        .map(|target| {
            let fs = Arc::clone(&fs);
            let out_dir = out_dir.to_path_buf();
            let name = target.name.clone();
            let handle =
                tokio::spawn(async move { package_one(fs.as_ref(), &target, &out_dir).await });
            (name, handle)
        })
        .collect();

    let mut summary = BatchSummary::default();
    for (name, handle) in handles {
        let outcome = match handle.await {
            Ok(outcome) => outcome,
            Err(e) => Err(PackError::TaskFailed(e.to_string())),
        };
        if let Err(e) = &outcome {
            warn!(skill = %name, error = %e, "packaging failed");
        }
        summary.reports.push(PackageReport { name, outcome });
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemoryFs;

    fn skills() -> MemoryFs {
        let fs = MemoryFs::new();
        fs.add_file("skills/beta/SKILL.md", "# beta")
            .add_file("skills/alpha/SKILL.md", "# alpha")
            .add_file("skills/alpha/scripts/run.py", "print()")
            .add_file("skills/.hidden/SKILL.md", "# hidden")
            .add_file("skills/README.md", "not a skill")
            .add_file("skills/nomanifest/notes.md", "no SKILL.md here");
        fs
    }

    #[tokio::test]
    async fn discovers_visible_directories_in_order() {
        let targets = discover(&skills(), Path::new("skills")).await.unwrap();
        let names: Vec<_> = targets.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "beta", "nomanifest"]);
        assert_eq!(targets[0].source_dir, Path::new("skills/alpha"));
    }

    #[tokio::test]
    async fn missing_skills_dir_is_source_not_found() {
        let err = discover(&MemoryFs::new(), Path::new("skills"))
            .await
            .unwrap_err();
        assert!(matches!(err, PackError::SourceNotFound { .. }));
    }

    #[tokio::test]
    async fn select_unknown_skill_fails() {
        let targets = discover(&skills(), Path::new("skills")).await.unwrap();
        assert_eq!(select(targets.clone(), None).unwrap().len(), 3);
        assert_eq!(select(targets.clone(), Some("beta")).unwrap()[0].name, "beta");
        assert!(matches!(
            select(targets, Some("gamma")),
            Err(PackError::SkillNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn one_failure_does_not_stop_the_batch() {
        let fs = Arc::new(skills());
        let targets = discover(fs.as_ref(), Path::new("skills")).await.unwrap();

        let summary = package_all(Arc::clone(&fs), targets, Path::new("dist")).await;

        let ok: Vec<_> = summary.succeeded().map(|(name, _)| name).collect();
        assert_eq!(ok, vec!["alpha", "beta"]);
        let failed: Vec<_> = summary.failed().collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].0, "nomanifest");
        assert!(matches!(failed[0].1, PackError::MissingManifest { .. }));
        assert!(!summary.is_success());

        assert!(fs.file("dist/alpha.skill").is_some());
        assert!(fs.file("dist/beta.skill").is_some());
        assert!(fs.file("dist/nomanifest.skill").is_none());

        let (_, alpha) = summary.succeeded().next().unwrap();
        assert_eq!(alpha.stats.entries, 2);
        assert_eq!(alpha.path, Path::new("dist/alpha.skill"));
    }

    #[tokio::test]
    async fn write_failures_are_reported_per_target() {
        let fs = MemoryFs::new().read_only();
        fs.add_file("skills/alpha/SKILL.md", "# alpha");
        let fs = Arc::new(fs);
        let targets = discover(fs.as_ref(), Path::new("skills")).await.unwrap();

        let summary = package_all(fs, targets, Path::new("dist")).await;
        assert!(matches!(
            summary.failed().next(),
            Some(("alpha", PackError::WriteFailure { .. }))
        ));
    }

    #[tokio::test]
    async fn linked_manifest_does_not_count() {
        let fs = MemoryFs::new();
        fs.add_other("skills/linked/SKILL.md")
            .add_file("skills/linked/scripts/run.py", "print()")
            .add_dir("skills/nested/SKILL.md");
        let targets = discover(&fs, Path::new("skills")).await.unwrap();

        for target in &targets {
            let err = package_one(&fs, target, Path::new("dist")).await.unwrap_err();
            assert!(matches!(err, PackError::MissingManifest { .. }));
        }
        assert_eq!(targets.len(), 2);
        assert!(fs.file("dist/linked.skill").is_none());
    }
}
