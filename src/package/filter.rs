//! Which files are left out of a package.
//!
//! Rules are checked in order and the first match wins:
//!
//! 1. any path segment is an excluded directory (`__pycache__`,
//!    `node_modules`, `.git`)
//! 2. the first directory inside the package root is `evals` or `tests`;
//!    deeper directories with those names are kept
//! 3. the file name is `.DS_Store` or `.gitkeep`
//! 4. the extension is exactly `pyc` (`data.pyclone` is kept)

pub const EXCLUDED_DIRS: &[&str] = &["__pycache__", "node_modules", ".git"];
pub const ROOT_EXCLUDED_DIRS: &[&str] = &["evals", "tests"];
pub const EXCLUDED_FILES: &[&str] = &[".DS_Store", ".gitkeep"];
pub const EXCLUDED_EXTENSIONS: &[&str] = &["pyc"];

/// A fixed set of exclusion rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusionRules {
    pub dirs: &'static [&'static str],
    pub root_dirs: &'static [&'static str],
    pub files: &'static [&'static str],
    pub extensions: &'static [&'static str],
}

impl Default for ExclusionRules {
    fn default() -> Self {
        Self {
            dirs: EXCLUDED_DIRS,
            root_dirs: ROOT_EXCLUDED_DIRS,
            files: EXCLUDED_FILES,
            extensions: EXCLUDED_EXTENSIONS,
        }
    }
}

impl ExclusionRules {
    /// Whether a directory with this name is never entered.
    pub fn is_excluded_dir(&self, name: &str) -> bool {
        contains(self.dirs, name)
    }

    /// Check an archive path such as `pkg/scripts/run.py`.
    pub fn should_exclude(&self, archive_path: &str) -> bool {
        let segments: Vec<&str> = archive_path.split('/').collect();
        self.matches(&segments)
    }

    /// Check `relative` as it would appear under `root`.
    ///
    /// `root` counts as one segment even if it contains `/`, so the
    /// root-only rule always looks at the first directory of `relative`.
    pub fn should_exclude_in(&self, root: &str, relative: &str) -> bool {
        let segments: Vec<&str> = std::iter::once(root)
            .chain(relative.split('/'))
            .collect();
        self.matches(&segments)
    }

    fn matches(&self, segments: &[&str]) -> bool {
        if segments.iter().any(|s| self.is_excluded_dir(s)) {
            return true;
        }

        if segments.len() > 1 && contains(self.root_dirs, segments[1]) {
            return true;
        }

        let file_name = segments.last().copied().unwrap_or_default();
        if contains(self.files, file_name) {
            return true;
        }

        contains(self.extensions, extension(file_name))
    }
}

fn contains(set: &[&str], value: &str) -> bool {
    set.iter().any(|item| *item == value)
}

/// Text after the last `.`, or `""` when there is none.
fn extension(file_name: &str) -> &str {
    file_name
        .rfind('.')
        .map(|i| &file_name[i + 1..])
        .unwrap_or("")
}

/// [`ExclusionRules::should_exclude`] with the default rules.
pub fn should_exclude(archive_path: &str) -> bool {
    ExclusionRules::default().should_exclude(archive_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excluded_dirs_anywhere() {
        assert!(should_exclude("pkg/__pycache__/x.pyc"));
        assert!(should_exclude("pkg/scripts/node_modules/lib/index.js"));
        assert!(should_exclude("pkg/.git/HEAD"));
        assert!(!should_exclude("pkg/scripts/git/HEAD"));
    }

    #[test]
    fn root_only_dirs() {
        assert!(should_exclude("pkg/tests/t.py"));
        assert!(should_exclude("pkg/evals/case.json"));
        assert!(!should_exclude("pkg/scripts/tests/t.py"));
        assert!(!should_exclude("tests"));
    }

    #[test]
    fn excluded_file_names() {
        assert!(should_exclude("pkg/.DS_Store"));
        assert!(should_exclude("pkg/assets/.gitkeep"));
        assert!(!should_exclude("pkg/.gitignore"));
    }

    #[test]
    fn extension_must_match_exactly() {
        assert!(should_exclude("pkg/data.pyc"));
        assert!(!should_exclude("pkg/data.pyclone"));
        assert!(!should_exclude("pkg/data.PYC"));
        assert!(!should_exclude("pkg/pyc"));
        assert!(!should_exclude("pkg/Makefile"));
    }

    #[test]
    fn extension_of_names() {
        assert_eq!(extension("a.tar.gz"), "gz");
        assert_eq!(extension("README"), "");
        assert_eq!(extension("trailing."), "");
    }

    #[test]
    fn root_with_slash_is_one_segment() {
        let rules = ExclusionRules::default();
        // Split naively, "tests" would look like a nested directory.
        assert!(!rules.should_exclude("org/pkg/tests/t.py"));
        assert!(rules.should_exclude_in("org/pkg", "tests/t.py"));
        assert!(!rules.should_exclude_in("org/pkg", "scripts/tests/t.py"));
    }

    #[test]
    fn skill_tree_scenario() {
        let kept: Vec<&str> = [
            "pkg/SKILL.md",
            "pkg/scripts/a.py",
            "pkg/tests/t.py",
            "pkg/__pycache__/x.pyc",
            "pkg/.DS_Store",
        ]
        .into_iter()
        .filter(|p| !should_exclude(p))
        .collect();
        assert_eq!(kept, vec!["pkg/SKILL.md", "pkg/scripts/a.py"]);
    }
}
