//! Git hooks that block commits and pushes on protected branches
//!
//! These back up the engine's own guards for anyone committing by hand in
//! the watched checkout.

use eyre::{Result, bail};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Marker line identifying hooks written by branchwarden
pub const HOOK_MARKER: &str = "# managed-by: branchwarden";

/// Outcome for one hook file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookInstall {
    /// Written (new or replacing an earlier branchwarden hook)
    Installed(PathBuf),
    /// Left alone because a foreign hook already exists
    SkippedForeign(PathBuf),
}

fn protected_list(protected: &BTreeSet<String>) -> String {
    protected.iter().map(|b| format!("\"{}\"", b)).collect::<Vec<_>>().join(" ")
}

fn pre_commit_script(protected: &BTreeSet<String>) -> String {
    format!(
        r#"#!/bin/sh
{marker}
branch=$(git branch --show-current)
for protected in {list}; do
    if [ "$branch" = "$protected" ]; then
        echo "branchwarden: direct commits to '$branch' are blocked, use a branch" >&2
        exit 1
    fi
done
exit 0
"#,
        marker = HOOK_MARKER,
        list = protected_list(protected),
    )
}

fn pre_push_script(protected: &BTreeSet<String>) -> String {
    format!(
        r#"#!/bin/sh
{marker}
while read local_ref local_sha remote_ref remote_sha; do
    for protected in {list}; do
        if [ "$remote_ref" = "refs/heads/$protected" ]; then
            echo "branchwarden: pushing to '$protected' is blocked, open a pull request" >&2
            exit 1
        fi
    done
done
exit 0
"#,
        marker = HOOK_MARKER,
        list = protected_list(protected),
    )
}

/// Write `pre-commit` and `pre-push` hooks into `<repo>/.git/hooks`
///
/// Existing hooks without the branchwarden marker are never overwritten.
pub fn install_hooks(repo: &Path, protected: &BTreeSet<String>) -> Result<Vec<HookInstall>> {
    debug!(?repo, ?protected, "install_hooks: called");
    let git_dir = repo.join(".git");
    if !git_dir.is_dir() {
        bail!("Not a git checkout with a .git directory: {}", repo.display());
    }

    let hooks_dir = git_dir.join("hooks");
    fs::create_dir_all(&hooks_dir)?;

    let mut results = Vec::new();
    for (name, script) in [
        ("pre-commit", pre_commit_script(protected)),
        ("pre-push", pre_push_script(protected)),
    ] {
        let path = hooks_dir.join(name);

        if path.exists() {
            let existing = fs::read_to_string(&path).unwrap_or_default();
            if !existing.contains(HOOK_MARKER) {
                warn!(hook = %path.display(), "Existing hook not managed by branchwarden, leaving it alone");
                results.push(HookInstall::SkippedForeign(path));
                continue;
            }
        }

        fs::write(&path, script)?;
        make_executable(&path)?;
        info!(hook = %path.display(), "Installed git hook");
        results.push(HookInstall::Installed(path));
    }

    Ok(results)
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms)?;
    Ok(())
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn protected() -> BTreeSet<String> {
        ["main", "master"].iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_scripts_mention_protected_branches() {
        let script = pre_commit_script(&protected());
        assert!(script.starts_with("#!/bin/sh"));
        assert!(script.contains(HOOK_MARKER));
        assert!(script.contains("for protected in \"main\" \"master\"; do"));

        let script = pre_push_script(&protected());
        assert!(script.contains("refs/heads/$protected"));
    }

    #[test]
    fn test_install_requires_git_dir() {
        let dir = tempdir().unwrap();
        assert!(install_hooks(dir.path(), &protected()).is_err());
    }

    #[test]
    fn test_install_writes_hooks() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join(".git")).unwrap();

        let results = install_hooks(dir.path(), &protected()).unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| matches!(r, HookInstall::Installed(_))));

        let hook = fs::read_to_string(dir.path().join(".git/hooks/pre-commit")).unwrap();
        assert!(hook.contains(HOOK_MARKER));

        // Reinstalling replaces our own hooks
        let again = install_hooks(dir.path(), &protected()).unwrap();
        assert!(again.iter().all(|r| matches!(r, HookInstall::Installed(_))));
    }

    #[test]
    fn test_install_skips_foreign_hook() {
        let dir = tempdir().unwrap();
        let hooks = dir.path().join(".git").join("hooks");
        fs::create_dir_all(&hooks).unwrap();
        fs::write(hooks.join("pre-commit"), "#!/bin/sh\nnpm test\n").unwrap();

        let results = install_hooks(dir.path(), &protected()).unwrap();
        assert_eq!(results[0], HookInstall::SkippedForeign(hooks.join("pre-commit")));
        assert_eq!(results[1], HookInstall::Installed(hooks.join("pre-push")));
        assert_eq!(fs::read_to_string(hooks.join("pre-commit")).unwrap(), "#!/bin/sh\nnpm test\n");
    }
}
