//! Executable resolution and PATH construction for provider processes.
//!
//! - Resolve a bare command name against PATH, or validate an explicit path
//! - Build the effective PATH handed to the child (exe dir, provider PATH,
//!   current PATH, platform defaults)

use std::collections::HashSet;
use std::env;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

/// Default paths to include on macOS when PATH is limited (bundled apps)
#[cfg(target_os = "macos")]
const MACOS_DEFAULT_PATHS: &[&str] = &[
    "/opt/homebrew/bin",
    "/usr/local/bin",
    "/usr/bin",
    "/bin",
    "/usr/sbin",
    "/sbin",
];

/// Locate the executable for `command`.
///
/// A command containing a path separator is taken as a path and must name
/// an existing executable file. A bare name is searched in `search_path`
/// (falling back to the current process PATH).
pub fn resolve_command(command: &str, search_path: Option<&OsStr>) -> Result<PathBuf, String> {
    if command.trim().is_empty() {
        return Err("Command cannot be empty".to_string());
    }

    let candidate = Path::new(command);
    if candidate.components().count() > 1 || candidate.is_absolute() {
        check_executable(candidate)?;
        return Ok(candidate.to_path_buf());
    }

    let search = search_path
        .map(OsStr::to_os_string)
        .or_else(|| env::var_os("PATH"))
        .unwrap_or_default();

    env::split_paths(&search)
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(|dir| dir.join(command))
        .find(|path| check_executable(path).is_ok())
        .ok_or_else(|| format!("Executable not found in PATH: {command}"))
}

/// Check that `path` is an existing, executable file.
fn check_executable(path: &Path) -> Result<(), String> {
    let display = path.display();

    if !path.exists() {
        return Err(format!("Executable not found: {display}"));
    }

    if !path.is_file() {
        return Err(format!("Executable path is not a file: {display}"));
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let metadata =
            std::fs::metadata(path).map_err(|e| format!("Failed to check permissions: {e}"))?;
        if metadata.permissions().mode() & 0o111 == 0 {
            return Err(format!("File is not executable: {display}"));
        }
    }

    Ok(())
}

/// Build an effective PATH for the child process.
///
/// Order: directory of the executable, `provider_path` entries, current
/// process PATH, then platform defaults. Entries are deduplicated.
pub fn build_effective_path(exe: &Path, provider_path: Option<&OsStr>) -> OsString {
    let mut entries: Vec<PathBuf> = Vec::new();

    if let Some(dir) = exe.parent().filter(|d| !d.as_os_str().is_empty()) {
        entries.push(dir.to_path_buf());
    }

    if let Some(extra) = provider_path {
        entries.extend(env::split_paths(extra));
    }

    if let Some(current) = env::var_os("PATH") {
        entries.extend(env::split_paths(&current));
    }

    #[cfg(target_os = "macos")]
    entries.extend(MACOS_DEFAULT_PATHS.iter().map(PathBuf::from));

    let mut seen = HashSet::new();
    let deduped: Vec<PathBuf> = entries
        .into_iter()
        .filter(|entry| !entry.as_os_str().is_empty())
        .filter(|entry| seen.insert(entry.clone()))
        .collect();

    env::join_paths(deduped).unwrap_or_else(|_| env::var_os("PATH").unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_rejects_empty() {
        assert!(resolve_command("  ", None).is_err());
    }

    #[test]
    fn test_resolve_rejects_nonexistent_path() {
        let err = resolve_command("/nonexistent/path/to/exe", None).unwrap_err();
        assert!(err.contains("not found"));
    }

    #[test]
    fn test_resolve_unknown_name() {
        let err = resolve_command("mcpvisor-definitely-missing-binary", None).unwrap_err();
        assert!(err.contains("not found in PATH"));
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_bare_name_via_search_path() {
        let resolved = resolve_command("sh", Some(OsStr::new("/nonexistent:/bin:/usr/bin"))).unwrap();
        assert!(resolved.ends_with("sh"));
        assert!(resolved.is_absolute());
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_rejects_non_executable_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("not-exec");
        std::fs::write(&file, "echo hi").unwrap();

        let err = resolve_command(file.to_str().unwrap(), None).unwrap_err();
        assert!(err.contains("not executable"));
    }

    #[cfg(unix)]
    #[test]
    fn test_build_effective_path_includes_exe_dir_first() {
        let path = build_effective_path(Path::new("/opt/tools/bin/mcp-fs"), None);
        let first = env::split_paths(&path).next().unwrap();
        assert_eq!(first, PathBuf::from("/opt/tools/bin"));
    }

    #[cfg(unix)]
    #[test]
    fn test_build_effective_path_deduplicates() {
        let path = build_effective_path(
            Path::new("/usr/bin/node"),
            Some(OsStr::new("/usr/bin:/custom/path")),
        );
        let entries: Vec<PathBuf> = env::split_paths(&path).collect();
        let count = entries.iter().filter(|e| *e == Path::new("/usr/bin")).count();
        assert_eq!(count, 1, "PATH should deduplicate /usr/bin");
        assert!(entries.contains(&PathBuf::from("/custom/path")));
    }
}
