//! Package file discovery

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::env::Environment;

/// Set by build steps that produced an IPA
pub const IPA_OUTPUT_PATH: &str = "IPA_OUTPUT_PATH";
/// Set by build steps that produced an APK
pub const GRADLE_APK_OUTPUT_PATH: &str = "GRADLE_APK_OUTPUT_PATH";

/// Pick the package to upload
///
/// Order: the explicit path, `IPA_OUTPUT_PATH`, the last `*.ipa` in
/// `working_dir`, `GRADLE_APK_OUTPUT_PATH`, the last `*.apk`. The first
/// candidate wins even if it does not exist; callers check existence.
pub fn resolve_package_file(
    explicit: Option<&Path>,
    working_dir: &Path,
    env: &dyn Environment,
) -> Option<PathBuf> {
    let candidate = explicit
        .map(Path::to_path_buf)
        .or_else(|| env.non_empty(IPA_OUTPUT_PATH).map(PathBuf::from))
        .or_else(|| last_match(working_dir, "ipa"))
        .or_else(|| env.non_empty(GRADLE_APK_OUTPUT_PATH).map(PathBuf::from))
        .or_else(|| last_match(working_dir, "apk"))?;

    let resolved = if candidate.is_relative() {
        working_dir.join(candidate)
    } else {
        candidate
    };
    debug!(file = %resolved.display(), "resolved package file");
    Some(resolved)
}

fn last_match(dir: &Path, extension: &str) -> Option<PathBuf> {
    let pattern = format!(
        "{}/*.{}",
        glob::Pattern::escape(&dir.to_string_lossy()),
        extension
    );
    glob::glob(&pattern)
        .ok()?
        .filter_map(|entry| entry.ok())
        .filter(|path| path.is_file())
        .last()
}
