// Default file locations

use std::path::{Path, PathBuf};

pub const APP_DIR: &str = "stainplan";
pub const RUN_SETTING_FILE: &str = "runsetting.json";
pub const TEMPLATE_FILE: &str = "template_base.xml";
pub const MAPPER_FILE: &str = "mapper.json";

/// `~/.config/stainplan` (platform equivalent), or `./stainplan` when the
/// platform has no config directory.
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

pub fn default_run_setting_path() -> PathBuf {
    config_dir().join(RUN_SETTING_FILE)
}

/// Resolve `path` against `workdir` unless it is already absolute.
pub fn resolve(workdir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        workdir.join(path)
    }
}

/// Locate a support file (template, dye mapping) that was not given
/// explicitly.
///
/// Looked up in `workdir` first, then in the config directory. When neither
/// exists the workdir candidate is returned so the "not found" error names
/// the place most users expect.
pub fn find_asset(workdir: &Path, file_name: &str) -> PathBuf {
    find_asset_in(workdir, &config_dir(), file_name)
}

fn find_asset_in(workdir: &Path, config_dir: &Path, file_name: &str) -> PathBuf {
    let local = workdir.join(file_name);
    if local.exists() {
        return local;
    }
    let global = config_dir.join(file_name);
    if global.exists() {
        log::debug!("using {} from {}", file_name, config_dir.display());
        return global;
    }
    local
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_resolve_relative_and_absolute() {
        let work = Path::new("/work");
        assert_eq!(resolve(work, Path::new("plan.xlsx")), PathBuf::from("/work/plan.xlsx"));
        assert_eq!(resolve(work, Path::new("/data/plan.xlsx")), PathBuf::from("/data/plan.xlsx"));
    }

    #[test]
    fn test_find_asset_prefers_workdir() {
        let work = tempdir().unwrap();
        let conf = tempdir().unwrap();

        // Neither exists: workdir candidate
        assert_eq!(find_asset_in(work.path(), conf.path(), MAPPER_FILE), work.path().join(MAPPER_FILE));

        fs::write(conf.path().join(MAPPER_FILE), "{}").unwrap();
        assert_eq!(find_asset_in(work.path(), conf.path(), MAPPER_FILE), conf.path().join(MAPPER_FILE));

        fs::write(work.path().join(MAPPER_FILE), "{}").unwrap();
        assert_eq!(find_asset_in(work.path(), conf.path(), MAPPER_FILE), work.path().join(MAPPER_FILE));
    }

    #[test]
    fn test_default_paths_end_with_app_dir() {
        assert!(default_run_setting_path().ends_with("stainplan/runsetting.json"));
    }
}
