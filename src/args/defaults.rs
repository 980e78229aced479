pub(crate) const DEFAULT_USER_AGENT: &str = concat!("stagerun/", env!("CARGO_PKG_VERSION"));

/// Config filenames probed in the working directory when `--config` is absent.
pub(crate) const DEFAULT_CONFIG_FILES: [&str; 2] = ["stagerun.toml", "stagerun.json"];
