use std::{fs, path::{Path, PathBuf}};

use serde::Deserialize;

use crate::{
    error::{Error, Result},
    fmt::ChangelogFormat,
    link_style::LinkStyle,
};

#[derive(Debug, Clone, Deserialize)]
pub struct RawCfg {
    pub changelog: RawChangelogCfg,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RawChangelogCfg {
    pub repository: Option<String>,
    pub link_style: LinkStyle,
    pub docs_dir: Option<PathBuf>,
    pub base_url: Option<String>,
    pub max_buffer: Option<usize>,
    pub timeout_secs: Option<u64>,
    pub out_dir: Option<PathBuf>,
    pub output_format: ChangelogFormat,
}

impl RawCfg {
    /// Reads and parses a TOML config file.
    pub fn from_file(path: &Path) -> Result<RawCfg> {
        let text = fs::read_to_string(path)?;
        RawCfg::from_toml(&text, path)
    }

    fn from_toml(text: &str, path: &Path) -> Result<RawCfg> {
        let value: toml::Value =
            toml::from_str(text).map_err(|e| Error::ConfigParse(path.to_path_buf(), e))?;
        if value.get("changelog").is_none() {
            return Err(Error::ConfigFormat(path.to_path_buf()));
        }
        value
            .try_into()
            .map_err(|e| Error::ConfigParse(path.to_path_buf(), e))
    }
}
