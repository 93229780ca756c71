use crate::{
    error::{Error, JsonOrigin, Result},
    steps::{Phrasing, StepPart},
};
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

pub const DEFAULT_DATA_DIR: &str = "tests/_data";

/// The only HTTP module the steps know how to drive.
pub const REQUIRED_MODULE: &str = "REST";

const DEPENDENCY_EXAMPLE: &str = r#"Example configuration:
--
{
    "depends": "REST",
    "multipart_boundary": "foo"
}
--"#;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RestStepsConfiguration {
    multipart_boundary: Option<String>,
    data_dir: PathBuf,
    phrasing: Phrasing,
    disabled_parts: Vec<StepPart>,
    depends: Option<String>,
}

impl RestStepsConfiguration {
    pub fn new() -> Self {
        Self {
            multipart_boundary: None,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            phrasing: Phrasing::Current,
            disabled_parts: Vec::new(),
            depends: None,
        }
    }

    pub fn from_json_str<S: AsRef<str>>(json: S) -> Result<Self> {
        serde_json::from_str(json.as_ref()).map_err(|e| Error::invalid_json(JsonOrigin::Configuration, e))
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_json_str(fs::read_to_string(path)?)
    }

    pub fn set_multipart_boundary<S: Into<String>>(&mut self, boundary: S) {
        self.multipart_boundary = Some(boundary.into());
    }

    /// The configured boundary, required by the multipart form step only.
    pub fn multipart_boundary(&self) -> Result<&str> {
        self.multipart_boundary.as_deref().ok_or_else(|| {
            Error::Configuration(
                "Multipart boundary is not set. Please set `multipart_boundary` in config.".into(),
            )
        })
    }

    pub fn set_data_dir<P: Into<PathBuf>>(&mut self, data_dir: P) {
        self.data_dir = data_dir.into();
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn set_phrasing(&mut self, phrasing: Phrasing) {
        self.phrasing = phrasing;
    }

    pub fn phrasing(&self) -> Phrasing {
        self.phrasing
    }

    pub fn disable_part(&mut self, part: StepPart) {
        if !self.disabled_parts.contains(&part) {
            self.disabled_parts.push(part);
        }
    }

    pub fn is_part_enabled(&self, part: StepPart) -> bool {
        !self.disabled_parts.contains(&part)
    }

    pub fn set_depends<S: Into<String>>(&mut self, module: S) {
        self.depends = Some(module.into());
    }

    /// Checks the declared dependency, when there is one.
    pub fn validate(&self) -> Result<()> {
        match self.depends.as_deref() {
            None | Some(REQUIRED_MODULE) => Ok(()),
            Some(other) => Err(Error::Configuration(format!(
                "the steps depend on the \"{}\" module, \"{}\" was configured.\n{}",
                REQUIRED_MODULE, other, DEPENDENCY_EXAMPLE
            ))),
        }
    }
}

impl Default for RestStepsConfiguration {
    fn default() -> Self {
        Self::new()
    }
}
