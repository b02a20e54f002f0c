//! Result artifacts: identifiers and the flat directory they live in.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use rand::{Rng, distr::Alphanumeric};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::error::{PipelineError, Result};

/// Length of a generated result identifier.
pub const RESULT_ID_LEN: usize = 10;
/// Extension every artifact carries on disk.
pub const RESULT_EXTENSION: &str = "json";

/// Randomly generated, filesystem-safe name of one scan's output.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResultId(String);

impl ResultId {
    /// Fresh identifier drawn from the thread-local RNG.
    pub fn generate() -> Self {
        let id: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(RESULT_ID_LEN)
            .map(char::from)
            .collect();
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `<id>.json`
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.0, RESULT_EXTENSION)
    }
}

impl FromStr for ResultId {
    type Err = PipelineError;

    /// Accepts the bare identifier or its artifact file name.
    fn from_str(raw: &str) -> Result<Self> {
        let trimmed = raw.strip_suffix(".json").unwrap_or(raw);

        let valid = trimmed.len() == RESULT_ID_LEN
            && trimmed.bytes().all(|b| b.is_ascii_alphanumeric());
        if !valid {
            return Err(PipelineError::InvalidResultId(raw.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }
}

impl TryFrom<String> for ResultId {
    type Error = PipelineError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<ResultId> for String {
    fn from(value: ResultId) -> Self {
        value.0
    }
}

impl fmt::Display for ResultId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Read side of the result pool.
#[derive(Debug, Clone)]
pub struct ResultStore {
    root: PathBuf,
}

impl ResultStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, id: &ResultId) -> PathBuf {
        self.root.join(id.file_name())
    }

    /// Raw artifact bytes, untouched.
    pub async fn read(&self, id: &ResultId) -> Result<Vec<u8>> {
        let path = self.path_for(id);
        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                debug!(result_id = %id, bytes = bytes.len(), "result artifact read");
                Ok(bytes)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                error!(result_id = %id, path = %path.display(), "result artifact missing");
                Err(PipelineError::ResultNotFound(id.to_string()))
            }
            Err(err) => {
                error!(result_id = %id, error = %err, "failed to read result artifact");
                Err(PipelineError::Io(err))
            }
        }
    }
}
