use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use serde::{de::DeserializeOwned, Serialize};
use tally_core::CoreError;

pub const SCHEMA_VERSION: u32 = 1;
const TMP_SUFFIX: &str = "tmp";

/// A persisted document that records the schema it was written with.
pub trait Versioned {
    fn schema_version(&self) -> u32;
}

/// Reads a document, refusing files written by a newer schema.
pub fn read_document<T>(path: &Path) -> Result<T, CoreError>
where
    T: DeserializeOwned + Versioned,
{
    let data = fs::read_to_string(path)?;
    let document: T =
        serde_json::from_str(&data).map_err(|err| CoreError::Serde(err.to_string()))?;
    if document.schema_version() > SCHEMA_VERSION {
        return Err(CoreError::Storage(format!(
            "{} uses schema version {}, newer than supported version {}",
            path.display(),
            document.schema_version(),
            SCHEMA_VERSION
        )));
    }
    Ok(document)
}

/// Writes next to the target, then renames over it.
pub fn write_document<T: Serialize>(path: &Path, document: &T) -> Result<(), CoreError> {
    let data =
        serde_json::to_string_pretty(document).map_err(|err| CoreError::Serde(err.to_string()))?;
    let tmp = tmp_path(path);
    write_atomic(&tmp, &data)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Directory-safe slug of a company name.
pub fn canonical_name(name: &str) -> String {
    let sanitized: String = name
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' => c,
            _ => '_',
        })
        .collect();
    if sanitized.trim_matches('_').is_empty() {
        "company".into()
    } else {
        sanitized
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_atomic(path: &Path, data: &str) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.sync_all()?;
    Ok(())
}
