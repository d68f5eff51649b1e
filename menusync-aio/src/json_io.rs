// menusync-aio/src/json_io.rs
use std::path::Path;

use menusync_common::error::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

/// Serializes data to pretty JSON and writes it atomically.
pub fn write_json_atomic<T: Serialize>(path: &Path, data: &T) -> Result<()> {
    debug!("Writing JSON to: {}", path.display());
    let mut json_bytes = serde_json::to_vec_pretty(data)?;
    json_bytes.push(b'\n');
    crate::fs::atomic_write_file(path, &json_bytes)
}

/// Reads and deserializes a JSON file, `None` if it does not exist.
pub fn read_json_optional<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    debug!("Reading JSON from: {}", path.display());
    match crate::fs::read_optional_string(path)? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn writes_and_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.json");
        let mut data = BTreeMap::new();
        data.insert("k".to_string(), 1u32);
        write_json_atomic(&path, &data).unwrap();
        let back: Option<BTreeMap<String, u32>> = read_json_optional(&path).unwrap();
        assert_eq!(back, Some(data));
        let missing: Option<BTreeMap<String, u32>> =
            read_json_optional(&dir.path().join("none.json")).unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn corrupt_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.json");
        std::fs::write(&path, b"{not json").unwrap();
        assert!(read_json_optional::<BTreeMap<String, u32>>(&path).is_err());
    }
}
