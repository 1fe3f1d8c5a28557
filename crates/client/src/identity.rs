use std::{fs, path::Path};

use anyhow::Context;

/// Stable pseudonymous voter id for this machine. Generated once, then reused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoterId(String);

impl VoterId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

pub fn load_or_create(path: &Path) -> anyhow::Result<VoterId> {
    if path.exists() {
        let stored = fs::read_to_string(path)
            .with_context(|| format!("Failed to read voter id from {}", path.display()))?;
        let stored = stored.trim();
        if !stored.is_empty() {
            return Ok(VoterId(stored.to_string()));
        }
    }

    let id = uuid::Uuid::new_v4().simple().to_string();
    fs::write(path, &id).with_context(|| format!("Failed to save voter id to {}", path.display()))?;
    Ok(VoterId(id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_file() -> std::path::PathBuf {
        std::env::temp_dir().join(format!("frontrow-voter-{}", uuid::Uuid::new_v4()))
    }

    #[test]
    fn id_is_created_once_and_reused() {
        let path = scratch_file();
        let first = load_or_create(&path).unwrap();
        let second = load_or_create(&path).unwrap();
        assert_eq!(first, second);
        assert!(!first.as_str().is_empty());
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn blank_file_gets_a_fresh_id() {
        let path = scratch_file();
        fs::write(&path, "  \n").unwrap();
        let id = load_or_create(&path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), id.as_str());
        fs::remove_file(&path).unwrap();
    }
}
