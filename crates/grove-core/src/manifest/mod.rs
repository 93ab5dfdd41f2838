//! The installation manifest: a flat on-disk cache of what the
//! workspace resolved, so subsequent invocations can skip the full
//! manifest reload. Round-trippable: `load(save(x)) == x` for every
//! field.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Where a package or package set comes from, VCS-wise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VcsDescriptor {
    /// VCS kind (`"git"`, `"svn"`, `"archive"`, ...).
    pub kind: String,
    /// Upstream location.
    pub url: String,
    /// Kind-specific settings (branch, tag, commit, ...).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

/// One source package's cached layout and origin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRecord {
    /// Package name.
    pub name: String,
    /// Package type (`"cmake"`, `"autotools"`, ...).
    #[serde(rename = "type")]
    pub type_: String,
    /// Source checkout directory.
    pub srcdir: PathBuf,
    /// Directory the importer works in (usually `srcdir`).
    pub importdir: PathBuf,
    /// Install prefix.
    pub prefix: PathBuf,
    /// Out-of-source build directory, when the package type has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub builddir: Option<PathBuf>,
    /// Where build logs go.
    pub logdir: PathBuf,
    /// Direct dependency names.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
    /// Where the sources come from. Kept last so the nested table
    /// serializes after the record's plain values.
    pub vcs: VcsDescriptor,
}

/// One package set's cached checkout locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageSetRecord {
    /// Package-set name.
    pub name: String,
    /// Checkout of the set as imported.
    pub raw_local_dir: PathBuf,
    /// Checkout after user-level overrides.
    pub user_local_dir: PathBuf,
    /// Where the set's definitions come from.
    pub vcs: VcsDescriptor,
}

/// The cached record list for a whole workspace.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InstallationManifest {
    /// Cached source packages.
    #[serde(default, rename = "package", skip_serializing_if = "Vec::is_empty")]
    pub packages: Vec<PackageRecord>,
    /// Cached package sets.
    #[serde(default, rename = "package_set", skip_serializing_if = "Vec::is_empty")]
    pub package_sets: Vec<PackageSetRecord>,
}

impl InstallationManifest {
    /// Load a manifest. A missing file is an empty manifest, not an
    /// error.
    pub async fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let manifest: InstallationManifest = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        Ok(manifest)
    }

    /// Save the manifest, creating parent directories as needed.
    pub async fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize manifest")?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        fs::write(path, content)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;

        Ok(())
    }

    /// The record for a package, if cached.
    pub fn find_package(&self, name: &str) -> Option<&PackageRecord> {
        self.packages.iter().find(|p| p.name == name)
    }

    /// The record for a package set, if cached.
    pub fn find_package_set(&self, name: &str) -> Option<&PackageSetRecord> {
        self.package_sets.iter().find(|s| s.name == name)
    }

    /// Insert or replace a package record.
    pub fn upsert_package(&mut self, record: PackageRecord) {
        match self.packages.iter_mut().find(|p| p.name == record.name) {
            Some(existing) => *existing = record,
            None => self.packages.push(record),
        }
    }

    /// Insert or replace a package-set record.
    pub fn upsert_package_set(&mut self, record: PackageSetRecord) {
        match self.package_sets.iter_mut().find(|s| s.name == record.name) {
            Some(existing) => *existing = record,
            None => self.package_sets.push(record),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_manifest() -> InstallationManifest {
        let mut extra = BTreeMap::new();
        extra.insert("branch".to_string(), "stable".to_string());

        InstallationManifest {
            packages: vec![PackageRecord {
                name: "drivers/gps_base".to_string(),
                type_: "cmake".to_string(),
                vcs: VcsDescriptor {
                    kind: "git".to_string(),
                    url: "https://example.org/drivers/gps_base.git".to_string(),
                    extra,
                },
                srcdir: PathBuf::from("drivers/gps_base"),
                importdir: PathBuf::from("drivers/gps_base"),
                prefix: PathBuf::from("install"),
                builddir: Some(PathBuf::from("build/drivers/gps_base")),
                logdir: PathBuf::from("install/log"),
                dependencies: vec!["base/types".to_string()],
            }],
            package_sets: vec![PackageSetRecord {
                name: "core".to_string(),
                vcs: VcsDescriptor {
                    kind: "git".to_string(),
                    url: "https://example.org/sets/core.git".to_string(),
                    extra: BTreeMap::new(),
                },
                raw_local_dir: PathBuf::from(".grove/remotes/core"),
                user_local_dir: PathBuf::from("grove/remotes/core"),
            }],
        }
    }

    #[tokio::test]
    async fn test_round_trip_preserves_every_field() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("installation-manifest.toml");

        let manifest = sample_manifest();
        manifest.save(&path).await.unwrap();
        let loaded = InstallationManifest::load(&path).await.unwrap();

        assert_eq!(manifest, loaded);
    }

    #[tokio::test]
    async fn test_missing_file_loads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("does-not-exist.toml");

        let loaded = InstallationManifest::load(&path).await.unwrap();
        assert!(loaded.packages.is_empty());
        assert!(loaded.package_sets.is_empty());
    }

    #[tokio::test]
    async fn test_upsert_replaces_by_name() {
        let mut manifest = sample_manifest();
        let mut record = manifest.packages[0].clone();
        record.type_ = "autotools".to_string();

        manifest.upsert_package(record);
        assert_eq!(manifest.packages.len(), 1);
        assert_eq!(manifest.find_package("drivers/gps_base").unwrap().type_, "autotools");
    }
}
