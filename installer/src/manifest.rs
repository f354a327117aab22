//! Artifact manifest loading.
//!
//! A manifest is a small TOML document naming the archive, the ordered patch
//! list, and optional logical-name to file-name mappings:
//!
//! ```toml
//! archive = "eap.zip"
//! patches = ["eap-7.4.1-patch.zip", "eap-7.4.2-patch.zip"]
//!
//! [artifacts]
//! "eap.zip" = "jboss-eap-7.4.0.zip"
//! ```

use crate::artifacts::validate_name;
use crate::error::{InstallerError, Result};
use camino::Utf8Path;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Parsed contents of an artifact manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArtifactManifest {
    /// Logical name of the distribution archive.
    pub archive: Option<String>,
    /// Logical names of patches, in application order.
    pub patches: Vec<String>,
    /// Logical-name to file-name mappings.
    pub artifacts: BTreeMap<String, String>,
}

impl ArtifactManifest {
    /// Reads and parses the manifest at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::Manifest`] when the file cannot be read, is
    /// not valid TOML, or names an artifact that is not a plain file name.
    pub fn load(path: &Utf8Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|err| InstallerError::Manifest {
            path: path.to_owned(),
            reason: err.to_string(),
        })?;
        Self::parse(&text).map_err(|reason| InstallerError::Manifest {
            path: path.to_owned(),
            reason,
        })
    }

    fn parse(text: &str) -> std::result::Result<Self, String> {
        let manifest: Self = toml::from_str(text).map_err(|err| err.message().to_owned())?;
        manifest
            .archive
            .iter()
            .chain(&manifest.patches)
            .try_for_each(|name| validate_name(name))
            .map_err(|err| err.to_string())?;
        Ok(manifest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use tempfile::TempDir;

    #[test]
    fn parses_full_manifest() {
        let manifest = ArtifactManifest::parse(
            r#"
archive = "eap.zip"
patches = ["p1", "p2"]

[artifacts]
"eap.zip" = "jboss-eap-7.4.0.zip"
"#,
        )
        .expect("manifest parses");

        assert_eq!(manifest.archive.as_deref(), Some("eap.zip"));
        assert_eq!(manifest.patches, vec!["p1".to_owned(), "p2".to_owned()]);
        assert_eq!(
            manifest.artifacts.get("eap.zip").map(String::as_str),
            Some("jboss-eap-7.4.0.zip")
        );
    }

    #[test]
    fn empty_manifest_uses_defaults() {
        let manifest = ArtifactManifest::parse("").expect("empty manifest parses");
        assert_eq!(manifest, ArtifactManifest::default());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = ArtifactManifest::parse("patchs = []").expect_err("typo should fail");
        assert!(err.contains("patchs"), "unexpected message: {err}");
    }

    #[test]
    fn escaping_patch_names_are_rejected() {
        assert!(ArtifactManifest::parse(r#"patches = ["../p1"]"#).is_err());
    }

    #[test]
    fn load_reports_path_on_failure() {
        let dir = TempDir::new().expect("tempdir");
        let path = Utf8PathBuf::from_path_buf(dir.path().join("missing.toml"))
            .expect("utf-8 temp path");

        let err = ArtifactManifest::load(&path).expect_err("missing file should fail");

        assert!(matches!(err, InstallerError::Manifest { .. }));
        assert!(err.to_string().contains("missing.toml"));
    }

    #[test]
    fn load_reads_file_from_disk() {
        let dir = TempDir::new().expect("tempdir");
        let path = Utf8PathBuf::from_path_buf(dir.path().join("artifacts.toml"))
            .expect("utf-8 temp path");
        std::fs::write(&path, "patches = [\"p1\"]\n").expect("write manifest");

        let manifest = ArtifactManifest::load(&path).expect("manifest loads");

        assert_eq!(manifest.patches, vec!["p1".to_owned()]);
        assert!(manifest.archive.is_none());
    }
}
