
use anyhow::{bail, Context};
use log::{debug, info};
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::data_types::collate_error::CollateError;
use crate::parsing::mutation_panel::{PanelVersion, VERSION_SUFFIX};
use crate::util::json_io::load_json;

/// Supported panel archive formats
#[derive(Clone, Copy, Debug, Eq, PartialEq, strum_macros::Display)]
pub enum ArchiveFormat {
    #[strum(serialize = "tar.gz")]
    TarGz,
    #[strum(serialize = "zip")]
    Zip
}

impl ArchiveFormat {
    /// Detects the format from the file name
    /// # Errors
    /// * `CollateError::UnknownArchiveFormat` for anything other than .tar.gz, .tgz, or .zip
    pub fn from_path(path: &Path) -> Result<Self, CollateError> {
        let name = path.file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Ok(ArchiveFormat::TarGz)
        } else if name.ends_with(".zip") {
            Ok(ArchiveFormat::Zip)
        } else {
            Err(CollateError::UnknownArchiveFormat { path: path.to_path_buf() })
        }
    }
}

/// An installed panel and where it lives
#[derive(Clone, Debug, PartialEq)]
pub struct InstalledPanel {
    pub version: PanelVersion,
    pub location: PathBuf
}

impl InstalledPanel {
    /// Tab-separated listing line: name, commit, author, date, location
    pub fn listing_line(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}\t{}",
            self.version.name, self.version.commit, self.version.author, self.version.date,
            self.location.display()
        )
    }
}

/// Finds every panel with version metadata in the database folder, sorted by name
/// # Errors
/// * if the folder cannot be listed or a version file fails to parse
pub fn list_databases(db_dir: &Path) -> anyhow::Result<Vec<InstalledPanel>> {
    let mut panels = vec![];
    let entries = std::fs::read_dir(db_dir)
        .with_context(|| format!("Error while listing {db_dir:?}:"))?;
    for entry in entries {
        let path = entry.with_context(|| format!("Error while listing {db_dir:?}:"))?.path();
        let is_version_file = path.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(VERSION_SUFFIX));
        if !is_version_file {
            continue;
        }

        let version: PanelVersion = load_json(&path)?;
        let location = db_dir.join(&version.name);
        debug!("Found panel {:?} in {path:?}", version.name);
        panels.push(InstalledPanel { version, location });
    }
    panels.sort_by(|a, b| a.version.name.cmp(&b.version.name));
    Ok(panels)
}

/// Extracts a panel archive into the database folder, creating the folder if needed
/// # Arguments
/// * `archive` - a .tar.gz, .tgz, or .zip panel archive
/// * `db_dir` - the database folder
/// # Errors
/// * if the archive is missing or has an unknown format
/// * if extraction fails
pub fn install_database(archive: &Path, db_dir: &Path) -> anyhow::Result<()> {
    if !archive.is_file() {
        bail!("File not found: {archive:?}");
    }
    let format = ArchiveFormat::from_path(archive)?;
    std::fs::create_dir_all(db_dir)
        .with_context(|| format!("Error while creating {db_dir:?}:"))?;

    info!("Extracting {archive:?} ({format}) to {db_dir:?}");
    let mut command = match format {
        ArchiveFormat::TarGz => {
            let mut c = Command::new("tar");
            c.arg("-xzf").arg(archive).arg("-C").arg(db_dir);
            c
        },
        ArchiveFormat::Zip => {
            let mut c = Command::new("unzip");
            c.arg("-o").arg(archive).arg("-d").arg(db_dir);
            c
        }
    };
    let status = command.status()
        .with_context(|| format!("Error while launching extraction of {archive:?}:"))?;
    if !status.success() {
        bail!("Extraction of {archive:?} exited with {status}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archive_format() {
        assert_eq!(ArchiveFormat::from_path(Path::new("db/panel.tar.gz")).unwrap(), ArchiveFormat::TarGz);
        assert_eq!(ArchiveFormat::from_path(Path::new("panel.tgz")).unwrap(), ArchiveFormat::TarGz);
        assert_eq!(ArchiveFormat::from_path(Path::new("panel.zip")).unwrap(), ArchiveFormat::Zip);
        assert!(matches!(
            ArchiveFormat::from_path(Path::new("panel.rar")),
            Err(CollateError::UnknownArchiveFormat { .. })
        ));
        assert_eq!(ArchiveFormat::TarGz.to_string(), "tar.gz");
    }

    #[test]
    fn test_list_example() {
        let db_dir = PathBuf::from("test_data/example_collate/db");
        let panels = list_databases(&db_dir).unwrap();
        assert_eq!(panels.len(), 1);
        assert_eq!(panels[0].version.name, "testdb");
        assert_eq!(
            panels[0].listing_line(),
            "testdb\tabc1234\ttest\t2024-01-01\ttest_data/example_collate/db/testdb"
        );
    }

    #[test]
    fn test_install_errors() {
        let tmp = tempfile::tempdir().unwrap();
        let db_dir = tmp.path().join("db");

        // missing archive
        assert!(install_database(&tmp.path().join("missing.tar.gz"), &db_dir).is_err());

        // unknown format is rejected before anything is created
        let bogus = tmp.path().join("panel.rar");
        std::fs::write(&bogus, "").unwrap();
        let err = install_database(&bogus, &db_dir).unwrap_err();
        assert!(matches!(err.downcast_ref::<CollateError>(), Some(CollateError::UnknownArchiveFormat { .. })));
        assert!(!db_dir.exists());
    }
}
