//! Archive extraction for Go release tarballs and zip files.
//!
//! Both formats go through the [`Extractor`] trait. Only directories and
//! regular files are materialised; every file gets the permission bits stored
//! in the archive. Entries that would land outside the destination directory
//! are rejected.

use crate::error::{GetgoError, Result};
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::Read;
use std::path::{Component, Path, PathBuf};
use tar::Archive;
use zip::ZipArchive;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    TarGz,
    Zip,
}

impl ArchiveFormat {
    /// Go ships zip files for Windows and tarballs everywhere else.
    pub fn for_os(os: &str) -> Self {
        if os == "windows" {
            ArchiveFormat::Zip
        } else {
            ArchiveFormat::TarGz
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ArchiveFormat::TarGz => "tar.gz",
            ArchiveFormat::Zip => "zip",
        }
    }

    pub fn extractor(self) -> &'static dyn Extractor {
        match self {
            ArchiveFormat::TarGz => &TarGzExtractor,
            ArchiveFormat::Zip => &ZipExtractor,
        }
    }

    pub fn extract(self, archive_path: &Path, destination: &Path) -> Result<()> {
        self.extractor().extract(archive_path, destination)
    }
}

pub trait Extractor {
    fn extract(&self, archive_path: &Path, destination: &Path) -> Result<()>;
}

pub struct TarGzExtractor;

impl Extractor for TarGzExtractor {
    fn extract(&self, archive_path: &Path, destination: &Path) -> Result<()> {
        log::debug!(
            "extracting tarball {} into {}",
            archive_path.display(),
            destination.display()
        );

        let file =
            File::open(archive_path).map_err(|e| GetgoError::extraction(archive_path, e))?;
        let mut archive = Archive::new(GzDecoder::new(file));
        let entries = archive
            .entries()
            .map_err(|e| GetgoError::extraction(archive_path, e))?;

        for entry in entries {
            let mut entry = entry.map_err(|e| GetgoError::extraction(archive_path, e))?;
            let stored = entry
                .path()
                .map_err(|e| GetgoError::extraction(archive_path, e))?
                .into_owned();
            let entry_type = entry.header().entry_type();

            if entry_type.is_dir() {
                let out_path = output_path(destination, &stored)?;
                create_dir_chain(&out_path)?;
            } else if entry_type.is_file() {
                let out_path = output_path(destination, &stored)?;
                let mode = entry
                    .header()
                    .mode()
                    .map_err(|e| GetgoError::extraction(&out_path, e))?;
                write_file(&mut entry, &out_path, Some(mode))?;
            } else {
                log::debug!("skipping {:?} entry {}", entry_type, stored.display());
            }
        }

        Ok(())
    }
}

pub struct ZipExtractor;

impl Extractor for ZipExtractor {
    fn extract(&self, archive_path: &Path, destination: &Path) -> Result<()> {
        log::debug!(
            "extracting zip {} into {}",
            archive_path.display(),
            destination.display()
        );

        let file =
            File::open(archive_path).map_err(|e| GetgoError::extraction(archive_path, e))?;
        let mut archive =
            ZipArchive::new(file).map_err(|e| GetgoError::extraction(archive_path, e.into()))?;

        for i in 0..archive.len() {
            let mut entry = archive
                .by_index(i)
                .map_err(|e| GetgoError::extraction(archive_path, e.into()))?;
            let out_path = output_path(destination, Path::new(entry.name()))?;

            if entry.is_dir() {
                create_dir_chain(&out_path)?;
            } else {
                let mode = entry.unix_mode();
                write_file(&mut entry, &out_path, mode)?;
            }
        }

        Ok(())
    }
}

/// Join `stored` onto `destination`, refusing absolute paths and `..`.
fn output_path(destination: &Path, stored: &Path) -> Result<PathBuf> {
    let mut relative = PathBuf::new();
    for component in stored.components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(GetgoError::UnsafeArchiveEntry {
                    entry: stored.display().to_string(),
                });
            }
        }
    }
    Ok(destination.join(relative))
}

fn create_dir_chain(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path).map_err(|e| GetgoError::extraction(path, e))
}

fn write_file<R: Read>(content: &mut R, out_path: &Path, mode: Option<u32>) -> Result<()> {
    if let Some(parent) = out_path.parent() {
        create_dir_chain(parent)?;
    }

    let mut out = File::create(out_path).map_err(|e| GetgoError::extraction(out_path, e))?;
    std::io::copy(content, &mut out).map_err(|e| GetgoError::extraction(out_path, e))?;
    drop(out);

    if let Some(mode) = mode {
        set_mode(out_path, mode)?;
    }
    Ok(())
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode & 0o7777))
        .map_err(|e| GetgoError::extraction(path, e))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Archive builders shared by the extractor and pipeline tests.

    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use std::path::Path;

    pub enum Item<'a> {
        Dir(&'a str),
        File(&'a str, &'a [u8], u32),
        Symlink(&'a str, &'a str),
    }

    pub fn tar_gz_bytes(items: &[Item]) -> Vec<u8> {
        let encoder = GzEncoder::new(Vec::new(), Compression::default());
        let mut builder = tar::Builder::new(encoder);

        for item in items {
            let mut header = tar::Header::new_gnu();
            match item {
                Item::Dir(name) => {
                    header.set_entry_type(tar::EntryType::Directory);
                    header.set_size(0);
                    header.set_mode(0o755);
                    header.set_cksum();
                    builder
                        .append_data(&mut header, name, std::io::empty())
                        .expect("Should append directory");
                }
                Item::File(name, content, mode) => {
                    header.set_entry_type(tar::EntryType::Regular);
                    header.set_size(content.len() as u64);
                    header.set_mode(*mode);
                    header.set_cksum();
                    builder
                        .append_data(&mut header, name, *content)
                        .expect("Should append file");
                }
                Item::Symlink(name, target) => {
                    header.set_entry_type(tar::EntryType::Symlink);
                    header.set_size(0);
                    header.set_mode(0o777);
                    builder
                        .append_link(&mut header, name, target)
                        .expect("Should append symlink");
                }
            }
        }

        builder
            .into_inner()
            .expect("Should finish tar")
            .finish()
            .expect("Should finish gzip")
    }

    pub fn write_tar_gz(path: &Path, items: &[Item]) {
        std::fs::write(path, tar_gz_bytes(items)).expect("Should write tarball");
    }

    pub fn zip_bytes(items: &[Item]) -> Vec<u8> {
        let mut zip = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));

        for item in items {
            match item {
                Item::Dir(name) => {
                    let options =
                        zip::write::SimpleFileOptions::default().unix_permissions(0o755);
                    zip.add_directory(*name, options)
                        .expect("Should add directory");
                }
                Item::File(name, content, mode) => {
                    let options =
                        zip::write::SimpleFileOptions::default().unix_permissions(*mode);
                    zip.start_file(*name, options).expect("Should start file");
                    zip.write_all(content).expect("Should write");
                }
                Item::Symlink(..) => panic!("zip fixtures do not carry symlinks"),
            }
        }

        zip.finish().expect("Should finish zip").into_inner()
    }

    pub fn write_zip(path: &Path, items: &[Item]) {
        std::fs::write(path, zip_bytes(items)).expect("Should write zip");
    }
}
