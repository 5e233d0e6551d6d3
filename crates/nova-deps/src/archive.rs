//! Archive extraction
//!
//! The container format is not declared; gzip-tar is tried first and zip is
//! the fallback.

use crate::{DepsError, DepsResult};
use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::io::{self, Cursor};
use std::path::{Component, Path, PathBuf};
use tar::Archive;
use zip::ZipArchive;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    TarGz,
    Zip,
}

/// Extract `data` into `dest`, returning the detected format
pub fn extract_archive(data: &[u8], dest: &Path, url: &str) -> DepsResult<ArchiveFormat> {
    fs::create_dir_all(dest).map_err(|e| DepsError::io(dest, e))?;

    match extract_tar_gz(data, dest) {
        Ok(()) => return Ok(ArchiveFormat::TarGz),
        Err(e) => tracing::debug!(url, error = %e, "not a gzip-tar archive, trying zip"),
    }

    // Drop whatever the failed tar attempt left behind.
    fs::remove_dir_all(dest).map_err(|e| DepsError::io(dest, e))?;
    fs::create_dir_all(dest).map_err(|e| DepsError::io(dest, e))?;

    let mut archive = ZipArchive::new(Cursor::new(data)).map_err(|_| DepsError::UnsupportedArchive {
        url: url.to_string(),
    })?;
    extract_zip(&mut archive, dest, url)?;
    Ok(ArchiveFormat::Zip)
}

fn extract_tar_gz(data: &[u8], dest: &Path) -> io::Result<()> {
    let mut archive = Archive::new(GzDecoder::new(Cursor::new(data)));
    // `unpack_in` refuses entries that would escape `dest`.
    for entry in archive.entries()? {
        entry?.unpack_in(dest)?;
    }
    Ok(())
}

fn extract_zip(archive: &mut ZipArchive<Cursor<&[u8]>>, dest: &Path, url: &str) -> DepsResult<()> {
    let corrupt = |reason: String| DepsError::CorruptArchive {
        url: url.to_string(),
        reason,
    };

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(|e| corrupt(e.to_string()))?;
        let name = entry.name().to_owned();
        let out_path = safe_output_path(dest, &name)
            .ok_or_else(|| corrupt(format!("path traversal detected: {name}")))?;

        if entry.is_dir() {
            fs::create_dir_all(&out_path).map_err(|e| DepsError::io(&out_path, e))?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent).map_err(|e| DepsError::io(parent, e))?;
        }
        let mut out_file = File::create(&out_path).map_err(|e| DepsError::io(&out_path, e))?;
        io::copy(&mut entry, &mut out_file).map_err(|e| DepsError::io(&out_path, e))?;
    }
    Ok(())
}

/// Resolve an archive entry under `dest`, or `None` if it would escape it
fn safe_output_path(dest: &Path, entry_name: &str) -> Option<PathBuf> {
    let mut resolved = dest.to_path_buf();
    for component in Path::new(entry_name).components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if !resolved.pop() || !resolved.starts_with(dest) {
                    return None;
                }
            }
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    resolved.starts_with(dest).then_some(resolved)
}
