use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;

use crate::error::SetupError;

/// `path` with `.{ext}` appended to its file name.
pub fn with_extension_appended(path: &Path, ext: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}

/// `path` with a trailing `.{ext}` removed, or `None` if it doesn't end that way.
pub fn without_extension(path: &Path, ext: &str) -> Option<PathBuf> {
    let name = path.file_name()?.to_str()?;
    let stem = name.strip_suffix(ext)?.strip_suffix('.')?;
    Some(path.with_file_name(stem))
}

/// Decompress `<file>.gz` into `<file>` and remove the archive, like `gzip -d`.
pub fn gunzip(archive: &Path) -> Result<PathBuf, SetupError> {
    let output = without_extension(archive, "gz").ok_or_else(|| SetupError::Extract {
        archive: archive.to_path_buf(),
        message: "expected a .gz file".into(),
    })?;

    let mut decoder = GzDecoder::new(BufReader::new(File::open(archive)?));
    let mut out = File::create(&output)?;
    std::io::copy(&mut decoder, &mut out).map_err(|e| SetupError::Extract {
        archive: archive.to_path_buf(),
        message: e.to_string(),
    })?;
    drop(out);

    std::fs::remove_file(archive)?;
    Ok(output)
}

/// Extract the top-level entry `entry` into `dest_dir`. Entries stored under
/// a directory never match, even when their file name is the same.
pub fn extract_entry(archive: &Path, entry: &str, dest_dir: &Path) -> Result<PathBuf, SetupError> {
    let mut zip = zip::ZipArchive::new(File::open(archive)?)?;

    let mut file = match zip.by_name(entry) {
        Ok(file) if !file.is_dir() => file,
        Ok(_) | Err(zip::result::ZipError::FileNotFound) => {
            return Err(SetupError::Extract {
                archive: archive.to_path_buf(),
                message: format!("no entry named {entry}"),
            })
        }
        Err(e) => return Err(e.into()),
    };

    std::fs::create_dir_all(dest_dir)?;
    let dest = dest_dir.join(entry);
    let mut out = File::create(&dest)?;
    std::io::copy(&mut file, &mut out)?;
    Ok(dest)
}

/// Add execute permission for everyone. No-op on non-unix platforms.
pub fn make_executable(path: &Path) -> Result<(), SetupError> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = std::fs::metadata(path)?.permissions();
        perms.set_mode(perms.mode() | 0o111);
        std::fs::set_permissions(path, perms)?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}
