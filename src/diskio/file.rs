use std::fs;
use std::io;
use std::path::Path;

/// Length of the regular file at `path`.
///
/// Returns `Ok(None)` when nothing exists at `path` or it is not a regular
/// file.
pub fn regular_file_len(path: &Path) -> io::Result<Option<u64>> {
    match fs::metadata(path) {
        Ok(meta) if meta.is_file() => Ok(Some(meta.len())),
        Ok(_) => Ok(None),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Physical memory currently available to the process, in bytes.
///
/// Returns 0 when the platform cannot tell, which disables any budget floor
/// derived from it.
#[cfg(target_os = "linux")]
pub fn available_memory() -> u64 {
    let pages = unsafe { libc::sysconf(libc::_SC_AVPHYS_PAGES) };
    let page_size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };

    if pages <= 0 || page_size <= 0 {
        0
    } else {
        (pages as u64).saturating_mul(page_size as u64)
    }
}

#[cfg(not(target_os = "linux"))]
pub fn available_memory() -> u64 {
    0
}
