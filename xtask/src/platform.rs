//! Host platform checks for launching QEMU.
//!
//! Use the functions where possible instead of `#[cfg(...)]` so that
//! code for all platforms gets checked at compile time.

use std::env::{self, consts};
use std::ffi::OsString;
use std::path::Path;

/// Default install location of the QEMU installer for Windows.
const WINDOWS_QEMU_DIR: &str = r"C:\Program Files\qemu";

pub fn is_linux() -> bool {
    consts::OS == "linux"
}

pub fn is_windows() -> bool {
    consts::FAMILY == "windows"
}

/// Whether QEMU can use KVM acceleration on this host.
pub fn kvm_available() -> bool {
    is_linux() && Path::new("/dev/kvm").exists()
}

/// PATH for the QEMU child process, or `None` to inherit ours.
///
/// The QEMU installer for Windows does not add its directory to the PATH.
pub fn qemu_search_path() -> Option<OsString> {
    if !is_windows() {
        return None;
    }
    let mut paths: Vec<_> = env::var_os("PATH")
        .map(|path| env::split_paths(&path).collect())
        .unwrap_or_default();
    paths.push(WINDOWS_QEMU_DIR.into());
    env::join_paths(paths).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_path() {
        let path = qemu_search_path();
        if is_windows() {
            let path = path.unwrap();
            assert!(env::split_paths(&path).any(|p| p == Path::new(WINDOWS_QEMU_DIR)));
        } else {
            assert!(path.is_none());
        }
    }
}
