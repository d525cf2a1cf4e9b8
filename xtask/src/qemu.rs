// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::arch::UefiArch;
use crate::opt::QemuOpt;
use crate::platform;
use crate::util::{build_dir, command_to_string};
use anyhow::{Context, Result, bail};
use regex::Regex;
use std::ffi::OsString;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use tempfile::TempDir;
#[cfg(target_os = "linux")]
use {std::fs::Permissions, std::os::unix::fs::PermissionsExt};

/// Logged by the first export in a fresh VM.
const EXPORTED_LINE: &str = "Exported HII Packages (";
/// Logged by the second export, which must find the variable.
const ALREADY_EXISTS_LINE: &str = "HII export already exists, nothing to do.";
/// Logged by the app once both exports succeeded.
const COMPLETE_LINE: &str = "HIIDB_EXPORT_COMPLETE";

enum PflashMode {
    ReadOnly,
    ReadWrite,
}

fn add_pflash_args(cmd: &mut Command, file: &Path, mode: PflashMode) {
    // Build the argument as an OsString to avoid requiring a UTF-8 path.
    let mut arg = OsString::from("if=pflash,format=raw,readonly=");
    arg.push(match mode {
        PflashMode::ReadOnly => "on",
        PflashMode::ReadWrite => "off",
    });
    arg.push(",file=");
    arg.push(file);

    cmd.arg("-drive");
    cmd.arg(arg);
}

/// What the application reported over the serial console.
#[derive(Debug)]
struct SerialLog {
    ansi_escape: Regex,
    exported: bool,
    already_exists: bool,
    complete: bool,
}

impl SerialLog {
    fn new() -> Self {
        // The console output protocol wraps text in ANSI escapes when it
        // writes to the serial device.
        let ansi_escape = Regex::new(r"(\x9b|\x1b\[)[0-?]*[ -/]*[@-~]").expect("invalid regex");
        Self {
            ansi_escape,
            exported: false,
            already_exists: false,
            complete: false,
        }
    }

    /// Record one line of serial output and return it without escapes.
    fn process_line(&mut self, line: &str) -> String {
        let line = self.ansi_escape.replace_all(line.trim_end(), "");

        // The logger prefixes every line with the level and source location,
        // so match on the tail.
        if line.contains(EXPORTED_LINE) {
            self.exported = true;
        } else if line.ends_with(ALREADY_EXISTS_LINE) {
            self.already_exists = true;
        } else if line.ends_with(COMPLETE_LINE) {
            self.complete = true;
        }

        line.into_owned()
    }

    fn check(&self) -> Result<()> {
        if !self.exported {
            bail!("the HII database was not exported");
        }
        if !self.already_exists {
            bail!("the second run did not find the HiiDB variable");
        }
        if !self.complete {
            bail!("the application did not complete");
        }
        Ok(())
    }
}

fn process_serial<R: BufRead>(reader: R) -> Result<SerialLog> {
    let mut log = SerialLog::new();
    for line in reader.lines() {
        println!("{}", log.process_line(&line?));
    }
    Ok(log)
}

/// Create an EFI boot directory to pass into QEMU, with the application as
/// the default boot file.
fn build_esp_dir(opt: &QemuOpt) -> Result<PathBuf> {
    let build_dir = build_dir(*opt.target, opt.build_mode.release);
    let esp_dir = build_dir.join("esp");

    let boot_dir = esp_dir.join("EFI").join("Boot");
    if !boot_dir.exists() {
        fs_err::create_dir_all(&boot_dir)?;
    }

    fs_err::copy(
        build_dir.join("hiidb-app.efi"),
        boot_dir.join(opt.target.boot_file_name()),
    )?;

    Ok(esp_dir)
}

/// Wrap a child process to automatically kill it when dropped.
struct ChildWrapper(Child);

impl Drop for ChildWrapper {
    fn drop(&mut self) {
        // Do nothing if child has already exited (this call doesn't block).
        if matches!(self.0.try_wait(), Ok(Some(_))) {
            return;
        }

        // Try to stop the process, then wait for it to exit. Log errors
        // but otherwise ignore.
        if let Err(err) = self.0.kill() {
            eprintln!("failed to kill process: {err}");
        }
        if let Err(err) = self.0.wait() {
            eprintln!("failed to wait for process exit: {err}");
        }
    }
}

pub fn run_qemu(arch: UefiArch, opt: &QemuOpt) -> Result<()> {
    for (kind, path) in [("code", &opt.ovmf_code), ("vars", &opt.ovmf_vars)] {
        if !path.exists() {
            bail!("ovmf {kind} file does not exist: {}", path.display());
        }
    }

    let mut cmd = Command::new(arch.qemu_exe());

    if let Some(path) = platform::qemu_search_path() {
        cmd.env("PATH", path);
    }

    // Disable default devices.
    // QEMU by defaults enables a ton of devices which slow down boot.
    cmd.arg("-nodefaults");

    // Set the boot menu timeout to zero. Note that we have to enable the
    // menu here even though we are skipping right past it, otherwise
    // `splash-time` is ignored in favor of a hardcoded default timeout.
    cmd.args(["-boot", "menu=on,splash-time=0"]);

    match arch {
        UefiArch::AArch64 => {
            cmd.args(["-machine", "virt"]);
            cmd.args(["-cpu", "cortex-a72"]);
            cmd.args(["-device", "virtio-gpu-pci"]);
        }
        UefiArch::IA32 | UefiArch::X86_64 => {
            cmd.args(["-machine", "q35"]);
            cmd.args(["-m", "256M"]);
            cmd.args(["-vga", "std"]);

            if platform::kvm_available() && !opt.disable_kvm {
                cmd.arg("--enable-kvm");
            }

            // The `qemu` feature of the uefi crate mirrors log output to
            // the debugcon port.
            cmd.args(["-debugcon", "file:./hiidb-debugcon.log"]);
        }
    }

    let tmp_dir = TempDir::new()?;

    // Make a copy of the OVMF vars file so that it can be used
    // read+write without modifying the original.
    let ovmf_vars = tmp_dir.path().join("ovmf_vars");
    fs_err::copy(&opt.ovmf_vars, &ovmf_vars)?;
    // Necessary, as for example on NixOS, the files are read-only inside
    // the Nix store.
    #[cfg(target_os = "linux")]
    fs_err::set_permissions(&ovmf_vars, Permissions::from_mode(0o666))?;

    add_pflash_args(&mut cmd, &opt.ovmf_code, PflashMode::ReadOnly);
    add_pflash_args(&mut cmd, &ovmf_vars, PflashMode::ReadWrite);

    // Mount the ESP directory as a FAT partition.
    cmd.arg("-drive");
    let mut drive_arg = OsString::from("format=raw,file=fat:rw:");
    drive_arg.push(build_esp_dir(opt)?);
    cmd.arg(drive_arg);

    if opt.headless {
        cmd.args(["-display", "none"]);
    }

    // The firmware console is mirrored to the serial port.
    cmd.args(["-serial", "stdio"]);

    println!("{}", command_to_string(&cmd));

    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    let mut child = ChildWrapper(cmd.spawn().context("failed to launch qemu")?);
    let stdout = child.0.stdout.take().context("qemu stdout is not piped")?;

    // The app powers the VM off when it is done, which closes stdout.
    let log = process_serial(BufReader::new(stdout));
    let status = child.0.wait()?;

    log?.check()?;

    match status.code() {
        Some(0) => Ok(()),
        Some(code) => bail!("qemu exited with code {code}"),
        None => bail!("qemu was terminated by a signal: {status:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_serial() {
        let output = concat!(
            "BdsDxe: starting Boot0001\n",
            "\x1b[0m\x1b[37m[ INFO]: hiidb/src/exporter.rs@095: Exported HII Packages (36352 bytes), var HiiDB-ef9fc172-a1b2-4693-b327-6d32fc416042\n",
            "[ INFO]: hiidb/src/exporter.rs@094: HII export already exists, nothing to do.\r\n",
            "[ INFO]: hiidb-app/src/main.rs@022: HIIDB_EXPORT_COMPLETE\n",
        );
        let log = process_serial(output.as_bytes()).unwrap();
        assert!(log.exported);
        assert!(log.already_exists);
        assert!(log.complete);
        log.check().unwrap();
    }

    #[test]
    fn test_missing_second_run() {
        let output = "[ INFO]: Exported HII Packages (512 bytes), var HiiDB-x\n";
        let log = process_serial(output.as_bytes()).unwrap();
        assert!(log.check().is_err());
    }

    #[test]
    fn test_strip_escapes() {
        let mut log = SerialLog::new();
        assert_eq!(log.process_line("\x1b[1;33mwarn\x1b[0m\n"), "warn");
    }
}
