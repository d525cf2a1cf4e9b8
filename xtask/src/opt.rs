use crate::arch::UefiArch;
use clap::{Parser, Subcommand};
use std::ops::Deref;
use std::path::PathBuf;

// Define some common options so that the doc strings don't have to be
// copy-pasted.

#[derive(Debug, Parser)]
pub struct TargetOpt {
    /// UEFI target to build for.
    #[clap(long, action, default_value_t)]
    pub target: UefiArch,
}

impl Deref for TargetOpt {
    type Target = UefiArch;

    fn deref(&self) -> &Self::Target {
        &self.target
    }
}

#[derive(Debug, Parser)]
pub struct BuildModeOpt {
    /// Build in release mode.
    #[clap(long, action)]
    pub release: bool,
}

#[derive(Debug, Parser)]
pub struct WarningOpt {
    /// Treat warnings as errors.
    #[clap(long, action)]
    pub warnings_as_errors: bool,
}

/// Developer utility for building and testing hiidb.
#[derive(Debug, Parser)]
pub struct Opt {
    #[clap(subcommand)]
    pub action: Action,
}

#[derive(Debug, Subcommand)]
pub enum Action {
    Build(BuildOpt),
    Clippy(ClippyOpt),
    Doc(DocOpt),
    Run(QemuOpt),
    Test(TestOpt),
}

/// Build the library and the UEFI application.
#[derive(Debug, Parser)]
pub struct BuildOpt {
    #[clap(flatten)]
    pub target: TargetOpt,

    #[clap(flatten)]
    pub build_mode: BuildModeOpt,
}

/// Run clippy on all the packages.
#[derive(Debug, Parser)]
pub struct ClippyOpt {
    #[clap(flatten)]
    pub target: TargetOpt,

    #[clap(flatten)]
    pub warning: WarningOpt,
}

/// Build the docs for the hiidb library.
#[derive(Debug, Parser)]
pub struct DocOpt {
    /// Open the docs in a browser.
    #[clap(long, action)]
    pub open: bool,

    #[clap(flatten)]
    pub warning: WarningOpt,
}

/// Build the application and run it in QEMU.
#[derive(Debug, Parser)]
pub struct QemuOpt {
    #[clap(flatten)]
    pub target: TargetOpt,

    #[clap(flatten)]
    pub build_mode: BuildModeOpt,

    /// Disable hardware accelerated virtualization support in QEMU.
    #[clap(long, action)]
    pub disable_kvm: bool,

    /// Run QEMU without a GUI.
    #[clap(long, action)]
    pub headless: bool,

    /// Path of an OVMF code file.
    #[clap(long, action, env = "OVMF_CODE")]
    pub ovmf_code: PathBuf,

    /// Path of an OVMF vars file.
    #[clap(long, action, env = "OVMF_VARS")]
    pub ovmf_vars: PathBuf,
}

/// Run the host tests.
#[derive(Debug, Parser)]
pub struct TestOpt;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run() {
        let opt = Opt::parse_from([
            "xtask",
            "run",
            "--target",
            "aarch64",
            "--headless",
            "--ovmf-code",
            "code.fd",
            "--ovmf-vars",
            "vars.fd",
        ]);
        let Action::Run(qemu_opt) = opt.action else {
            panic!("expected the run action");
        };
        assert_eq!(*qemu_opt.target, UefiArch::AArch64);
        assert!(qemu_opt.headless);
        assert!(!qemu_opt.build_mode.release);
        assert_eq!(qemu_opt.ovmf_code, PathBuf::from("code.fd"));
    }
}
