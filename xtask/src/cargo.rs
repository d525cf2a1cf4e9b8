use crate::arch::UefiArch;
use anyhow::{Result, bail};
use std::env;
use std::ffi::OsString;
use std::process::Command;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Package {
    Hiidb,
    HiidbApp,
    Xtask,
}

impl Package {
    fn as_str(self) -> &'static str {
        match self {
            Self::Hiidb => "hiidb",
            Self::HiidbApp => "hiidb-app",
            Self::Xtask => "xtask",
        }
    }

    /// Packages that build for the UEFI targets.
    pub fn uefi() -> Vec<Package> {
        vec![Self::Hiidb, Self::HiidbApp]
    }

    /// Packages whose tests run on the host. The application defines a
    /// panic handler and cannot be linked against `std`.
    pub fn host_testable() -> Vec<Package> {
        vec![Self::Hiidb, Self::Xtask]
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Feature {
    Qemu,
}

impl Feature {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Qemu => "hiidb-app/qemu",
        }
    }

    fn comma_separated_string(features: &[Feature]) -> String {
        features
            .iter()
            .map(|f| f.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }
}

#[derive(Clone, Copy, Debug)]
pub enum CargoAction {
    Build,
    Clippy,
    Doc { open: bool },
    Test,
}

/// Get a modified PATH to remove entries added by rustup. This is
/// necessary on Windows, see
/// https://github.com/rust-lang/rustup/issues/3031.
fn sanitized_path(orig_path: OsString) -> OsString {
    let paths = env::split_paths(&orig_path);
    let sanitized_paths = paths.filter(|path| {
        !path
            .components()
            .any(|component| component.as_os_str() == ".rustup")
    });

    env::join_paths(sanitized_paths).expect("invalid PATH")
}

/// Cargo automatically sets some env vars that can prevent the
/// channel arg (e.g. "+nightly") from working. Unset them in the
/// child's environment.
pub fn fix_nested_cargo_env(cmd: &mut Command) {
    cmd.env_remove("RUSTC");
    cmd.env_remove("RUSTDOC");
    let orig_path = env::var_os("PATH").unwrap_or_default();
    cmd.env("PATH", sanitized_path(orig_path));
}

#[derive(Debug)]
pub struct Cargo {
    pub action: CargoAction,
    pub features: Vec<Feature>,
    pub packages: Vec<Package>,
    pub release: bool,
    pub target: Option<UefiArch>,
    pub warnings_as_errors: bool,
}

impl Cargo {
    pub fn command(&self) -> Result<Command> {
        let mut cmd = Command::new("cargo");

        fix_nested_cargo_env(&mut cmd);

        let mut extra_args: Vec<&str> = Vec::new();
        let mut tool_args: Vec<&str> = Vec::new();
        let action = match self.action {
            CargoAction::Build => "build",
            CargoAction::Clippy => {
                if self.warnings_as_errors {
                    tool_args.extend(["-D", "warnings"]);
                }
                "clippy"
            }
            CargoAction::Doc { open } => {
                if self.warnings_as_errors {
                    cmd.env("RUSTDOCFLAGS", "-Dwarnings");
                }
                if open {
                    extra_args.push("--open");
                }
                "doc"
            }
            CargoAction::Test => "test",
        };
        cmd.arg(action);

        if self.release {
            cmd.arg("--release");
        }

        if let Some(target) = self.target {
            cmd.args(["--target", target.as_triple().as_str()]);
        }

        if self.packages.is_empty() {
            bail!("packages cannot be empty");
        }
        for package in &self.packages {
            cmd.args(["--package", package.as_str()]);
        }

        if !self.features.is_empty() {
            cmd.args([
                "--features",
                &Feature::comma_separated_string(&self.features),
            ]);
        }

        cmd.args(extra_args);

        if !tool_args.is_empty() {
            cmd.arg("--");
            cmd.args(tool_args);
        }

        Ok(cmd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::command_to_string;

    #[test]
    fn test_sanitize_path() {
        let (input, expected) = match env::consts::FAMILY {
            "unix" => ("Abc:/path/.rustup/cargo:Xyz", "Abc:Xyz"),
            "windows" => ("Abc;/path/.rustup/cargo;Xyz", "Abc;Xyz"),
            _ => unimplemented!(),
        };

        assert_eq!(sanitized_path(input.into()), expected);
    }

    #[test]
    fn test_doc_command() {
        let cargo = Cargo {
            action: CargoAction::Doc { open: true },
            features: Vec::new(),
            packages: vec![Package::Hiidb],
            release: false,
            target: None,
            warnings_as_errors: true,
        };
        assert_eq!(
            command_to_string(&cargo.command().unwrap()),
            "RUSTDOCFLAGS=-Dwarnings cargo doc --package hiidb --open"
        );
    }

    #[test]
    fn test_build_command() {
        let cargo = Cargo {
            action: CargoAction::Build,
            features: vec![Feature::Qemu],
            packages: vec![Package::HiidbApp],
            release: true,
            target: Some(UefiArch::X86_64),
            warnings_as_errors: false,
        };
        assert_eq!(
            command_to_string(&cargo.command().unwrap()),
            "cargo build --release --target x86_64-unknown-uefi --package hiidb-app --features hiidb-app/qemu"
        );
    }

    #[test]
    fn test_clippy_warnings() {
        let cargo = Cargo {
            action: CargoAction::Clippy,
            features: Vec::new(),
            packages: vec![Package::Xtask],
            release: false,
            target: None,
            warnings_as_errors: true,
        };
        assert_eq!(
            command_to_string(&cargo.command().unwrap()),
            "cargo clippy --package xtask -- -D warnings"
        );
    }

    #[test]
    fn test_empty_packages() {
        let cargo = Cargo {
            action: CargoAction::Test,
            features: Vec::new(),
            packages: Vec::new(),
            release: false,
            target: None,
            warnings_as_errors: false,
        };
        assert!(cargo.command().is_err());
    }
}
