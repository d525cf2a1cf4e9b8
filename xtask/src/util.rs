use crate::arch::UefiArch;
use anyhow::{Result, bail};
use std::path::PathBuf;
use std::process::Command;

/// Environment variables that cargo or rustup set internally. Printing them
/// only clutters the output.
const HIDDEN_VARS: [&str; 3] = ["PATH", "RUSTC", "RUSTDOC"];

/// Format a `Command` as a `String`.
///
/// Example: "VAR=val program --arg1 arg2".
pub fn command_to_string(cmd: &Command) -> String {
    let vars = cmd
        .get_envs()
        .filter(|(name, _)| !HIDDEN_VARS.contains(&name.to_str().unwrap_or_default()))
        .map(|(name, val)| {
            format!(
                "{}={}",
                name.to_string_lossy(),
                val.unwrap_or_default().to_string_lossy()
            )
        });
    let program = std::iter::once(cmd.get_program().to_string_lossy().into_owned());
    let args = cmd.get_args().map(|arg| arg.to_string_lossy().into_owned());

    vars.chain(program).chain(args).collect::<Vec<_>>().join(" ")
}

/// Print a `Command` and run it, then check that it completes
/// successfully.
pub fn run_cmd(mut cmd: Command) -> Result<()> {
    println!("{}", command_to_string(&cmd));

    let status = cmd.status()?;
    if status.success() {
        Ok(())
    } else {
        bail!("command failed: {}", status);
    }
}

/// Directory cargo writes the UEFI binaries to.
pub fn build_dir(arch: UefiArch, release: bool) -> PathBuf {
    let mode = if release { "release" } else { "debug" };
    ["target", arch.as_triple().as_str(), mode].iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_command_to_string() {
        let mut cmd = Command::new("MyCommand");
        cmd.args(["abc", "123"]).envs([
            ("VAR1", "val1"),
            ("VAR2", "val2"),
            ("PATH", "pathval"),
            ("RUSTC", "rustcval"),
            ("RUSTDOC", "rustdocval"),
        ]);
        assert_eq!(
            command_to_string(&cmd),
            "VAR1=val1 VAR2=val2 MyCommand abc 123"
        );
    }

    #[test]
    fn test_build_dir() {
        assert_eq!(
            build_dir(UefiArch::X86_64, true),
            Path::new("target/x86_64-unknown-uefi/release")
        );
        assert_eq!(
            build_dir(UefiArch::AArch64, false),
            Path::new("target/aarch64-unknown-uefi/debug")
        );
    }
}
