use anyhow::{Error, Result, anyhow};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum UefiArch {
    AArch64,
    IA32,
    #[default]
    X86_64,
}

impl UefiArch {
    fn all() -> &'static [Self] {
        &[Self::AArch64, Self::IA32, Self::X86_64]
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::AArch64 => "aarch64",
            Self::IA32 => "i686",
            Self::X86_64 => "x86_64",
        }
    }

    pub fn as_triple(self) -> String {
        format!("{}-unknown-uefi", self.as_str())
    }

    /// Name of the default boot file in `EFI/Boot` on the ESP.
    pub fn boot_file_name(self) -> &'static str {
        match self {
            Self::AArch64 => "BootAA64.efi",
            Self::IA32 => "BootIA32.efi",
            Self::X86_64 => "BootX64.efi",
        }
    }

    pub fn qemu_exe(self) -> &'static str {
        match self {
            Self::AArch64 => "qemu-system-aarch64",
            Self::IA32 | Self::X86_64 => "qemu-system-x86_64",
        }
    }
}

impl fmt::Display for UefiArch {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for UefiArch {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::all()
            .iter()
            .find(|arch| arch.as_str() == s)
            .cloned()
            .ok_or_else(|| anyhow!("invalid triple: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str() {
        assert_eq!(UefiArch::from_str("x86_64").unwrap(), UefiArch::X86_64);
        assert_eq!(UefiArch::from_str("i686").unwrap(), UefiArch::IA32);
        assert!(UefiArch::from_str("riscv64").is_err());
    }

    #[test]
    fn test_triple() {
        assert_eq!(UefiArch::AArch64.as_triple(), "aarch64-unknown-uefi");
        assert_eq!(UefiArch::default().boot_file_name(), "BootX64.efi");
    }
}
