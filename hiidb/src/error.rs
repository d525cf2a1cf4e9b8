// SPDX-License-Identifier: MIT OR Apache-2.0

use core::fmt::{self, Display, Formatter};
use uefi::Status;

/// Reasons an export can fail.
///
/// Every variant is terminal for the current invocation; the application
/// reports it and exits with [`ExportError::status`]. An export that already
/// exists is not an error, see [`Outcome::AlreadyExported`].
///
/// [`Outcome::AlreadyExported`]: crate::Outcome::AlreadyExported
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportError {
    /// Probing the `HiiDB` variable failed with something other than
    /// `NOT_FOUND` or `BUFFER_TOO_SMALL`.
    VariableQuery(Status),
    /// The zero-length probe of the `HiiDB` variable did not fail. A
    /// variable that exists should report `BUFFER_TOO_SMALL`, so the store
    /// is in a state the exporter does not understand.
    AnomalousProbe(Status),
    /// The HII database protocol could not be located.
    ProtocolUnavailable(Status),
    /// The HII database reported that the export needs zero bytes.
    NothingToExport,
    /// Runtime memory for the export could not be allocated.
    Allocation(Status),
    /// Filling the export buffer failed.
    Export(Status),
    /// Writing the descriptor to the `HiiDB` variable failed.
    Publish(Status),
}

impl ExportError {
    /// Exit status reported for this error.
    ///
    /// All failures map to [`Status::UNSUPPORTED`]; the log line is what
    /// tells them apart.
    #[must_use]
    pub const fn status(&self) -> Status {
        Status::UNSUPPORTED
    }

    /// The firmware status that caused the failure, if there was one.
    #[must_use]
    pub const fn firmware_status(&self) -> Option<Status> {
        match self {
            Self::VariableQuery(status)
            | Self::AnomalousProbe(status)
            | Self::ProtocolUnavailable(status)
            | Self::Allocation(status)
            | Self::Export(status)
            | Self::Publish(status) => Some(*status),
            Self::NothingToExport => None,
        }
    }
}

impl Display for ExportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::VariableQuery(status) => write!(f, "Failed to retrieve HII DB: {status}"),
            Self::AnomalousProbe(_) => {
                write!(f, "Successfully retrieved HII DB (probably something went wrong?)")
            }
            Self::ProtocolUnavailable(_) => write!(f, "HII protocol could not be found."),
            Self::NothingToExport => write!(f, "Couldn't get size for ExportPackageLists"),
            Self::Allocation(status) => {
                write!(f, "Couldn't allocate memory for ExportPackageLists: {status}")
            }
            Self::Export(status) => write!(f, "ExportPackageLists failed: {status}"),
            Self::Publish(status) => write!(f, "Unable to set HiiDB variable: {status}"),
        }
    }
}

impl core::error::Error for ExportError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_is_generic() {
        let errors = [
            ExportError::VariableQuery(Status::DEVICE_ERROR),
            ExportError::AnomalousProbe(Status::SUCCESS),
            ExportError::ProtocolUnavailable(Status::NOT_FOUND),
            ExportError::NothingToExport,
            ExportError::Allocation(Status::OUT_OF_RESOURCES),
            ExportError::Export(Status::BUFFER_TOO_SMALL),
            ExportError::Publish(Status::WRITE_PROTECTED),
        ];
        for err in errors {
            assert_eq!(err.status(), Status::UNSUPPORTED);
        }
    }

    #[test]
    fn test_firmware_status() {
        assert_eq!(
            ExportError::Export(Status::INVALID_PARAMETER).firmware_status(),
            Some(Status::INVALID_PARAMETER)
        );
        assert_eq!(ExportError::NothingToExport.firmware_status(), None);
    }
}
