// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::descriptor::ExportDescriptor;
use crate::error::ExportError;
use crate::services::{HiiLocator, PackageListSource, RuntimeAllocator, VariableStore};
use core::ptr::{self, NonNull};
use core::slice;
use log::{debug, error, info, warn};
use uefi::runtime::{VariableAttributes, VariableVendor};
use uefi::{CStr16, Status, cstr16};
use uefi_raw::protocol::hii::database::HiiDatabaseProtocol;

/// Where and how the descriptor is published.
#[derive(Clone, Debug)]
pub struct ExportTarget<'a> {
    /// Variable name.
    pub name: &'a CStr16,
    /// Variable namespace.
    pub vendor: VariableVendor,
    /// Attributes the variable is created with.
    pub attributes: VariableAttributes,
}

impl ExportTarget<'static> {
    /// Name of the variable later boot stages look for.
    pub const NAME: &'static CStr16 = cstr16!("HiiDB");

    /// The variable lives in the HII database protocol's namespace.
    pub const VENDOR: VariableVendor = VariableVendor(HiiDatabaseProtocol::GUID);
}

impl Default for ExportTarget<'static> {
    /// `HiiDB` in the HII database namespace, visible to boot and runtime
    /// services.
    fn default() -> Self {
        Self {
            name: Self::NAME,
            vendor: Self::VENDOR,
            attributes: VariableAttributes::BOOTSERVICE_ACCESS
                | VariableAttributes::RUNTIME_ACCESS,
        }
    }
}

/// A completed export.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Export {
    /// The published descriptor.
    pub descriptor: ExportDescriptor,
    /// Start of the exported blob in runtime memory.
    pub buffer: NonNull<u8>,
    /// Size of the blob in bytes, before truncation.
    pub size: usize,
}

/// Result of a successful [`Exporter::run`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The variable already existed; nothing was touched.
    AlreadyExported,
    /// The database was exported and the descriptor published.
    Exported(Export),
}

/// Exports the HII database and publishes its descriptor.
///
/// The exporter makes at most one call to each capability and never
/// retries. Running it again in the same boot finds the variable written by
/// the first run and returns [`Outcome::AlreadyExported`].
#[derive(Debug)]
pub struct Exporter<'a, V, H, A> {
    target: ExportTarget<'a>,
    variables: V,
    hii: H,
    allocator: A,
}

impl<'a, V, H, A> Exporter<'a, V, H, A>
where
    V: VariableStore,
    H: HiiLocator,
    A: RuntimeAllocator,
{
    /// Create an exporter publishing to `target`.
    pub const fn new(target: ExportTarget<'a>, variables: V, hii: H, allocator: A) -> Self {
        Self {
            target,
            variables,
            hii,
            allocator,
        }
    }

    /// Run the export and log its outcome.
    pub fn run(&mut self) -> Result<Outcome, ExportError> {
        let result = self.try_run();
        match &result {
            Ok(Outcome::AlreadyExported) => info!("HII export already exists, nothing to do."),
            Ok(Outcome::Exported(export)) => info!(
                "Exported HII Packages ({} bytes), var {}-{}",
                export.size, self.target.name, self.target.vendor.0
            ),
            Err(err) => error!("{err}"),
        }
        result
    }

    fn try_run(&mut self) -> Result<Outcome, ExportError> {
        if self.is_published()? {
            return Ok(Outcome::AlreadyExported);
        }
        self.export().map(Outcome::Exported)
    }

    /// Probe the target variable. Only `NOT_FOUND` leads to a fresh export.
    fn is_published(&mut self) -> Result<bool, ExportError> {
        let status = self.variables.probe(self.target.name, &self.target.vendor);
        debug!("probe of {} returned {status}", self.target.name);
        match status {
            Status::NOT_FOUND => Ok(false),
            Status::BUFFER_TOO_SMALL => Ok(true),
            status if status.is_error() => Err(ExportError::VariableQuery(status)),
            status => Err(ExportError::AnomalousProbe(status)),
        }
    }

    fn export(&mut self) -> Result<Export, ExportError> {
        let mut database = self
            .hii
            .locate()
            .map_err(|err| ExportError::ProtocolUnavailable(err.status()))?;

        let required = database.required_size();
        debug!("HII export needs {required} bytes");
        if required == 0 {
            return Err(ExportError::NothingToExport);
        }

        // Leaked on every path below: the blob has to outlive this
        // application, and on failure the firmware reclaims it at reset.
        let buffer = self
            .allocator
            .allocate_runtime(required)
            .map_err(|err| ExportError::Allocation(err.status()))?;

        // SAFETY: the allocator returned `required` writable bytes that
        // nothing else references. Zeroing them first makes the slice
        // initialized.
        let buf = unsafe {
            ptr::write_bytes(buffer.as_ptr(), 0, required);
            slice::from_raw_parts_mut(buffer.as_ptr(), required)
        };
        let size = database
            .export(buf)
            .map_err(|err| ExportError::Export(err.status()))?;

        let address = buffer.as_ptr() as usize;
        if !ExportDescriptor::fits(size, address) {
            warn!("HII export at {address:#x} ({size} bytes) does not fit the 32-bit descriptor");
        }
        let descriptor = ExportDescriptor::new(size, address);

        self.variables
            .set(
                self.target.name,
                &self.target.vendor,
                self.target.attributes,
                &descriptor.to_bytes(),
            )
            .map_err(|err| ExportError::Publish(err.status()))?;

        Ok(Export {
            descriptor,
            buffer,
            size,
        })
    }
}

/// Exit status for the result of [`Exporter::run`].
#[must_use]
pub fn exit_status(result: &Result<Outcome, ExportError>) -> Status {
    match result {
        Ok(_) => Status::SUCCESS,
        Err(err) => err.status(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uefi::guid;

    #[test]
    fn test_default_target() {
        let target = ExportTarget::default();
        assert_eq!(target.name, cstr16!("HiiDB"));
        assert_eq!(
            target.vendor.0,
            guid!("ef9fc172-a1b2-4693-b327-6d32fc416042")
        );
        assert_eq!(
            target.attributes,
            VariableAttributes::BOOTSERVICE_ACCESS | VariableAttributes::RUNTIME_ACCESS
        );
        assert!(!target.attributes.contains(VariableAttributes::NON_VOLATILE));
    }

    #[test]
    fn test_exit_status() {
        assert_eq!(exit_status(&Ok(Outcome::AlreadyExported)), Status::SUCCESS);
        assert_eq!(
            exit_status(&Err(ExportError::NothingToExport)),
            Status::UNSUPPORTED
        );
        assert_eq!(
            exit_status(&Err(ExportError::Publish(Status::OUT_OF_RESOURCES))),
            Status::UNSUPPORTED
        );
    }
}
