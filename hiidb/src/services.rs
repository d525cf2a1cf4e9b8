// SPDX-License-Identifier: MIT OR Apache-2.0

//! Firmware capabilities used by the [`Exporter`].
//!
//! Each trait covers one firmware service the export depends on. The
//! [`firmware`] module implements them with boot and runtime services; tests
//! substitute their own implementations.
//!
//! [`Exporter`]: crate::Exporter
//! [`firmware`]: crate::firmware

use core::ptr::NonNull;
use uefi::runtime::{VariableAttributes, VariableVendor};
use uefi::{CStr16, Status};

/// Access to named firmware variables.
pub trait VariableStore {
    /// Query `name` with a zero-length buffer and return the raw status.
    ///
    /// An existing variable reports [`Status::BUFFER_TOO_SMALL`], a missing
    /// one [`Status::NOT_FOUND`].
    fn probe(&mut self, name: &CStr16, vendor: &VariableVendor) -> Status;

    /// Create or overwrite `name` with `data`.
    fn set(
        &mut self,
        name: &CStr16,
        vendor: &VariableVendor,
        attributes: VariableAttributes,
        data: &[u8],
    ) -> uefi::Result;
}

/// Discovery of the HII database service.
pub trait HiiLocator {
    /// Handle to the located service.
    type Database: PackageListSource;

    /// Find the HII database.
    fn locate(&mut self) -> uefi::Result<Self::Database>;
}

/// Export of all HII package lists.
pub trait PackageListSource {
    /// Number of bytes needed to export every package list.
    ///
    /// Zero means the size could not be determined.
    fn required_size(&mut self) -> usize;

    /// Export every package list into `buf`, returning the number of bytes
    /// written.
    fn export(&mut self, buf: &mut [u8]) -> uefi::Result<usize>;
}

/// Allocation of memory that outlives boot services.
pub trait RuntimeAllocator {
    /// Allocate `size` bytes that stay mapped after `ExitBootServices`.
    ///
    /// The allocation is never released by the caller.
    fn allocate_runtime(&mut self, size: usize) -> uefi::Result<NonNull<u8>>;
}

impl<T: VariableStore + ?Sized> VariableStore for &mut T {
    fn probe(&mut self, name: &CStr16, vendor: &VariableVendor) -> Status {
        (**self).probe(name, vendor)
    }

    fn set(
        &mut self,
        name: &CStr16,
        vendor: &VariableVendor,
        attributes: VariableAttributes,
        data: &[u8],
    ) -> uefi::Result {
        (**self).set(name, vendor, attributes, data)
    }
}

impl<T: RuntimeAllocator + ?Sized> RuntimeAllocator for &mut T {
    fn allocate_runtime(&mut self, size: usize) -> uefi::Result<NonNull<u8>> {
        (**self).allocate_runtime(size)
    }
}
