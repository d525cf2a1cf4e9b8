// SPDX-License-Identifier: MIT OR Apache-2.0

//! HII Database protocol.

use crate::services::{HiiLocator, PackageListSource};
use core::ptr;
use uefi::boot::{self, OpenProtocolAttributes, OpenProtocolParams, ScopedProtocol};
use uefi::proto::unsafe_protocol;
use uefi::{Status, StatusExt};
use uefi_raw::protocol::hii::database::HiiDatabaseProtocol;

/// The HII Database Protocol.
///
/// Only the package list export is wrapped here; it serializes every package
/// list the firmware knows about into a caller-provided buffer.
///
/// # UEFI Spec Description
///
/// Database manager for HII-related data structures.
#[derive(Debug)]
#[repr(transparent)]
#[unsafe_protocol(HiiDatabaseProtocol::GUID)]
pub struct HiiDatabase(HiiDatabaseProtocol);

impl HiiDatabase {
    /// Call `ExportPackageLists` for all package lists with a buffer of
    /// `size` bytes at `buffer`. On return `size` holds the size the
    /// firmware wrote or needs.
    ///
    /// # Safety
    ///
    /// `buffer` must be null with `size == 0`, or valid for `size` bytes of
    /// writes.
    unsafe fn export_package_lists(&self, buffer: *mut u8, size: &mut usize) -> Status {
        unsafe {
            (self.0.export_package_lists)(&self.0, ptr::null_mut(), size, buffer.cast())
        }
    }
}

impl PackageListSource for HiiDatabase {
    fn required_size(&mut self) -> usize {
        let mut size = 0;
        // The probe is expected to fail with BUFFER_TOO_SMALL; only the
        // reported size matters.
        // SAFETY: null buffer with a zero size.
        let status = unsafe { self.export_package_lists(ptr::null_mut(), &mut size) };
        log::debug!("ExportPackageLists size probe: {status}, {size} bytes");
        size
    }

    fn export(&mut self, buf: &mut [u8]) -> uefi::Result<usize> {
        let mut size = buf.len();
        // SAFETY: `buf` is valid for `size` bytes of writes.
        unsafe { self.export_package_lists(buf.as_mut_ptr(), &mut size) }
            .to_result_with_val(|| size)
    }
}

impl PackageListSource for ScopedProtocol<HiiDatabase> {
    fn required_size(&mut self) -> usize {
        (**self).required_size()
    }

    fn export(&mut self, buf: &mut [u8]) -> uefi::Result<usize> {
        (**self).export(buf)
    }
}

/// Locates the HII database through boot services.
#[derive(Clone, Copy, Debug, Default)]
pub struct BootHii;

impl HiiLocator for BootHii {
    type Database = ScopedProtocol<HiiDatabase>;

    fn locate(&mut self) -> uefi::Result<Self::Database> {
        let handle = boot::get_handle_for_protocol::<HiiDatabase>()?;
        // The database is shared by every driver that publishes forms, so
        // open it non-exclusively, like `LocateProtocol` would.
        // SAFETY: the protocol stays installed for the lifetime of boot
        // services and the exporter does not outlive them.
        unsafe {
            boot::open_protocol::<HiiDatabase>(
                OpenProtocolParams {
                    handle,
                    agent: boot::image_handle(),
                    controller: None,
                },
                OpenProtocolAttributes::GetProtocol,
            )
        }
    }
}
