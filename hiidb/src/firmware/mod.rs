// SPDX-License-Identifier: MIT OR Apache-2.0

//! Capabilities backed by UEFI boot and runtime services.
//!
//! These need the [`uefi`] crate's system table to be set up, which the
//! `#[entry]` macro does. They must only be used before boot services are
//! exited.

mod hii;

pub use hii::{BootHii, HiiDatabase};

use crate::exporter::{ExportTarget, Exporter, exit_status};
use crate::services::{RuntimeAllocator, VariableStore};
use core::ptr::NonNull;
use uefi::boot::{self, MemoryType};
use uefi::runtime::{self, VariableAttributes, VariableVendor};
use uefi::{CStr16, Status};

/// Variable store backed by runtime services.
#[derive(Clone, Copy, Debug, Default)]
pub struct RuntimeVariables;

impl VariableStore for RuntimeVariables {
    fn probe(&mut self, name: &CStr16, vendor: &VariableVendor) -> Status {
        match runtime::get_variable(name, vendor, &mut []) {
            Ok(_) => Status::SUCCESS,
            Err(err) => err.status(),
        }
    }

    fn set(
        &mut self,
        name: &CStr16,
        vendor: &VariableVendor,
        attributes: VariableAttributes,
        data: &[u8],
    ) -> uefi::Result {
        runtime::set_variable(name, vendor, attributes, data)
    }
}

/// Pool allocator handing out [`MemoryType::RUNTIME_SERVICES_DATA`].
#[derive(Clone, Copy, Debug, Default)]
pub struct RuntimePool;

impl RuntimeAllocator for RuntimePool {
    fn allocate_runtime(&mut self, size: usize) -> uefi::Result<NonNull<u8>> {
        boot::allocate_pool(MemoryType::RUNTIME_SERVICES_DATA, size)
    }
}

/// Export the HII database to the default [`ExportTarget`] using the
/// firmware's services.
///
/// Returns [`Status::SUCCESS`] if the export was published or already
/// existed, [`Status::UNSUPPORTED`] otherwise. The outcome is logged.
#[must_use]
pub fn export_hii_database() -> Status {
    let mut exporter = Exporter::new(
        ExportTarget::default(),
        RuntimeVariables,
        BootHii,
        RuntimePool,
    );
    exit_status(&exporter.run())
}
