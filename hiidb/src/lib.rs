// SPDX-License-Identifier: MIT OR Apache-2.0

//! Export the firmware's HII database for later boot stages.
//!
//! The Human Interface Infrastructure (HII) database holds the strings and
//! forms that firmware drivers register for the setup screens. It only exists
//! while boot services are running. This crate snapshots the whole database
//! into runtime-services memory and publishes an [`ExportDescriptor`] in the
//! `HiiDB` firmware variable, so that an OS loader or the OS itself can find
//! the blob after `ExitBootServices`.
//!
//! # Crate organisation
//!
//! - [`Exporter`] implements the export sequence against the capability
//!   traits in [`services`]. It has no direct dependency on the firmware and
//!   can be driven by fakes in host tests.
//! - [`firmware`] implements those traits on top of the [`uefi`] crate and
//!   provides [`firmware::export_hii_database`], the one-call entry point
//!   used by the UEFI application.
//!
//! # Example
//!
//! ```no_run
//! use uefi::Status;
//!
//! fn efi_main() -> Status {
//!     hiidb::firmware::export_hii_database()
//! }
//! ```

#![no_std]
#![deny(
    clippy::all,
    clippy::ptr_as_ptr,
    clippy::use_self,
    missing_debug_implementations,
    missing_docs
)]

mod descriptor;
mod error;
mod exporter;

pub mod firmware;
pub mod services;

pub use descriptor::ExportDescriptor;
pub use error::ExportError;
pub use exporter::{Export, ExportTarget, Exporter, Outcome, exit_status};
