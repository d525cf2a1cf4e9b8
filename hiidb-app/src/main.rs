// SPDX-License-Identifier: MIT OR Apache-2.0

//! UEFI application that exports the HII database and publishes it in the
//! `HiiDB` variable. Meant to run once per boot, e.g. from a startup script
//! or as a boot option chained before the OS loader.

#![no_main]
#![no_std]

use uefi::prelude::*;

cfg_if::cfg_if! {
    if #[cfg(feature = "qemu")] {
        use log::info;
        use uefi::runtime::{self, ResetType};

        /// Export again to exercise the already-exported path, then power
        /// off so the host sees the result.
        fn finish(status: Status) -> Status {
            let rerun = hiidb::firmware::export_hii_database();
            if status.is_success() && rerun.is_success() {
                info!("HIIDB_EXPORT_COMPLETE");
            }
            runtime::reset(ResetType::SHUTDOWN, status, None)
        }
    } else {
        fn finish(status: Status) -> Status {
            status
        }
    }
}

#[entry]
fn main() -> Status {
    if let Err(err) = uefi::helpers::init() {
        return err.status();
    }

    finish(hiidb::firmware::export_hii_database())
}
