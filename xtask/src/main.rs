mod arch;
mod cargo;
mod opt;
mod platform;
mod qemu;
mod util;

use anyhow::Result;
use cargo::{Cargo, CargoAction, Feature, Package};
use clap::Parser;
use opt::{Action, BuildOpt, ClippyOpt, DocOpt, Opt, QemuOpt, TestOpt};
use util::run_cmd;

fn build(opt: &BuildOpt) -> Result<()> {
    let cargo = Cargo {
        action: CargoAction::Build,
        features: Vec::new(),
        packages: Package::uefi(),
        release: opt.build_mode.release,
        target: Some(*opt.target),
        warnings_as_errors: false,
    };
    run_cmd(cargo.command()?)
}

fn clippy(opt: &ClippyOpt) -> Result<()> {
    // Run clippy on all the UEFI packages.
    let cargo = Cargo {
        action: CargoAction::Clippy,
        features: vec![Feature::Qemu],
        packages: Package::uefi(),
        release: false,
        target: Some(*opt.target),
        warnings_as_errors: opt.warning.warnings_as_errors,
    };
    run_cmd(cargo.command()?)?;

    // Run clippy on xtask.
    let cargo = Cargo {
        action: CargoAction::Clippy,
        features: Vec::new(),
        packages: vec![Package::Xtask],
        release: false,
        target: None,
        warnings_as_errors: opt.warning.warnings_as_errors,
    };
    run_cmd(cargo.command()?)
}

/// Build docs.
fn doc(opt: &DocOpt) -> Result<()> {
    let cargo = Cargo {
        action: CargoAction::Doc { open: opt.open },
        features: Vec::new(),
        packages: vec![Package::Hiidb],
        release: false,
        target: None,
        warnings_as_errors: opt.warning.warnings_as_errors,
    };
    run_cmd(cargo.command()?)
}

/// Build the application with the QEMU shutdown hook and boot it twice
/// in one VM session.
fn run_vm_tests(opt: &QemuOpt) -> Result<()> {
    let cargo = Cargo {
        action: CargoAction::Build,
        features: vec![Feature::Qemu],
        packages: vec![Package::HiidbApp],
        release: opt.build_mode.release,
        target: Some(*opt.target),
        warnings_as_errors: false,
    };
    run_cmd(cargo.command()?)?;

    qemu::run_qemu(*opt.target, opt)
}

/// Run unit tests and doctests on the host. The exporter runs against
/// in-memory fakes, so no VM is needed.
fn run_host_tests(_test_opt: &TestOpt) -> Result<()> {
    let cargo = Cargo {
        action: CargoAction::Test,
        features: Vec::new(),
        packages: Package::host_testable(),
        release: false,
        // Use the host target so that tests can run without a VM.
        target: None,
        warnings_as_errors: false,
    };
    run_cmd(cargo.command()?)
}

fn main() -> Result<()> {
    let opt = Opt::parse();

    match &opt.action {
        Action::Build(build_opt) => build(build_opt),
        Action::Clippy(clippy_opt) => clippy(clippy_opt),
        Action::Doc(doc_opt) => doc(doc_opt),
        Action::Run(qemu_opt) => run_vm_tests(qemu_opt),
        Action::Test(test_opt) => run_host_tests(test_opt),
    }
}
