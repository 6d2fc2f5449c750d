//! Architecture boundary tests: run with `cargo test -p firmware --test arch_boundaries`
// Architecture test file: expect/unwrap/panic are intentional test mechanisms.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::assertions_on_constants,
)]
//!
//! Rules:
//!   Rule 1: busfault is pure computation; no cortex-m, defmt only as an option
//!   Rule 2: the BusFault trampoline hands EXC_RETURN over untouched
//!   Rule 3: the fault handler never returns and never allocates
//!
//! Source-level checks read the files with `include_str!`, so a violation
//! fails here before it reaches a hardware build.

const BUSFAULT_MANIFEST: &str = include_str!("../../busfault/Cargo.toml");
const HANDLERS: &str = include_str!("../src/exception_handlers.rs");
const MAIN: &str = include_str!("../src/main.rs");
const BOOT: &str = include_str!("../src/boot.rs");
const MEMORY_X: &str = include_str!("../../../memory.x");

#[test]
fn busfault_has_no_hardware_dependencies() {
    assert!(
        !BUSFAULT_MANIFEST.contains("cortex-m"),
        "busfault must stay host-testable; hardware access belongs in firmware"
    );
    let defmt_optional = BUSFAULT_MANIFEST
        .lines()
        .skip_while(|line| !line.starts_with("[dependencies.defmt]"))
        .find(|line| line.starts_with("optional"))
        .expect("busfault's defmt dependency must be declared");
    assert!(defmt_optional.contains("true"), "defmt must be optional in busfault");
}

#[test]
fn trampoline_passes_lr_in_r0() {
    let mov = HANDLERS.find("mov r0, lr").expect("trampoline must copy lr to r0");
    let branch = HANDLERS.find("b {entry}").expect("trampoline must branch to the entry");
    assert!(mov < branch, "lr must be captured before the branch");
    assert!(HANDLERS.contains("sym bus_fault_entry"));
}

#[test]
fn fault_handler_halts() {
    assert!(HANDLERS.contains("extern \"C\" fn bus_fault_entry(lr: u32) -> !"));
    assert!(
        HANDLERS.contains("defmt::panic!(\"unrecoverable bus fault"),
        "bus_fault_entry must halt via defmt::panic! after the report"
    );
    assert!(!HANDLERS.contains("alloc::"), "fault path must not allocate");
}

/// The defmt console gets the decoded SYSMPU error capture, not only the raw
/// report words.
#[test]
fn fault_handler_logs_mpu_error_capture() {
    let report = HANDLERS.find("stream_report(&report").expect("report must be streamed");
    let ports = HANDLERS.find("report.mpu.faulting_ports()").expect("faulting ports must be logged");
    let halt = HANDLERS.find("defmt::panic!(\"unrecoverable bus fault").unwrap();
    assert!(report < ports && ports < halt);
    for accessor in ["access_control_detail()", "master()", "attributes()", "revision()"] {
        assert!(HANDLERS.contains(accessor), "{accessor} must reach the log");
    }
}

#[test]
fn boot_runs_before_main_loop() {
    let init = MAIN.find("boot::hardware::init").expect("main must run the boot sequence");
    let idle = MAIN.find("loop {").expect("main must idle in a loop");
    assert!(init < idle);
}

/// ACTLR goes through cortex-m's typed ICB register, never a raw address.
#[test]
fn actlr_written_through_icb() {
    assert!(BOOT.contains("icb.actlr.modify(actlr_with_precise_faults)"));
    assert!(!BOOT.contains("0xE000_E008"), "no hand-built ACTLR pointer");
    assert!(!BOOT.contains("as *mut u32"), "no raw register pointers in boot");
    assert!(MAIN.contains("boot::hardware::init(&mut core.ICB, &mut core.SCB)"));
}

#[test]
fn memory_x_matches_k64f() {
    assert!(MEMORY_X.contains("ORIGIN = 0x00000000, LENGTH = 1024K"));
    assert!(MEMORY_X.contains("ORIGIN = 0x1FFF0000, LENGTH = 256K"));
    assert!(MAIN.contains("0xFE, // FSEC"), "flash must stay unsecured");
}

/// `.` inside an output section is section-relative: the flash config field
/// must end 0x10 bytes after its start, where `.text` begins.
#[test]
fn flash_config_field_is_sixteen_bytes() {
    let section = MEMORY_X
        .split(".flash_config 0x400 :")
        .nth(1)
        .and_then(|rest| rest.split('}').next())
        .expect("memory.x must place .flash_config at 0x400");
    assert!(section.contains("KEEP(*(.flash_config));"));
    assert!(
        section.contains(". = 0x10;"),
        "location counter must advance by the field size, not to an absolute address"
    );
    assert!(!section.contains(". = 0x410"), "absolute end would make the section 0x410 bytes");
    assert!(MEMORY_X.contains("ASSERT(SIZEOF(.flash_config) == 0x10"));
    assert!(MEMORY_X.contains("_stext = 0x410;"));
    let field_len = MAIN
        .split("static FLASH_CONFIG: [u8; ")
        .nth(1)
        .and_then(|rest| rest.split(']').next())
        .expect("main.rs must define FLASH_CONFIG");
    assert_eq!(field_len, "16");
}

#[test]
fn handler_module_exists() {
    assert!(firmware::exception_handlers::BUSFAULT_DEFINED);
}
