use flexi_logger::{Duplicate, FileSpec, Logger};

#[macro_use]
pub mod macros;
pub mod float_ext;

/// Absolute tolerance for screen-space float comparisons.
pub const EPSILON: f32 = 1e-3;

pub fn is_debug() -> bool {
    cfg!(debug_assertions)
}

pub fn setup_logging(base_level: &str) {
    let _ = Logger::try_with_str(base_level)
        .unwrap_or_else(|e| panic!("Logger initialization failed with {}", e))
        .log_to_file(FileSpec::default().directory("logs"))
        .duplicate_to_stderr(Duplicate::Warn)
        .duplicate_to_stdout(Duplicate::All)
        .rotate(
            flexi_logger::Criterion::Size(1024 * 1024), //1MB
            flexi_logger::Naming::Timestamps,
            flexi_logger::Cleanup::KeepLogFiles(5),
        )
        .start();
}
