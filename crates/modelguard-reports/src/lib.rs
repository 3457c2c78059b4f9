pub mod formatters;
pub mod store;
pub mod utils;

use modelguard_core::runner::RunOutput;
pub use formatters::{json::JsonFormatter, stdout::StdOutFormatter};
pub use store::ReportStore;

/// Progress and result hooks for a check run.
pub trait Reporter {
    fn on_start(&self);
    fn on_table_load(&self, current: usize, total: usize, name: &str);
    fn on_run_start(&self);
    fn on_check_result(&mut self, output: &RunOutput);
    fn on_summary(&self, passed: usize, failed: usize);
}
