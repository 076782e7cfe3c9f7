pub mod error;
pub mod process;
pub mod report;
pub mod walk;

pub use error::UpdateError;
pub use process::process_file;
pub use report::{DirectoryReport, FileOutcome, FileReport, RunReport, Totals};
pub use walk::{run, UpdateOptions};

#[cfg(test)]
mod testing;
