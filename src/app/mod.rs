// App layer: wiring shared by the binaries.

pub mod context;

pub use context::{init_logging, report_failure, AppContext};
