pub mod chart;
pub mod config;
pub mod dashboard;
pub mod data;
pub mod fetch;
pub mod report;
pub mod stats;

pub use chart::{ChartDescriptor, ChartKind, DataPoint};
pub use config::Config;
pub use data::{SalesRecord, SalesTable};
pub use report::{build_report, report_from_inputs, Report, ReportError, ReportKind};
