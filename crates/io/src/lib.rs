// File I/O operations

pub mod checklist;
pub mod csv;
pub mod load;
pub mod report;
pub mod xlsx;

pub use checklist::write_checklist_xlsx;
pub use load::{detect_format, load_table, InputFormat, LoadOptions, LoadStats};
pub use report::{write_problems_csv, write_report_xlsx, write_summary_csv, SideLabels};
