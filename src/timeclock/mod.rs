pub mod clock;
pub mod engine;
pub mod error;
pub mod report;
pub mod session;
pub mod store;

/// Concrete service types wired up in `main`.
pub type SqlSessionManager = session::SessionManager<store::MySqlAttendanceStore>;
pub type SqlReportBuilder = report::ReportBuilder<store::MySqlAttendanceStore>;
