//! Command-line surface for colstore: database creation, inspection, aggregation and the
//! grid scan report.

pub mod cli;
pub mod report;
