//! Ranking reports, the CSV artifact, and console/JSON rendering

pub mod formatter;
pub mod report;

pub use formatter::{OutputFormatter, ReportGenerator};
pub use report::{RankingArtifact, RankingReport};
