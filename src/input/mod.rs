//! Input processing module
//! Handles format detection, text extraction, and loading files into documents

pub mod file_detector;
pub mod text_extractor;
pub mod manager;

pub use file_detector::DocumentFormat;
pub use text_extractor::TextExtractor;
