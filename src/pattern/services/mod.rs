//! Pattern analysis services.

mod analyzer;

pub use analyzer::{AnalysisReport, AnalyzerError, AnalyzerResult, PatternAnalyzer};
