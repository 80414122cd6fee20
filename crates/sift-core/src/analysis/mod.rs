//! Product-label analysis: preprocessing, prompt and result types.

pub mod preprocess;
pub mod prompt;
pub mod types;

pub use preprocess::Preprocessor;
pub use prompt::label_prompt;
pub use types::{AnalysisResult, ProviderResult};
