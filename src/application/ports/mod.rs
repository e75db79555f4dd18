pub mod content_extractor;
pub mod language_model;
pub mod repository_source;
pub mod web_search;

pub use content_extractor::ContentExtractor;
pub use language_model::{CompletionRequest, LanguageModel, Transcriber};
pub use repository_source::RepositorySource;
pub use web_search::{SearchHit, WebSearch};
