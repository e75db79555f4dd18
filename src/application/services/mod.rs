pub mod describe;
pub mod github_evaluator;
pub mod novelty_evaluator;
pub mod presentation_evaluator;
pub mod startup_service;

#[cfg(test)]
pub(crate) mod test_support;

pub use github_evaluator::GithubEvaluator;
pub use novelty_evaluator::NoveltyEvaluator;
pub use presentation_evaluator::PresentationEvaluator;
pub use startup_service::StartupService;
