pub mod extraction;
pub mod logging;
pub mod search;
