pub mod client;
pub mod reply;

pub use client::OpenAiClient;
