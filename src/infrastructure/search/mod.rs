pub mod searchapi_client;

pub use searchapi_client::SearchApiClient;
