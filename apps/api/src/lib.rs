pub mod archive;
pub mod config;
pub mod documents;
pub mod errors;
pub mod interview;
pub mod llm_client;
pub mod provider;
pub mod routes;
pub mod state;
pub mod store;
