pub mod api;
pub mod commands;
pub mod config;
pub mod error;
pub mod models;
pub mod state;

#[cfg(test)]
mod business_logic_tests;
#[cfg(test)]
mod test_support;

pub use api::ApiClient;
pub use config::Config;
pub use error::{GestionaleError, GestionaleResult};
pub use state::{SessionState, SessionStore, UserProfile};
