// Public API - what other modules can use
pub use handlers::{change_data, change_password, dashboard, login, logout, register};
pub use service::AccountService;

// Internal modules
mod handlers;
pub mod models;
pub mod repository;
pub mod service;
pub mod types;
