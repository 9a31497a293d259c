// Public API - what other modules can use
pub use middleware::bearer_auth;
pub use token::TokenIssuer;
pub use types::AccessClaims;

// Internal modules
mod middleware;
mod token;
mod types;
