pub mod auth;
pub mod sessions;
pub mod tokens;
pub mod users;
pub mod vault;
