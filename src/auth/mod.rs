pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod password;
pub mod roles;

pub use roles::{Identity, Role};
