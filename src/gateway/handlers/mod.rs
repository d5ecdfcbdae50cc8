pub mod check;
pub mod health;
pub mod manage;

pub use check::{check, check_or_verify, verify};
pub use health::{liveness, readiness};
pub use manage::{ManageError, create_key, get_key, search_keys};
