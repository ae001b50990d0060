//! Value objects - immutable types that represent domain concepts

mod server_version;
mod user_id;

pub use server_version::{ServerVersion, ServerVersionParseError};
pub use user_id::{UserId, UserIdParseError};
