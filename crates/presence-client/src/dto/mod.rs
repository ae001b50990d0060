//! Wire types of the presence endpoint

mod responses;

pub use responses::{PresenceUserDto, UsersPresenceResponse};
