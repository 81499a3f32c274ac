//! Domain models for the membership service.

mod access_request;
mod group;
mod session;
mod user;
mod verification_code;

pub use access_request::{AccessRequest, AccessRequestResponse, RequestStatus};
pub use group::{Group, GroupMembership, GroupResponse, MemberRole};
pub use session::Session;
pub use user::{User, UserResponse};
pub use verification_code::VerificationCode;
