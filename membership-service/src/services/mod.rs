pub mod approval;
pub mod email;
pub mod error;
pub mod login;

pub use approval::{ApprovalOutcome, ApprovalService};
pub use email::{EmailProvider, MockEmailService, SmtpEmailService};
pub use error::ServiceError;
pub use login::{CodeIssued, LoginOutcome, LoginService};
