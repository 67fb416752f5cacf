pub mod guard;
pub mod password;
pub mod token;

pub use guard::{AuthUser, SESSION_COOKIE, Session};
pub use token::{Claims, Purpose, TokenService};
