//! Authentication: password hashing, bearer tokens and the `/auth` routes.

pub mod handlers;
pub mod password;
pub mod token;

pub use handlers::{routes, AuthState};
pub use token::{Authenticated, Claims, TokenIssuer};
