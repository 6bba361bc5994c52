//! Registration, log-in and log-out, and the session cookie that proves who
//! is making a request.

mod cookie;
mod log_in;
mod log_out;
mod middleware;
mod register;
mod token;

pub(crate) use cookie::{DEFAULT_COOKIE_DURATION, invalidate_auth_cookie, set_auth_cookie};
pub use log_in::post_log_in;
pub use log_out::post_log_out;
pub use middleware::{AuthContext, auth_guard};
pub use register::register_user;
pub(super) use token::Token;

#[cfg(test)]
pub(crate) use cookie::COOKIE_TOKEN;

#[cfg(test)]
pub use middleware::AuthState;
