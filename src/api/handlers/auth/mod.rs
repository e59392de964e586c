//! Authentication and session management.
//!
//! Flow Overview: the login endpoint runs the credential state machine
//! (lookup, lockout short-circuit, password check, attempt bookkeeping) and
//! issues a signed session token; the session guard verifies that token ahead
//! of every protected route and hands handlers a typed identity.

pub mod login;
pub mod principal;
pub mod register;
pub mod session;
pub mod state;
pub mod types;

pub(crate) mod password;
pub(crate) mod storage;
pub(crate) mod token;

pub use self::principal::Identity;
pub use self::state::{AuthConfig, AuthState};
