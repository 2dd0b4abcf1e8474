//! `enterprisepro-auth`: client-side authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage: it models who
//! is logged in, what they may do, and which sections they may see.

pub mod authorize;
pub mod permissions;
pub mod roles;
pub mod sections;
pub mod session;
pub mod user;

pub use authorize::{authorize, authorize_section, AuthzError};
pub use permissions::{Permission, PermissionSet};
pub use roles::Role;
pub use sections::{menu_for, Section};
pub use session::{Session, TokenPair};
pub use user::User;
