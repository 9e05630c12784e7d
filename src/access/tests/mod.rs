//! Unit tests for the access module.


use crate::request::{CallerIdentity, Role, UserId};

pub(super) fn identity(user: &str, role: Role) -> CallerIdentity {
    CallerIdentity::new(UserId::new(user).expect("valid user id"), role)
}
