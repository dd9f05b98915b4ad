//! SAML 2.0 assertion namespace elements
//!
//! Identifiers, subjects, conditions, statements and the assertion itself.
//! `BaseID`, `Condition` and `Statement` are extension points decoded
//! through [`crate::dispatch`].

mod aggregate;
mod attributes;
mod authn;
mod authz;
mod conditions;
mod constants;
mod identifiers;
mod statements;
mod subject;

pub use aggregate::*;
pub use attributes::*;
pub use authn::*;
pub use authz::*;
pub use conditions::*;
pub use constants::*;
pub use identifiers::*;
pub use statements::*;
pub use subject::*;
