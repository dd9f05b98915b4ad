//! SAML 2.0 metadata namespace elements
//!
//! Only the `RoleDescriptor` extension point is modelled. Concrete role
//! descriptors come from the hosting application's registry; anything else
//! is kept verbatim.

mod role_descriptor;

pub use role_descriptor::*;

/// SAML 2.0 protocol support URI for `protocolSupportEnumeration`
pub const SAML20_PROTOCOL: &str = "urn:oasis:names:tc:SAML:2.0:protocol";
