//! Auth-domain scope sets, decision policies, and cached-token models.

pub mod policy;
pub mod scope;
pub mod token;

pub use policy::*;
pub use scope::*;
pub use token::*;
