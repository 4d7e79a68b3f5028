//! Secret records held in the external store, plus scope helpers.

pub mod data;
pub mod scope;
pub mod secret;

pub use data::*;
pub use scope::*;
pub use secret::*;
