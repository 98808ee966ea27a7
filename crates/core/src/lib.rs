//! Pure domain rules for the Gotta Listen authentication core.
//!
//! Nothing in this crate touches the database, the network, or the process
//! clock directly; time is read through [`clock::Clock`].

pub mod ban;
pub mod clock;
pub mod error;
pub mod registration;
pub mod types;
