//! Command implementations for the exepatch CLI

pub mod apply;
pub mod detect;
pub mod inspect;
