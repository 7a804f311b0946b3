//! Route modules for the XPS server

pub mod convert;
pub mod health;
