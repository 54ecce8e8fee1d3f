//! Clients for the third-party services this bridge talks to.

pub mod followiz;
