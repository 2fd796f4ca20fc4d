//! StealthQuote command-line dashboard.
pub mod cli;
pub mod platform;
