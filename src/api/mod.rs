//! Wire-level model provider APIs.

pub mod anthropic;
