pub mod hasher;
pub mod serde_helpers;
