//! Infrastructure layer - storage adapters, hashing and the account service

pub mod logging;
pub mod role;
pub mod storage;
pub mod user;
