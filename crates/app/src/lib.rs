//! Shared application domain, persistence and payment gateway modules.

pub mod auth;
pub mod context;
pub mod database;
pub mod domain;
pub mod gateway;

#[cfg(test)]
mod test;

mod uuids;
