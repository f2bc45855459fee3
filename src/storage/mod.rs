//! Persistent storage for the document registry

mod database;

pub use database::DocumentDb;
