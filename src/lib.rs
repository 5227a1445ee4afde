//! Assign dynamically-typed documents into typed records, mappings, and back.

/// Runtime type model, assignment engine, and document loading.
pub mod mapper;
