/// Merge several documents into one.
pub mod merge;
/// Load and print one document.
pub mod show;
/// Shared input and output helpers.
pub mod util;
