//! Column commands

mod list;

pub use list::ListColumn;
