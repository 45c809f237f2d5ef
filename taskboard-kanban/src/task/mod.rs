//! Task commands

mod add;
mod get;
mod mv;

pub use add::AddTask;
pub use get::GetTask;
pub use mv::MoveTask;
