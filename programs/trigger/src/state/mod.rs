pub mod book;
pub mod pledger;
pub mod treasury;

pub use book::*;
pub use pledger::*;
pub use treasury::*;
