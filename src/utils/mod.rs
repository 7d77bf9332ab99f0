pub mod consts;
pub mod cursor;
pub mod logging;

pub use cursor::Cursor;
