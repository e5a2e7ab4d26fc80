#[macro_use]
pub mod errors;
pub mod command;
pub mod console;
pub mod storage;
