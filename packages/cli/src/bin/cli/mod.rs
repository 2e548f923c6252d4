pub mod collections;
pub mod records;
pub mod utils;
