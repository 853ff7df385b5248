pub mod client;
pub mod sheet;
