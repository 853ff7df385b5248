pub mod filter;
pub mod history;
pub mod trend;
pub mod winrate;
