pub mod cli;
pub mod ui;
