pub mod config;
pub mod extract;
pub mod parse;
pub mod text;
