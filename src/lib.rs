pub mod resolver;
pub mod ui;
