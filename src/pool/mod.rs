pub mod position;
pub mod state;
pub mod swap;
