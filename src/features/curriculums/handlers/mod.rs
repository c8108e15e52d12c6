pub mod curriculum_handler;

pub use curriculum_handler::*;
