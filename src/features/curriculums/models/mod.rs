pub mod curriculum;

pub use curriculum::Curriculum;
