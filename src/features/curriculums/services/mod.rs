pub mod curriculum_service;

pub use curriculum_service::CurriculumService;
