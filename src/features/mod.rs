pub mod curriculums;
