pub mod base_entity;
pub mod constants;
pub mod test_helpers;
pub mod types;
pub mod validation;
