//! Curriculum administration.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | GET | `/curriculums` | Paginated list of active curricula |
//! | POST | `/curriculums` | Create a curriculum |
//! | GET | `/curriculums/{id}` | Get one curriculum |
//! | PUT | `/curriculums/{id}` | Update name or description |
//! | DELETE | `/curriculums/{id}` | Soft delete |
//! | POST | `/curriculums/{id}/document` | Upload the curriculum document |
//! | DELETE | `/curriculums/{id}/document` | Remove the curriculum document |
//! | GET | `/mobile/curriculums` | Compact list for the mobile app |
//!
//! Paths are relative to `/{API_PREFIX}/v{API_VERSION}`.

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

pub use services::CurriculumService;
