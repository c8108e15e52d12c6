pub mod curriculum_dto;

pub use curriculum_dto::{
    CreateCurriculumDto, CurriculumQueryParams, CurriculumResponseDto, MobileCurriculumDto,
    UpdateCurriculumDto, UploadCurriculumDocumentDto,
};
