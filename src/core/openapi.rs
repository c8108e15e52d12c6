use utoipa::openapi::path::{Operation, PathItem};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::openapi::server::Server;
use utoipa::{Modify, OpenApi};

use crate::features::curriculums::{dtos as curriculums_dtos, handlers as curriculums_handlers};
use crate::modules::storage::UploadedFileDescriptor;
use crate::shared::types::{ApiResponse, ErrorMessage, ErrorResponse, Meta, Paginated};

/// Tag prefix marking operations that only appear in the mobile document
pub const MOBILE_TAG_PREFIX: &str = "mobile";

#[derive(OpenApi)]
#[openapi(
    paths(
        // Curriculums
        curriculums_handlers::list_curriculums,
        curriculums_handlers::get_curriculum,
        curriculums_handlers::create_curriculum,
        curriculums_handlers::update_curriculum,
        curriculums_handlers::delete_curriculum,
        curriculums_handlers::upload_curriculum_document,
        curriculums_handlers::remove_curriculum_document,
        // Mobile
        curriculums_handlers::list_mobile_curriculums,
    ),
    components(
        schemas(
            // Shared
            Meta,
            ErrorMessage,
            ErrorResponse,
            UploadedFileDescriptor,
            // Curriculums
            curriculums_dtos::CreateCurriculumDto,
            curriculums_dtos::UpdateCurriculumDto,
            curriculums_dtos::UploadCurriculumDocumentDto,
            curriculums_dtos::CurriculumResponseDto,
            curriculums_dtos::MobileCurriculumDto,
            ApiResponse<curriculums_dtos::CurriculumResponseDto>,
            ApiResponse<Paginated<curriculums_dtos::CurriculumResponseDto>>,
            ApiResponse<Vec<curriculums_dtos::MobileCurriculumDto>>,
        )
    ),
    tags(
        (name = "curriculums", description = "Curriculum administration"),
        (name = "mobile", description = "Endpoints consumed by the mobile app"),
    ),
    modifiers(&SecurityAddon),
)]
pub struct ApiDoc;

/// Adds Bearer security scheme to OpenAPI spec
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("Bearer")
                        .build(),
                ),
            );
        }
    }
}

/// Which audience a generated document is for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocVariant {
    Web,
    Mobile,
}

impl DocVariant {
    pub fn slug(&self) -> &'static str {
        match self {
            DocVariant::Web => "web",
            DocVariant::Mobile => "mobile",
        }
    }

    fn title(&self) -> &'static str {
        match self {
            DocVariant::Web => "BPK API Module Admin Kurikulum (Web Version)",
            DocVariant::Mobile => "BPK API Module Admin Kurikulum (Mobile Version)",
        }
    }

    fn description(&self) -> &'static str {
        match self {
            DocVariant::Web => "BPK API module admin kurikulum documentation for web",
            DocVariant::Mobile => "BPK API module admin kurikulum documentation for mobile",
        }
    }
}

/// Modifier to override OpenAPI info and server from config
pub struct DocInfoModifier {
    pub variant: DocVariant,
    pub version: String,
    pub server_url: String,
}

impl Modify for DocInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.variant.title().to_string();
        openapi.info.description = Some(self.variant.description().to_string());
        openapi.info.version = self.version.clone();
        openapi.servers = Some(vec![Server::new(self.server_url.clone())]);
    }
}

/// Mount path of a document's Swagger UI, e.g. `/api/docs/v1/web`
pub fn docs_path(api_version: &str, variant: DocVariant) -> String {
    format!("/api/docs/v{}/{}", api_version, variant.slug())
}

/// Build the document for one audience.
///
/// Mobile gets everything; web drops mobile-tagged operations.
pub fn build_document(
    variant: DocVariant,
    api_version: &str,
    base_path: &str,
) -> utoipa::openapi::OpenApi {
    let mut openapi = ApiDoc::openapi();
    DocInfoModifier {
        variant,
        version: api_version.to_string(),
        server_url: base_path.to_string(),
    }
    .modify(&mut openapi);

    if variant == DocVariant::Web {
        filter_mobile_routes(&mut openapi);
    }
    openapi
}

/// Remove every operation carrying a tag that starts with `mobile`
/// (case-insensitive), then any path left without operations
pub fn filter_mobile_routes(openapi: &mut utoipa::openapi::OpenApi) {
    openapi.paths.paths.retain(|_, item| {
        for operation in operations_mut(item) {
            if operation.as_ref().is_some_and(is_mobile_operation) {
                *operation = None;
            }
        }
        operations_mut(item).iter().any(|operation| operation.is_some())
    });
}

fn is_mobile_operation(operation: &Operation) -> bool {
    operation.tags.as_ref().is_some_and(|tags| {
        tags.iter()
            .any(|tag| tag.to_lowercase().starts_with(MOBILE_TAG_PREFIX))
    })
}

fn operations_mut(item: &mut PathItem) -> [&mut Option<Operation>; 8] {
    [
        &mut item.get,
        &mut item.put,
        &mut item.post,
        &mut item.delete,
        &mut item.options,
        &mut item.head,
        &mut item.patch,
        &mut item.trace,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use utoipa::openapi::path::{HttpMethod, OperationBuilder, PathItem, PathsBuilder};
    use utoipa::openapi::{InfoBuilder, OpenApiBuilder};

    fn tagged(tag: &str) -> Operation {
        OperationBuilder::new().tag(tag).build()
    }

    #[test]
    fn test_web_document_drops_mobile_paths() {
        let web = build_document(DocVariant::Web, "1", "/api/v1");

        assert!(web.paths.paths.contains_key("/curriculums"));
        assert!(web.paths.paths.contains_key("/curriculums/{id}/document"));
        assert!(!web.paths.paths.contains_key("/mobile/curriculums"));
        assert_eq!(
            web.info.title,
            "BPK API Module Admin Kurikulum (Web Version)"
        );
    }

    #[test]
    fn test_mobile_document_is_complete() {
        let mobile = build_document(DocVariant::Mobile, "2", "/api/v2");

        assert!(mobile.paths.paths.contains_key("/mobile/curriculums"));
        assert!(mobile.paths.paths.contains_key("/curriculums/{id}"));
        assert_eq!(
            mobile.info.title,
            "BPK API Module Admin Kurikulum (Mobile Version)"
        );
        assert_eq!(mobile.info.version, "2");

        let servers = mobile.servers.unwrap();
        assert_eq!(servers[0].url, "/api/v2");
    }

    #[test]
    fn test_documents_declare_bearer_auth() {
        let web = build_document(DocVariant::Web, "1", "/api/v1");
        let components = web.components.unwrap();
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }

    #[test]
    fn test_filter_is_case_insensitive_and_keeps_mixed_paths() {
        let mut shared = PathItem::new(HttpMethod::Get, tagged("curriculums"));
        shared.post = Some(tagged("Mobile"));

        let mut openapi = OpenApiBuilder::new()
            .info(InfoBuilder::new().title("t").version("1").build())
            .paths(
                PathsBuilder::new()
                    .path("/shared", shared)
                    .path("/app", PathItem::new(HttpMethod::Get, tagged("mobile-app")))
                    .path("/admin", PathItem::new(HttpMethod::Get, tagged("admin"))),
            )
            .build();

        filter_mobile_routes(&mut openapi);

        let paths = &openapi.paths.paths;
        assert!(!paths.contains_key("/app"));
        assert!(paths.contains_key("/admin"));
        let shared = &paths["/shared"];
        assert!(shared.get.is_some());
        assert!(shared.post.is_none());
    }

    #[test]
    fn test_docs_path() {
        assert_eq!(docs_path("1", DocVariant::Web), "/api/docs/v1/web");
        assert_eq!(docs_path("3", DocVariant::Mobile), "/api/docs/v3/mobile");
    }
}
