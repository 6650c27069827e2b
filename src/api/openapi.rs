//! OpenAPI documentation and schema generation
//!
//! This module defines the OpenAPI specification for the dvorfs-dl REST API
//! using utoipa for compile-time spec generation.

use utoipa::OpenApi;

/// OpenAPI documentation for the dvorfs-dl REST API
///
/// The spec can be accessed via:
/// - `/openapi.json` - JSON format OpenAPI specification
/// - `/swagger-ui` - Interactive Swagger UI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Dvorfs Downloader Backend",
        description = "Inspect media resources and download a selected rendition as a streamed attachment",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:8000", description = "Local development server")
    ),
    paths(
        // Media
        crate::api::routes::resource_info,
        crate::api::routes::download,

        // System
        crate::api::routes::root,
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
    ),
    components(schemas(
        // Core types from types.rs
        crate::types::MediaKind,
        crate::types::FormatDescriptor,
        crate::types::ResourceInfo,

        // API request types from routes
        crate::api::routes::InfoRequest,
        crate::api::routes::DownloadRequest,

        // Error types from error.rs
        crate::error::ApiError,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "media", description = "Resource metadata and downloads"),
        (name = "system", description = "System endpoints - Identity, health checks, OpenAPI spec"),
    )
)]
pub struct ApiDoc;
