use utoipa::OpenApi;

use crate::handlers;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Sieve API",
        version = "0.1.0",
        description = "Stage uploaded files, scan them for sensitive data and route them to the sensitive or non-sensitive bucket."
    ),
    paths(
        handlers::upload::upload_file,
        handlers::events::object_created,
        handlers::events::job_completed,
        handlers::health::health_check,
    ),
    components(schemas(
        handlers::upload::UploadResponse,
        handlers::events::PushEnvelope,
        handlers::events::PushMessage,
        handlers::health::HealthResponse,
        handlers::health::ComponentHealth,
        sieve_core::IntakeReceipt,
        sieve_core::ObjectCreated,
        sieve_infra::ErrorResponse,
    )),
    tags(
        (name = "intake", description = "File submission"),
        (name = "events", description = "Pipeline notification push endpoints"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;

pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
