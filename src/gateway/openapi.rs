//! OpenAPI documentation
//!
//! - OpenAPI JSON: `http://localhost:8080/api-docs/openapi.json`

use utoipa::OpenApi;

use crate::gateway::types::{AcceptedResponse, ErrorResponse, HealthResponse};
use crate::transfer::TransferRequest;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Transfer Gateway API",
        version = "1.0.0",
        description = "Accepts fund-transfer requests and publishes them as keyed events for asynchronous settlement.",
        license(
            name = "MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Development"),
    ),
    paths(
        crate::gateway::handlers::transfer::submit_transfer,
        crate::gateway::handlers::health::health_check,
    ),
    components(
        schemas(
            TransferRequest,
            AcceptedResponse,
            ErrorResponse,
            HealthResponse,
        )
    ),
    tags(
        (name = "Transfer", description = "Transfer submission"),
        (name = "System", description = "Health checks and system info")
    )
)]
pub struct ApiDoc;
