use actix_web::web;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers;
use crate::models::*;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::lottery::draw,
        handlers::lottery::get_prizes,
        handlers::lottery::get_records,
    ),
    components(
        schemas(
            DrawRequest,
            DrawResponse,
            DrawRecordQuery,
            DrawRecordResponse,
            PrizeResponse,
            ParticipantResponse,
            PaginationParams,
            ApiError,
        )
    ),
    tags(
        (name = "lottery", description = "Weighted lottery draw API"),
    ),
    info(
        title = "Lottery Backend API",
        version = "0.1.0",
        description = "Weighted prize draws with transactional inventory"
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}
