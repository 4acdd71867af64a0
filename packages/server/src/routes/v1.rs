use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::UploadConfig;
use crate::handlers;
use crate::state::AppState;

pub fn routes(upload: &UploadConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/auth", auth_routes())
        .nest("/collections", collection_routes(upload))
        .nest("/admin/collections", admin_collection_routes())
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::auth::login))
        .routes(routes!(handlers::auth::me))
        .routes(routes!(handlers::auth::verify))
}

fn collection_routes(upload: &UploadConfig) -> OpenApiRouter<AppState> {
    let validate = OpenApiRouter::new().routes(routes!(handlers::collection::validate_code));

    let photos = OpenApiRouter::new()
        .routes(routes!(handlers::collection::upload_photos))
        .layer(handlers::collection::upload_body_limit(
            upload.max_request_bytes,
        ));

    validate.merge(photos)
}

fn admin_collection_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::admin_collection::list_collections,
            handlers::admin_collection::create_collection
        ))
        .routes(routes!(handlers::admin_collection::count_collections))
        .routes(routes!(
            handlers::admin_collection::get_collection,
            handlers::admin_collection::update_collection,
            handlers::admin_collection::delete_collection
        ))
        .routes(routes!(handlers::admin_collection::list_photos))
}
