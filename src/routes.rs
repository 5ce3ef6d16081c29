// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method},
    routing::get,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    handlers::{self, blog, user},
    state::AppState,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Blog API",
        version = "0.1.0",
        description = "Users, blogs and comments with filtering, sorting and cascading deletes"
    ),
    paths(
        blog::list_blogs,
        blog::get_blog,
        blog::create_blog,
        blog::update_blog,
        blog::delete_blog,
        blog::list_comments,
        blog::add_comment,
        user::list_users,
        user::get_user,
        user::create_user,
        user::update_user,
        user::delete_user,
        user::list_user_comments,
        user::list_user_blogs,
    ),
    tags(
        (name = "Blogs", description = "Blog CRUD, filtering and sorting"),
        (name = "Comments", description = "Comments attached to a blog"),
        (name = "Users", description = "User CRUD and reverse listings"),
    )
)]
pub struct ApiDoc;

/// Assembles the main application router.
///
/// * Mounts the blog, comment and user routes at the root.
/// * Serves the OpenAPI document and Swagger UI.
/// * Applies global middleware (Trace, CORS).
pub fn create_router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    let blog_routes = Router::new()
        .route("/", get(blog::list_blogs).post(blog::create_blog))
        .route(
            "/{id}",
            get(blog::get_blog)
                .put(blog::update_blog)
                .delete(blog::delete_blog),
        )
        .route(
            "/{id}/comments",
            get(blog::list_comments).post(blog::add_comment),
        );

    let user_routes = Router::new()
        .route("/", get(user::list_users).post(user::create_user))
        .route(
            "/{id}",
            get(user::get_user)
                .put(user::update_user)
                .delete(user::delete_user),
        )
        .route("/{id}/comments", get(user::list_user_comments))
        .route("/{id}/blogs", get(user::list_user_blogs));

    Router::new()
        .route("/", get(handlers::index))
        .nest("/blogs", blog_routes)
        .nest("/users", user_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
