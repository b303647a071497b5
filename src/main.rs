use axum::Router;
use axum::http::{Method, header};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use studyhub::auth::{AuthApiState, AuthService, JwtConfig, JwtService, auth_api_router};
use studyhub::config::Config;
use studyhub::db::pool::{DbConfig, create_pool_with_migrations};
use studyhub::db::repositories::{BoardRepository, GroupRepository, UserRepository};
use studyhub::groups::{GroupApiState, GroupService, group_api_router};

#[tokio::main]
async fn main() {
    // Load .env file (if exists)
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load application config from environment variables
    let config = Config::from_env();

    // Log config status (without revealing secrets)
    tracing::info!(
        "Config loaded: database={}, secret_key={}",
        config.has_database(),
        config.has_secret_key()
    );

    let db_config = DbConfig::new(config.database_url_or_panic());

    let pool = create_pool_with_migrations(&db_config)
        .await
        .expect("failed to connect to database");

    let user_repo = UserRepository::new(pool.clone());
    let group_repo = GroupRepository::new(pool.clone());
    let board_repo = BoardRepository::new(pool.clone());

    let jwt_service = JwtService::new(JwtConfig::new(config.secret_key_or_panic()));
    let auth_service = AuthService::new(user_repo, jwt_service);
    let group_service = GroupService::new(group_repo.clone(), board_repo);

    let auth_api = auth_api_router(AuthApiState {
        auth_service: auth_service.clone(),
        group_repo,
    });

    let group_api = group_api_router(GroupApiState {
        auth_service,
        group_service,
    });

    // Mirror-any-origin CORS with credentials, for the cookie transport
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true);

    let app = Router::new()
        .merge(auth_api)
        .nest("/group", group_api)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr = config.bind_addr.clone();
    tracing::info!("listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind listener");
    axum::serve(listener, app.into_make_service())
        .await
        .expect("server error");
}
