use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method},
    routing::get,
    Router,
};
use filedrop_blob::FileRegistry;
use tokio::net::{TcpListener, ToSocketAddrs};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::{routes, FileDropState, ServerConfig};

pub struct FileDropApp {
    pub state: FileDropState,
    pub router: Router<()>,
}

impl FileDropApp {
    pub async fn listen<A>(self, addr: A) -> anyhow::Result<()>
    where
        A: ToSocketAddrs,
    {
        let listener = TcpListener::bind(addr).await?;
        tracing::info!(addr = %listener.local_addr()?, "filedrop listening");
        axum::serve(listener, self.router).await?;
        Ok(())
    }
}

/// Open the registry described by `config` and wire up the router
pub async fn build(config: ServerConfig) -> anyhow::Result<FileDropApp> {
    let registry = FileRegistry::open(config.files.clone()).await?;
    let state = FileDropState::new(registry, config.spool_dir.clone());
    let router = router(state.clone(), &config);
    Ok(FileDropApp { state, router })
}

pub fn router(state: FileDropState, config: &ServerConfig) -> Router<()> {
    let uploads = ServeDir::new(&config.files.upload_root);
    let prefix = config.files.serve_prefix.trim_matches('/');

    let router = Router::new()
        .nest("/api", routes::api_router(state))
        .route("/health", get(|| async { "ok" }));

    let router = if prefix.is_empty() {
        router.fallback_service(uploads)
    } else {
        router.nest_service(&format!("/{}", prefix), uploads)
    };

    router
        .layer(DefaultBodyLimit::max(config.max_request_bytes))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::DELETE])
                .allow_headers([header::CONTENT_TYPE]),
        )
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
}
