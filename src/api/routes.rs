//! API route definitions

use axum::{
    handler::Handler,
    middleware,
    routing::{get, post, MethodRouter},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::{auth, handlers};
use crate::config::Config;
use crate::error::Result;
use crate::store::RecordStore;
use crate::types::RouteInfo;
use crate::upstream::UpstreamClient;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub upstreams: Arc<UpstreamClient>,
    pub records: Arc<RecordStore>,
    pub api_key: Option<Arc<str>>,
    /// Filled in by `create_router` from the registered route table
    pub routes: Arc<[RouteInfo]>,
}

impl AppState {
    pub fn new(upstreams: UpstreamClient, records: RecordStore, api_key: Option<String>) -> Self {
        Self {
            upstreams: Arc::new(upstreams),
            records: Arc::new(records),
            api_key: api_key.map(Arc::from),
            routes: Arc::from(Vec::<RouteInfo>::new()),
        }
    }

    /// Build the upstream client and open the record store described by `config`
    pub fn from_config(config: &Config) -> Result<Self> {
        let upstreams = UpstreamClient::from_config(config)?;
        let records = RecordStore::open(&config.record_db)?;
        Ok(Self::new(upstreams, records, config.api_key.clone()))
    }
}

/// Router under construction that remembers what was registered on it
pub struct RouteTable {
    router: Router<AppState>,
    routes: Vec<RouteInfo>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self {
            router: Router::new(),
            routes: Vec::new(),
        }
    }

    pub fn get<H, T>(self, path: &str, handler: H) -> Self
    where
        H: Handler<T, AppState>,
        T: 'static,
    {
        self.add("GET", path, handler_name::<H>(), get(handler))
    }

    pub fn post<H, T>(self, path: &str, handler: H) -> Self
    where
        H: Handler<T, AppState>,
        T: 'static,
    {
        self.add("POST", path, handler_name::<H>(), post(handler))
    }

    fn add(
        mut self,
        method: &str,
        path: &str,
        name: String,
        method_router: MethodRouter<AppState>,
    ) -> Self {
        self.routes.push(RouteInfo {
            method: method.to_string(),
            path: path.to_string(),
            name,
        });
        self.router = self.router.route(path, method_router);
        self
    }

    pub fn into_parts(self) -> (Router<AppState>, Vec<RouteInfo>) {
        (self.router, self.routes)
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Fully qualified path of a handler function, e.g. `nlp_gateway::api::handlers::get_health`
fn handler_name<H>() -> String {
    std::any::type_name::<H>().to_string()
}

fn route_table() -> RouteTable {
    RouteTable::new()
        // Health
        .get("/health", handlers::get_health)
        .get("/health/{app}", handlers::get_health_upstream)
        .get("/error", handlers::get_error)

        // Introspection
        .get("/routes", handlers::get_routes)

        // NLP passthroughs
        .post("/keywords", handlers::get_keywords)
        .post("/tokens", handlers::get_tokens)
        .post("/entities", handlers::get_entities)
        .post("/sentences", handlers::get_sentences)
        .post("/language", handlers::get_language)

        // Persistence
        .post("/record", handlers::put_record)
}

/// Everything `create_router` registers, without building any state
pub fn registered_routes() -> Vec<RouteInfo> {
    route_table().into_parts().1
}

/// Create the API router
pub fn create_router(mut state: AppState) -> Router {
    let (router, routes) = route_table().into_parts();
    state.routes = Arc::from(routes);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // route_layer: the key check only wraps registered routes, unknown paths 404 first
    router
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_api_key,
        ))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registered_routes() {
        let routes = registered_routes();
        assert_eq!(routes.len(), 10);

        let keywords = routes.iter().find(|r| r.path == "/keywords").unwrap();
        assert_eq!(keywords.method, "POST");
        assert_eq!(keywords.name, "nlp_gateway::api::handlers::get_keywords");

        let health = routes.iter().find(|r| r.path == "/health/{app}").unwrap();
        assert_eq!(health.method, "GET");
        assert!(health.name.ends_with("::get_health_upstream"));
    }
}
