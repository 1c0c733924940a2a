use actix_cors::Cors;
use actix_web::error::BlockingError;
use actix_web::{web, App, HttpResponse, HttpServer, Result as ActixResult};
use elastic_dql_core::{get_query, ConfigError, Error, Expr, Result, SchemaError};
use elastic_dql_schema::{serialize_mappings, SchemaRegistry};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Where the target index of a request comes from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Take the index from the `index` query parameter
    #[serde(default = "default_accept_index_param")]
    pub accept_index_param: bool,

    /// Used when the parameter is not accepted or not given
    #[serde(default)]
    pub default_index: Option<String>,
}

fn default_accept_index_param() -> bool {
    true
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            accept_index_param: true,
            default_index: None,
        }
    }
}

impl ApiConfig {
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if !self.accept_index_param && self.default_index.is_none() {
            return Err(ConfigError::MissingDefaultIndex);
        }
        Ok(())
    }

    pub fn resolve_index(&self, requested: Option<&str>) -> std::result::Result<String, SchemaError> {
        let requested = requested.filter(|index| self.accept_index_param && !index.is_empty());
        requested
            .or(self.default_index.as_deref())
            .map(str::to_string)
            .ok_or(SchemaError::IndexNotSpecified)
    }
}

/// Shared handler state
#[derive(Clone)]
pub struct ApiState {
    registry: Arc<SchemaRegistry>,
    config: ApiConfig,
}

impl ApiState {
    pub fn new(registry: Arc<SchemaRegistry>, config: ApiConfig) -> Self {
        Self { registry, config }
    }
}

#[derive(Deserialize)]
struct IndexParams {
    index: Option<String>,
}

#[derive(Deserialize)]
struct SuggestionParams {
    index: Option<String>,
    search: Option<String>,
}

#[derive(Deserialize)]
struct QueryRequest {
    expr: Expr,
}

pub struct RestApi;

impl RestApi {
    pub async fn start(state: ApiState, host: &str, port: u16) -> std::io::Result<()> {
        info!("Starting HTTP server on {}:{}", host, port);
        HttpServer::new(move || {
            let cors = Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
                .max_age(3600);

            App::new()
                .wrap(cors)
                .app_data(web::Data::new(state.clone()))
                .configure(RestApi::configure)
        })
        .bind((host, port))?
        .run()
        .await
    }

    /// Register all routes; the caller provides `web::Data<ApiState>`
    pub fn configure(cfg: &mut web::ServiceConfig) {
        cfg.route("/mappings", web::get().to(get_mappings))
            .route("/suggestions/{field}", web::get().to(get_suggestions))
            .route("/query", web::post().to(compile_query));
    }
}

async fn get_mappings(
    state: web::Data<ApiState>,
    params: web::Query<IndexParams>,
) -> ActixResult<HttpResponse> {
    let index = match state.config.resolve_index(params.index.as_deref()) {
        Ok(index) => index,
        Err(e) => return Ok(error_response(e.into())),
    };

    let registry = state.registry.clone();
    let result = web::block(move || -> Result<_> {
        let schema = registry.get_schema_instance(&index)?;
        Ok(serialize_mappings(&schema.get_mappings()?))
    })
    .await;

    Ok(respond(result))
}

async fn get_suggestions(
    state: web::Data<ApiState>,
    path: web::Path<String>,
    params: web::Query<SuggestionParams>,
) -> ActixResult<HttpResponse> {
    let field = path.into_inner();
    let params = params.into_inner();
    let index = match state.config.resolve_index(params.index.as_deref()) {
        Ok(index) => index,
        Err(e) => return Ok(error_response(e.into())),
    };

    let registry = state.registry.clone();
    let result = web::block(move || -> Result<_> {
        let schema = registry.get_schema_instance(&index)?;
        schema.suggestions(&field, params.search.as_deref())
    })
    .await;

    Ok(respond(result))
}

async fn compile_query(
    state: web::Data<ApiState>,
    params: web::Query<IndexParams>,
    req: web::Json<QueryRequest>,
) -> ActixResult<HttpResponse> {
    let index = match state.config.resolve_index(params.index.as_deref()) {
        Ok(index) => index,
        Err(e) => return Ok(error_response(e.into())),
    };

    let registry = state.registry.clone();
    let expr = req.into_inner().expr;
    let result = web::block(move || -> Result<_> {
        let schema = registry.get_schema_instance(&index)?;
        get_query(&expr, &schema)
    })
    .await;

    Ok(respond(result))
}

fn respond<T: Serialize>(result: std::result::Result<Result<T>, BlockingError>) -> HttpResponse {
    match result {
        Ok(Ok(body)) => HttpResponse::Ok().json(body),
        Ok(Err(e)) => error_response(e),
        Err(e) => {
            warn!("Blocking task failed: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": e.to_string()
            }))
        }
    }
}

fn error_response(e: Error) -> HttpResponse {
    warn!("Request failed: {}", e);
    HttpResponse::BadRequest().json(serde_json::json!({
        "error": e.to_string()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::test;
    use elastic_dql_schema::{InMemoryClient, RegistryConfig, SharedClientFactory};
    use serde_json::{json, Value};

    fn state(config: ApiConfig) -> ApiState {
        let client = InMemoryClient::new()
            .with_mapping(
                "books",
                json!({"properties": {
                    "title": {"type": "text", "fields": {"raw": {"type": "keyword"}}},
                    "pages": {"type": "integer"}
                }}),
            )
            .with_search_response(json!({
                "aggregations": {"values": {"buckets": [{"key": "Dune", "doc_count": 2}]}}
            }));
        let factory = Arc::new(SharedClientFactory::new(Arc::new(client)));
        let registry = SchemaRegistry::new(&RegistryConfig::default(), factory).unwrap();
        ApiState::new(Arc::new(registry), config)
    }

    #[::core::prelude::v1::test]
    fn test_resolve_index() {
        let config = ApiConfig::default();
        assert_eq!(config.resolve_index(Some("books")).unwrap(), "books");
        assert_eq!(config.resolve_index(None), Err(SchemaError::IndexNotSpecified));

        let fixed = ApiConfig {
            accept_index_param: false,
            default_index: Some("books".to_string()),
        };
        assert_eq!(fixed.resolve_index(Some("other")).unwrap(), "books");
        assert!(fixed.validate().is_ok());

        let broken = ApiConfig {
            accept_index_param: false,
            default_index: None,
        };
        assert_eq!(broken.validate(), Err(ConfigError::MissingDefaultIndex));
    }

    #[actix_web::test]
    async fn test_mappings_endpoint() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state(ApiConfig::default())))
                .configure(RestApi::configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/mappings?index=books").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(
            body,
            json!([
                {"name": "title", "type": "text"},
                {"name": "title.raw", "type": "keyword"},
                {"name": "pages", "type": "integer"}
            ])
        );
    }

    #[actix_web::test]
    async fn test_missing_index_is_bad_request() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state(ApiConfig::default())))
                .configure(RestApi::configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/mappings").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({"error": "index not specified"}));

        let req = test::TestRequest::get().uri("/mappings?index=x%2F..%2Fbooks").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({"error": "invalid index name: x/../books"}));
    }

    #[actix_web::test]
    async fn test_suggestions_endpoint() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state(ApiConfig::default())))
                .configure(RestApi::configure),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/suggestions/title.raw?index=books&search=Du")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, json!([{"key": "Dune", "doc_count": 2}]));

        let req = test::TestRequest::get().uri("/suggestions/title?index=books").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_query_endpoint_uses_default_index() {
        let config = ApiConfig {
            accept_index_param: false,
            default_index: Some("books".to_string()),
        };
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state(config)))
                .configure(RestApi::configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/query")
            .set_json(json!({"expr": {
                "type": "comparison", "left": "pages", "operator": "!=", "right": 10
            }}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(
            body,
            json!({"query": {"bool": {"filter": [
                {"bool": {"must_not": [{"match": {"pages": 10}}]}}
            ]}}})
        );

        let req = test::TestRequest::post()
            .uri("/query")
            .set_json(json!({"expr": {
                "type": "comparison", "left": "pages", "operator": "~", "right": "1"
            }}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
