//! REST API for the packaging service.
//!
//! Uses Axum as the web framework and supports CORS. Handlers only translate
//! between JSON and the `PackagingService`; no state is written.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::{
    Router,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use std::sync::OnceLock;
use tower_http::cors::{Any, CorsLayer};
use utoipa::{OpenApi, ToSchema};

use crate::config::ApiConfig;
use crate::model::{
    BoxSpec, OptimizationResult, ProductRequest, Recommendation, SavingsResult, ValidationError,
};
use crate::service::{Outcome, PackagingService};
use crate::types::validation;

#[derive(Clone)]
struct ApiState {
    service: PackagingService,
}

static OPENAPI_DOC: OnceLock<utoipa::openapi::OpenApi> = OnceLock::new();

// SRI hashes verified against https://unpkg.com/swagger-ui-dist@5.17.14/ on 2025-10-29.
const SWAGGER_UI_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
    <head>
        <meta charset="utf-8" />
        <title>packwise API Docs</title>
        <link
            rel="stylesheet"
            href="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui.css"
            integrity="sha384-wxLW6kwyHktdDGr6Pv1zgm/VGJh99lfUbzSn6HNHBENZlCN7W602k9VkGdxuFvPn"
            crossorigin="anonymous"
        />
    </head>
    <body>
        <div id="swagger-ui"></div>
        <script
            src="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui-bundle.js"
            integrity="sha384-wmyclcVGX/WhUkdkATwhaK1X1JtiNrr2EoYJ+diV3vj4v6OC5yCeSu+yW13SYJep"
            crossorigin="anonymous"
        ></script>
        <script>
            window.onload = function () {
                window.ui = SwaggerUIBundle({
                    url: "/docs/openapi.json",
                    dom_id: "#swagger-ui",
                });
            };
        </script>
    </body>
    </html>"##;

fn openapi_doc() -> &'static utoipa::openapi::OpenApi {
    OPENAPI_DOC.get_or_init(ApiDoc::openapi)
}

/// Response of `POST /optimize`.
///
/// `status` is `"ok"` with both analyses present, or `"no_fit"` with `error`
/// set when no box in the catalog can hold the product.
#[derive(Serialize, ToSchema)]
pub struct OptimizeResponse {
    pub status: OptimizeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optimization: Option<OptimizationResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carbon_analysis: Option<SavingsResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Product dimensions that were checked, including any fragility padding.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Vec<f64>>, example = json!([52.0, 12.0, 7.0]))]
    pub required_dimensions: Option<(f64, f64, f64)>,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OptimizeStatus {
    Ok,
    NoFit,
}

impl OptimizeResponse {
    fn from_outcome(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Recommended(Recommendation {
                optimization,
                carbon_analysis,
            }) => Self {
                status: OptimizeStatus::Ok,
                optimization: Some(optimization),
                carbon_analysis: Some(carbon_analysis),
                error: None,
                required_dimensions: None,
            },
            Outcome::NoFit(no_fit) => Self {
                status: OptimizeStatus::NoFit,
                optimization: None,
                carbon_analysis: None,
                error: Some(no_fit.to_string()),
                required_dimensions: Some(no_fit.required.as_tuple()),
            },
        }
    }
}

/// Request structure for the savings endpoint.
///
/// `default_volume` defaults to 1.5 times `optimized_volume`.
#[derive(Deserialize, Debug, ToSchema)]
#[schema(example = json!({
    "unit_cost": 25.0,
    "optimized_volume": 6000.0,
    "default_volume": 9000.0
}))]
pub struct SavingsRequest {
    pub unit_cost: f64,
    pub optimized_volume: f64,
    #[serde(default)]
    #[schema(nullable = true)]
    pub default_volume: Option<f64>,
}

impl SavingsRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        validation::validate_positive(self.unit_cost, "Unit cost")
            .map_err(ValidationError::InvalidCost)?;
        validation::validate_positive(self.optimized_volume, "Optimized volume")
            .map_err(ValidationError::InvalidDimension)?;
        if let Some(default_volume) = self.default_volume {
            validation::validate_positive(default_volume, "Default volume")
                .map_err(ValidationError::InvalidDimension)?;
        }
        Ok(())
    }
}

/// Box types in catalog order.
#[derive(Serialize, ToSchema)]
pub struct BoxListResponse {
    pub boxes: Vec<BoxSpec>,
}

#[derive(Serialize, ToSchema)]
struct ErrorResponse {
    error: String,
    details: String,
}

impl ErrorResponse {
    fn new(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: details.into(),
        }
    }
}

fn error_response(
    status: StatusCode,
    error: impl Into<String>,
    details: impl Into<String>,
) -> Response {
    (status, Json(ErrorResponse::new(error, details))).into_response()
}

fn json_deserialize_error(err: JsonRejection) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid JSON data",
        err.to_string(),
    )
}

fn validation_error(err: ValidationError) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid input data",
        err.to_string(),
    )
}

fn configuration_error(details: impl Into<String>) -> Response {
    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        "Service misconfigured",
        details,
    )
}

fn parse_product_request(
    payload: Result<Json<ProductRequest>, JsonRejection>,
) -> Result<ProductRequest, Response> {
    let Json(product) = payload.map_err(json_deserialize_error)?;
    product.validate().map_err(validation_error)?;
    Ok(product)
}

#[derive(OpenApi)]
#[openapi(
    paths(handle_optimize, handle_savings, handle_list_boxes),
    components(
        schemas(
            ProductRequest,
            OptimizeResponse,
            OptimizeStatus,
            OptimizationResult,
            SavingsRequest,
            SavingsResult,
            BoxListResponse,
            BoxSpec,
            ErrorResponse
        )
    ),
    tags((name = "packaging", description = "Box selection and savings estimation"))
)]
struct ApiDoc;

fn router(service: PackagingService) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    Router::new()
        .route("/optimize", post(handle_optimize))
        .route("/savings", post(handle_savings))
        .route("/boxes", get(handle_list_boxes))
        .route("/docs/openapi.json", get(serve_openapi_json))
        .route("/docs", get(serve_openapi_ui))
        .layer(cors)
        .with_state(ApiState { service })
}

/// Starts the API server.
///
/// Configures CORS for cross-origin requests from browser clients.
/// Blocks until the server is terminated.
pub async fn start_api_server(
    config: ApiConfig,
    service: PackagingService,
) -> Result<(), std::io::Error> {
    let app = router(service);

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;

    let display_host = config.display_host();
    tracing::info!(
        "🚀 Server running on http://{}:{}",
        display_host,
        config.port()
    );
    if config.binds_to_all_interfaces() && config.uses_default_host() {
        tracing::info!("💡 Local access: http://localhost:{}", config.port());
    }
    tracing::info!("📦 API endpoints: POST /optimize, POST /savings, GET /boxes");
    tracing::info!("📑 Documentation: GET /docs, GET /docs/openapi.json");

    axum::serve(listener, app).await
}

/// Handler for POST /optimize endpoint.
///
/// Selects the tightest box for the product and estimates the savings
/// against a box 1.5 times its size.
#[utoipa::path(
    post,
    path = "/optimize",
    request_body = ProductRequest,
    responses(
        (status = 200, description = "Recommended box, or a no_fit marker", body = OptimizeResponse),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid product data", body = ErrorResponse),
        (status = INTERNAL_SERVER_ERROR, description = "Material factor table lacks cardboard", body = ErrorResponse)
    ),
    tag = "packaging"
)]
async fn handle_optimize(
    State(state): State<ApiState>,
    payload: Result<Json<ProductRequest>, JsonRejection>,
) -> Response {
    let product = match parse_product_request(payload) {
        Ok(product) => product,
        Err(response) => return response,
    };

    tracing::debug!(
        length = product.length,
        width = product.width,
        height = product.height,
        weight = product.weight,
        fragile = product.fragile,
        "optimize request"
    );

    match state.service.recommend(&product) {
        Ok(outcome) => {
            match &outcome {
                Outcome::Recommended(rec) => tracing::info!(
                    selected_box = %rec.optimization.selected_box,
                    waste_percentage = rec.optimization.waste_percentage,
                    co2_saved_kg = rec.carbon_analysis.co2_saved_kg,
                    "box selected"
                ),
                Outcome::NoFit(no_fit) => tracing::info!(
                    required = ?no_fit.required,
                    weight = no_fit.weight,
                    "no suitable box"
                ),
            }
            (StatusCode::OK, Json(OptimizeResponse::from_outcome(outcome))).into_response()
        }
        Err(err) => {
            tracing::error!(error = %err, "savings estimate failed");
            configuration_error(err.to_string())
        }
    }
}

/// Handler for POST /savings endpoint.
#[utoipa::path(
    post,
    path = "/savings",
    request_body = SavingsRequest,
    responses(
        (status = 200, description = "Savings against the default box", body = SavingsResult),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid volumes or cost", body = ErrorResponse),
        (status = INTERNAL_SERVER_ERROR, description = "Material factor table lacks cardboard", body = ErrorResponse)
    ),
    tag = "packaging"
)]
async fn handle_savings(
    State(state): State<ApiState>,
    payload: Result<Json<SavingsRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(err) => return json_deserialize_error(err),
    };
    if let Err(err) = request.validate() {
        return validation_error(err);
    }

    match state.service.savings(
        request.unit_cost,
        request.default_volume,
        request.optimized_volume,
    ) {
        Ok(savings) => (StatusCode::OK, Json(savings)).into_response(),
        Err(err) => {
            tracing::error!(error = %err, "savings estimate failed");
            configuration_error(err.to_string())
        }
    }
}

/// Handler for GET /boxes endpoint.
#[utoipa::path(
    get,
    path = "/boxes",
    responses((status = 200, description = "All box types in catalog order", body = BoxListResponse)),
    tag = "packaging"
)]
async fn handle_list_boxes(State(state): State<ApiState>) -> Json<BoxListResponse> {
    Json(BoxListResponse {
        boxes: state.service.catalog().boxes().to_vec(),
    })
}

async fn serve_openapi_json() -> impl IntoResponse {
    Json(openapi_doc())
}

async fn serve_openapi_ui() -> impl IntoResponse {
    Html(SWAGGER_UI_HTML)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{BoxCatalog, MaterialFactors};
    use axum::body::Body;
    use axum::http::{Request, header};
    use std::sync::Arc;
    use tower::ServiceExt;

    const CATALOG: &str = "\
box_id,length_cm,width_cm,height_cm,max_weight_kg,cost_per_box
B1,30,20,10,5,10
B2,40,30,20,10,25
";

    fn state_with_materials(materials: &str) -> ApiState {
        crate::logging::init_test();
        let catalog = BoxCatalog::from_reader(CATALOG.as_bytes()).unwrap();
        let factors = MaterialFactors::from_reader(materials.as_bytes()).unwrap();
        ApiState {
            service: PackagingService::new(Arc::new(catalog), Arc::new(factors)),
        }
    }

    fn state() -> ApiState {
        state_with_materials("material_type,co2_per_kg_kg\ncardboard,2.0\n")
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should be readable");
        serde_json::from_slice(&bytes).expect("body should be JSON")
    }

    fn product_json(value: serde_json::Value) -> Result<Json<ProductRequest>, JsonRejection> {
        Ok(Json(serde_json::from_value(value).expect("valid product JSON")))
    }

    #[test]
    fn openapi_doc_lists_expected_paths() {
        let doc = openapi_doc();
        let paths = &doc.paths.paths;
        for path in ["/optimize", "/savings", "/boxes"] {
            assert!(
                paths.contains_key(path),
                "OpenAPI documentation is missing the {} path",
                path
            );
        }
    }

    #[test]
    fn openapi_doc_contains_key_schemas() {
        let doc = openapi_doc();
        let components = doc
            .components
            .as_ref()
            .expect("OpenAPI documentation contains no components");
        let schemas = &components.schemas;
        for name in [
            "ProductRequest",
            "OptimizeResponse",
            "SavingsResult",
            "BoxSpec",
            "ErrorResponse",
        ] {
            assert!(
                schemas.contains_key(name),
                "Expected schema '{}' is missing from OpenAPI spec",
                name
            );
        }
    }

    #[test]
    fn savings_request_default_volume_is_optional() {
        let request: SavingsRequest =
            serde_json::from_str(r#"{"unit_cost": 25.0, "optimized_volume": 6000.0}"#)
                .expect("Should parse valid JSON");
        assert_eq!(request.default_volume, None);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn savings_request_rejects_non_positive_values() {
        let request = SavingsRequest {
            unit_cost: 0.0,
            optimized_volume: 6000.0,
            default_volume: None,
        };
        assert!(matches!(
            request.validate(),
            Err(ValidationError::InvalidCost(_))
        ));

        let request = SavingsRequest {
            unit_cost: 1.0,
            optimized_volume: 6000.0,
            default_volume: Some(-1.0),
        };
        assert!(matches!(
            request.validate(),
            Err(ValidationError::InvalidDimension(_))
        ));
    }

    #[tokio::test]
    async fn optimize_returns_box_and_savings() {
        let response = handle_optimize(
            State(state()),
            product_json(json!({
                "length": 25.0, "width": 15.0, "height": 8.0, "weight": 3.0, "fragile": true
            })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["optimization"]["selected_box"], "B1");
        assert_eq!(body["optimization"]["box_dimensions"], json!([30.0, 20.0, 10.0]));
        assert_eq!(body["optimization"]["waste_percentage"], 23.5);
        assert_eq!(body["carbon_analysis"]["cost_saved"], 5.0);
        assert!(body.get("error").is_none());
    }

    #[tokio::test]
    async fn optimize_reports_no_fit_as_structured_output() {
        let response = handle_optimize(
            State(state()),
            product_json(json!({
                "length": 50.0, "width": 10.0, "height": 5.0, "weight": 1.0
            })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["status"], "no_fit");
        assert_eq!(body["error"], "No suitable box found");
        assert_eq!(body["required_dimensions"], json!([50.0, 10.0, 5.0]));
        assert!(body.get("optimization").is_none());
    }

    #[tokio::test]
    async fn optimize_rejects_negative_weight() {
        let response = handle_optimize(
            State(state()),
            product_json(json!({
                "length": 5.0, "width": 5.0, "height": 5.0, "weight": -2.0
            })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = body_json(response).await;
        assert_eq!(body["error"], "Invalid input data");
    }

    #[tokio::test]
    async fn optimize_without_cardboard_factor_is_server_error() {
        let state = state_with_materials("material_type,co2_per_kg_kg\nplastic,6.0\n");
        let response = handle_optimize(
            State(state),
            product_json(json!({
                "length": 25.0, "width": 15.0, "height": 8.0, "weight": 3.0
            })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn savings_matches_reference_values() {
        let request = SavingsRequest {
            unit_cost: 25.0,
            optimized_volume: 6000.0,
            default_volume: Some(9000.0),
        };
        let response = handle_savings(State(state()), Ok(Json(request))).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["weight_saved_kg"], 2.1);
        assert_eq!(body["co2_saved_kg"], 4.2);
        assert_eq!(body["cost_saved"], 12.5);
        assert_eq!(body["sustainability_score"], 42.0);
    }

    fn json_request(method: &str, uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_owned()))
            .expect("valid request")
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("valid request")
    }

    async fn send(state: ApiState, request: Request<Body>) -> Response {
        router(state.service)
            .oneshot(request)
            .await
            .expect("router never fails")
    }

    #[tokio::test]
    async fn router_rejects_malformed_json_with_422() {
        let response = send(
            state(),
            json_request("POST", "/optimize", r#"{"length": 25.0, "width":"#),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = body_json(response).await;
        assert_eq!(body["error"], "Invalid JSON data");
    }

    #[tokio::test]
    async fn router_rejects_mistyped_fields_with_422() {
        let response = send(
            state(),
            json_request(
                "POST",
                "/optimize",
                r#"{"length": "long", "width": 15.0, "height": 8.0, "weight": 3.0}"#,
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = body_json(response).await;
        assert_eq!(body["error"], "Invalid JSON data");
    }

    #[tokio::test]
    async fn router_serves_optimize() {
        let response = send(
            state(),
            json_request(
                "POST",
                "/optimize",
                r#"{"length": 25.0, "width": 15.0, "height": 8.0, "weight": 3.0}"#,
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["optimization"]["selected_box"], "B1");
        assert_eq!(body["optimization"]["waste_percentage"], 50.0);
    }

    #[tokio::test]
    async fn router_lists_boxes() {
        let response = send(state(), get_request("/boxes")).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["boxes"][0]["box_id"], "B1");
        assert_eq!(body["boxes"][1]["box_id"], "B2");
    }

    #[tokio::test]
    async fn router_savings_without_cardboard_is_server_error() {
        let state = state_with_materials("material_type,co2_per_kg_kg\nplastic,6.0\n");
        let response = send(
            state,
            json_request(
                "POST",
                "/savings",
                r#"{"unit_cost": 25.0, "optimized_volume": 6000.0}"#,
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["error"], "Service misconfigured");
    }

    #[tokio::test]
    async fn router_savings_with_invalid_volume_is_422() {
        let response = send(
            state(),
            json_request(
                "POST",
                "/savings",
                r#"{"unit_cost": 25.0, "optimized_volume": 0.0}"#,
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = body_json(response).await;
        assert_eq!(body["error"], "Invalid input data");
    }

    #[tokio::test]
    async fn router_serves_documentation() {
        let response = send(state(), get_request("/docs/openapi.json")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert!(body["paths"].get("/optimize").is_some());

        let response = send(state(), get_request("/docs")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should be readable");
        assert!(String::from_utf8_lossy(&bytes).contains("swagger-ui"));
    }

    #[tokio::test]
    async fn router_rejects_wrong_method() {
        let response = send(state(), get_request("/optimize")).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn router_allows_cross_origin_requests() {
        let request = Request::builder()
            .uri("/boxes")
            .header(header::ORIGIN, "http://example.com")
            .body(Body::empty())
            .expect("valid request");
        let response = send(state(), request).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );
    }

    #[tokio::test]
    async fn list_boxes_keeps_catalog_order() {
        let Json(body) = handle_list_boxes(State(state())).await;
        let ids: Vec<&str> = body.boxes.iter().map(|b| b.box_id.as_str()).collect();
        assert_eq!(ids, ["B1", "B2"]);
    }
}
