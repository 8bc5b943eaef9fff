use axum::{
    Json, Router,
    http::StatusCode,
    routing::{get, post},
};
use panel_layout::Error;
use panel_layout::config::{Config, Strategy};
use panel_layout::export::{CsvRow, csv_rows};
use panel_layout::solver::{Solution, Solver, Variant};
use panel_layout::types::Orientation;
use serde::{Deserialize, Serialize};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

#[derive(Deserialize, Serialize)]
struct LayoutRequest {
    /// Parsed by [`Config::from_value`]; missing means defaults.
    #[serde(default)]
    config: Option<serde_json::Value>,
    /// Overrides `config.strategy`.
    #[serde(default)]
    strategy: Option<Strategy>,
    /// Overrides `config.genetic.seed`.
    #[serde(default)]
    seed: Option<u64>,
}

#[derive(Serialize)]
struct LayoutResponse {
    strategy: Strategy,
    orientation: Option<Orientation>,
    variants: Vec<Variant>,
    total_panels: usize,
    power_kw: f64,
    cost: f64,
    /// Rows of the best variant, left side first.
    rows: Vec<CsvRow>,
}

fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::Config(_) | Error::InvalidOrientation(_) | Error::Parse(_) => {
            StatusCode::BAD_REQUEST
        }
        Error::NoSlots { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        Error::Validation(_) | Error::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn solve(req: LayoutRequest) -> panel_layout::Result<Solution> {
    let mut config = match req.config {
        Some(value) => Config::from_value(value)?,
        None => Config::default(),
    };
    if let Some(strategy) = req.strategy {
        config.strategy = strategy;
    }
    if let Some(seed) = req.seed {
        config.genetic.seed = Some(seed);
    }
    config.validate()?;
    Solver::new(config).solve()
}

async fn layout(
    Json(req): Json<LayoutRequest>,
) -> Result<Json<LayoutResponse>, (StatusCode, String)> {
    tracing::info!(
        body = serde_json::to_string(&req).unwrap_or_default(),
        "POST /layout"
    );

    let solution = solve(req).map_err(|e| {
        let status = status_for(&e);
        if status.is_server_error() {
            tracing::error!(error = %e, "layout failed");
        }
        (status, e.to_string())
    })?;

    let rows = solution
        .best()
        .map(|v| {
            v.sides
                .iter()
                .flat_map(|s| csv_rows(s.side, &s.layout))
                .collect()
        })
        .unwrap_or_default();

    Ok(Json(LayoutResponse {
        strategy: solution.strategy,
        orientation: solution.orientation,
        total_panels: solution.total_panels(),
        power_kw: solution.power_kw(),
        cost: solution.cost(),
        variants: solution.variants,
        rows,
    }))
}

#[tokio::main]
async fn main() {
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open("development.log")
        .expect("failed to open development.log");

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_target(false)
        .with_ansi(false)
        .with_max_level(Level::INFO)
        .init();

    let _sentry = std::env::var("SENTRY_DSN").ok().map(|dsn| {
        sentry::init((
            dsn,
            sentry::ClientOptions {
                release: sentry::release_name!(),
                ..Default::default()
            },
        ))
    });

    let port = std::env::var("PORT").unwrap_or_else(|_| "3001".to_string());
    let addr = format!("0.0.0.0:{port}");

    let app = Router::new()
        .route("/up", get(|| async { "ok" }))
        .route("/layout", post(layout))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind listen address");
    eprintln!("Listening on {addr}");
    if let Err(e) = axum::serve(listener, app).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
