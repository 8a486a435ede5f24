use axum::{
    Router,
    extract::{Json, Path, Query, State},
    http::{HeaderValue, StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::core::{
    Catalog, ContributionFrequency, Instrument, InstrumentMetrics, MAX_YEARS_OF_GROWTH,
    MIN_YEARS_OF_GROWTH, ProjectionSummary, RateLookup, ReturnAssumption, RiskProfile,
    SimulationConfig, SimulationPoint, resolve_or_flat, simulate, summarize, yearly_points,
};

const INDEX_HTML: &str = include_str!("../../web/index.html");
const STYLES_CSS: &str = include_str!("../../web/styles.css");
const APP_JS: &str = include_str!("../../web/app.js");

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliContributionFrequency {
    Daily,
    Weekly,
    Monthly,
    Annually,
}

impl From<CliContributionFrequency> for ContributionFrequency {
    fn from(value: CliContributionFrequency) -> Self {
        match value {
            CliContributionFrequency::Daily => ContributionFrequency::Daily,
            CliContributionFrequency::Weekly => ContributionFrequency::Weekly,
            CliContributionFrequency::Monthly => ContributionFrequency::Monthly,
            CliContributionFrequency::Annually => ContributionFrequency::Annually,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliRiskProfile {
    Conservative,
    Average,
    Aggressive,
}

impl From<CliRiskProfile> for RiskProfile {
    fn from(value: CliRiskProfile) -> Self {
        match value {
            CliRiskProfile::Conservative => RiskProfile::Conservative,
            CliRiskProfile::Average => RiskProfile::Average,
            CliRiskProfile::Aggressive => RiskProfile::Aggressive,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ApiContributionFrequency {
    Daily,
    Weekly,
    Monthly,
    #[serde(alias = "annual", alias = "yearly")]
    Annually,
}

impl From<ApiContributionFrequency> for CliContributionFrequency {
    fn from(value: ApiContributionFrequency) -> Self {
        match value {
            ApiContributionFrequency::Daily => CliContributionFrequency::Daily,
            ApiContributionFrequency::Weekly => CliContributionFrequency::Weekly,
            ApiContributionFrequency::Monthly => CliContributionFrequency::Monthly,
            ApiContributionFrequency::Annually => CliContributionFrequency::Annually,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ApiRiskProfile {
    Conservative,
    #[serde(alias = "moderate")]
    Average,
    Aggressive,
}

impl From<ApiRiskProfile> for CliRiskProfile {
    fn from(value: ApiRiskProfile) -> Self {
        match value {
            ApiRiskProfile::Conservative => CliRiskProfile::Conservative,
            ApiRiskProfile::Average => CliRiskProfile::Average,
            ApiRiskProfile::Aggressive => CliRiskProfile::Aggressive,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SimulatePayload {
    initial_deposit: Option<f64>,
    years_of_growth: Option<i64>,
    contribution_amount: Option<f64>,
    contribution_frequency: Option<ApiContributionFrequency>,

    ticker: Option<String>,
    profile: Option<ApiRiskProfile>,
    annual_return: Option<f64>,

    compare_ticker: Option<String>,
    compare_return: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SearchQuery {
    q: String,
}

/// Project long-term portfolio growth for an ETF, a risk profile or a custom return.
#[derive(Parser, Debug, Clone)]
#[command(name = "snowball", version)]
pub struct Cli {
    #[arg(
        long,
        default_value_t = 1000.0,
        allow_negative_numbers = true,
        help = "Initial deposit, negative amounts clamp to 0"
    )]
    initial_deposit: f64,
    #[arg(
        long,
        default_value_t = 10,
        allow_negative_numbers = true,
        help = "Years of growth, clamped to 1..=100"
    )]
    years: i64,
    #[arg(
        long,
        default_value_t = 100.0,
        allow_negative_numbers = true,
        help = "Recurring contribution amount, negative amounts clamp to 0"
    )]
    contribution: f64,
    #[arg(long, value_enum, default_value_t = CliContributionFrequency::Monthly)]
    contribution_frequency: CliContributionFrequency,
    #[arg(long, help = "Catalog ticker whose average return drives the projection")]
    ticker: Option<String>,
    #[arg(
        long,
        value_enum,
        default_value_t = CliRiskProfile::Average,
        help = "Growth preset used when neither --ticker nor --annual-return is given"
    )]
    profile: CliRiskProfile,
    #[arg(
        long,
        allow_negative_numbers = true,
        help = "Custom average annual return in percent"
    )]
    annual_return: Option<f64>,
    #[arg(long, help = "Catalog ticker for the comparison series")]
    compare_ticker: Option<String>,
    #[arg(
        long,
        allow_negative_numbers = true,
        help = "Custom annual return in percent for the comparison series"
    )]
    compare_return: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct RateSummary {
    source: String,
    annual_rate: f64,
}

#[derive(Debug)]
struct ProjectionRequest {
    config: SimulationConfig,
    primary_rate: RateSummary,
    compare_rate: Option<RateSummary>,
    warnings: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SimulateResponse {
    initial_deposit: f64,
    years_of_growth: u32,
    contribution_amount: f64,
    contribution_frequency: ContributionFrequency,
    primary_rate: RateSummary,
    compare_rate: Option<RateSummary>,
    warnings: Vec<String>,
    summary: ProjectionSummary,
    yearly_points: Vec<SimulationPoint>,
    points: Vec<SimulationPoint>,
}

#[derive(Debug, Serialize)]
struct SearchResponse {
    instruments: Vec<&'static Instrument>,
}

#[derive(Debug, Serialize)]
struct InstrumentResponse {
    instrument: &'static Instrument,
    metrics: InstrumentMetrics,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn build_request(cli: Cli, lookup: &dyn RateLookup) -> Result<ProjectionRequest, String> {
    let ticker = non_empty(cli.ticker);
    let compare_ticker = non_empty(cli.compare_ticker);

    if ticker.is_some() && cli.annual_return.is_some() {
        return Err("--ticker and --annual-return cannot both be set".to_string());
    }
    if compare_ticker.is_some() && cli.compare_return.is_some() {
        return Err("--compare-ticker and --compare-return cannot both be set".to_string());
    }

    let years_of_growth = cli
        .years
        .clamp(MIN_YEARS_OF_GROWTH as i64, MAX_YEARS_OF_GROWTH as i64) as u32;
    if years_of_growth as i64 != cli.years {
        tracing::debug!(
            requested = cli.years,
            years_of_growth,
            "years of growth clamped"
        );
    }

    let primary = match (ticker, cli.annual_return) {
        (Some(ticker), _) => ReturnAssumption::Instrument(ticker),
        (None, Some(percent)) => ReturnAssumption::CustomPercent(percent),
        (None, None) => ReturnAssumption::Profile(cli.profile.into()),
    };
    let compare = match (compare_ticker, cli.compare_return) {
        (Some(ticker), _) => Some(ReturnAssumption::Instrument(ticker)),
        (None, Some(percent)) => Some(ReturnAssumption::CustomPercent(percent)),
        (None, None) => None,
    };

    let mut warnings = Vec::new();
    let mut resolve = |assumption: &ReturnAssumption| {
        let resolved = resolve_or_flat(assumption, lookup, years_of_growth);
        if let Some(missing) = resolved.missing {
            warnings.push(format!("{missing}; projecting flat growth"));
        }
        RateSummary {
            source: assumption.label(),
            annual_rate: resolved.annual_rate,
        }
    };
    let primary_rate = resolve(&primary);
    let compare_rate = compare.as_ref().map(&mut resolve);

    let config = SimulationConfig {
        initial_deposit: cli.initial_deposit,
        years_of_growth,
        primary_rate: primary_rate.annual_rate,
        contribution_amount: cli.contribution,
        contribution_frequency: cli.contribution_frequency.into(),
        compare_rate: compare_rate.as_ref().map(|rate| rate.annual_rate),
    }
    .clamped();

    Ok(ProjectionRequest {
        config,
        primary_rate,
        compare_rate,
        warnings,
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn run_projection(request: ProjectionRequest) -> Result<SimulateResponse, String> {
    let points = simulate(&request.config).map_err(|e| e.to_string())?;
    let summary = summarize(&points).ok_or_else(|| "projection produced no points".to_string())?;

    Ok(SimulateResponse {
        initial_deposit: request.config.initial_deposit,
        years_of_growth: request.config.years_of_growth,
        contribution_amount: request.config.contribution_amount,
        contribution_frequency: request.config.contribution_frequency,
        primary_rate: request.primary_rate,
        compare_rate: request.compare_rate,
        warnings: request.warnings,
        summary,
        yearly_points: yearly_points(&points),
        points,
    })
}

/// Runs one projection from command line flags and renders it as JSON.
pub fn project_from_cli(cli: Cli) -> Result<String, String> {
    let request = build_request(cli, &Catalog::builtin())?;
    let response = run_projection(request)?;
    serde_json::to_string_pretty(&response).map_err(|e| format!("failed to render projection: {e}"))
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route("/", get(index_handler))
        .route("/index.html", get(index_handler))
        .route("/styles.css", get(styles_handler))
        .route("/app.js", get(app_js_handler))
        .route(
            "/api/simulate",
            get(simulate_get_handler).post(simulate_post_handler),
        )
        .route("/api/instruments", get(search_handler))
        .route("/api/instruments/:ticker", get(instrument_handler))
        .fallback(not_found_handler)
        .with_state(Catalog::builtin())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("snowball HTTP API listening on http://{addr}");
    tracing::info!("Local access: http://127.0.0.1:{port}/");

    axum::serve(listener, app).await
}

async fn index_handler() -> impl IntoResponse {
    with_cache_control(Html(INDEX_HTML))
}

async fn styles_handler() -> impl IntoResponse {
    with_cache_control((
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        STYLES_CSS,
    ))
}

async fn app_js_handler() -> impl IntoResponse {
    with_cache_control((
        [(
            header::CONTENT_TYPE,
            "application/javascript; charset=utf-8",
        )],
        APP_JS,
    ))
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn simulate_get_handler(
    State(catalog): State<Catalog>,
    Query(payload): Query<SimulatePayload>,
) -> Response {
    simulate_handler_impl(&catalog, payload)
}

async fn simulate_post_handler(
    State(catalog): State<Catalog>,
    Json(payload): Json<SimulatePayload>,
) -> Response {
    simulate_handler_impl(&catalog, payload)
}

fn simulate_handler_impl(catalog: &Catalog, payload: SimulatePayload) -> Response {
    let request = match request_from_payload(payload, catalog) {
        Ok(request) => request,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };

    match run_projection(request) {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(msg) => error_response(StatusCode::BAD_REQUEST, &msg),
    }
}

async fn search_handler(
    State(catalog): State<Catalog>,
    Query(query): Query<SearchQuery>,
) -> Response {
    json_response(
        StatusCode::OK,
        SearchResponse {
            instruments: catalog.search(&query.q),
        },
    )
}

async fn instrument_handler(
    State(catalog): State<Catalog>,
    Path(ticker): Path<String>,
) -> Response {
    match catalog.find(&ticker) {
        Some(instrument) => json_response(
            StatusCode::OK,
            InstrumentResponse {
                instrument,
                metrics: InstrumentMetrics::for_instrument(instrument),
            },
        ),
        None => error_response(
            StatusCode::NOT_FOUND,
            &format!("unknown ticker {}", ticker.to_ascii_uppercase()),
        ),
    }
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    with_cache_control((status, Json(body)))
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
fn request_from_json(json: &str) -> Result<ProjectionRequest, String> {
    let payload = serde_json::from_str::<SimulatePayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    request_from_payload(payload, &Catalog::builtin())
}

fn request_from_payload(
    payload: SimulatePayload,
    lookup: &dyn RateLookup,
) -> Result<ProjectionRequest, String> {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.initial_deposit {
        cli.initial_deposit = v;
    }
    if let Some(v) = payload.years_of_growth {
        cli.years = v;
    }
    if let Some(v) = payload.contribution_amount {
        cli.contribution = v;
    }
    if let Some(v) = payload.contribution_frequency {
        cli.contribution_frequency = v.into();
    }

    if let Some(v) = payload.ticker {
        cli.ticker = Some(v);
    }
    if let Some(v) = payload.profile {
        cli.profile = v.into();
    }
    if let Some(v) = payload.annual_return {
        cli.annual_return = Some(v);
    }

    if let Some(v) = payload.compare_ticker {
        cli.compare_ticker = Some(v);
    }
    if let Some(v) = payload.compare_return {
        cli.compare_return = Some(v);
    }

    build_request(cli, lookup)
}

fn default_cli_for_api() -> Cli {
    Cli {
        initial_deposit: 1_000.0,
        years: 10,
        contribution: 100.0,
        contribution_frequency: CliContributionFrequency::Monthly,
        ticker: None,
        profile: CliRiskProfile::Average,
        annual_return: None,
        compare_ticker: None,
        compare_return: None,
    }
}
