use axum::{
    Router,
    extract::{Json, Query, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use clap::{Parser, ValueEnum, error::ErrorKind};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::core::{
    CalculationResult, CalculatorInputs, CompoundFrequency, ProjectionSummary,
    calculate_compound_interest,
};
use crate::narrative::{Narrative, NarrativeConfig, generate_narrative};

const MAX_YEARS: u32 = 100;
const MAX_INTEREST_RATE: f64 = 100.0;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliCompoundFrequency {
    Annually,
    Semiannually,
    Quarterly,
    Monthly,
    Daily,
}

impl From<CliCompoundFrequency> for CompoundFrequency {
    fn from(value: CliCompoundFrequency) -> Self {
        match value {
            CliCompoundFrequency::Annually => CompoundFrequency::Annually,
            CliCompoundFrequency::Semiannually => CompoundFrequency::Semiannually,
            CliCompoundFrequency::Quarterly => CompoundFrequency::Quarterly,
            CliCompoundFrequency::Monthly => CompoundFrequency::Monthly,
            CliCompoundFrequency::Daily => CompoundFrequency::Daily,
        }
    }
}

impl From<CompoundFrequency> for CliCompoundFrequency {
    fn from(value: CompoundFrequency) -> Self {
        match value {
            CompoundFrequency::Annually => CliCompoundFrequency::Annually,
            CompoundFrequency::Semiannually => CliCompoundFrequency::Semiannually,
            CompoundFrequency::Quarterly => CliCompoundFrequency::Quarterly,
            CompoundFrequency::Monthly => CliCompoundFrequency::Monthly,
            CompoundFrequency::Daily => CliCompoundFrequency::Daily,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ApiCompoundFrequency {
    #[serde(alias = "annual", alias = "yearly")]
    Annually,
    #[serde(
        alias = "semiAnnually",
        alias = "semi-annually",
        alias = "semi_annually",
        alias = "semiannual"
    )]
    Semiannually,
    #[serde(alias = "quarter")]
    Quarterly,
    Monthly,
    Daily,
}

impl From<ApiCompoundFrequency> for CliCompoundFrequency {
    fn from(value: ApiCompoundFrequency) -> Self {
        match value {
            ApiCompoundFrequency::Annually => CliCompoundFrequency::Annually,
            ApiCompoundFrequency::Semiannually => CliCompoundFrequency::Semiannually,
            ApiCompoundFrequency::Quarterly => CliCompoundFrequency::Quarterly,
            ApiCompoundFrequency::Monthly => CliCompoundFrequency::Monthly,
            ApiCompoundFrequency::Daily => CliCompoundFrequency::Daily,
        }
    }
}

/// Compounding frequency as sent by clients: a name or its periods-per-year value.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(untagged)]
enum FrequencyField {
    Periods(u32),
    Named(ApiCompoundFrequency),
}

impl TryFrom<FrequencyField> for CliCompoundFrequency {
    type Error = String;

    fn try_from(value: FrequencyField) -> Result<Self, Self::Error> {
        match value {
            FrequencyField::Named(named) => Ok(named.into()),
            FrequencyField::Periods(periods) => CompoundFrequency::from_periods_per_year(periods)
                .map(Into::into)
                .ok_or_else(|| {
                    format!("--compound-frequency must be one of 1, 2, 4, 12, 365 (got {periods})")
                }),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct CalculatePayload {
    initial_investment: Option<f64>,
    monthly_contribution: Option<f64>,
    years: Option<u32>,
    interest_rate: Option<f64>,
    compound_frequency: Option<FrequencyField>,
}

/// Raw form fields from a query string. Text is coerced before validation.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct FormQuery {
    initial_investment: Option<String>,
    monthly_contribution: Option<String>,
    years: Option<String>,
    interest_rate: Option<String>,
    compound_frequency: Option<String>,
}

#[derive(Parser, Debug)]
#[command(
    name = "compound",
    about = "Compound interest projection with monthly contributions and configurable compounding"
)]
struct Cli {
    #[arg(long, default_value_t = 10_000.0, help = "Lump sum invested at the start")]
    initial_investment: f64,
    #[arg(long, default_value_t = 500.0, help = "Amount added at the start of every month")]
    monthly_contribution: f64,
    #[arg(long, default_value_t = 20, help = "Projection horizon in years (1-100)")]
    years: u32,
    #[arg(
        long,
        default_value_t = 7.0,
        help = "Nominal annual interest rate in percent, e.g. 7"
    )]
    interest_rate: f64,
    #[arg(long, value_enum, default_value_t = CliCompoundFrequency::Annually)]
    compound_frequency: CliCompoundFrequency,
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CalculateResponse {
    inputs: CalculatorInputs,
    periods_per_year: u32,
    summary: ProjectionSummary,
    result: CalculationResult,
}

#[derive(Debug, Serialize)]
struct NarrativeResponse {
    #[serde(flatten)]
    calculation: CalculateResponse,
    narrative: Narrative,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

struct AppState {
    client: reqwest::Client,
    narrative: NarrativeConfig,
}

fn build_inputs(cli: &Cli) -> Result<CalculatorInputs, String> {
    for (name, amount) in [
        ("--initial-investment", cli.initial_investment),
        ("--monthly-contribution", cli.monthly_contribution),
    ] {
        if !amount.is_finite() || amount < 0.0 {
            return Err(format!("{name} must be >= 0"));
        }
    }

    if !(1..=MAX_YEARS).contains(&cli.years) {
        return Err(format!("--years must be between 1 and {MAX_YEARS}"));
    }

    if !(0.0..=MAX_INTEREST_RATE).contains(&cli.interest_rate) {
        return Err(format!(
            "--interest-rate must be between 0 and {MAX_INTEREST_RATE}"
        ));
    }

    Ok(CalculatorInputs {
        initial_investment: cli.initial_investment,
        monthly_contribution: cli.monthly_contribution,
        years: cli.years,
        interest_rate: cli.interest_rate,
        compound_frequency: cli.compound_frequency.into(),
    })
}

fn default_cli_for_api() -> Cli {
    let defaults = CalculatorInputs::default();
    Cli {
        initial_investment: defaults.initial_investment,
        monthly_contribution: defaults.monthly_contribution,
        years: defaults.years,
        interest_rate: defaults.interest_rate,
        compound_frequency: defaults.compound_frequency.into(),
        format: OutputFormat::Json,
    }
}

fn inputs_from_payload(payload: CalculatePayload) -> Result<CalculatorInputs, String> {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.initial_investment {
        cli.initial_investment = v;
    }
    if let Some(v) = payload.monthly_contribution {
        cli.monthly_contribution = v;
    }
    if let Some(v) = payload.years {
        cli.years = v;
    }
    if let Some(v) = payload.interest_rate {
        cli.interest_rate = v;
    }
    if let Some(v) = payload.compound_frequency {
        cli.compound_frequency = v.try_into()?;
    }

    build_inputs(&cli)
}

#[cfg(test)]
fn inputs_from_json(json: &str) -> Result<CalculatorInputs, String> {
    let payload = serde_json::from_str::<CalculatePayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    inputs_from_payload(payload)
}

/// Form text that does not parse as a number counts as zero.
fn coerce_form_number(text: &str) -> f64 {
    match text.trim().parse::<f64>() {
        Ok(value) if !value.is_nan() => value,
        _ => 0.0,
    }
}

/// Unknown names or period counts fall back to the default frequency.
fn coerce_form_frequency(text: &str) -> CompoundFrequency {
    let text = text.trim().to_ascii_lowercase();
    let named = match text.as_str() {
        "annually" | "annual" | "yearly" => Some(CompoundFrequency::Annually),
        "semiannually" | "semi-annually" | "semi_annually" | "semiannual" => {
            Some(CompoundFrequency::Semiannually)
        }
        "quarterly" => Some(CompoundFrequency::Quarterly),
        "monthly" => Some(CompoundFrequency::Monthly),
        "daily" => Some(CompoundFrequency::Daily),
        _ => None,
    };

    named
        .or_else(|| {
            text.parse::<u32>()
                .ok()
                .and_then(CompoundFrequency::from_periods_per_year)
        })
        .unwrap_or_else(|| {
            debug!("unrecognised compound frequency {text:?}, using default");
            CompoundFrequency::default()
        })
}

fn inputs_from_form(query: FormQuery) -> Result<CalculatorInputs, String> {
    let mut cli = default_cli_for_api();

    if let Some(v) = query.initial_investment.as_deref() {
        cli.initial_investment = coerce_form_number(v);
    }
    if let Some(v) = query.monthly_contribution.as_deref() {
        cli.monthly_contribution = coerce_form_number(v);
    }
    if let Some(v) = query.years.as_deref() {
        let years = coerce_form_number(v);
        if !(0.0..=MAX_YEARS as f64).contains(&years) {
            return Err(format!("--years must be between 1 and {MAX_YEARS}"));
        }
        cli.years = years.trunc() as u32;
    }
    if let Some(v) = query.interest_rate.as_deref() {
        cli.interest_rate = coerce_form_number(v);
    }
    if let Some(v) = query.compound_frequency.as_deref() {
        cli.compound_frequency = coerce_form_frequency(v).into();
    }

    build_inputs(&cli)
}

fn build_calculate_response(inputs: CalculatorInputs) -> CalculateResponse {
    let result = calculate_compound_interest(&inputs);
    CalculateResponse {
        inputs,
        periods_per_year: inputs.compound_frequency.periods_per_year(),
        summary: ProjectionSummary::from_result(&result),
        result,
    }
}

/// Whole-currency display, e.g. `$12,345` or `-$80`. Non-finite values show as `$0`.
pub fn format_currency(value: f64) -> String {
    if !value.is_finite() {
        return "$0".to_string();
    }
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if rounded < 0.0 {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

fn render_table(response: &CalculateResponse) -> String {
    let mut out = format!(
        "{:>4}  {:>16}  {:>16}  {:>16}\n",
        "Year", "Principal", "Interest", "Balance"
    );
    for point in &response.result.yearly_data {
        out.push_str(&format!(
            "{:>4}  {:>16}  {:>16}  {:>16}\n",
            point.year,
            format_currency(point.total_principal),
            format_currency(point.total_interest),
            format_currency(point.balance)
        ));
    }

    let summary = &response.summary;
    out.push('\n');
    out.push_str(&format!(
        "Future value:          {}\n",
        format_currency(summary.future_value)
    ));
    out.push_str(&format!(
        "Total contributions:   {} ({:.0}%)\n",
        format_currency(summary.total_contributions),
        summary.principal_share_pct
    ));
    out.push_str(&format!(
        "Total interest earned: {} ({:.0}%)\n",
        format_currency(summary.total_interest_earned),
        summary.interest_share_pct
    ));
    out
}

/// Parses command-line flags, runs one projection and renders it.
///
/// `--help` output comes back as `Ok`; bad flags and invalid inputs as `Err`.
pub fn run_cli<I, T>(args: I) -> Result<String, String>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            return Ok(e.to_string());
        }
        Err(e) => return Err(e.to_string()),
    };
    let inputs = build_inputs(&cli)?;
    let response = build_calculate_response(inputs);

    match cli.format {
        OutputFormat::Table => Ok(render_table(&response)),
        OutputFormat::Json => serde_json::to_string_pretty(&response)
            .map(|json| format!("{json}\n"))
            .map_err(|e| format!("failed to serialize result: {e}")),
    }
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route(
            "/api/calculate",
            get(calculate_get_handler).post(calculate_post_handler),
        )
        .route("/api/narrative", post(narrative_handler))
        .fallback(not_found_handler)
        .with_state(state)
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let narrative = NarrativeConfig::from_env();
    if narrative.api_key.is_none() {
        warn!("no narrative API key configured; /api/narrative will return fallback text");
    }
    let state = Arc::new(AppState {
        client: reqwest::Client::new(),
        narrative,
    });

    let listener = TcpListener::bind(addr).await?;
    info!("Compound interest API listening on http://{addr}");
    info!("Local access: http://127.0.0.1:{port}/api/calculate");

    axum::serve(listener, router(state)).await
}

async fn health_handler() -> Response {
    json_response(StatusCode::OK, serde_json::json!({ "status": "ok" }))
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn calculate_get_handler(Query(query): Query<FormQuery>) -> Response {
    calculate_handler_impl(inputs_from_form(query))
}

async fn calculate_post_handler(
    payload: Result<Json<CalculatePayload>, JsonRejection>,
) -> Response {
    calculate_handler_impl(inputs_from_json_body(payload))
}

/// Malformed bodies are reported like any other validation failure.
fn inputs_from_json_body(
    payload: Result<Json<CalculatePayload>, JsonRejection>,
) -> Result<CalculatorInputs, String> {
    let Json(payload) = payload.map_err(|rejection| rejection.body_text())?;
    inputs_from_payload(payload)
}

fn calculate_handler_impl(inputs: Result<CalculatorInputs, String>) -> Response {
    match inputs {
        Ok(inputs) => {
            debug!("calculating projection for {inputs:?}");
            json_response(StatusCode::OK, build_calculate_response(inputs))
        }
        Err(msg) => {
            warn!("rejected calculation request: {msg}");
            error_response(StatusCode::BAD_REQUEST, &msg)
        }
    }
}

async fn narrative_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CalculatePayload>, JsonRejection>,
) -> Response {
    let inputs = match inputs_from_json_body(payload) {
        Ok(inputs) => inputs,
        Err(msg) => {
            warn!("rejected narrative request: {msg}");
            return error_response(StatusCode::BAD_REQUEST, &msg);
        }
    };

    let calculation = build_calculate_response(inputs);
    let narrative = generate_narrative(
        &state.client,
        &state.narrative,
        &calculation.inputs,
        &calculation.result,
    )
    .await;

    json_response(
        StatusCode::OK,
        NarrativeResponse {
            calculation,
            narrative,
        },
    )
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}
