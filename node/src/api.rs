//! # REST API
//!
//! Builds the axum router that exposes the node's HTTP interface: the
//! query surface product front-ends poll (state codes, deposit totals,
//! receipt balances, creation records) plus the mutating product entry
//! points. All endpoints share application state through axum's `State`
//! extractor; a single async RwLock around the registry serializes
//! mutations, matching the escrow engine's single-writer model.
//!
//! ## Endpoints
//!
//! | Method | Path                                          | Description                          |
//! |--------|-----------------------------------------------|--------------------------------------|
//! | GET    | `/health`                                     | Liveness probe                       |
//! | GET    | `/status`                                     | Node status summary                  |
//! | GET    | `/products`                                   | List hosted products                 |
//! | POST   | `/products`                                   | Create a wired insurance product     |
//! | GET    | `/products/:vault`                            | Product detail                       |
//! | GET    | `/products/:vault/state`                      | State name + stable code             |
//! | GET    | `/products/:vault/totals`                     | Deposit totals                       |
//! | GET    | `/products/:vault/deposits/investor/:address` | One investor's cumulative deposits   |
//! | GET    | `/products/:vault/deposits/insuree/:address`  | One insuree's cumulative premiums    |
//! | POST   | `/products/:vault/invest`                     | Investor deposit                     |
//! | POST   | `/products/:vault/insure`                     | Insuree premium                      |
//! | POST   | `/products/:vault/activate`                   | Start coverage                       |
//! | POST   | `/products/:vault/no-insuree`                 | Wind down a premium-less product     |
//! | POST   | `/products/:vault/close`                      | Fix the outcome flag                 |
//! | POST   | `/products/:vault/claims/investor`            | Settle an investor claim             |
//! | POST   | `/products/:vault/claims/insuree`             | Settle an insuree claim              |
//! | GET    | `/coins/:address`                             | Receipt-coin metadata + supply       |
//! | GET    | `/coins/:address/balance/:holder`             | One holder's receipt balance         |
//! | GET    | `/events?from=N`                              | Creation records from sequence N     |

use axum::{
    extract::{Path, Query, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use parapool_escrow::{
    Address, Clock, CoinError, FactoryError, InsuranceProduct, Payout, Period, ProductError,
    RecordedEvent, VaultError,
};

use crate::metrics::SharedMetrics;
use crate::registry::ProductRegistry;

// ---------------------------------------------------------------------------
// Application State
// ---------------------------------------------------------------------------

/// Shared application state available to all request handlers.
///
/// Cheap to clone — everything behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// The node's reported version string.
    pub version: String,
    /// The hosted products and their factory.
    pub registry: Arc<RwLock<ProductRegistry>>,
    /// Time source injected into every time-gated call.
    pub clock: Arc<dyn Clock>,
    /// Prometheus metric handles for in-handler recording.
    pub metrics: SharedMetrics,
    /// When this node process started.
    pub started_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Router Construction
// ---------------------------------------------------------------------------

/// Builds the full axum [`Router`] with all API routes, CORS, and tracing.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/status", get(status_handler))
        .route(
            "/products",
            get(list_products_handler).post(create_product_handler),
        )
        .route("/products/:vault", get(product_detail_handler))
        .route("/products/:vault/state", get(product_state_handler))
        .route("/products/:vault/totals", get(product_totals_handler))
        .route(
            "/products/:vault/deposits/investor/:address",
            get(investor_deposits_handler),
        )
        .route(
            "/products/:vault/deposits/insuree/:address",
            get(insuree_deposits_handler),
        )
        .route("/products/:vault/invest", post(invest_handler))
        .route("/products/:vault/insure", post(insure_handler))
        .route("/products/:vault/activate", post(activate_handler))
        .route("/products/:vault/no-insuree", post(no_insuree_handler))
        .route("/products/:vault/close", post(close_handler))
        .route(
            "/products/:vault/claims/investor",
            post(claim_investor_handler),
        )
        .route(
            "/products/:vault/claims/insuree",
            post(claim_insuree_handler),
        )
        .route("/coins/:address", get(coin_handler))
        .route("/coins/:address/balance/:holder", get(coin_balance_handler))
        .route("/events", get(events_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Request / Response Types
// ---------------------------------------------------------------------------

/// Request body for `POST /products`. Timestamps are unix seconds — the
/// unit front-ends already carry for window math.
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateProductRequest {
    /// Creator of the product; recorded as the event sender.
    pub sender: Address,
    /// Display name for the investor receipt coin.
    pub name_investor: String,
    /// Display name for the insuree receipt coin.
    pub name_insuree: String,
    /// Coverage window start, unix seconds.
    pub insurance_period_start: i64,
    /// Coverage window end, unix seconds.
    pub insurance_period_end: i64,
    /// Deposit window start, unix seconds.
    pub signature_period_start: i64,
    /// Deposit window end, unix seconds.
    pub signature_period_end: i64,
    /// Capacity factor in percentage points (100 = one-to-one backing).
    pub rate_percent: u64,
}

/// Response body for `POST /products`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ProductCreatedResponse {
    /// The new vault.
    pub vault: Address,
    /// The investor-side receipt coin.
    pub investor_coin: Address,
    /// The insuree-side receipt coin.
    pub insuree_coin: Address,
}

/// Request body for the two deposit endpoints.
#[derive(Debug, Serialize, Deserialize)]
pub struct DepositRequest {
    /// Who is depositing.
    pub payer: Address,
    /// Amount in base units.
    pub amount: u64,
}

/// Request body for `POST /products/:vault/close`.
#[derive(Debug, Serialize, Deserialize)]
pub struct CloseRequest {
    /// Whether the insured event happened.
    pub case_happened: bool,
}

/// Request body for the two claim endpoints.
#[derive(Debug, Serialize, Deserialize)]
pub struct ClaimRequest {
    /// Who is being settled.
    pub payee: Address,
}

/// One hosted product, summarized for listings.
#[derive(Debug, Serialize, Deserialize)]
pub struct ProductSummary {
    /// The escrow vault.
    pub vault: Address,
    /// The investor-side receipt coin.
    pub investor_coin: Address,
    /// The insuree-side receipt coin.
    pub insuree_coin: Address,
    /// State name (e.g., "InvestorFound").
    pub state: String,
    /// Stable integer state code.
    pub state_code: u8,
    /// Sum of investor deposits.
    pub total_investor_deposits: u64,
    /// Sum of insuree premiums.
    pub total_insuree_deposits: u64,
    /// Sum of both.
    pub total_deposits: u64,
}

impl ProductSummary {
    fn from_product(product: &InsuranceProduct) -> Self {
        let vault = product.vault();
        Self {
            vault: vault.address(),
            investor_coin: product.investor_coin().address(),
            insuree_coin: product.insuree_coin().address(),
            state: vault.current_state().to_string(),
            state_code: vault.state_code(),
            total_investor_deposits: vault.total_investor_deposits(),
            total_insuree_deposits: vault.total_insuree_deposits(),
            total_deposits: vault.total_deposits(),
        }
    }
}

/// Full product detail for `GET /products/:vault`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ProductDetail {
    /// The summary fields.
    #[serde(flatten)]
    pub summary: ProductSummary,
    /// The coverage window.
    pub insurance_period: Period,
    /// The deposit window.
    pub signature_period: Period,
    /// Capacity factor in percentage points.
    pub rate_percent: u64,
    /// Receipt units minted per deposited base unit.
    pub receipt_multiplier: u64,
    /// Investor capital not yet reserved by coverage.
    pub available_capacity: u64,
    /// Funds still held after settlements.
    pub funds_held: u64,
    /// The outcome flag, once fixed.
    pub outcome: Option<bool>,
}

/// Response body for `GET /products/:vault/state`.
#[derive(Debug, Serialize, Deserialize)]
pub struct StateResponse {
    /// State name.
    pub state: String,
    /// Stable integer code.
    pub state_code: u8,
}

/// Response body for `GET /products/:vault/totals`.
#[derive(Debug, Serialize, Deserialize)]
pub struct TotalsResponse {
    /// Sum of investor deposits.
    pub total_investor_deposits: u64,
    /// Sum of insuree premiums.
    pub total_insuree_deposits: u64,
    /// Sum of both.
    pub total_deposits: u64,
    /// Funds still held after settlements.
    pub funds_held: u64,
}

/// Response body for the per-address deposit queries.
#[derive(Debug, Serialize, Deserialize)]
pub struct DepositOfResponse {
    /// The queried address.
    pub address: Address,
    /// Cumulative deposits of that address on the queried side.
    pub amount: u64,
}

/// Response body for `GET /coins/:address`.
#[derive(Debug, Serialize, Deserialize)]
pub struct CoinResponse {
    /// The coin's address.
    pub address: Address,
    /// Display name.
    pub name: String,
    /// Display decimals.
    pub decimals: u8,
    /// Current minter (the owning vault after wiring).
    pub minter: Address,
    /// Current total supply.
    pub total_supply: u64,
    /// Number of distinct holders.
    pub holder_count: usize,
}

/// Response body for `GET /coins/:address/balance/:holder`.
#[derive(Debug, Serialize, Deserialize)]
pub struct BalanceResponse {
    /// The queried holder.
    pub holder: Address,
    /// The holder's receipt balance.
    pub balance: u64,
}

/// Response payload for `GET /status`.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Node software version.
    pub version: String,
    /// Number of hosted products.
    pub products: usize,
    /// Number of hosted products not yet terminal.
    pub open_products: usize,
    /// Number of creation records published.
    pub events: usize,
    /// When the node started.
    pub started_at: DateTime<Utc>,
    /// ISO-8601 timestamp of the response.
    pub timestamp: String,
}

/// Query parameters for `GET /events`.
#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    /// First sequence number to return. Defaults to 0 (everything).
    pub from: Option<u64>,
}

/// Generic error body returned by all endpoints on failure.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ---------------------------------------------------------------------------
// Error Mapping
// ---------------------------------------------------------------------------

/// Maps escrow errors onto HTTP statuses: state conflicts and repeat
/// claims are 409, guard violations 422, empty claims 404, and misuse of
/// the mint capability 403.
fn product_error_status(err: &ProductError) -> StatusCode {
    match err {
        ProductError::Vault(vault_err) => match vault_err {
            VaultError::WrongState { .. }
            | VaultError::NotActiveInvestorBenefits { .. }
            | VaultError::NotActiveInsureeBenefits { .. }
            | VaultError::AlreadyClaimed { .. } => StatusCode::CONFLICT,
            VaultError::NothingToClaim { .. } => StatusCode::NOT_FOUND,
            VaultError::TooEarly { .. }
            | VaultError::TooLate { .. }
            | VaultError::CapacityExceeded { .. }
            | VaultError::ZeroDeposit
            | VaultError::AmountOverflow
            | VaultError::Coverage(_) => StatusCode::UNPROCESSABLE_ENTITY,
        },
        ProductError::Coin(coin_err) => match coin_err {
            CoinError::Unauthorized { .. } | CoinError::MinterAlreadyTransferred { .. } => {
                StatusCode::FORBIDDEN
            }
            CoinError::SupplyOverflow { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        },
    }
}

fn product_error_response(err: ProductError) -> Response {
    (
        product_error_status(&err),
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
        .into_response()
}

fn factory_error_response(err: FactoryError) -> Response {
    let status = match err {
        FactoryError::Coin(_) => StatusCode::FORBIDDEN,
        _ => StatusCode::UNPROCESSABLE_ENTITY,
    };
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
        .into_response()
}

fn not_found(what: impl std::fmt::Display) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: format!("{} not found", what),
        }),
    )
        .into_response()
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /health` — returns 200 if the node is alive. Liveness probe for
/// orchestrators; subsystem state belongs in `/status`.
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

/// `GET /status` — node status summary.
async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let registry = state.registry.read().await;
    let resp = StatusResponse {
        version: state.version.clone(),
        products: registry.len(),
        open_products: registry.open_count(),
        events: registry.event_count(),
        started_at: state.started_at,
        timestamp: Utc::now().to_rfc3339(),
    };
    Json(resp)
}

/// `GET /products` — all hosted products, summarized.
async fn list_products_handler(State(state): State<AppState>) -> impl IntoResponse {
    let registry = state.registry.read().await;
    let mut products: Vec<ProductSummary> =
        registry.iter().map(ProductSummary::from_product).collect();
    // HashMap iteration order is arbitrary; keep listings stable.
    products.sort_by_key(|p| p.vault);
    Json(products)
}

/// `POST /products` — creates one fully wired insurance product.
async fn create_product_handler(
    State(state): State<AppState>,
    Json(req): Json<CreateProductRequest>,
) -> Response {
    let parse_ts = |secs: i64, field: &str| {
        DateTime::from_timestamp(secs, 0).ok_or_else(|| {
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ErrorResponse {
                    error: format!("invalid unix timestamp in {}: {}", field, secs),
                }),
            )
                .into_response()
        })
    };
    let insurance_period = Period::new(
        match parse_ts(req.insurance_period_start, "insurance_period_start") {
            Ok(t) => t,
            Err(resp) => return resp,
        },
        match parse_ts(req.insurance_period_end, "insurance_period_end") {
            Ok(t) => t,
            Err(resp) => return resp,
        },
    );
    let signature_period = Period::new(
        match parse_ts(req.signature_period_start, "signature_period_start") {
            Ok(t) => t,
            Err(resp) => return resp,
        },
        match parse_ts(req.signature_period_end, "signature_period_end") {
            Ok(t) => t,
            Err(resp) => return resp,
        },
    );

    let mut registry = state.registry.write().await;
    match registry.create_product(
        req.sender,
        &req.name_investor,
        &req.name_insuree,
        insurance_period,
        signature_period,
        req.rate_percent,
    ) {
        Ok(vault) => {
            state.metrics.products_created_total.inc();
            state.metrics.open_products.set(registry.open_count() as i64);
            let product = registry.get(&vault).expect("just inserted");
            (
                StatusCode::CREATED,
                Json(ProductCreatedResponse {
                    vault,
                    investor_coin: product.investor_coin().address(),
                    insuree_coin: product.insuree_coin().address(),
                }),
            )
                .into_response()
        }
        Err(e) => factory_error_response(e),
    }
}

/// `GET /products/:vault` — full product detail.
async fn product_detail_handler(
    State(state): State<AppState>,
    Path(vault): Path<Address>,
) -> Response {
    let registry = state.registry.read().await;
    let Some(product) = registry.get(&vault) else {
        return not_found(format_args!("product {}", vault));
    };
    let v = product.vault();
    let detail = ProductDetail {
        summary: ProductSummary::from_product(product),
        insurance_period: v.insurance_period(),
        signature_period: v.signature_period(),
        rate_percent: v.capacity_factor().percent(),
        receipt_multiplier: v.receipt_multiplier(),
        available_capacity: v.available_capacity(),
        funds_held: v.funds_held(),
        outcome: v.outcome(),
    };
    Json(detail).into_response()
}

/// `GET /products/:vault/state` — state name plus stable integer code.
async fn product_state_handler(
    State(state): State<AppState>,
    Path(vault): Path<Address>,
) -> Response {
    let registry = state.registry.read().await;
    let Some(product) = registry.get(&vault) else {
        return not_found(format_args!("product {}", vault));
    };
    Json(StateResponse {
        state: product.vault().current_state().to_string(),
        state_code: product.vault().state_code(),
    })
    .into_response()
}

/// `GET /products/:vault/totals` — the three deposit totals plus held funds.
async fn product_totals_handler(
    State(state): State<AppState>,
    Path(vault): Path<Address>,
) -> Response {
    let registry = state.registry.read().await;
    let Some(product) = registry.get(&vault) else {
        return not_found(format_args!("product {}", vault));
    };
    let v = product.vault();
    Json(TotalsResponse {
        total_investor_deposits: v.total_investor_deposits(),
        total_insuree_deposits: v.total_insuree_deposits(),
        total_deposits: v.total_deposits(),
        funds_held: v.funds_held(),
    })
    .into_response()
}

/// `GET /products/:vault/deposits/investor/:address`.
async fn investor_deposits_handler(
    State(state): State<AppState>,
    Path((vault, address)): Path<(Address, Address)>,
) -> Response {
    let registry = state.registry.read().await;
    let Some(product) = registry.get(&vault) else {
        return not_found(format_args!("product {}", vault));
    };
    Json(DepositOfResponse {
        address,
        amount: product.vault().deposits_of_investor(&address),
    })
    .into_response()
}

/// `GET /products/:vault/deposits/insuree/:address`.
async fn insuree_deposits_handler(
    State(state): State<AppState>,
    Path((vault, address)): Path<(Address, Address)>,
) -> Response {
    let registry = state.registry.read().await;
    let Some(product) = registry.get(&vault) else {
        return not_found(format_args!("product {}", vault));
    };
    Json(DepositOfResponse {
        address,
        amount: product.vault().deposits_of_insuree(&address),
    })
    .into_response()
}

/// `POST /products/:vault/invest` — investor deposit.
async fn invest_handler(
    State(state): State<AppState>,
    Path(vault): Path<Address>,
    Json(req): Json<DepositRequest>,
) -> Response {
    let mut registry = state.registry.write().await;
    let Some(product) = registry.get_mut(&vault) else {
        return not_found(format_args!("product {}", vault));
    };
    match product.invest(state.clock.as_ref(), req.payer, req.amount) {
        Ok(()) => {
            state.metrics.investor_deposits_total.inc();
            state.metrics.deposited_amount_total.inc_by(req.amount);
            state.metrics.deposit_amount.observe(req.amount as f64);
            Json(TotalsResponse {
                total_investor_deposits: product.vault().total_investor_deposits(),
                total_insuree_deposits: product.vault().total_insuree_deposits(),
                total_deposits: product.vault().total_deposits(),
                funds_held: product.vault().funds_held(),
            })
            .into_response()
        }
        Err(e) => product_error_response(e),
    }
}

/// `POST /products/:vault/insure` — insuree premium at the vault's
/// configured capacity factor.
async fn insure_handler(
    State(state): State<AppState>,
    Path(vault): Path<Address>,
    Json(req): Json<DepositRequest>,
) -> Response {
    let mut registry = state.registry.write().await;
    let Some(product) = registry.get_mut(&vault) else {
        return not_found(format_args!("product {}", vault));
    };
    match product.insure(state.clock.as_ref(), req.payer, req.amount) {
        Ok(()) => {
            state.metrics.insuree_deposits_total.inc();
            state.metrics.deposited_amount_total.inc_by(req.amount);
            state.metrics.deposit_amount.observe(req.amount as f64);
            Json(TotalsResponse {
                total_investor_deposits: product.vault().total_investor_deposits(),
                total_insuree_deposits: product.vault().total_insuree_deposits(),
                total_deposits: product.vault().total_deposits(),
                funds_held: product.vault().funds_held(),
            })
            .into_response()
        }
        Err(e) => product_error_response(e),
    }
}

/// `POST /products/:vault/activate` — start coverage.
async fn activate_handler(State(state): State<AppState>, Path(vault): Path<Address>) -> Response {
    let mut registry = state.registry.write().await;
    let Some(product) = registry.get_mut(&vault) else {
        return not_found(format_args!("product {}", vault));
    };
    match product.activate(state.clock.as_ref()) {
        Ok(()) => Json(StateResponse {
            state: product.vault().current_state().to_string(),
            state_code: product.vault().state_code(),
        })
        .into_response(),
        Err(e) => product_error_response(e),
    }
}

/// `POST /products/:vault/no-insuree` — wind down a premium-less product.
async fn no_insuree_handler(State(state): State<AppState>, Path(vault): Path<Address>) -> Response {
    let mut registry = state.registry.write().await;
    let Some(product) = registry.get_mut(&vault) else {
        return not_found(format_args!("product {}", vault));
    };
    match product.set_no_insuree_found(state.clock.as_ref()) {
        Ok(()) => {
            state.metrics.open_products.set(registry.open_count() as i64);
            Json(serde_json::json!({ "state": "NoInsureeFound" })).into_response()
        }
        Err(e) => product_error_response(e),
    }
}

/// `POST /products/:vault/close` — fix the outcome flag.
async fn close_handler(
    State(state): State<AppState>,
    Path(vault): Path<Address>,
    Json(req): Json<CloseRequest>,
) -> Response {
    let mut registry = state.registry.write().await;
    let Some(product) = registry.get_mut(&vault) else {
        return not_found(format_args!("product {}", vault));
    };
    match product.close_case(req.case_happened) {
        Ok(()) => {
            let resp = StateResponse {
                state: product.vault().current_state().to_string(),
                state_code: product.vault().state_code(),
            };
            state.metrics.open_products.set(registry.open_count() as i64);
            Json(resp).into_response()
        }
        Err(e) => product_error_response(e),
    }
}

/// `POST /products/:vault/claims/investor` — settle an investor claim.
async fn claim_investor_handler(
    State(state): State<AppState>,
    Path(vault): Path<Address>,
    Json(req): Json<ClaimRequest>,
) -> Response {
    let mut registry = state.registry.write().await;
    let Some(product) = registry.get_mut(&vault) else {
        return not_found(format_args!("product {}", vault));
    };
    match product.claim_as_investor(req.payee) {
        Ok(payout) => settled(&state, payout),
        Err(e) => product_error_response(e),
    }
}

/// `POST /products/:vault/claims/insuree` — settle an insuree claim.
async fn claim_insuree_handler(
    State(state): State<AppState>,
    Path(vault): Path<Address>,
    Json(req): Json<ClaimRequest>,
) -> Response {
    let mut registry = state.registry.write().await;
    let Some(product) = registry.get_mut(&vault) else {
        return not_found(format_args!("product {}", vault));
    };
    match product.claim_as_insuree(req.payee) {
        Ok(payout) => settled(&state, payout),
        Err(e) => product_error_response(e),
    }
}

fn settled(state: &AppState, payout: Payout) -> Response {
    state.metrics.claims_settled_total.inc();
    state.metrics.paid_out_amount_total.inc_by(payout.amount);
    Json(payout).into_response()
}

/// `GET /coins/:address` — receipt-coin metadata and supply.
async fn coin_handler(State(state): State<AppState>, Path(address): Path<Address>) -> Response {
    let registry = state.registry.read().await;
    let Some(coin) = registry.find_coin(&address) else {
        return not_found(format_args!("coin {}", address));
    };
    Json(CoinResponse {
        address: coin.address(),
        name: coin.name().to_string(),
        decimals: coin.decimals(),
        minter: coin.minter(),
        total_supply: coin.total_supply(),
        holder_count: coin.holder_count(),
    })
    .into_response()
}

/// `GET /coins/:address/balance/:holder` — one holder's receipt balance.
/// Unknown holders report a zero balance, like any fungible ledger.
async fn coin_balance_handler(
    State(state): State<AppState>,
    Path((address, holder)): Path<(Address, Address)>,
) -> Response {
    let registry = state.registry.read().await;
    let Some(coin) = registry.find_coin(&address) else {
        return not_found(format_args!("coin {}", address));
    };
    Json(BalanceResponse {
        holder,
        balance: coin.balance_of(&holder),
    })
    .into_response()
}

/// `GET /events?from=N` — creation records from sequence N onwards.
async fn events_handler(
    State(state): State<AppState>,
    Query(query): Query<EventsQuery>,
) -> impl IntoResponse {
    let registry = state.registry.read().await;
    let events: Vec<RecordedEvent> = registry.events_since(query.from.unwrap_or(0)).to_vec();
    Json(events)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
