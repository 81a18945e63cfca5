//! # Protocol Configuration & Constants
//!
//! Every tunable of the escrow engine lives here. Source deployments of
//! the product disagreed on a couple of these (the receipt multiplier
//! changed between revisions, the capacity factor was sometimes implicit),
//! which is exactly why they are named constants and constructor
//! parameters instead of literals at the use sites.

/// Crate version string, stamped into the node's status endpoint.
pub const PROTOCOL_VERSION: &str = "0.1.0";

// ---------------------------------------------------------------------------
// Capacity
// ---------------------------------------------------------------------------

/// Denominator of the capacity factor. Factors are integer percentage
/// points over this scale: 100 = factor 1.0, 150 = factor 1.5.
pub const CAPACITY_FACTOR_SCALE: u64 = 100;

/// Default capacity factor in percentage points: one unit of investor
/// capital backs exactly one unit of insuree coverage.
pub const DEFAULT_CAPACITY_FACTOR_PCT: u64 = 100;

// ---------------------------------------------------------------------------
// Receipt Coins
// ---------------------------------------------------------------------------

/// Default receipt-coin mint multiplier: each deposited base unit mints
/// this many receipt units to the depositor. 1000 matches the deployed
/// revision that scaled wei-sized deposits to a round display unit.
pub const DEFAULT_RECEIPT_MULTIPLIER: u64 = 1000;

/// Display decimals for receipt coins. Purely for rendering — the ledger
/// never divides.
pub const RECEIPT_COIN_DECIMALS: u8 = 3;

// ---------------------------------------------------------------------------
// Node Defaults
// ---------------------------------------------------------------------------

/// Default port for the operator node's HTTP API.
pub const DEFAULT_API_PORT: u16 = 8791;

/// Default port for the Prometheus metrics endpoint.
pub const DEFAULT_METRICS_PORT: u16 = 8792;
