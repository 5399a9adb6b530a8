//! Auction ledger for shielded sealed bids.
//!
//! This crate implements the authoritative state machine of a single-item
//! sealed-bid auction whose amounts stay opaque end-to-end:
//!
//! - Bid admission with replay and binding checks
//! - The opaque comparator that folds each accepted bid into the running
//!   highest without decrypting anything
//! - The one-way `Active -> Ended -> RevealPending -> RevealFinalized`
//!   lifecycle
//! - Read-only queries over ledger state
//!
//! # Architecture
//!
//! - `call`: Message types for state-changing operations
//! - `handlers`: Business logic for processing calls
//! - `comparator`: Opaque highest-bid folding
//! - `ops`: The interface to the encryption service's evaluator
//! - `queries`: Read-only state access
//! - `state`: Ledger state structure
//! - `config`: Creation-time configuration
//! - `error`: Error types
//!
//! # Example
//!
//! ```ignore
//! use shielded_ledger::{handlers, AuctionConfig, CallContext};
//!
//! let ctx = CallContext { sender: seller, timestamp: now };
//! let mut ledger = handlers::handle_open_auction(config, &ctx, &mut engine)?;
//!
//! // Submit a sealed bid
//! handlers::handle_bid(&mut ledger, &bid_ctx, &mut engine, handle, proof)?;
//! ```

pub mod call;
pub mod comparator;
pub mod config;
pub mod error;
pub mod handlers;
pub mod ops;
pub mod queries;
pub mod state;
pub mod testing;

pub use call::AuctionCall;
pub use config::{AuctionConfig, ConfigError};
pub use error::AuctionError;
pub use handlers::{CallContext, HandlerResult};
pub use ops::{OpaqueOps, OpsError};
pub use queries::{AuctionQuery, AuctionQueryResponse};
pub use state::AuctionLedger;
