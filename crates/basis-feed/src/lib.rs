//! Tick parsing, leg pairing and basis observation emission.
//!
//! Data flows one way through this crate:
//! raw message → `ParserTable` (per-exchange `TickParser`) → `PairingBook`
//! (per-exchange `ExchangePairing`) → `ObservationEmitter` → render/persist.

pub mod emitter;
pub mod error;
pub mod pairing;
pub mod parser;

pub use emitter::{EmitterConfig, ObservationEmitter};
pub use error::{FeedError, FeedResult};
pub use pairing::{CompletedPairing, ExchangePairing, PairingBook};
pub use parser::{BinanceParser, BybitParser, OkxParser, ParseOutcome, ParserTable, TickParser};
