//! # Domain Models
//!
//! Canonical types shared by the cache, the orchestrator and the renderer.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Symbol`] | Upper-cased ticker |
//! | [`Interval`] | Closed set of bar intervals, with `daily`/`weekly`/`monthly` aliases |
//! | [`RawSeries`] | Provider rows as delivered, heterogeneous field sets |
//! | [`SeriesRow`] | Capability trait the normalizer reads rows through |
//! | [`NormalizedRecord`] | Uniform `(date, open, close)` record |
//! | [`StockResult`] | Per-request result handed to the renderer |

mod interval;
mod models;
mod series;
mod symbol;

pub use interval::Interval;
pub use models::{NormalizedRecord, StockResult};
pub use series::{columns, FieldValue, RawRow, RawSeries, RowTimestamp, SeriesRow};
pub use symbol::Symbol;
