//! Data layer: dataset registry, loading, filtering, metrics and chart specs.
//!
//! Architecture:
//! ```text
//!   data_dir/*.csv
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  read CSV, coerce cells, derive columns → Table
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  cache    │  (session, dataset) → Arc<Table>
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  filter   │  FilterSelection → FilteredView (row indices)
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  metrics  │  counts, sums, means, breakdowns, histograms
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  charts   │  ChartSpec per registry chart
//!   └──────────┘
//! ```
//!
//! Everything dataset-specific is declared in `registry`.

pub mod cache;
pub mod charts;
pub mod filter;
pub mod loader;
pub mod metrics;
pub mod model;
pub mod pipeline;
pub mod registry;

#[cfg(test)]
pub(crate) mod fixtures;
