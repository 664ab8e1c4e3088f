/// Data layer: core types, loading, enrichment, filtering, and aggregation.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → raw records
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  enrich   │  derive severity, critical, complexity, …
///   └──────────┘
///        │
///        ▼
///   ┌────────────────┐
///   │ IncidentDataset │  Vec<Incident>, selector indices
///   └────────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  apply the year/country/attack selection → indices
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ aggregate  │  counts, means, sums, cross-tabs, flows per chart
///   └───────────┘
/// ```

pub mod aggregate;
pub mod enrich;
pub mod error;
pub mod filter;
pub mod loader;
pub mod model;
