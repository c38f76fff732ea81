//! Data layer: core types, loading, filtering and aggregation.
//!
//! Architecture:
//! ```text
//!  incident_event_log.csv
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  parse CSV → IncidentTable   (memoised by `cache`)
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  filter   │  FilterSpec (date range + membership sets) → row subset
//!   └──────────┘
//!        │
//!        ▼
//!   ┌───────────┐
//!   │ aggregate │  counts by state / category / priority / day, metrics
//!   └───────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │   view    │  render(table, spec) → DashboardView for the UI
//!   └──────────┘
//! ```
pub mod aggregate;
pub mod cache;
pub mod filter;
pub mod loader;
pub mod model;
pub mod view;
