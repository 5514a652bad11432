// Single-statement repository functions are generic over `E: Executor<'e, Database = Postgres>`
// so they accept both a `&PgPool` (direct query) and a `&mut Transaction` (atomic operations).
// Functions that issue several statements take `&mut PgConnection` and expect the caller to
// hold a transaction.

pub mod badge;
pub mod challenge;
pub mod course;
pub mod enrollment;
pub mod graph;
pub mod lesson;
pub mod module;
pub mod ordering;
pub mod series;
pub mod stats;
