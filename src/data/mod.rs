/// Data layer: core types and loading.
///
/// Architecture:
/// ```text
///  .arff / .csv / .txt / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Dataset (kinds declared or inferred)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ Dataset   │  Vec<Attribute>, Vec<Row>, target column
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ reconcile │  align test schema with train → fit / predict
///   └───────────┘
/// ```

pub mod loader;
pub mod model;
