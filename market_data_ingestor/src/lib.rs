//! Market data boundary: canonical bar models, the [`DataProvider`](providers::DataProvider)
//! abstraction, and concrete vendor adapters.

pub mod models;
pub mod providers;
