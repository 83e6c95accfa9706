//! # Workers
//! src/workers/mod.rs
//!
//! Pool de threads de tamaño fijo que consume la cola de conexiones.

pub mod pool;

pub use pool::{Worker, WorkerPool};
