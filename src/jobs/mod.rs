//! # Cola de Trabajos
//! src/jobs/mod.rs
//!
//! El acceptor deposita aquí cada conexión aceptada y los workers la
//! retiran en orden de llegada (FIFO). Una cola llena es la señal de
//! backpressure: la conexión se rechaza en lugar de crecer sin límite.

pub mod queue;

pub use queue::{JobQueue, PushError, QueueStats};
