//! # Sistema de Métricas
//! src/metrics/mod.rs
//!
//! Recolección de métricas del servidor de archivos:
//! - Requests por código de estado y por ruta
//! - Latencias (p50, p95, p99)
//! - Conexiones descartadas (cola llena) y abandonadas
//! - Workers ocupados

pub mod collector;

pub use collector::{MetricsCollector, MetricsSnapshot};
