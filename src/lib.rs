//! # Static Server
//! src/lib.rs
//!
//! Servidor HTTP/1.0 concurrente de archivos estáticos implementado desde
//! cero para practicar conceptos de sistemas operativos: sincronización
//! con mutex y variables de condición, pools de threads, manejo de memoria
//! con arenas y acceso seguro al sistema de archivos.
//!
//! ## Arquitectura
//!
//! - `arena`: bump allocator por conexión y strings acotados
//! - `jobs`: cola circular acotada (productor/consumidor)
//! - `workers`: pool fijo de threads que drena la cola
//! - `http`: parser del request line y respuestas
//! - `fs`: resolución segura de rutas dentro del root
//! - `server`: acceptor TCP, manejo de conexiones y apagado
//! - `metrics`: contadores y latencias
//! - `config`: CLI y variables de entorno
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use static_server::config::Config;
//! use static_server::server::{install_shutdown_flag, Server};
//!
//! let config = Config::default();
//! let server = Server::bind(config).unwrap();
//! let shutdown = install_shutdown_flag().unwrap();
//! server.run(shutdown).unwrap();
//! ```

pub mod arena;
pub mod config;
pub mod error;
pub mod fs;
pub mod http;
pub mod jobs;
pub mod metrics;
pub mod server;
pub mod workers;

pub use error::ServerError;
