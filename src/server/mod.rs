//! # Módulo del Servidor HTTP
//! src/server/mod.rs
//!
//! - `tcp`: acceptor, cola de conexiones y pool de workers
//! - `handler`: lo que hace un worker con cada conexión
//! - `shutdown`: bandera de apagado manejada por señales

pub mod handler;
pub mod shutdown;
pub mod tcp;

pub use handler::{handle_connection, ConnectionContext, ConnectionWorker, Outcome};
pub use shutdown::install_shutdown_flag;
pub use tcp::Server;
