//! # Errores Fatales del Servidor
//! src/error.rs
//!
//! Errores que impiden arrancar (o seguir corriendo) el servidor. Los
//! errores por conexión nunca llegan hasta acá: se convierten en una
//! respuesta HTTP o en una conexión abandonada.

use crate::arena::ArenaError;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    /// `Config::validate()` rechazó la configuración
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// El root no existe, no es directorio o no se pudo canonicalizar
    #[error("invalid root directory {path}: {source}")]
    InvalidRoot {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("could not bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },

    /// No se pudo crear la arena de algún worker
    #[error("could not create worker arena: {0}")]
    Arena(#[from] ArenaError),

    /// El sistema operativo no pudo crear los threads del pool
    #[error("could not start worker pool: {0}")]
    Spawn(#[source] io::Error),
}
