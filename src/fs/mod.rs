//! # Acceso al Sistema de Archivos
//! src/fs/mod.rs
//!
//! Envoltorios delgados sobre `std::fs` que usa el núcleo del servidor:
//!
//! - `path_kind`: ¿archivo, directorio u otra cosa?
//! - `read_file`: contenido completo de un archivo regular
//! - `canonicalize`: ruta absoluta con symlinks, `.` y `..` resueltos
//!
//! La lógica de seguridad (contención dentro del root) vive en
//! [`safe_path`].

pub mod safe_path;

pub use safe_path::{is_contained, resolve, Rejected, SafeRoot};

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Tipo de entrada en el sistema de archivos
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    File,
    Directory,
    /// Socket, FIFO, dispositivo...
    Other,
    /// No existe o no se pudo hacer `stat`
    Error,
}

/// Errores al leer un archivo
#[derive(Debug, Error)]
pub enum FileError {
    /// No existe o no es un archivo regular
    #[error("not found or not a regular file: {}", .0.display())]
    NotFound(PathBuf),

    /// Cualquier otro error de I/O
    #[error("i/o error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Clasifica una ruta (siguiendo symlinks)
pub fn path_kind(path: &Path) -> PathKind {
    match fs::metadata(path) {
        Ok(meta) if meta.is_file() => PathKind::File,
        Ok(meta) if meta.is_dir() => PathKind::Directory,
        Ok(_) => PathKind::Other,
        Err(e) => {
            log::debug!("stat falló para \"{}\": {}", path.display(), e);
            PathKind::Error
        }
    }
}

/// Lee el contenido completo de un archivo regular
pub fn read_file(path: &Path) -> Result<Vec<u8>, FileError> {
    let io_error = |source: io::Error| {
        if source.kind() == io::ErrorKind::NotFound {
            FileError::NotFound(path.to_path_buf())
        } else {
            FileError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    };

    let mut file = fs::File::open(path).map_err(io_error)?;
    let meta = file.metadata().map_err(io_error)?;

    if !meta.is_file() {
        return Err(FileError::NotFound(path.to_path_buf()));
    }

    let mut contents = Vec::with_capacity(meta.len() as usize);
    file.read_to_end(&mut contents).map_err(io_error)?;
    Ok(contents)
}

/// Ruta absoluta canónica
pub fn canonicalize(path: &Path) -> io::Result<PathBuf> {
    fs::canonicalize(path)
}
