//! # Resolución Segura de Rutas
//! src/fs/safe_path.rs
//!
//! Convierte la URI del cliente en una ruta absoluta **garantizada** dentro
//! del directorio raíz, o la rechaza.
//!
//! ## Algoritmo
//!
//! 1. El root se canonicaliza una sola vez al arrancar
//! 2. Se concatena `root + "/" + uri` (concatenación de texto, no `join`,
//!    así una URI absoluta no reemplaza al root)
//! 3. Se canonicaliza el resultado: esto resuelve `..`, `.` y symlinks,
//!    y falla si el archivo no existe
//! 4. El resultado tiene que empezar con los bytes del root **y** el byte
//!    siguiente tiene que ser el fin de la ruta o un separador
//!
//! El paso 4 evita que `/srv/www` acepte `/srv/www-secret/config`.
//!
//! Todos los fallos se colapsan en [`Rejected`]: el cliente nunca sabe si
//! la ruta salía del root o simplemente no existía.

use super::canonicalize;
use std::ffi::OsString;
use std::io;
use std::path::{is_separator, Path, PathBuf, MAIN_SEPARATOR_STR};
use thiserror::Error;

/// Documento por defecto cuando la URI está vacía
pub const DEFAULT_INDEX: &str = "index.html";

/// La ruta pedida no se puede servir
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("path rejected")]
pub struct Rejected;

/// Directorio raíz canonicalizado
#[derive(Debug, Clone)]
pub struct SafeRoot {
    root: PathBuf,
    index_file: String,
}

impl SafeRoot {
    /// Canonicaliza `root`; tiene que existir y ser un directorio
    pub fn new(root: impl AsRef<Path>) -> io::Result<Self> {
        let root = canonicalize(root.as_ref())?;

        if !root.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a directory", root.display()),
            ));
        }

        Ok(Self {
            root,
            index_file: DEFAULT_INDEX.to_string(),
        })
    }

    /// Cambia el documento por defecto
    pub fn with_index_file(mut self, index_file: &str) -> Self {
        self.index_file = index_file.to_string();
        self
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    pub fn index_file(&self) -> &str {
        &self.index_file
    }

    /// Resuelve `requested` (relativa al root) a una ruta canónica contenida
    ///
    /// Una petición vacía (o `/`) se reescribe al documento por defecto.
    pub fn resolve(&self, requested: &str) -> Result<PathBuf, Rejected> {
        let requested = if requested.is_empty() || requested == "/" {
            self.index_file.as_str()
        } else {
            requested
        };

        let mut joined: OsString = self.root.clone().into_os_string();
        joined.push(MAIN_SEPARATOR_STR);
        joined.push(requested);

        let target = canonicalize(Path::new(&joined)).map_err(|e| {
            log::debug!("no se pudo resolver \"{}\": {}", requested, e);
            Rejected
        })?;

        if is_contained(&self.root, &target) {
            Ok(target)
        } else {
            log::warn!(
                "🚫 Bloqueado acceso fuera del root: \"{}\" -> {}",
                requested,
                target.display()
            );
            Err(Rejected)
        }
    }
}

/// Resolución de una sola vez, canonicalizando el root en el momento
pub fn resolve(root: &Path, requested: &str) -> Result<PathBuf, Rejected> {
    SafeRoot::new(root).map_err(|_| Rejected)?.resolve(requested)
}

/// `true` si `target` es `root` o está debajo de él
///
/// Ambas rutas deben venir ya canonicalizadas.
pub fn is_contained(root: &Path, target: &Path) -> bool {
    let root = root.as_os_str().as_encoded_bytes();
    let target = target.as_os_str().as_encoded_bytes();

    if !target.starts_with(root) {
        return false;
    }

    match target.get(root.len()) {
        None => true,
        Some(&next) => {
            is_separator(next as char)
                || root.last().map_or(false, |&last| is_separator(last as char))
        }
    }
}
