//! # Arena (Bump Allocator) por Conexión
//! src/arena/mod.rs
//!
//! Toda la memoria transitoria de una conexión (buffer del header, tokens
//! del request line, strings reescritos) sale de un único bloque de tamaño
//! fijo. Las asignaciones nunca se liberan individualmente: cuando la
//! conexión termina, el worker hace `reset()` y el bloque se reutiliza.
//!
//! ## Layout
//!
//! ```text
//! base: [ header .... | pad | "index.html" | pad | .... libre .... ]
//!        ^0                                        ^offset       ^capacity
//! ```
//!
//! En lugar de punteros crudos, cada asignación se representa con un
//! [`Span`] (offset + longitud) que se resuelve contra la arena con
//! [`Arena::get`] / [`Arena::get_mut`]. Así el borrow checker sigue
//! garantizando que nadie escribe en la arena mientras otro la lee.
//!
//! ## Ejemplo
//!
//! ```
//! use static_server::arena::Arena;
//!
//! let mut arena = Arena::new(256).unwrap();
//! let span = arena.alloc_bytes(b"GET").unwrap();
//! assert_eq!(arena.get(span), b"GET");
//!
//! arena.reset();
//! assert_eq!(arena.offset(), 0);
//! ```

pub mod string;

pub use string::ArenaStr;

use thiserror::Error;

/// Tamaño máximo permitido para una arena (bytes)
pub const ARENA_MAX_SIZE: usize = 64 * 1000;

/// Granularidad de los offsets: tamaño de un puntero
///
/// Es relativa al inicio del bloque. El bloque es un `[u8]`, así que la
/// dirección absoluta de una asignación no tiene alineación garantizada.
pub const ALIGN: usize = std::mem::size_of::<usize>();

/// Errores de la arena
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArenaError {
    /// Se pidió crear una arena de 0 bytes
    #[error("cannot create an arena of size 0")]
    ZeroSize,

    /// Se pidió una arena más grande que `ARENA_MAX_SIZE`
    #[error("cannot create an arena larger than {max} bytes (requested {requested})")]
    TooLarge { requested: usize, max: usize },

    /// No queda espacio (incluyendo padding) o se pidieron 0 bytes
    #[error("arena out of memory: requested {requested} bytes, {remaining} remaining")]
    OutOfMemory { requested: usize, remaining: usize },
}

/// Región asignada dentro de una arena
///
/// Un `Span` sólo es válido para la arena que lo creó y hasta el próximo
/// `reset()`. La generación permite detectar usos después del reset en
/// builds de debug.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    start: usize,
    len: usize,
    generation: u32,
}

impl Span {
    /// Offset del primer byte dentro de la arena
    pub fn start(&self) -> usize {
        self.start
    }

    /// Longitud en bytes
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Offset del byte siguiente al último
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    /// Sub-región `[start, start + len)` relativa a este span
    ///
    /// Retorna `None` si la sub-región se sale de los límites.
    pub fn sub(&self, start: usize, len: usize) -> Option<Span> {
        let end = start.checked_add(len)?;
        if end > self.len {
            return None;
        }
        Some(Span {
            start: self.start + start,
            len,
            generation: self.generation,
        })
    }
}

/// Bump allocator sobre un bloque fijo
///
/// Invariante: `0 <= offset <= capacity`. Ninguna asignación viva se
/// solapa con otra.
#[derive(Debug)]
pub struct Arena {
    /// Bloque de memoria (inicializado en cero)
    base: Box<[u8]>,

    /// Cursor: primer byte libre
    offset: usize,

    /// Se incrementa en cada `reset()`
    generation: u32,
}

impl Arena {
    /// Crea una arena de `size` bytes
    ///
    /// # Errores
    ///
    /// - `ArenaError::ZeroSize` si `size == 0`
    /// - `ArenaError::TooLarge` si `size > ARENA_MAX_SIZE`
    pub fn new(size: usize) -> Result<Self, ArenaError> {
        if size == 0 {
            return Err(ArenaError::ZeroSize);
        }
        if size > ARENA_MAX_SIZE {
            return Err(ArenaError::TooLarge {
                requested: size,
                max: ARENA_MAX_SIZE,
            });
        }

        Ok(Self {
            base: vec![0u8; size].into_boxed_slice(),
            offset: 0,
            generation: 0,
        })
    }

    /// Reserva `size` bytes a partir de un offset múltiplo de [`ALIGN`]
    ///
    /// El padding se calcula desde el offset actual, no desde la dirección
    /// en memoria: sirve para bytes, no para reinterpretar el bloque como
    /// otros tipos. Si `size == 0` o si
    /// `padding + size` no cabe en lo que queda, retorna
    /// `ArenaError::OutOfMemory` y el offset no cambia.
    pub fn alloc(&mut self, size: usize) -> Result<Span, ArenaError> {
        let remaining = self.remaining();
        let padding = (ALIGN - (self.offset & (ALIGN - 1))) & (ALIGN - 1);

        let fits = padding
            .checked_add(size)
            .map_or(false, |needed| needed <= remaining);

        if size == 0 || !fits {
            log::warn!("Arena sin memoria: pedidos {} bytes, quedan {}", size, remaining);
            return Err(ArenaError::OutOfMemory {
                requested: size,
                remaining,
            });
        }

        let start = self.offset + padding;
        self.offset = start + size;

        Ok(Span {
            start,
            len: size,
            generation: self.generation,
        })
    }

    /// Reserva espacio y copia `bytes` dentro de la arena
    pub fn alloc_bytes(&mut self, bytes: &[u8]) -> Result<Span, ArenaError> {
        let span = self.alloc(bytes.len())?;
        self.get_mut(span).copy_from_slice(bytes);
        Ok(span)
    }

    /// Span vacío válido en la generación actual (no consume memoria)
    pub fn empty_span(&self) -> Span {
        Span {
            start: self.offset,
            len: 0,
            generation: self.generation,
        }
    }

    /// Bytes de una asignación
    pub fn get(&self, span: Span) -> &[u8] {
        self.check_generation(span);
        &self.base[span.start..span.end()]
    }

    /// Bytes mutables de una asignación
    pub fn get_mut(&mut self, span: Span) -> &mut [u8] {
        self.check_generation(span);
        &mut self.base[span.start..span.end()]
    }

    /// Copia el contenido de `src` a partir del offset absoluto `dest`
    ///
    /// Usado por `ArenaStr::concat`; el destino debe haber sido asignado.
    pub(crate) fn copy_span(&mut self, src: Span, dest: usize) {
        self.check_generation(src);
        self.base.copy_within(src.start..src.end(), dest);
    }

    /// Invalida todas las asignaciones previas
    ///
    /// En builds de debug el bloque se llena de ceros para que cualquier
    /// uso colgante salga a la luz cuanto antes.
    pub fn reset(&mut self) {
        self.offset = 0;
        self.generation = self.generation.wrapping_add(1);

        #[cfg(debug_assertions)]
        self.base.fill(0);
    }

    /// Libera el bloque; la arena deja de existir
    pub fn destroy(self) {
        log::trace!("Arena destruida ({} bytes)", self.capacity());
    }

    /// Capacidad total en bytes
    pub fn capacity(&self) -> usize {
        self.base.len()
    }

    /// Cursor actual
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Bytes libres (sin contar padding futuro)
    pub fn remaining(&self) -> usize {
        self.capacity() - self.offset
    }

    fn check_generation(&self, span: Span) {
        debug_assert_eq!(
            span.generation, self.generation,
            "span used after arena reset"
        );
    }
}
