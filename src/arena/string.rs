//! # Strings Acotados sobre la Arena
//! src/arena/string.rs
//!
//! `ArenaStr` es un par (datos, longitud) que vive dentro de una [`Arena`].
//! No hay terminador nulo; un string es inmutable una vez creado y la
//! única forma de "modificarlo" es concatenar, lo que produce uno nuevo.
//!
//! Los tokens que extrae el parser son vistas (`slice`) sobre el buffer
//! del header: no se copia nada.

use super::{Arena, ArenaError, Span};

/// String acotado respaldado por una arena
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArenaStr {
    span: Span,
}

impl ArenaStr {
    /// Copia `bytes` dentro de la arena
    ///
    /// Un string vacío no consume memoria.
    pub fn new(arena: &mut Arena, bytes: &[u8]) -> Result<Self, ArenaError> {
        if bytes.is_empty() {
            return Ok(Self { span: arena.empty_span() });
        }
        let span = arena.alloc_bytes(bytes)?;
        Ok(Self { span })
    }

    /// Envuelve una región ya asignada
    pub fn from_span(span: Span) -> Self {
        Self { span }
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn len(&self) -> usize {
        self.span.len()
    }

    pub fn is_empty(&self) -> bool {
        self.span.is_empty()
    }

    pub fn as_bytes<'a>(&self, arena: &'a Arena) -> &'a [u8] {
        arena.get(self.span)
    }

    /// Vista como `&str` si los bytes son UTF-8 válido
    pub fn to_str<'a>(&self, arena: &'a Arena) -> Option<&'a str> {
        std::str::from_utf8(self.as_bytes(arena)).ok()
    }

    /// Sub-string `[start, start + len)` sin copiar
    pub fn slice(&self, start: usize, len: usize) -> Option<Self> {
        self.span.sub(start, len).map(Self::from_span)
    }

    /// Posición de la primera ocurrencia de alguno de `needles`
    pub fn find_any(&self, arena: &Arena, needles: &[u8]) -> Option<usize> {
        self.as_bytes(arena).iter().position(|b| needles.contains(b))
    }

    pub fn starts_with(&self, arena: &Arena, prefix: &[u8]) -> bool {
        self.as_bytes(arena).starts_with(prefix)
    }

    /// Compara contra otro `ArenaStr` de la misma arena
    pub fn starts_with_str(&self, arena: &Arena, prefix: ArenaStr) -> bool {
        self.as_bytes(arena).starts_with(prefix.as_bytes(arena))
    }

    /// Nuevo string `a + b`, ambos ya en la arena
    pub fn concat(arena: &mut Arena, a: ArenaStr, b: ArenaStr) -> Result<Self, ArenaError> {
        let total = a.len() + b.len();
        if total == 0 {
            return Ok(Self { span: arena.empty_span() });
        }

        let span = arena.alloc(total)?;
        arena.copy_span(a.span, span.start());
        arena.copy_span(b.span, span.start() + a.len());
        Ok(Self { span })
    }

    /// Nuevo string `a + b` donde `b` viene de fuera de la arena
    pub fn concat_str(arena: &mut Arena, a: ArenaStr, b: &[u8]) -> Result<Self, ArenaError> {
        Self::concat_parts(arena, a, &[b])
    }

    /// Nuevo string `a + parts[0] + parts[1] + ...` en una sola asignación
    pub fn concat_parts(arena: &mut Arena, a: ArenaStr, parts: &[&[u8]]) -> Result<Self, ArenaError> {
        let total = parts.iter().fold(a.len(), |acc, part| acc + part.len());
        if total == 0 {
            return Ok(Self { span: arena.empty_span() });
        }

        let span = arena.alloc(total)?;
        arena.copy_span(a.span, span.start());

        let out = arena.get_mut(span);
        let mut at = a.len();
        for part in parts {
            out[at..at + part.len()].copy_from_slice(part);
            at += part.len();
        }
        Ok(Self { span })
    }
}
