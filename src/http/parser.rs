//! # Parser del Request Line (Máquina de Estados)
//! src/http/parser.rs
//!
//! Recorre los bytes del header **una sola vez**, byte a byte, y extrae
//! el método y la URI. Sólo se parsea la primera línea: el resto de los
//! headers (y el body) se ignoran.
//!
//! ## Gramática
//!
//! ```text
//! <METHOD> <SP>+ <URI> <SP>+ <VERSION> \r\n
//! ```
//!
//! La URI **debe** ir seguida de un espacio antes de la versión; un
//! request line como `GET /a\r\n` no pertenece a esta gramática y falla.
//!
//! ## Estados
//!
//! ```text
//! Method ──' '──> SpaceBeforeUri ──byte──> Uri ──' '──> SpaceBeforeVersion
//!   │                                      │                  │
//!   └──> Error <───────────────────────────┘               byte
//!                                                             v
//!                        Done <──'\n'── Crlf <──'\r'──── Version
//! ```
//!
//! Los tokens no se copian: son vistas ([`ArenaStr::slice`]) sobre el
//! buffer del header que ya vive en la arena.

use crate::arena::{Arena, ArenaStr};
use thiserror::Error;

/// Longitud máxima del método (`OPTIONS` = 7)
pub const MAX_METHOD: usize = 7;

/// Longitud máxima de la URI
pub const MAX_URI: usize = 2048;

/// Límites de tamaño de los tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub max_method: usize,
    pub max_uri: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_method: MAX_METHOD,
            max_uri: MAX_URI,
        }
    }
}

/// Errores del parser
///
/// `Incomplete` significa que la entrada se acabó antes de llegar a
/// `Done`; el resto son requests malformados.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// El método excede `max_method` bytes
    #[error("method token exceeds {max} bytes")]
    MethodTooLong { max: usize },

    /// La URI excede `max_uri` bytes
    #[error("uri token exceeds {max} bytes")]
    UriTooLong { max: usize },

    /// Método vacío o fin de línea dentro de un token
    #[error("malformed request line")]
    Malformed,

    /// La entrada terminó antes del `\r\n` del request line
    #[error("incomplete request line")]
    Incomplete,
}

/// Estados de la máquina
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Method,
    SpaceBeforeUri,
    Uri,
    SpaceBeforeVersion,
    Version,
    Crlf,
}

/// Request line parseado
///
/// Los tokens viven en la arena de la conexión y no sobreviven a ella.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpRequest {
    /// Método (ej: `GET`). Se parsea pero no se despacha sobre él.
    pub method: ArenaStr,

    /// URI tal como llegó (ej: `/index.html`)
    pub uri: ArenaStr,

    /// Bytes consumidos hasta el `\n` inclusive
    pub line_len: usize,
}

/// Parsea el request line contenido en `input`
///
/// # Ejemplo
///
/// ```
/// use static_server::arena::{Arena, ArenaStr};
/// use static_server::http::parser::{parse_request_line, Limits};
///
/// let mut arena = Arena::new(256).unwrap();
/// let raw = ArenaStr::new(&mut arena, b"GET /index.html HTTP/1.0\r\n").unwrap();
/// let request = parse_request_line(&arena, raw, &Limits::default()).unwrap();
///
/// assert_eq!(request.method.as_bytes(&arena), b"GET");
/// assert_eq!(request.uri.as_bytes(&arena), b"/index.html");
/// ```
pub fn parse_request_line(
    arena: &Arena,
    input: ArenaStr,
    limits: &Limits,
) -> Result<HttpRequest, ParseError> {
    let bytes = input.as_bytes(arena);

    let mut state = State::Method;
    let mut token_start = 0;
    let mut method = None;
    let mut uri = None;

    for (i, &byte) in bytes.iter().enumerate() {
        match state {
            State::Method => match byte {
                b' ' => {
                    let len = i - token_start;
                    if len == 0 {
                        return Err(ParseError::Malformed);
                    }
                    method = input.slice(token_start, len);
                    state = State::SpaceBeforeUri;
                }
                b'\r' | b'\n' => return Err(ParseError::Malformed),
                _ => {
                    if i + 1 - token_start > limits.max_method {
                        return Err(ParseError::MethodTooLong { max: limits.max_method });
                    }
                }
            },

            State::SpaceBeforeUri => {
                if byte != b' ' {
                    token_start = i;
                    state = State::Uri;
                    if limits.max_uri == 0 {
                        return Err(ParseError::UriTooLong { max: limits.max_uri });
                    }
                }
            }

            State::Uri => match byte {
                b' ' => {
                    uri = input.slice(token_start, i - token_start);
                    state = State::SpaceBeforeVersion;
                }
                b'\r' | b'\n' => return Err(ParseError::Malformed),
                _ => {
                    if i + 1 - token_start > limits.max_uri {
                        return Err(ParseError::UriTooLong { max: limits.max_uri });
                    }
                }
            },

            State::SpaceBeforeVersion => {
                if byte != b' ' {
                    state = State::Version;
                }
            }

            State::Version => {
                if byte == b'\r' {
                    state = State::Crlf;
                }
            }

            State::Crlf => {
                if byte == b'\n' {
                    // Done: el primer Done alcanzable termina el scan
                    return match (method, uri) {
                        (Some(method), Some(uri)) => Ok(HttpRequest {
                            method,
                            uri,
                            line_len: i + 1,
                        }),
                        _ => Err(ParseError::Malformed),
                    };
                }
            }
        }
    }

    Err(ParseError::Incomplete)
}
