//! # Módulo HTTP
//!
//! Protocolo mínimo HTTP/1.0 implementado desde cero:
//!
//! - Parser del request line (máquina de estados sobre la arena)
//! - Construcción de las respuestas fijas (200 / 4xx / 5xx)
//! - Códigos de estado
//!
//! ### Formato de Request (sólo se mira la primera línea)
//!
//! ```text
//! GET /path HTTP/1.0\r\n
//! Header-Name: Header-Value\r\n   <- ignorado
//! \r\n
//! ```
//!
//! No hay keep-alive: cada conexión lleva exactamente un request y una
//! respuesta, y luego se cierra.

pub mod parser; // Máquina de estados del request line
pub mod response; // Construcción de HTTP responses
pub mod status; // Códigos de estado HTTP

pub use parser::{parse_request_line, HttpRequest, Limits, ParseError};
pub use response::Response;
pub use status::StatusCode;
