//! # Respuestas HTTP/1.0
//!
//! El servidor sólo produce formas fijas de respuesta:
//!
//! ```text
//! HTTP/1.0 200 OK\r\n
//! Content-Type: text/html\r\n
//! Content-Length: 1234\r\n
//! Server: static-server/0.1\r\n
//! Connection: close\r\n
//! \r\n
//! <bytes del archivo>
//! ```
//!
//! ```text
//! HTTP/1.0 404 NOT FOUND\r\n
//! ...\r\n
//! \r\n
//! File Not Found
//! ```
//!
//! Los headers se guardan en orden de inserción para que la salida sea
//! determinista.

use super::StatusCode;
use std::io::{self, Write};
use std::path::Path;

/// Valor del header `Server`
pub const SERVER_NAME: &str = "static-server/0.1";

/// Representa una respuesta HTTP/1.0 completa
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl Response {
    /// Crea una respuesta con los headers comunes (`Server`, `Connection`)
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
        }
        .with_header("Server", SERVER_NAME)
        .with_header("Connection", "close")
    }

    /// Agrega (o reemplaza) un header
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.add_header(name, value);
        self
    }

    /// Versión mutable de `with_header`
    pub fn add_header(&mut self, name: &str, value: &str) {
        match self
            .headers
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
        {
            Some((_, existing)) => *existing = value.to_string(),
            None => self.headers.push((name.to_string(), value.to_string())),
        }
    }

    /// Establece el body y el `Content-Length`
    pub fn with_body_bytes(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        let length = self.body.len().to_string();
        self.add_header("Content-Length", &length);
        self
    }

    pub fn with_body(self, body: &str) -> Self {
        self.with_body_bytes(body.as_bytes().to_vec())
    }

    /// 200 OK con el contenido de un archivo
    pub fn file(path: &Path, contents: Vec<u8>) -> Self {
        Self::new(StatusCode::Ok)
            .with_header("Content-Type", content_type_for(path))
            .with_body_bytes(contents)
    }

    /// 404 con cuerpo literal
    ///
    /// Es la misma respuesta para "fuera del root", "no existe" y "no se
    /// pudo resolver".
    pub fn not_found() -> Self {
        Self::text(StatusCode::NotFound, "File Not Found")
    }

    pub fn bad_request() -> Self {
        Self::text(StatusCode::BadRequest, "Bad Request")
    }

    pub fn internal_error() -> Self {
        Self::text(StatusCode::InternalServerError, "Internal Server Error")
    }

    pub fn service_unavailable() -> Self {
        Self::text(StatusCode::ServiceUnavailable, "Server Busy")
    }

    fn text(status: StatusCode, body: &str) -> Self {
        Self::new(status)
            .with_header("Content-Type", "text/plain")
            .with_body(body)
    }

    /// Status line + headers + línea vacía
    pub fn head_bytes(&self) -> Vec<u8> {
        let mut head = format!("HTTP/1.0 {}\r\n", self.status);
        for (name, value) in &self.headers {
            head.push_str(name);
            head.push_str(": ");
            head.push_str(value);
            head.push_str("\r\n");
        }
        head.push_str("\r\n");
        head.into_bytes()
    }

    /// Escribe head y body sin concatenarlos en memoria
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.head_bytes())?;
        writer.write_all(&self.body)?;
        writer.flush()
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Busca un header (sin distinguir mayúsculas)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

/// `Content-Type` según la extensión del archivo
pub fn content_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match extension.as_deref() {
        Some("html") | Some("htm") => "text/html",
        Some("css") => "text/css",
        Some("js") => "application/javascript",
        Some("json") => "application/json",
        Some("txt") => "text/plain",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
}
