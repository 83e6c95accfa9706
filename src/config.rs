//! # Configuración del Servidor
//! src/config.rs
//!
//! Configuración del servidor de archivos con soporte para argumentos CLI
//! y variables de entorno.
//!
//! ## Ejemplos de uso
//!
//! ### CLI
//! ```bash
//! ./static_server --port 8080 \
//!   --root-dir ./public \
//!   --workers 4 \
//!   --queue-capacity 256
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! HTTP_PORT=8080 ROOT_DIR=/srv/www RUST_LOG=debug ./static_server
//! ```

use crate::arena::{ALIGN, ARENA_MAX_SIZE};
use crate::http::parser::{Limits, MAX_METHOD, MAX_URI};
use clap::Parser;
use std::path::is_separator;
use std::time::Duration;

/// Cola del request line: ` HTTP/1.0\r\n` sin el espacio
const REQUEST_LINE_VERSION: &str = "HTTP/1.0\r\n";

/// Configuración del servidor HTTP/1.0 de archivos estáticos
#[derive(Debug, Clone, Parser)]
#[command(name = "static_server")]
#[command(about = "Servidor HTTP/1.0 concurrente de archivos estáticos")]
#[command(version = "0.1.0")]
pub struct Config {
    /// Puerto en el que escucha el servidor
    #[arg(short, long, default_value = "8080", env = "HTTP_PORT")]
    pub port: u16,

    /// Host/IP en el que escucha
    #[arg(long, default_value = "127.0.0.1", env = "HTTP_HOST")]
    pub host: String,

    /// Directorio raíz que se sirve (nada fuera de él es accesible)
    #[arg(short, long = "root-dir", default_value = "./public", env = "ROOT_DIR")]
    pub root_dir: String,

    // === Concurrencia ===

    /// Número fijo de workers
    #[arg(short, long, default_value = "4", env = "WORKERS")]
    pub workers: usize,

    /// Conexiones aceptadas que pueden esperar en la cola
    #[arg(long = "queue-capacity", default_value = "256", env = "QUEUE_CAPACITY")]
    pub queue_capacity: usize,

    // === Memoria por conexión ===

    /// Bytes leídos como máximo del header del request
    ///
    /// Tiene que alcanzar para el request line más largo que aceptan
    /// los límites de método y URI.
    #[arg(long = "header-buffer-size", default_value = "4096", env = "HEADER_BUFFER_SIZE")]
    pub header_buffer_size: usize,

    /// Tamaño de la arena de cada worker (ver [`Config::min_arena_size`])
    #[arg(long = "arena-size", default_value = "8192", env = "ARENA_SIZE")]
    pub arena_size: usize,

    // === Parser ===

    #[arg(long = "max-method-length", default_value = "7", env = "MAX_METHOD_LENGTH")]
    pub max_method_length: usize,

    #[arg(long = "max-uri-length", default_value = "2048", env = "MAX_URI_LENGTH")]
    pub max_uri_length: usize,

    // === Timeouts ===

    /// Timeout de lectura del socket en milisegundos
    #[arg(long = "read-timeout", default_value = "5000", env = "READ_TIMEOUT_MS")]
    pub read_timeout_ms: u64,

    /// Timeout de escritura del socket en milisegundos
    #[arg(long = "write-timeout", default_value = "5000", env = "WRITE_TIMEOUT_MS")]
    pub write_timeout_ms: u64,

    /// Documento servido para `/` y para directorios
    #[arg(long = "index-file", default_value = "index.html", env = "INDEX_FILE")]
    pub index_file: String,
}

impl Config {
    /// Dirección completa para bind (host:port)
    ///
    /// # Ejemplo
    /// ```rust
    /// use static_server::config::Config;
    ///
    /// let config = Config::default();
    /// assert_eq!(config.address(), "127.0.0.1:8080");
    /// ```
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Límites de tokens para el parser
    pub fn limits(&self) -> Limits {
        Limits {
            max_method: self.max_method_length,
            max_uri: self.max_uri_length,
        }
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }

    /// Largo del request line más largo que el parser puede aceptar
    ///
    /// `METHOD SP URI SP HTTP/1.x CRLF`
    pub fn max_request_line(&self) -> usize {
        self.max_method_length + 1 + self.max_uri_length + 1 + REQUEST_LINE_VERSION.len()
    }

    /// Arena mínima para atender cualquier request válido
    ///
    /// Cubre el buffer del header más la ruta `<uri>/<index>` que se arma
    /// al servir un directorio, con el padding de cada asignación.
    pub fn min_arena_size(&self) -> usize {
        self.header_buffer_size + self.max_uri_length + 1 + self.index_file.len() + 2 * ALIGN
    }

    /// Valida la configuración
    ///
    /// Retorna errores si hay valores inválidos
    pub fn validate(&self) -> Result<(), String> {
        if self.workers == 0 {
            return Err("Workers must be >= 1".to_string());
        }
        if self.queue_capacity == 0 {
            return Err("Queue capacity must be >= 1".to_string());
        }

        if self.max_method_length == 0 {
            return Err("Max method length must be >= 1".to_string());
        }
        if self.max_uri_length == 0 {
            return Err("Max URI length must be >= 1".to_string());
        }

        // Con un buffer más chico la URI se corta antes de llegar al límite
        if self.header_buffer_size < self.max_request_line() {
            return Err(format!(
                "Header buffer size must be >= {} (longest request line)",
                self.max_request_line()
            ));
        }
        if self.arena_size > ARENA_MAX_SIZE {
            return Err(format!("Arena size must be <= {}", ARENA_MAX_SIZE));
        }
        if self.arena_size < self.min_arena_size() {
            return Err(format!(
                "Arena size must be >= {} (header buffer + URI + index file)",
                self.min_arena_size()
            ));
        }

        if self.read_timeout_ms == 0 {
            return Err("Read timeout must be > 0".to_string());
        }
        if self.write_timeout_ms == 0 {
            return Err("Write timeout must be > 0".to_string());
        }

        if self.index_file.is_empty() || self.index_file.chars().any(is_separator) {
            return Err("Index file must be a plain file name".to_string());
        }

        Ok(())
    }

    /// Imprime un resumen de la configuración
    pub fn print_summary(&self) {
        println!("╔══════════════════════════════════════════════════════════════╗");
        println!("║           Static HTTP/1.0 Server Configuration              ║");
        println!("╚══════════════════════════════════════════════════════════════╝");
        println!();
        println!("🌐 Network:");
        println!("   Address:      {}", self.address());
        println!("   Root dir:     {}", self.root_dir);
        println!("   Index file:   {}", self.index_file);
        println!();
        println!("👷 Workers & Queue:");
        println!("   ┌──────────────┬────────────┬──────────────┐");
        println!("   │ Workers      │ Queue Cap  │ Arena/worker │");
        println!("   ├──────────────┼────────────┼──────────────┤");
        println!(
            "   │ {:^12} │ {:^10} │ {:>10} B │",
            self.workers, self.queue_capacity, self.arena_size
        );
        println!("   └──────────────┴────────────┴──────────────┘");
        println!();
        println!("📏 Limits:");
        println!("   Header buf:   {} bytes", self.header_buffer_size);
        println!("   Method:       {} bytes", self.max_method_length);
        println!("   URI:          {} bytes", self.max_uri_length);
        println!("   Timeouts:     read {} ms / write {} ms", self.read_timeout_ms, self.write_timeout_ms);
        println!();
        println!("═══════════════════════════════════════════════════════════════");
        println!();
    }
}

impl Default for Config {
    /// Configuración por defecto (igual a la del CLI)
    fn default() -> Self {
        Self {
            port: 8080,
            host: "127.0.0.1".to_string(),
            root_dir: "./public".to_string(),
            workers: 4,
            queue_capacity: 256,
            header_buffer_size: 4096,
            arena_size: 8192,
            max_method_length: MAX_METHOD,
            max_uri_length: MAX_URI,
            read_timeout_ms: 5_000,
            write_timeout_ms: 5_000,
            index_file: "index.html".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.workers, 4);
        assert_eq!(config.queue_capacity, 256);
        assert_eq!(config.index_file, "index.html");
    }

    #[test]
    fn test_default_matches_cli_defaults() {
        let parsed = Config::try_parse_from(["static_server"]).unwrap();
        let default = Config::default();

        assert_eq!(parsed.port, default.port);
        assert_eq!(parsed.root_dir, default.root_dir);
        assert_eq!(parsed.workers, default.workers);
        assert_eq!(parsed.queue_capacity, default.queue_capacity);
        assert_eq!(parsed.arena_size, default.arena_size);
        assert_eq!(parsed.header_buffer_size, default.header_buffer_size);
        assert_eq!(parsed.max_uri_length, default.max_uri_length);
    }

    #[test]
    fn test_cli_flags() {
        let config = Config::try_parse_from([
            "static_server",
            "--port",
            "3000",
            "--root-dir",
            "/srv/www",
            "--workers",
            "8",
            "--queue-capacity",
            "16",
        ])
        .unwrap();

        assert_eq!(config.port, 3000);
        assert_eq!(config.root_dir, "/srv/www");
        assert_eq!(config.workers, 8);
        assert_eq!(config.queue_capacity, 16);
    }

    #[test]
    fn test_address() {
        let mut config = Config::default();
        config.host = "0.0.0.0".to_string();
        config.port = 3000;
        assert_eq!(config.address(), "0.0.0.0:3000");
    }

    #[test]
    fn test_limits() {
        let mut config = Config::default();
        config.max_method_length = 4;
        config.max_uri_length = 100;

        assert_eq!(config.limits(), Limits { max_method: 4, max_uri: 100 });
        assert_eq!(Config::default().limits(), Limits::default());
    }

    #[test]
    fn test_validate_success() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_invalid_workers() {
        let mut config = Config::default();
        config.workers = 0;
        assert!(config.validate().unwrap_err().contains("Workers"));
    }

    #[test]
    fn test_validate_invalid_queue_capacity() {
        let mut config = Config::default();
        config.queue_capacity = 0;
        assert!(config.validate().unwrap_err().contains("Queue capacity"));
    }

    #[test]
    fn test_validate_arena_too_large() {
        let mut config = Config::default();
        config.arena_size = ARENA_MAX_SIZE + 1;
        assert!(config.validate().unwrap_err().contains("Arena size"));

        config.arena_size = ARENA_MAX_SIZE;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_arena_smaller_than_header_buffer() {
        let mut config = Config::default();
        config.arena_size = 512;
        config.header_buffer_size = 1024;
        config.max_uri_length = 256;
        assert!(config.validate().unwrap_err().contains("header buffer"));
    }

    #[test]
    fn test_validate_arena_must_fit_directory_index() {
        let mut config = Config::default();

        // Entra el header pero no la ruta del índice
        config.arena_size = config.header_buffer_size;
        assert!(config.validate().unwrap_err().contains("Arena size"));

        config.arena_size = config.min_arena_size() - 1;
        assert!(config.validate().is_err());

        config.arena_size = config.min_arena_size();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_header_buffer() {
        let mut config = Config::default();
        config.header_buffer_size = 0;
        assert!(config.validate().unwrap_err().contains("Header buffer"));
    }

    #[test]
    fn test_validate_header_buffer_fits_longest_request_line() {
        let mut config = Config::default();
        assert!(config.header_buffer_size >= config.max_request_line());

        // El default viejo cortaba URIs de más de ~1000 bytes
        config.header_buffer_size = 1024;
        assert!(config.validate().unwrap_err().contains("Header buffer"));

        config.header_buffer_size = config.max_request_line() - 1;
        assert!(config.validate().is_err());

        config.header_buffer_size = config.max_request_line();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_max_request_line() {
        let mut config = Config::default();
        config.max_method_length = 3;
        config.max_uri_length = 5;

        let longest = "GET /abcd HTTP/1.0\r\n";
        assert_eq!(config.max_request_line(), longest.len());
    }

    #[test]
    fn test_validate_zero_token_limits() {
        let mut config = Config::default();
        config.max_method_length = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.max_uri_length = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_zero_timeouts() {
        let mut config = Config::default();
        config.read_timeout_ms = 0;
        assert!(config.validate().unwrap_err().contains("Read timeout"));

        let mut config = Config::default();
        config.write_timeout_ms = 0;
        assert!(config.validate().unwrap_err().contains("Write timeout"));
    }

    #[test]
    fn test_validate_index_file() {
        let mut config = Config::default();
        config.index_file = "sub/index.html".to_string();
        assert!(config.validate().unwrap_err().contains("Index file"));

        config.index_file = String::new();
        assert!(config.validate().is_err());

        config.index_file = "home.htm".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_timeouts_as_duration() {
        let config = Config::default();
        assert_eq!(config.read_timeout(), Duration::from_secs(5));
        assert_eq!(config.write_timeout(), Duration::from_secs(5));
    }
}
