//! # Manejo de una Conexión
//! src/server/handler.rs
//!
//! Lo que hace un worker con cada socket que saca de la cola:
//!
//! ```text
//! reset arena ─> alloc buffer ─> read (hasta '\n') ─> parse request line
//!      ─> normalizar URI ─> resolver dentro del root ─> leer archivo
//!      ─> escribir respuesta ─> cerrar
//! ```
//!
//! Todas las asignaciones de la conexión salen de la arena del worker.
//! Ningún error de una conexión afecta al servidor: termina en una
//! respuesta HTTP o en una conexión abandonada.

use crate::arena::{Arena, ArenaError, ArenaStr};
use crate::config::Config;
use crate::fs::{path_kind, read_file, FileError, PathKind, SafeRoot};
use crate::http::{parse_request_line, HttpRequest, Limits, Response, StatusCode};
use crate::metrics::MetricsCollector;
use crate::workers::Worker;
use std::io::{self, Read, Write};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Ruta con la que se cuentan los requests que no sirvieron un archivo
pub const NOT_SERVED: &str = "-";

/// Estado compartido (sólo lectura) por todos los workers
#[derive(Clone)]
pub struct ConnectionContext {
    pub root: SafeRoot,
    pub limits: Limits,
    pub header_buffer_size: usize,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
    pub metrics: MetricsCollector,
}

impl ConnectionContext {
    pub fn from_config(config: &Config, root: SafeRoot, metrics: MetricsCollector) -> Self {
        Self {
            root,
            limits: config.limits(),
            header_buffer_size: config.header_buffer_size,
            read_timeout: config.read_timeout(),
            write_timeout: config.write_timeout(),
            metrics,
        }
    }
}

/// Cómo terminó una conexión
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Se escribió una respuesta completa
    Responded(StatusCode),
    /// El cliente no mandó nada, cerró, o falló el I/O
    Abandoned,
}

/// Procesa una conexión completa sobre `stream`
///
/// La arena debe venir recién reseteada; todo lo que se asigna acá queda
/// inválido en el próximo `reset()`.
pub fn handle_connection<S: Read + Write>(
    stream: &mut S,
    arena: &mut Arena,
    ctx: &ConnectionContext,
) -> Outcome {
    let start = Instant::now();

    let header = match arena.alloc(ctx.header_buffer_size) {
        Ok(span) => span,
        Err(e) => {
            log::error!("❌ Sin memoria para el header: {}", e);
            return respond(stream, Response::internal_error(), NOT_SERVED, start, ctx);
        }
    };

    let filled = match read_header(stream, arena.get_mut(header)) {
        Ok(0) => {
            log::debug!("Conexión cerrada sin datos");
            ctx.metrics.record_abandoned();
            return Outcome::Abandoned;
        }
        Ok(n) => n,
        Err(e) => {
            log::debug!("Error leyendo el request: {}", e);
            ctx.metrics.record_abandoned();
            return Outcome::Abandoned;
        }
    };

    let Some(input) = header.sub(0, filled).map(ArenaStr::from_span) else {
        return respond(stream, Response::internal_error(), NOT_SERVED, start, ctx);
    };

    let request = match parse_request_line(arena, input, &ctx.limits) {
        Ok(request) => request,
        Err(e) => {
            log::info!("⚠️  Request inválido: {}", e);
            return respond(stream, Response::bad_request(), NOT_SERVED, start, ctx);
        }
    };

    let label = String::from_utf8_lossy(request.uri.as_bytes(arena)).into_owned();
    log::debug!(
        "{} {}",
        String::from_utf8_lossy(request.method.as_bytes(arena)),
        label
    );

    let response = match serve(arena, &request, &ctx.root) {
        Ok(response) => response,
        Err(e) => {
            log::error!("❌ Sin memoria armando la ruta: {}", e);
            Response::internal_error()
        }
    };

    respond(stream, response, &label, start, ctx)
}

/// Lee hasta tener un `\n`, llenar el buffer, o hasta que el cliente cierre
///
/// Un error después de haber recibido algo corta la lectura y se parsea
/// lo que haya.
fn read_header<R: Read>(stream: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;

    while filled < buf.len() {
        match stream.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => {
                let has_newline = buf[filled..filled + n].contains(&b'\n');
                filled += n;
                if has_newline {
                    break;
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) if filled > 0 => {
                log::debug!("Lectura parcial ({} bytes): {}", filled, e);
                break;
            }
            Err(e) => return Err(e),
        }
    }

    Ok(filled)
}

/// Arma la respuesta para un request ya parseado
///
/// Sólo falla si la arena se queda sin memoria.
fn serve(arena: &mut Arena, request: &HttpRequest, root: &SafeRoot) -> Result<Response, ArenaError> {
    let path = normalize_uri(arena, request.uri);

    let Some(requested) = path.to_str(arena) else {
        log::debug!("URI no es UTF-8");
        return Ok(Response::not_found());
    };

    let target = match root.resolve(requested) {
        Ok(target) => target,
        Err(_) => return Ok(Response::not_found()),
    };

    let target = match path_kind(&target) {
        PathKind::File => target,
        PathKind::Directory => {
            // <uri>/<index>, resuelto otra vez desde el root
            let separator: &[u8] = if path.as_bytes(arena).last() == Some(&b'/') || path.is_empty() {
                b""
            } else {
                b"/"
            };
            let index = ArenaStr::concat_parts(arena, path, &[separator, root.index_file().as_bytes()])?;

            let resolved = index
                .to_str(arena)
                .and_then(|index| root.resolve(index).ok());

            match resolved {
                Some(target) if path_kind(&target) == PathKind::File => target,
                _ => return Ok(Response::not_found()),
            }
        }
        PathKind::Other | PathKind::Error => return Ok(Response::not_found()),
    };

    match read_file(&target) {
        Ok(contents) => Ok(Response::file(&target, contents)),
        Err(FileError::NotFound(_)) => Ok(Response::not_found()),
        Err(e) => {
            log::warn!("⚠️  {}", e);
            Ok(Response::not_found())
        }
    }
}

/// Quita `?query`, `#fragment` y la `/` inicial
///
/// El resultado es una vista sobre la URI recibida.
fn normalize_uri(arena: &Arena, uri: ArenaStr) -> ArenaStr {
    let end = uri.find_any(arena, b"?#").unwrap_or(uri.len());
    let path = uri.slice(0, end).unwrap_or(uri);

    if path.starts_with(arena, b"/") {
        path.slice(1, path.len() - 1).unwrap_or(path)
    } else {
        path
    }
}

/// Escribe la respuesta y registra la métrica
fn respond<W: Write>(
    stream: &mut W,
    response: Response,
    label: &str,
    start: Instant,
    ctx: &ConnectionContext,
) -> Outcome {
    let status = response.status();

    if let Err(e) = response.write_to(stream) {
        log::debug!("No se pudo escribir la respuesta: {}", e);
        ctx.metrics.record_abandoned();
        return Outcome::Abandoned;
    }

    let latency = start.elapsed();
    let level = if status.is_server_error() {
        log::Level::Warn
    } else {
        log::Level::Info
    };
    log::log!(level, "{} -> {} ({:.2}ms)", label, status, latency.as_secs_f64() * 1000.0);

    // Sólo los 200 cuentan por ruta; el resto se agrupa por status
    let path = if status == StatusCode::Ok { label } else { NOT_SERVED };
    ctx.metrics.record_request(path, status.as_u16(), latency);

    Outcome::Responded(status)
}

/// Marca un worker como ocupado mientras vive
struct BusyGuard<'a>(&'a MetricsCollector);

impl<'a> BusyGuard<'a> {
    fn new(metrics: &'a MetricsCollector) -> Self {
        metrics.increment_busy_workers();
        Self(metrics)
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.decrement_busy_workers();
    }
}

/// Worker del pool: dueño de una arena que reutiliza entre conexiones
pub struct ConnectionWorker {
    id: usize,
    arena: Arena,
    ctx: Arc<ConnectionContext>,
}

impl ConnectionWorker {
    pub fn new(id: usize, arena_size: usize, ctx: Arc<ConnectionContext>) -> Result<Self, ArenaError> {
        Ok(Self {
            id,
            arena: Arena::new(arena_size)?,
            ctx,
        })
    }
}

impl Worker<TcpStream> for ConnectionWorker {
    fn process(&mut self, mut stream: TcpStream) {
        let _busy = BusyGuard::new(&self.ctx.metrics);

        // Todo lo de la conexión anterior queda invalidado
        self.arena.reset();

        let timeouts = stream
            .set_read_timeout(Some(self.ctx.read_timeout))
            .and_then(|_| stream.set_write_timeout(Some(self.ctx.write_timeout)));
        if let Err(e) = timeouts {
            log::warn!("⚠️  [worker {}] No se pudieron fijar timeouts: {}", self.id, e);
        }

        let outcome = handle_connection(&mut stream, &mut self.arena, &self.ctx);
        log::trace!(
            "[worker {}] {:?} (arena: {} de {} bytes)",
            self.id,
            outcome,
            self.arena.offset(),
            self.arena.capacity()
        );
    }
}
