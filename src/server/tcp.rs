//! # Servidor TCP Concurrente
//! src/server/tcp.rs
//!
//! Un thread acepta conexiones y las encola; un pool fijo de workers las
//! procesa. El acceptor nunca toca el socket más allá de encolarlo (o de
//! contestar 503 si la cola está llena).
//!
//! ```text
//!             ┌────────────┐   push    ┌──────────┐   pop   ┌──────────┐
//! cliente ──> │  acceptor  │ ────────> │ JobQueue │ ──────> │ worker N │
//!             └────────────┘           └──────────┘         └──────────┘
//!                   │ cola llena
//!                   └──> 503 + close
//! ```
//!
//! El listener es no bloqueante para poder revisar la bandera de apagado
//! entre intentos de `accept`.

use super::handler::{ConnectionContext, ConnectionWorker};
use crate::arena::Arena;
use crate::config::Config;
use crate::error::ServerError;
use crate::fs::SafeRoot;
use crate::http::Response;
use crate::jobs::{JobQueue, PushError};
use crate::metrics::{MetricsCollector, MetricsSnapshot};
use crate::workers::WorkerPool;
use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Pausa entre `accept` cuando no hay conexiones pendientes
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Servidor HTTP/1.0 de archivos estáticos
pub struct Server {
    config: Config,
    listener: TcpListener,
    ctx: Arc<ConnectionContext>,
    metrics: MetricsCollector,
}

impl Server {
    /// Valida la configuración, canonicaliza el root y hace bind
    ///
    /// Cualquier error acá es fatal: el servidor no arranca.
    pub fn bind(config: Config) -> Result<Self, ServerError> {
        config.validate().map_err(ServerError::InvalidConfig)?;

        // Falla temprano si la arena no es válida, antes de abrir el puerto
        Arena::new(config.arena_size)?.destroy();

        let root = SafeRoot::new(&config.root_dir)
            .map_err(|source| ServerError::InvalidRoot {
                path: config.root_dir.clone(),
                source,
            })?
            .with_index_file(&config.index_file);
        log::info!("📁 Sirviendo {}", root.path().display());

        let address = config.address();
        let listener = TcpListener::bind(&address)
            .and_then(|listener| {
                listener.set_nonblocking(true)?;
                Ok(listener)
            })
            .map_err(|source| ServerError::Bind {
                address: address.clone(),
                source,
            })?;

        let metrics = MetricsCollector::new();
        let ctx = Arc::new(ConnectionContext::from_config(&config, root, metrics.clone()));

        Ok(Self {
            config,
            listener,
            ctx,
            metrics,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Handle al collector (comparte estado con el servidor)
    pub fn metrics(&self) -> MetricsCollector {
        self.metrics.clone()
    }

    /// Acepta conexiones hasta que `shutdown` pase a `true`
    ///
    /// Al salir apaga la cola, espera a que los workers terminen lo que
    /// quedaba encolado y retorna las métricas finales.
    pub fn run(self, shutdown: Arc<AtomicBool>) -> Result<MetricsSnapshot, ServerError> {
        let queue: Arc<JobQueue<TcpStream>> = Arc::new(JobQueue::new(self.config.queue_capacity));

        let workers = (0..self.config.workers)
            .map(|id| ConnectionWorker::new(id, self.config.arena_size, Arc::clone(&self.ctx)))
            .collect::<Result<Vec<_>, _>>()?;

        let pool = WorkerPool::start(Arc::clone(&queue), workers).map_err(ServerError::Spawn)?;

        log::info!(
            "🚀 Escuchando en {} ({} workers, cola de {})",
            self.local_addr()
                .map(|addr| addr.to_string())
                .unwrap_or_else(|_| self.config.address()),
            pool.size(),
            queue.capacity()
        );

        while !shutdown.load(Ordering::SeqCst) {
            match self.listener.accept() {
                Ok((stream, peer)) => self.dispatch(&queue, stream, peer),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => thread::sleep(ACCEPT_POLL_INTERVAL),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    log::warn!("⚠️  Error al aceptar conexión: {}", e);
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
            }
        }

        log::info!("🛑 Apagando: {} conexiones pendientes en la cola", queue.len());
        queue.shutdown();

        let clean = pool.join();
        log::info!("👷 {} de {} workers terminaron limpio", clean, self.config.workers);

        let snapshot = self.metrics.snapshot();
        log::info!("📊 Métricas finales:\n{}", snapshot.to_json());

        Ok(snapshot)
    }

    /// Encola la conexión o la rechaza con 503
    fn dispatch(&self, queue: &JobQueue<TcpStream>, stream: TcpStream, peer: SocketAddr) {
        // En algunas plataformas el socket hereda el modo no bloqueante
        if let Err(e) = stream.set_nonblocking(false) {
            log::warn!("⚠️  No se pudo configurar el socket de {}: {}", peer, e);
            return;
        }

        match queue.push(stream) {
            Ok(()) => log::debug!("Conexión de {} encolada", peer),
            Err(PushError::Full(mut stream)) => {
                log::warn!("🚦 Cola llena, rechazando {}", peer);
                self.metrics.record_dropped();

                // Best effort: si el cliente no lee, igual se cierra
                let _ = stream.set_write_timeout(Some(self.ctx.write_timeout));
                if let Err(e) = Response::service_unavailable().write_to(&mut stream) {
                    log::debug!("No se pudo enviar 503 a {}: {}", peer, e);
                }
            }
            Err(PushError::Shutdown(_)) => {
                log::debug!("Cola cerrada, descartando {}", peer);
                self.metrics.record_dropped();
            }
        }
    }
}
