//! # Pool de Workers
//! src/workers/pool.rs
//!
//! N threads de larga vida que drenan la [`JobQueue`]. Cada worker:
//!
//! ```text
//! loop {
//!     pop() ──> None (shutdown)  ──> termina
//!          └──> Some(job)        ──> process(job) ──> loop
//! }
//! ```
//!
//! El número de workers se fija al arrancar y no cambia. `join()` sólo
//! debe llamarse después de `queue.shutdown()`, si no bloquea para
//! siempre.

use crate::jobs::JobQueue;
use std::any::Any;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Unidad de procesamiento que vive dentro de un worker
///
/// Cada worker es dueño exclusivo de su `Worker`, así que puede guardar
/// estado mutable (por ejemplo su arena) sin sincronización.
pub trait Worker<T>: Send + 'static {
    fn process(&mut self, job: T);
}

impl<T, F> Worker<T> for F
where
    F: FnMut(T) + Send + 'static,
{
    fn process(&mut self, job: T) {
        self(job)
    }
}

/// Pool de tamaño fijo
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Lanza un thread por cada elemento de `workers`
    ///
    /// El id de cada worker es su posición en el vector y sólo se usa para
    /// diagnóstico (nombre del thread y logs).
    ///
    /// # Errores
    ///
    /// Si el sistema operativo no puede crear un thread se apaga la cola,
    /// se espera a los workers ya lanzados y se retorna el error.
    pub fn start<T, W>(queue: Arc<JobQueue<T>>, workers: Vec<W>) -> io::Result<Self>
    where
        T: Send + 'static,
        W: Worker<T>,
    {
        let mut handles = Vec::with_capacity(workers.len());

        for (id, worker) in workers.into_iter().enumerate() {
            let worker_queue = Arc::clone(&queue);
            let spawned = thread::Builder::new()
                .name(format!("worker-{}", id))
                .spawn(move || worker_loop(id, worker_queue, worker));

            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    log::error!("No se pudo lanzar el worker {}: {}", id, e);
                    queue.shutdown();
                    WorkerPool { handles }.join();
                    return Err(e);
                }
            }
        }

        log::info!("Pool inicializado con {} workers", handles.len());
        Ok(Self { handles })
    }

    /// Número de workers lanzados
    pub fn size(&self) -> usize {
        self.handles.len()
    }

    /// Bloquea hasta que todos los workers terminen
    ///
    /// Retorna cuántos workers terminaron limpiamente.
    pub fn join(self) -> usize {
        let mut clean = 0;
        for handle in self.handles {
            let name = handle.thread().name().unwrap_or("worker").to_string();
            match handle.join() {
                Ok(()) => clean += 1,
                Err(payload) => {
                    log::error!("{} terminó con pánico: {}", name, panic_message(&*payload));
                }
            }
        }
        clean
    }
}

/// Loop principal del worker
fn worker_loop<T, W: Worker<T>>(id: usize, queue: Arc<JobQueue<T>>, mut worker: W) {
    log::debug!("🔧 Worker {} online", id);

    while let Some(job) = queue.pop() {
        // Un pánico procesando una conexión no debe matar al worker
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| worker.process(job)));

        if let Err(payload) = outcome {
            log::error!("Worker {}: pánico procesando trabajo: {}", id, panic_message(&*payload));
        }
    }

    log::debug!("Worker {} apagándose", id);
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}
