//! # Cola Acotada de Conexiones
//! src/jobs/queue.rs
//!
//! Buffer circular de capacidad fija protegido por un `Mutex` y un
//! `Condvar`. El acceptor hace `push` (no bloqueante, falla si está llena)
//! y los workers hacen `pop` (bloqueante hasta que haya trabajo o se
//! apague la cola).
//!
//! ```text
//!         head                 tail
//!          v                    v
//! [ _ | c1 | c2 | c3 | _ | _ | _ ]   count = 3
//! ```
//!
//! El lock sólo se toma para operaciones O(1) sobre el ring; nunca se
//! hace I/O ni logging con el lock tomado.

use std::fmt;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// Motivo por el que un `push` fue rechazado
///
/// El handle se devuelve al llamador para que decida qué hacer con él
/// (normalmente cerrar la conexión).
#[derive(Debug)]
pub enum PushError<T> {
    /// La cola está en su capacidad máxima (backpressure)
    Full(T),

    /// La cola ya fue apagada
    Shutdown(T),
}

impl<T> fmt::Display for PushError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PushError::Full(_) => write!(f, "queue is full"),
            PushError::Shutdown(_) => write!(f, "queue is shut down"),
        }
    }
}

impl<T: fmt::Debug> std::error::Error for PushError<T> {}

impl<T> PushError<T> {
    /// Recupera el handle rechazado
    pub fn into_inner(self) -> T {
        match self {
            PushError::Full(item) | PushError::Shutdown(item) => item,
        }
    }
}

/// Estado interno protegido por el mutex
struct RingState<T> {
    slots: Vec<Option<T>>,
    head: usize,
    tail: usize,
    count: usize,
    shutdown: bool,
}

/// Cola FIFO acotada y thread-safe
pub struct JobQueue<T> {
    state: Mutex<RingState<T>>,

    /// Se notifica en cada push y en el shutdown
    notify: Condvar,

    capacity: usize,
}

impl<T> JobQueue<T> {
    /// Crea una cola con capacidad fija
    ///
    /// Una capacidad de 0 se trata como 1: una cola que nunca acepta nada
    /// no tiene sentido.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let slots = std::iter::repeat_with(|| None).take(capacity).collect();

        Self {
            state: Mutex::new(RingState {
                slots,
                head: 0,
                tail: 0,
                count: 0,
                shutdown: false,
            }),
            notify: Condvar::new(),
            capacity,
        }
    }

    /// Encola un handle sin bloquear
    ///
    /// Retorna `PushError::Full` si la cola está llena; en ese caso
    /// `head`, `tail` y `count` no cambian.
    pub fn push(&self, item: T) -> Result<(), PushError<T>> {
        let mut state = self.lock();

        if state.shutdown {
            return Err(PushError::Shutdown(item));
        }
        if state.count == self.capacity {
            return Err(PushError::Full(item));
        }

        let tail = state.tail;
        state.slots[tail] = Some(item);
        state.tail = (tail + 1) % self.capacity;
        state.count += 1;
        drop(state);

        self.notify.notify_one();
        Ok(())
    }

    /// Desencola el handle más antiguo, bloqueando si la cola está vacía
    ///
    /// Retorna `None` únicamente cuando la cola fue apagada y ya no queda
    /// nada por entregar. Los handles encolados antes del shutdown se
    /// siguen entregando.
    pub fn pop(&self) -> Option<T> {
        let mut state = self.lock();

        while state.count == 0 && !state.shutdown {
            state = self
                .notify
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }

        Self::take_head(&mut state, self.capacity)
    }

    /// Desencola sin bloquear
    pub fn try_pop(&self) -> Option<T> {
        let mut state = self.lock();
        Self::take_head(&mut state, self.capacity)
    }

    /// Apaga la cola y despierta a todos los workers
    ///
    /// Idempotente: el flag nunca vuelve a `false`.
    pub fn shutdown(&self) {
        let mut state = self.lock();
        state.shutdown = true;
        drop(state);

        self.notify.notify_all();
    }

    pub fn is_shutdown(&self) -> bool {
        self.lock().shutdown
    }

    /// Número de handles en la cola
    pub fn len(&self) -> usize {
        self.lock().count
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity
    }

    /// Snapshot del estado del ring
    pub fn stats(&self) -> QueueStats {
        let state = self.lock();
        QueueStats {
            count: state.count,
            capacity: self.capacity,
            head: state.head,
            tail: state.tail,
            shutdown: state.shutdown,
        }
    }

    fn take_head(state: &mut RingState<T>, capacity: usize) -> Option<T> {
        if state.count == 0 {
            return None;
        }

        let head = state.head;
        let item = state.slots[head].take();
        state.head = (head + 1) % capacity;
        state.count -= 1;
        item
    }

    // Las secciones críticas nunca dejan el ring a medias, así que un
    // mutex envenenado sigue siendo utilizable.
    fn lock(&self) -> MutexGuard<'_, RingState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Estadísticas de la cola
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueStats {
    pub count: usize,
    pub capacity: usize,
    pub head: usize,
    pub tail: usize,
    pub shutdown: bool,
}
