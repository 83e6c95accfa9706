//! # Collector de Métricas
//! src/metrics/collector.rs
//!
//! Cuenta lo que pasa con cada conexión: requests servidos por código de
//! estado, conexiones descartadas por cola llena, conexiones abandonadas
//! por el cliente y workers ocupados. Al apagar el servidor se imprime un
//! [`MetricsSnapshot`] en JSON.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Cantidad máxima de latencias guardadas para los percentiles
const MAX_LATENCIES: usize = 10_000;

/// Rutas incluidas en `top_paths`
const TOP_PATHS: usize = 10;

/// Rutas distintas que se cuentan por separado
pub const MAX_TRACKED_PATHS: usize = 1_000;

/// Acumula las rutas que llegan cuando el mapa ya está lleno
pub const OTHER_PATHS: &str = "(other)";

/// Collector de métricas thread-safe
#[derive(Clone)]
pub struct MetricsCollector {
    inner: Arc<Mutex<MetricsData>>,
    start_time: Instant,
}

struct MetricsData {
    total_requests: u64,
    status_codes: BTreeMap<u16, u64>,

    /// Ventana de latencias en microsegundos (las más viejas salen primero)
    latencies: VecDeque<u64>,

    requests_per_path: HashMap<String, u64>,

    /// Cola llena: se contestó 503 (o nada) y se cerró
    dropped_connections: u64,

    /// El cliente cerró o no mandó nada antes del timeout
    abandoned_connections: u64,

    busy_workers: u64,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MetricsData {
                total_requests: 0,
                status_codes: BTreeMap::new(),
                latencies: VecDeque::with_capacity(MAX_LATENCIES),
                requests_per_path: HashMap::new(),
                dropped_connections: 0,
                abandoned_connections: 0,
                busy_workers: 0,
            })),
            start_time: Instant::now(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MetricsData> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registra un request respondido
    pub fn record_request(&self, path: &str, status_code: u16, latency: Duration) {
        let mut data = self.lock();

        data.total_requests += 1;
        *data.status_codes.entry(status_code).or_insert(0) += 1;

        if data.latencies.len() >= MAX_LATENCIES {
            data.latencies.pop_front();
        }
        data.latencies.push_back(latency.as_micros() as u64);

        // Las URIs las elige el cliente: el mapa no puede crecer sin límite
        let key = if data.requests_per_path.contains_key(path)
            || data.requests_per_path.len() < MAX_TRACKED_PATHS
        {
            path
        } else {
            OTHER_PATHS
        };
        *data.requests_per_path.entry(key.to_string()).or_insert(0) += 1;
    }

    pub fn record_dropped(&self) {
        self.lock().dropped_connections += 1;
    }

    pub fn record_abandoned(&self) {
        self.lock().abandoned_connections += 1;
    }

    pub fn increment_busy_workers(&self) {
        self.lock().busy_workers += 1;
    }

    /// No baja de cero
    pub fn decrement_busy_workers(&self) {
        let mut data = self.lock();
        data.busy_workers = data.busy_workers.saturating_sub(1);
    }

    pub fn busy_workers(&self) -> u64 {
        self.lock().busy_workers
    }

    /// Foto de las métricas actuales
    pub fn snapshot(&self) -> MetricsSnapshot {
        let data = self.lock();

        let latencies: Vec<u64> = data.latencies.iter().copied().collect();
        let (p50, p95, p99, avg) = calculate_percentiles(&latencies);
        let stddev = calculate_stddev(&latencies, avg);

        let mut paths: Vec<PathCount> = data
            .requests_per_path
            .iter()
            .map(|(path, count)| PathCount {
                path: path.clone(),
                count: *count,
            })
            .collect();
        // Empates por nombre para que el orden sea estable
        paths.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.path.cmp(&b.path)));
        paths.truncate(TOP_PATHS);

        MetricsSnapshot {
            uptime_secs: self.start_time.elapsed().as_secs(),
            total_requests: data.total_requests,
            status_codes: data.status_codes.clone(),
            dropped_connections: data.dropped_connections,
            abandoned_connections: data.abandoned_connections,
            busy_workers: data.busy_workers,
            top_paths: paths,
            latency_us: LatencySummary {
                p50,
                p95,
                p99,
                avg,
                stddev,
                samples: latencies.len(),
            },
        }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Percentiles y promedio (p50, p95, p99, avg)
fn calculate_percentiles(latencies: &[u64]) -> (u64, u64, u64, u64) {
    if latencies.is_empty() {
        return (0, 0, 0, 0);
    }

    let mut sorted = latencies.to_vec();
    sorted.sort_unstable();

    let len = sorted.len();
    let p50 = sorted[len * 50 / 100];
    let p95 = sorted[len * 95 / 100];
    let p99 = sorted[len * 99 / 100];
    let avg = sorted.iter().sum::<u64>() / len as u64;

    (p50, p95, p99, avg)
}

fn calculate_stddev(latencies: &[u64], avg: u64) -> f64 {
    if latencies.is_empty() {
        return 0.0;
    }

    let variance = latencies
        .iter()
        .map(|&x| {
            let diff = x as f64 - avg as f64;
            diff * diff
        })
        .sum::<f64>()
        / latencies.len() as f64;

    variance.sqrt()
}

/// Snapshot serializable de las métricas
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub uptime_secs: u64,
    pub total_requests: u64,
    pub status_codes: BTreeMap<u16, u64>,
    pub dropped_connections: u64,
    pub abandoned_connections: u64,
    pub busy_workers: u64,
    pub top_paths: Vec<PathCount>,
    pub latency_us: LatencySummary,
}

impl MetricsSnapshot {
    /// Requests respondidos con un código dado
    pub fn count_for(&self, status_code: u16) -> u64 {
        self.status_codes.get(&status_code).copied().unwrap_or(0)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathCount {
    pub path: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatencySummary {
    pub p50: u64,
    pub p95: u64,
    pub p99: u64,
    pub avg: u64,
    pub stddev: f64,
    pub samples: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_request_counts_by_status() {
        let collector = MetricsCollector::new();

        collector.record_request("/index.html", 200, Duration::from_millis(10));
        collector.record_request("/index.html", 200, Duration::from_millis(20));
        collector.record_request("/missing", 404, Duration::from_millis(5));

        let snapshot = collector.snapshot();
        assert_eq!(snapshot.total_requests, 3);
        assert_eq!(snapshot.count_for(200), 2);
        assert_eq!(snapshot.count_for(404), 1);
        assert_eq!(snapshot.count_for(500), 0);
    }

    #[test]
    fn test_percentiles() {
        let collector = MetricsCollector::new();

        for i in 1..=100 {
            collector.record_request("/a", 200, Duration::from_micros(i));
        }

        let latency = collector.snapshot().latency_us;
        assert_eq!(latency.samples, 100);
        assert!(latency.p50 > 0);
        assert!(latency.p95 > latency.p50);
        assert!(latency.p99 > latency.p95);
        assert!(latency.stddev > 0.0);
    }

    #[test]
    fn test_empty_snapshot() {
        let snapshot = MetricsCollector::new().snapshot();

        assert_eq!(snapshot.total_requests, 0);
        assert_eq!(snapshot.latency_us.p99, 0);
        assert_eq!(snapshot.latency_us.stddev, 0.0);
        assert!(snapshot.top_paths.is_empty());
    }

    #[test]
    fn test_dropped_and_abandoned() {
        let collector = MetricsCollector::new();

        collector.record_dropped();
        collector.record_dropped();
        collector.record_abandoned();

        let snapshot = collector.snapshot();
        assert_eq!(snapshot.dropped_connections, 2);
        assert_eq!(snapshot.abandoned_connections, 1);
        assert_eq!(snapshot.total_requests, 0);
    }

    #[test]
    fn test_busy_workers_tracking() {
        let collector = MetricsCollector::new();
        assert_eq!(collector.busy_workers(), 0);

        collector.increment_busy_workers();
        collector.increment_busy_workers();
        assert_eq!(collector.busy_workers(), 2);

        collector.decrement_busy_workers();
        collector.decrement_busy_workers();
        collector.decrement_busy_workers();
        assert_eq!(collector.busy_workers(), 0);
    }

    #[test]
    fn test_path_map_is_bounded() {
        let collector = MetricsCollector::new();

        for i in 0..20_000 {
            collector.record_request(&format!("/junk-{}", i), 404, Duration::ZERO);
        }
        // Una ruta ya conocida sigue sumando en su propia entrada
        collector.record_request("/junk-0", 404, Duration::ZERO);

        assert_eq!(collector.lock().requests_per_path.len(), MAX_TRACKED_PATHS + 1);

        let snapshot = collector.snapshot();
        assert_eq!(snapshot.total_requests, 20_001);
        assert_eq!(snapshot.top_paths[0].path, OTHER_PATHS);
        assert_eq!(snapshot.top_paths[0].count, (20_000 - MAX_TRACKED_PATHS) as u64);
        assert_eq!(snapshot.top_paths[1].path, "/junk-0");
        assert_eq!(snapshot.top_paths[1].count, 2);
    }

    #[test]
    fn test_top_paths_sorted() {
        let collector = MetricsCollector::new();

        collector.record_request("/b", 200, Duration::ZERO);
        collector.record_request("/a", 200, Duration::ZERO);
        collector.record_request("/c", 200, Duration::ZERO);
        collector.record_request("/c", 200, Duration::ZERO);

        let paths: Vec<_> = collector
            .snapshot()
            .top_paths
            .into_iter()
            .map(|p| (p.path, p.count))
            .collect();

        assert_eq!(
            paths,
            vec![("/c".to_string(), 2), ("/a".to_string(), 1), ("/b".to_string(), 1)]
        );
    }

    #[test]
    fn test_latency_window() {
        let collector = MetricsCollector::new();

        for i in 0..(MAX_LATENCIES as u64 + 500) {
            collector.record_request("/a", 200, Duration::from_micros(i));
        }

        let snapshot = collector.snapshot();
        assert_eq!(snapshot.total_requests, MAX_LATENCIES as u64 + 500);
        assert_eq!(snapshot.latency_us.samples, MAX_LATENCIES);
    }

    #[test]
    fn test_json_is_valid() {
        let collector = MetricsCollector::new();
        collector.record_request("/index.html", 200, Duration::from_millis(3));
        collector.record_dropped();

        let json = collector.snapshot().to_json();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["total_requests"], 1);
        assert_eq!(value["status_codes"]["200"], 1);
        assert_eq!(value["dropped_connections"], 1);
        assert_eq!(value["top_paths"][0]["path"], "/index.html");
        assert_eq!(value["latency_us"]["samples"], 1);
    }

    #[test]
    fn test_clones_share_state() {
        let collector = MetricsCollector::new();
        let clone = collector.clone();

        let handle = std::thread::spawn(move || {
            for _ in 0..100 {
                clone.record_request("/t", 200, Duration::ZERO);
            }
        });
        handle.join().unwrap();

        assert_eq!(collector.snapshot().total_requests, 100);
    }
}
