//! Servicio de cache clave/valor con expiración.
//!
//! Contrato del colaborador externo: `get` devuelve el valor serializado si
//! la entrada existe y no expiró; `set_with_expiry` escribe con TTL. Las
//! operaciones son idempotentes y por clave independiente, sin requisitos
//! transaccionales entre claves.
//!
//! La cache es una optimización, no una dependencia de corrección: los
//! componentes reciben `Option<Arc<dyn CacheStore>>` y su ausencia degrada a
//! "siempre computar".

use async_trait::async_trait;
use dashmap::DashMap;
use std::time::{Duration, Instant};

/// Almacenamiento clave/valor con expiración por entrada.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Devuelve el valor serializado si existe y sigue vigente.
    async fn get(&self, key: &str) -> Option<String>;
    /// Escribe el valor con un TTL a partir de ahora.
    async fn set_with_expiry(&self, key: &str, ttl: Duration, value: String);
}

/// Implementación en memoria sobre `DashMap`, segura para fan-out
/// concurrente dentro de un stage. La expiración es perezosa: las entradas
/// vencidas se descartan al leerlas.
pub struct InMemoryCache {
    inner: DashMap<String, (Instant, String)>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        InMemoryCache { inner: DashMap::new() }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStore for InMemoryCache {
    async fn get(&self, key: &str) -> Option<String> {
        let now = Instant::now();
        // El guard de lectura del shard debe soltarse antes de remover; un
        // remove con el guard vivo bloquea contra el mismo shard.
        let live = self.inner
                       .get(key)
                       .and_then(|entry| if entry.0 > now { Some(entry.1.clone()) } else { None });
        if live.is_none() {
            self.inner.remove_if(key, |_, (deadline, _)| *deadline <= now);
        }
        live
    }

    async fn set_with_expiry(&self, key: &str, ttl: Duration, value: String) {
        self.inner.insert(key.to_string(), (Instant::now() + ttl, value));
    }
}
