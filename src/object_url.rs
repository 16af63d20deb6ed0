use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

const SCHEME: &str = "blob:disk-imager/";

#[derive(Default)]
struct Registry {
    next_id: u64,
    live: HashMap<u64, Arc<[u8]>>,
}

// A panic elsewhere must not stop entries from being revoked.
fn lock(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
    registry.lock().unwrap_or_else(|e| e.into_inner())
}

/// In-memory image bytes addressable by a short-lived local URL.
#[derive(Clone, Default)]
pub struct ObjectUrls {
    inner: Arc<Mutex<Registry>>,
}

impl ObjectUrls {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, bytes: Vec<u8>) -> ObjectUrl {
        let bytes: Arc<[u8]> = bytes.into();
        let mut reg = lock(&self.inner);
        reg.next_id += 1;
        let id = reg.next_id;
        reg.live.insert(id, bytes.clone());
        log::debug!("object url {} created ({} bytes, {} live)", id, bytes.len(), reg.live.len());
        ObjectUrl {
            id,
            url: format!("{SCHEME}{id}"),
            bytes,
            registry: self.inner.clone(),
        }
    }

    pub fn resolve(&self, url: &str) -> Option<Arc<[u8]>> {
        let id = url.strip_prefix(SCHEME)?.parse::<u64>().ok()?;
        lock(&self.inner).live.get(&id).cloned()
    }

    pub fn live_count(&self) -> usize {
        lock(&self.inner).live.len()
    }
}

/// Owning handle for one registered URL; the entry is revoked on drop.
pub struct ObjectUrl {
    id: u64,
    url: String,
    bytes: Arc<[u8]>,
    registry: Arc<Mutex<Registry>>,
}

impl ObjectUrl {
    pub fn as_str(&self) -> &str {
        &self.url
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl Drop for ObjectUrl {
    fn drop(&mut self) {
        let mut reg = lock(&self.registry);
        reg.live.remove(&self.id);
        log::debug!("object url {} revoked ({} live)", self.id, reg.live.len());
    }
}

impl std::fmt::Debug for ObjectUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectUrl")
            .field("url", &self.url)
            .field("len", &self.bytes.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_resolve_revoke() {
        let urls = ObjectUrls::new();
        let a = urls.create(vec![1, 2, 3]);
        let b = urls.create(vec![4]);
        assert_ne!(a.as_str(), b.as_str());
        assert!(a.as_str().starts_with("blob:"));
        assert_eq!(urls.live_count(), 2);
        assert_eq!(urls.resolve(a.as_str()).as_deref(), Some(&[1u8, 2, 3][..]));

        let a_url = a.as_str().to_string();
        drop(a);
        assert_eq!(urls.live_count(), 1);
        assert!(urls.resolve(&a_url).is_none());
        assert_eq!(b.bytes(), &[4u8]);
    }

    #[test]
    fn test_resolve_rejects_foreign_urls() {
        let urls = ObjectUrls::new();
        let _a = urls.create(vec![0]);
        assert!(urls.resolve("https://via.placeholder.com/400").is_none());
        assert!(urls.resolve("blob:disk-imager/abc").is_none());
    }

    #[test]
    fn test_revoke_after_poisoned_lock() {
        let urls = ObjectUrls::new();
        let a = urls.create(vec![1]);
        let b = urls.create(vec![2]);

        let inner = urls.inner.clone();
        let poisoned = std::thread::spawn(move || {
            let _guard = inner.lock().unwrap();
            panic!("poison the registry");
        })
        .join();
        assert!(poisoned.is_err());
        assert!(urls.inner.is_poisoned());

        drop(a);
        assert_eq!(urls.live_count(), 1);
        assert_eq!(urls.resolve(b.as_str()).as_deref(), Some(&[2u8][..]));
        drop(b);
        assert_eq!(urls.live_count(), 0);
    }
}
