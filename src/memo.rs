//! Memoization Module
//!
//! Call-level caching over any cache tier: a deterministic key is derived
//! from a function identity plus its stringified arguments, and the wrapped
//! computation runs only on a miss. There is no process-wide default cache;
//! every [`Memoized`] wrapper is built around an explicit instance.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::cache::{DiskStore, HybridCache};

// == Key Generation ==
/// Builds a deterministic cache key: positional parts joined by `::`, then
/// `name=value` pairs sorted by name (so semantically identical calls always
/// produce the same key), optionally led by a `prefix`.
///
/// `cache_keygen(&["arg1", "arg2"], &[("kwarg1", "value1")], None)` yields
/// `"arg1::arg2::kwarg1=value1"`.
pub fn cache_keygen<S: AsRef<str>>(args: &[S], kwargs: &[(S, S)], prefix: Option<&str>) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(args.len() + kwargs.len() + 1);

    if let Some(prefix) = prefix {
        parts.push(prefix.to_string());
    }
    parts.extend(args.iter().map(|arg| arg.as_ref().to_string()));

    let mut named: Vec<(&str, &str)> = kwargs
        .iter()
        .map(|(name, value)| (name.as_ref(), value.as_ref()))
        .collect();
    named.sort_by(|a, b| a.0.cmp(b.0));
    parts.extend(named.into_iter().map(|(name, value)| format!("{}={}", name, value)));

    parts.join("::")
}

// == Call Arguments ==
/// Stringified arguments of one call, collected positionally and by name.
///
/// The builder accepts anything `Display`, so call sites read close to the
/// invocation they memoize.
#[derive(Debug, Clone, Default)]
pub struct CallArgs {
    args: Vec<String>,
    kwargs: Vec<(String, String)>,
}

impl CallArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a positional argument.
    pub fn arg(mut self, value: impl Display) -> Self {
        self.args.push(value.to_string());
        self
    }

    /// Appends a named argument. Order of insertion does not matter; names
    /// are sorted during key generation.
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Display) -> Self {
        self.kwargs.push((name.into(), value.to_string()));
        self
    }

    /// Renders the key these arguments produce under `prefix`.
    pub fn key(&self, prefix: Option<&str>) -> String {
        let kwargs: Vec<(&str, &str)> = self
            .kwargs
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
            .collect();
        let args: Vec<&str> = self.args.iter().map(String::as_str).collect();
        cache_keygen(&args, &kwargs, prefix)
    }
}

// == Cache Layer Seam ==
/// The minimal cache contract the memoizer needs. Implemented by both the
/// disk-only store and the hybrid cache, so a wrapper can be bound to either.
pub trait CacheLayer<V> {
    fn get(&self, key: &str) -> Option<V>;
    fn set(&self, key: &str, value: V, ttl: Option<Duration>) -> bool;
    fn invalidate(&self, key: &str) -> bool;
}

impl<V: Serialize + DeserializeOwned> CacheLayer<V> for DiskStore<V> {
    fn get(&self, key: &str) -> Option<V> {
        DiskStore::get(self, key)
    }

    fn set(&self, key: &str, value: V, ttl: Option<Duration>) -> bool {
        DiskStore::set(self, key, &value, ttl)
    }

    fn invalidate(&self, key: &str) -> bool {
        DiskStore::invalidate(self, key)
    }
}

impl<V: Clone + Serialize + DeserializeOwned> CacheLayer<V> for HybridCache<V> {
    fn get(&self, key: &str) -> Option<V> {
        HybridCache::get(self, key)
    }

    fn set(&self, key: &str, value: V, ttl: Option<Duration>) -> bool {
        HybridCache::set(self, key, value, ttl)
    }

    fn invalidate(&self, key: &str) -> bool {
        HybridCache::invalidate(self, key)
    }
}

// == Memoized Wrapper ==
/// Memoizes calls against an explicit cache instance under a key prefix
/// (typically the wrapped function's name). An optional TTL overrides the
/// instance default for stored results.
#[derive(Debug)]
pub struct Memoized<C> {
    cache: Arc<C>,
    key_prefix: String,
    ttl: Option<Duration>,
}

impl<C> Clone for Memoized<C> {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
            key_prefix: self.key_prefix.clone(),
            ttl: self.ttl,
        }
    }
}

impl<C> Memoized<C> {
    // == Constructor ==
    pub fn new(cache: Arc<C>, key_prefix: impl Into<String>) -> Self {
        Self {
            cache,
            key_prefix: key_prefix.into(),
            ttl: None,
        }
    }

    /// Overrides the cache's default TTL for results stored by this wrapper.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// The key this wrapper derives for `call`.
    pub fn call_key(&self, call: &CallArgs) -> String {
        call.key(Some(&self.key_prefix))
    }

    // == Synchronous Memoization ==
    /// Returns the cached result for `call`, or runs `compute` exactly once,
    /// stores its result and returns it.
    pub fn get_or_compute<V, F>(&self, call: &CallArgs, compute: F) -> V
    where
        C: CacheLayer<V>,
        V: Clone,
        F: FnOnce() -> V,
    {
        let key = self.call_key(call);
        if let Some(value) = self.cache.get(&key) {
            return value;
        }
        let value = compute();
        self.cache.set(&key, value.clone(), self.ttl);
        value
    }

    // == Asynchronous Memoization ==
    /// Async variant: on a hit the future is never even constructed, so the
    /// underlying computation is neither scheduled nor awaited.
    pub async fn get_or_compute_async<V, F, Fut>(&self, call: &CallArgs, compute: F) -> V
    where
        C: CacheLayer<V>,
        V: Clone,
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        let key = self.call_key(call);
        if let Some(value) = self.cache.get(&key) {
            return value;
        }
        let value = compute().await;
        self.cache.set(&key, value.clone(), self.ttl);
        value
    }

    /// Fallible async variant: an `Err` propagates to the caller and is
    /// never cached, so the next call retries the computation.
    pub async fn try_get_or_compute_async<V, E, F, Fut>(
        &self,
        call: &CallArgs,
        compute: F,
    ) -> std::result::Result<V, E>
    where
        C: CacheLayer<V>,
        V: Clone,
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<V, E>>,
    {
        let key = self.call_key(call);
        if let Some(value) = self.cache.get(&key) {
            return Ok(value);
        }
        let value = compute().await?;
        self.cache.set(&key, value.clone(), self.ttl);
        Ok(value)
    }

    // == Invalidation ==
    /// Recomputes the key the wrapper would derive for this exact call and
    /// invalidates it on the bound cache instance.
    pub fn invalidate_call<V>(&self, call: &CallArgs) -> bool
    where
        C: CacheLayer<V>,
    {
        self.cache.invalidate(&self.call_key(call))
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::EvictionStrategy;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    fn hybrid_cache(dir: &TempDir) -> Arc<HybridCache<String>> {
        Arc::new(
            HybridCache::new(
                dir.path(),
                Duration::from_secs(300),
                1024 * 1024,
                32,
                EvictionStrategy::Lru,
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_cache_keygen_basic() {
        let key = cache_keygen(&["arg1", "arg2"], &[("kwarg1", "value1")], None);
        assert_eq!(key, "arg1::arg2::kwarg1=value1");
    }

    #[test]
    fn test_cache_keygen_with_prefix() {
        let key = cache_keygen(&["arg1"], &[], Some("prefix"));
        assert_eq!(key, "prefix::arg1");
    }

    #[test]
    fn test_cache_keygen_sorts_kwargs() {
        let forward = cache_keygen(&[], &[("a", "1"), ("b", "2")], None);
        let reversed = cache_keygen(&[], &[("b", "2"), ("a", "1")], None);
        assert_eq!(forward, reversed);
        assert_eq!(forward, "a=1::b=2");
    }

    #[test]
    fn test_call_args_builder() {
        let call = CallArgs::new().arg(123).arg("abc").kwarg("flag", true);
        assert_eq!(call.key(Some("lookup")), "lookup::123::abc::flag=true");
    }

    #[test]
    fn test_memoized_executes_once() {
        let dir = TempDir::new().unwrap();
        let memo = Memoized::new(hybrid_cache(&dir), "double");
        let calls = AtomicUsize::new(0);

        let call = CallArgs::new().arg(5);
        for _ in 0..3 {
            let result = memo.get_or_compute(&call, || {
                calls.fetch_add(1, Ordering::SeqCst);
                (5 * 2).to_string()
            });
            assert_eq!(result, "10");
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_memoized_distinguishes_arguments() {
        let dir = TempDir::new().unwrap();
        let memo = Memoized::new(hybrid_cache(&dir), "concat");
        let calls = AtomicUsize::new(0);

        let compute = |a: &str, b: &str| {
            calls.fetch_add(1, Ordering::SeqCst);
            format!("{}-{}", a, b)
        };

        let first = CallArgs::new().arg("test").kwarg("arg2", "value");
        let second = CallArgs::new().arg("test").kwarg("arg2", "different");

        assert_eq!(memo.get_or_compute(&first, || compute("test", "value")), "test-value");
        assert_eq!(memo.get_or_compute(&first, || compute("test", "value")), "test-value");
        assert_eq!(
            memo.get_or_compute(&second, || compute("test", "different")),
            "test-different"
        );

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_prefixes_partition_the_keyspace() {
        let dir = TempDir::new().unwrap();
        let cache = hybrid_cache(&dir);
        let first = Memoized::new(Arc::clone(&cache), "prefix1");
        let second = Memoized::new(cache, "prefix2");
        let calls = AtomicUsize::new(0);

        let call = CallArgs::new().arg("test");
        first.get_or_compute(&call, || {
            calls.fetch_add(1, Ordering::SeqCst);
            "r".to_string()
        });
        second.get_or_compute(&call, || {
            calls.fetch_add(1, Ordering::SeqCst);
            "r".to_string()
        });

        // Same arguments, different prefix: both bodies ran
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_invalidate_call_forces_recompute() {
        let dir = TempDir::new().unwrap();
        let memo = Memoized::new(hybrid_cache(&dir), "example");
        let calls = AtomicUsize::new(0);

        let call = CallArgs::new().arg("test").kwarg("arg2", "value");
        let run = || {
            memo.get_or_compute(&call, || {
                calls.fetch_add(1, Ordering::SeqCst);
                "test-value".to_string()
            })
        };

        run();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        assert!(memo.invalidate_call::<String>(&call));

        run();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_disk_backed_memoization() {
        let dir = TempDir::new().unwrap();
        let store: Arc<DiskStore<String>> = Arc::new(
            DiskStore::new(dir.path(), Duration::from_secs(300), 1024 * 1024).unwrap(),
        );
        let memo = Memoized::new(store, "slow_lookup");
        let calls = AtomicUsize::new(0);

        let call = CallArgs::new().arg("item");
        for _ in 0..2 {
            let result = memo.get_or_compute(&call, || {
                calls.fetch_add(1, Ordering::SeqCst);
                "found".to_string()
            });
            assert_eq!(result, "found");
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_async_hit_never_runs_future() {
        let dir = TempDir::new().unwrap();
        let memo = Memoized::new(hybrid_cache(&dir), "fetch");
        let calls = AtomicUsize::new(0);

        let call = CallArgs::new().arg("url");
        for _ in 0..3 {
            let result = memo
                .get_or_compute_async(&call, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    "body".to_string()
                })
                .await;
            assert_eq!(result, "body");
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_async_errors_are_not_cached() {
        let dir = TempDir::new().unwrap();
        let memo = Memoized::new(hybrid_cache(&dir), "flaky");
        let calls = AtomicUsize::new(0);

        let call = CallArgs::new().arg("x");

        let first: Result<String, String> = memo
            .try_get_or_compute_async(&call, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("boom".to_string())
            })
            .await;
        assert!(first.is_err());

        // Failure was not cached; the retry runs and its success is cached
        let second: Result<String, String> = memo
            .try_get_or_compute_async(&call, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok("ok".to_string())
            })
            .await;
        assert_eq!(second.unwrap(), "ok");

        let third: Result<String, String> = memo
            .try_get_or_compute_async(&call, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok("ok".to_string())
            })
            .await;
        assert_eq!(third.unwrap(), "ok");

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_ttl_override() {
        let dir = TempDir::new().unwrap();
        let memo = Memoized::new(hybrid_cache(&dir), "short")
            .with_ttl(Duration::from_millis(50));
        let calls = AtomicUsize::new(0);

        let call = CallArgs::new().arg("k");
        let run = || {
            memo.get_or_compute(&call, || {
                calls.fetch_add(1, Ordering::SeqCst);
                "v".to_string()
            })
        };

        run();
        run();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        std::thread::sleep(Duration::from_millis(90));

        run();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
