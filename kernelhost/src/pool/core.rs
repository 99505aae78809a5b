//! The concrete kernel daemon pool.

use super::handle::{DaemonPool, PoolError, PoolHandle};
use crate::daemon::{DaemonConfig, DaemonProcess};
use crate::exec::ProcessExecutionService;
use crate::kernelspec::{Interpreter, KernelSpec};
use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Default number of pre-warmed daemons kept per pool key.
pub const DEFAULT_PREWARM_COUNT: usize = 1;

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the kernel daemon pool.
#[derive(Clone, Debug)]
pub struct PoolConfig {
    /// Whether daemons are used at all. When false, every acquisition
    /// falls back to the direct execution service.
    pub enabled: bool,

    /// Pre-warm target per interpreter+environment key.
    pub prewarm_count: usize,

    /// Configuration for spawned daemon processes.
    pub daemon: DaemonConfig,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            prewarm_count: DEFAULT_PREWARM_COUNT,
            daemon: DaemonConfig::default(),
        }
    }
}

impl From<&crate::config::DaemonSettings> for PoolConfig {
    fn from(settings: &crate::config::DaemonSettings) -> Self {
        Self {
            enabled: settings.enabled,
            prewarm_count: settings.prewarm_count,
            daemon: DaemonConfig::from(settings),
        }
    }
}

// =============================================================================
// Pool Key
// =============================================================================

/// Pool key: interpreter executable plus the kernel's environment
/// overrides, order-insensitive.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
struct PoolKey {
    interpreter: PathBuf,
    env: Vec<(String, String)>,
}

impl PoolKey {
    fn new(interpreter: &Interpreter, spec: &KernelSpec) -> Self {
        let mut env: Vec<(String, String)> = spec
            .env
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        env.sort();
        Self {
            interpreter: interpreter.path.clone(),
            env,
        }
    }
}

// =============================================================================
// Kernel Daemon Pool
// =============================================================================

type WarmDaemons = Mutex<HashMap<PoolKey, Vec<Arc<DaemonProcess>>>>;

/// Pool of pre-warmed kernel daemons keyed by interpreter + environment.
///
/// `get` pops a warm daemon when one matches, spawns a fresh one
/// otherwise, and tops the pool back up in the background after handing a
/// daemon out. When daemons are disabled or cannot be spawned, the
/// acquisition falls back to [`PoolHandle::Executor`], so kernels still
/// launch - just without daemon lifecycle control.
pub struct KernelDaemonPool {
    config: PoolConfig,
    warm: Arc<WarmDaemons>,
}

impl KernelDaemonPool {
    /// Creates a pool with the given configuration.
    pub fn new(config: PoolConfig) -> Self {
        Self {
            config,
            warm: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Pre-warms daemons for a spec/interpreter pair up to the configured
    /// target.
    ///
    /// Unlike the silent fallback inside `get`, a spawn failure here is
    /// reported, so callers warming up ahead of time learn that daemons
    /// will not be available.
    pub async fn prewarm(
        &self,
        spec: &KernelSpec,
        interpreter: &Interpreter,
    ) -> Result<(), PoolError> {
        if !self.config.enabled || self.config.prewarm_count == 0 {
            return Ok(());
        }
        let key = PoolKey::new(interpreter, spec);
        loop {
            {
                let map = self.warm.lock().await;
                let count = map.get(&key).map_or(0, Vec::len);
                if count >= self.config.prewarm_count {
                    return Ok(());
                }
            }
            let daemon = DaemonProcess::spawn(interpreter, &self.config.daemon).await?;
            self.warm
                .lock()
                .await
                .entry(key.clone())
                .or_default()
                .push(daemon);
        }
    }

    /// Returns the number of warm daemons held for a spec/interpreter pair.
    pub async fn warm_count(&self, spec: &KernelSpec, interpreter: &Interpreter) -> usize {
        let key = PoolKey::new(interpreter, spec);
        self.warm.lock().await.get(&key).map_or(0, Vec::len)
    }

    /// Shuts down every warm daemon still held by the pool.
    ///
    /// Daemons already handed out are unaffected; their lifetime belongs
    /// to whoever launched with them.
    pub async fn shutdown(&self) {
        let mut map = self.warm.lock().await;
        for (_, daemons) in map.drain() {
            for daemon in daemons {
                daemon.shutdown();
            }
        }
    }

    fn executor_fallback(&self, interpreter: &Interpreter) -> PoolHandle {
        PoolHandle::Executor(Arc::new(
            ProcessExecutionService::new(interpreter.path.clone())
                .with_channel_capacity(self.config.daemon.output_channel_capacity),
        ))
    }

    /// Replenishes the warm pool for a key in the background.
    fn spawn_top_up(&self, key: PoolKey) {
        if self.config.prewarm_count == 0 {
            return;
        }
        let warm = Arc::clone(&self.warm);
        let daemon_config = self.config.daemon.clone();
        let target = self.config.prewarm_count;
        let interpreter = Interpreter::new(key.interpreter.clone());
        tokio::spawn(async move {
            loop {
                {
                    let map = warm.lock().await;
                    if map.get(&key).map_or(0, Vec::len) >= target {
                        break;
                    }
                }
                match DaemonProcess::spawn(&interpreter, &daemon_config).await {
                    Ok(daemon) => {
                        warm.lock().await.entry(key.clone()).or_default().push(daemon);
                    }
                    Err(error) => {
                        warn!(%error, "Failed to pre-warm kernel daemon");
                        break;
                    }
                }
            }
        });
    }
}

impl DaemonPool for KernelDaemonPool {
    fn get<'a>(
        &'a self,
        _resource: Option<&'a Path>,
        spec: &'a KernelSpec,
        interpreter: &'a Interpreter,
    ) -> Pin<Box<dyn Future<Output = Result<PoolHandle, PoolError>> + Send + 'a>> {
        Box::pin(async move {
            if !self.config.enabled {
                debug!(
                    interpreter = %interpreter.path.display(),
                    "Daemons disabled; using direct execution"
                );
                return Ok(self.executor_fallback(interpreter));
            }

            let key = PoolKey::new(interpreter, spec);
            let warm = self.warm.lock().await.get_mut(&key).and_then(Vec::pop);
            if let Some(daemon) = warm {
                debug!(pid = daemon.pid(), "Reusing pre-warmed kernel daemon");
                self.spawn_top_up(key);
                return Ok(PoolHandle::Daemon(daemon));
            }

            match DaemonProcess::spawn(interpreter, &self.config.daemon).await {
                Ok(daemon) => {
                    self.spawn_top_up(key);
                    Ok(PoolHandle::Daemon(daemon))
                }
                Err(error) => {
                    warn!(
                        %error,
                        interpreter = %interpreter.path.display(),
                        "Daemon unavailable; falling back to direct execution"
                    );
                    Ok(self.executor_fallback(interpreter))
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn python_spec() -> KernelSpec {
        KernelSpec::new(
            vec![
                "python".to_string(),
                "-m".to_string(),
                "ipykernel_launcher".to_string(),
            ],
            "Python 3",
            "python",
        )
    }

    #[test]
    fn test_pool_key_env_order_insensitive() {
        let interpreter = Interpreter::new("/usr/bin/python3");
        let mut env_a = HashMap::new();
        env_a.insert("A".to_string(), "1".to_string());
        env_a.insert("B".to_string(), "2".to_string());
        let mut env_b = HashMap::new();
        env_b.insert("B".to_string(), "2".to_string());
        env_b.insert("A".to_string(), "1".to_string());

        let key_a = PoolKey::new(&interpreter, &python_spec().with_env(env_a));
        let key_b = PoolKey::new(&interpreter, &python_spec().with_env(env_b));
        assert_eq!(key_a, key_b);
    }

    #[test]
    fn test_pool_key_distinguishes_env() {
        let interpreter = Interpreter::new("/usr/bin/python3");
        let mut env = HashMap::new();
        env.insert("A".to_string(), "1".to_string());

        let key_plain = PoolKey::new(&interpreter, &python_spec());
        let key_env = PoolKey::new(&interpreter, &python_spec().with_env(env));
        assert_ne!(key_plain, key_env);
    }

    #[tokio::test]
    async fn test_disabled_pool_returns_executor() {
        let pool = KernelDaemonPool::new(PoolConfig {
            enabled: false,
            ..PoolConfig::default()
        });
        let interpreter = Interpreter::new("/usr/bin/python3");

        let handle = pool.get(None, &python_spec(), &interpreter).await.unwrap();
        assert!(matches!(handle, PoolHandle::Executor(_)));
    }

    #[tokio::test]
    async fn test_unspawnable_daemon_falls_back_to_executor() {
        let pool = KernelDaemonPool::new(PoolConfig {
            prewarm_count: 0,
            ..PoolConfig::default()
        });
        let interpreter = Interpreter::new("/nonexistent/kernelhost-no-such-interpreter");

        let handle = pool.get(None, &python_spec(), &interpreter).await.unwrap();
        assert!(matches!(handle, PoolHandle::Executor(_)));
    }

    #[cfg(unix)]
    mod scripted {
        use super::*;
        use std::os::unix::fs::PermissionsExt;
        use std::time::Duration;

        /// A minimal scripted daemon that answers every request in order.
        fn script_interpreter(dir: &tempfile::TempDir) -> Interpreter {
            let path = dir.path().join("fake-daemon.sh");
            let body = r#"#!/bin/sh
i=1
while read line; do
  printf '{"type":"reply","id":%d}\n' "$i"
  i=$((i+1))
done"#;
            std::fs::write(&path, body).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            Interpreter::new(path)
        }

        fn scripted_config(prewarm_count: usize) -> PoolConfig {
            PoolConfig {
                enabled: true,
                prewarm_count,
                daemon: DaemonConfig {
                    startup_timeout: Duration::from_secs(5),
                    ..DaemonConfig::default()
                },
            }
        }

        #[tokio::test]
        async fn test_prewarm_fills_pool_to_target() {
            let dir = tempfile::tempdir().unwrap();
            let interpreter = script_interpreter(&dir);
            let pool = KernelDaemonPool::new(scripted_config(2));
            let spec = python_spec();

            pool.prewarm(&spec, &interpreter).await.unwrap();
            assert_eq!(pool.warm_count(&spec, &interpreter).await, 2);

            // Idempotent: a second prewarm does not overfill.
            pool.prewarm(&spec, &interpreter).await.unwrap();
            assert_eq!(pool.warm_count(&spec, &interpreter).await, 2);

            pool.shutdown().await;
        }

        #[tokio::test]
        async fn test_get_returns_daemon_variant() {
            let dir = tempfile::tempdir().unwrap();
            let interpreter = script_interpreter(&dir);
            let pool = KernelDaemonPool::new(scripted_config(0));
            let spec = python_spec();

            let handle = pool.get(None, &spec, &interpreter).await.unwrap();
            match handle {
                PoolHandle::Daemon(daemon) => {
                    // The daemon is live: starting a kernel succeeds.
                    let observable = daemon
                        .start("kernel_module", &[], &crate::exec::SpawnOptions::default())
                        .await
                        .unwrap();
                    assert_eq!(observable.pid(), None);
                }
                PoolHandle::Executor(_) => panic!("expected daemon variant"),
            }
        }

        #[tokio::test]
        async fn test_prewarm_failure_is_reported() {
            let pool = KernelDaemonPool::new(scripted_config(1));
            let interpreter = Interpreter::new("/nonexistent/kernelhost-no-such-interpreter");

            let error = pool.prewarm(&python_spec(), &interpreter).await.unwrap_err();
            assert!(matches!(error, PoolError::Daemon(_)));
        }
    }
}
