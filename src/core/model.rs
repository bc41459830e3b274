//! Model registry: named data proxies.

use crate::config::{DuplicatePolicy, FacadeConfig};
use crate::core::notifier::Notifier;
use crate::core::registry_lock::RegistryLock;
use crate::error::{MvcError, MvcResult};
use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard};

/// A named holder of application data.
pub trait Proxy: Any + Send + Sync {
    fn proxy_name(&self) -> &str;

    /// Notifier attached to the facade when the proxy is registered through it.
    fn notifier(&self) -> Option<&Notifier> {
        None
    }

    fn on_register(&self) {}

    fn on_remove(&self) {}

    /// Erase the proxy so it can be downcast back to its concrete type.
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

/// A proxy holding a single value of type `T`.
pub struct DataProxy<T> {
    name: String,
    notifier: Notifier,
    data: RwLock<T>,
}

impl<T: Send + Sync + 'static> DataProxy<T> {
    pub fn new(name: impl Into<String>, data: T) -> Self {
        let name = name.into();
        Self {
            notifier: Notifier::new(name.as_str()),
            name,
            data: RwLock::new(data),
        }
    }

    pub fn data(&self) -> RwLockReadGuard<'_, T> {
        self.data.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_data(&self, data: T) {
        *self.data.write().unwrap_or_else(PoisonError::into_inner) = data;
    }

    /// Mutate the data in place and return what `update` returns.
    pub fn update<R>(&self, update: impl FnOnce(&mut T) -> R) -> R {
        let mut data = self.data.write().unwrap_or_else(PoisonError::into_inner);
        update(&mut data)
    }
}

impl<T: Send + Sync + 'static> Proxy for DataProxy<T> {
    fn proxy_name(&self) -> &str {
        &self.name
    }

    fn notifier(&self) -> Option<&Notifier> {
        Some(&self.notifier)
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

pub struct Model {
    proxies: Mutex<HashMap<String, Arc<dyn Proxy>>>,
    lock: RegistryLock,
    duplicate_policy: DuplicatePolicy,
}

impl Model {
    pub fn new(config: &FacadeConfig) -> Self {
        Self::with_lock(config, RegistryLock::new())
    }

    /// A model serialized by a lock shared with the other registries.
    pub fn with_lock(config: &FacadeConfig, lock: RegistryLock) -> Self {
        Self {
            proxies: Mutex::new(HashMap::new()),
            lock,
            duplicate_policy: config.duplicate_policy,
        }
    }

    pub fn registry_lock(&self) -> &RegistryLock {
        &self.lock
    }

    fn proxies(&self) -> MutexGuard<'_, HashMap<String, Arc<dyn Proxy>>> {
        self.proxies.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn register_proxy(&self, proxy: Arc<dyn Proxy>) -> MvcResult<()> {
        let _serial = self.lock.enter();
        let name = proxy.proxy_name().to_string();
        {
            let mut proxies = self.proxies();
            if proxies.contains_key(&name) {
                return match self.duplicate_policy {
                    DuplicatePolicy::Error => Err(MvcError::DuplicateProxy(name)),
                    DuplicatePolicy::Ignore => {
                        log::debug!("Proxy {} already registered, ignoring", name);
                        Ok(())
                    }
                };
            }
            proxies.insert(name.clone(), proxy.clone());
        }

        log::debug!("Registered proxy {}", name);
        proxy.on_register();
        Ok(())
    }

    pub fn retrieve_proxy(&self, name: &str) -> Option<Arc<dyn Proxy>> {
        self.proxies().get(name).cloned()
    }

    /// Retrieve a proxy as its concrete type, `None` if absent or of another type.
    pub fn retrieve_proxy_as<P: Proxy>(&self, name: &str) -> Option<Arc<P>> {
        self.retrieve_proxy(name)?.into_any().downcast::<P>().ok()
    }

    pub fn has_proxy(&self, name: &str) -> bool {
        self.proxies().contains_key(name)
    }

    pub fn remove_proxy(&self, name: &str) -> Option<Arc<dyn Proxy>> {
        let _serial = self.lock.enter();
        let proxy = self.proxies().remove(name)?;
        log::debug!("Removed proxy {}", name);
        proxy.on_remove();
        Some(proxy)
    }
}
