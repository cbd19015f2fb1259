//! 绑定注册表实现

use dashmap::DashMap;
use di_abstractions::{Binding, BindingRegistry, BindingTarget, Instance};
use infrastructure_common::TypeKey;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

/// 基于分片并发哈希表的绑定注册表
///
/// 读取返回绑定的克隆，调用方不会在递归解析期间持有分片锁。
#[derive(Debug, Default)]
pub struct BindingRegistryImpl {
    /// 抽象类型 -> 绑定
    bindings: DashMap<TypeKey, Binding>,
    /// 代数计数器
    generations: AtomicU64,
}

impl BindingRegistryImpl {
    /// 创建新的注册表
    pub fn new() -> Self {
        Self::default()
    }

    fn next_generation(&self) -> u64 {
        self.generations.fetch_add(1, Ordering::Relaxed) + 1
    }
}

impl BindingRegistry for BindingRegistryImpl {
    fn insert(&self, key: TypeKey, mut binding: Binding) -> Option<Binding> {
        binding.generation = self.next_generation();
        let previous = self.bindings.insert(key, binding);

        if let Some(previous) = &previous {
            warn!(
                "覆盖已有绑定: {} (原实现 {}, {})",
                key,
                previous.implementation,
                previous.lifetime
            );
        }

        previous
    }

    fn lookup(&self, key: &TypeKey) -> Option<Binding> {
        self.bindings.get(key).map(|entry| entry.value().clone())
    }

    fn store(&self, key: &TypeKey, generation: u64, instance: Instance) -> Instance {
        let Some(mut entry) = self.bindings.get_mut(key) else {
            return instance;
        };

        if let BindingTarget::Built(existing) = &entry.target {
            debug!("单例已被其他调用提交，丢弃本次构建: {}", key);
            return existing.clone();
        }

        if entry.generation != generation {
            warn!("构建期间绑定已被替换，不提交旧实例: {}", key);
            return instance;
        }

        entry.target = BindingTarget::Built(instance.clone());
        debug!("单例已物化: {}", key);
        instance
    }

    fn contains(&self, key: &TypeKey) -> bool {
        self.bindings.contains_key(key)
    }

    fn snapshot(&self) -> Vec<(TypeKey, Binding)> {
        self.bindings
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect()
    }

    fn len(&self) -> usize {
        self.bindings.len()
    }
}
