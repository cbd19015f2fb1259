//! 组件解析器实现
//!
//! 解析是一次同步的深度优先遍历：先解析叶子依赖，再构建依赖它们的类型。

use crate::registry::BindingRegistryImpl;
use dashmap::DashMap;
use di_abstractions::{
    format_dependency_chain, Binding, BindingRegistry, BindingTarget, CircularDependencyDetector,
    ComponentResolver, DefaultCircularDependencyDetector, DependencyGraphNode, ErasedConstructor,
    InjectorConfig, Instance, ResolveContext, ResolveOptions, SingletonPolicy,
};
use infrastructure_common::{DependencyError, DependencyResult, Lifetime, TypeKey};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, trace};

/// 组件解析器实现
pub struct DependencyResolverImpl {
    /// 绑定注册表
    registry: Arc<BindingRegistryImpl>,
    /// 单例构建锁，每个抽象类型一把
    build_locks: DashMap<TypeKey, Arc<Mutex<()>>>,
    /// 循环依赖检测器
    detector: DefaultCircularDependencyDetector,
    /// 解析选项
    options: ResolveOptions,
    /// 单例构建策略
    policy: SingletonPolicy,
    /// 是否记录每一步解析
    log_resolution: bool,
}

impl DependencyResolverImpl {
    /// 创建新的解析器
    pub fn new(registry: Arc<BindingRegistryImpl>, config: &InjectorConfig) -> Self {
        Self {
            registry,
            build_locks: DashMap::new(),
            detector: DefaultCircularDependencyDetector,
            options: ResolveOptions::from(config),
            policy: config.singleton_policy,
            log_resolution: config.log_resolution,
        }
    }

    /// 获取绑定注册表
    pub fn registry(&self) -> &Arc<BindingRegistryImpl> {
        &self.registry
    }

    /// 收集从 `key` 可达的依赖子图，只查询可达的绑定
    pub fn reachable_graph(&self, key: TypeKey) -> Vec<DependencyGraphNode> {
        let mut graph = Vec::new();
        let mut seen = HashSet::from([key]);
        let mut pending = vec![key];

        while let Some(current) = pending.pop() {
            let Some(binding) = self.registry.lookup(&current) else {
                continue;
            };
            let dependencies = binding.dependencies().to_vec();
            for dependency in &dependencies {
                if seen.insert(*dependency) {
                    pending.push(*dependency);
                }
            }
            graph.push(DependencyGraphNode {
                key: current,
                dependencies,
            });
        }

        graph
    }

    /// 检查从 `key` 可达的绑定图中是否有环
    pub fn ensure_acyclic(&self, key: TypeKey) -> DependencyResult<()> {
        let graph = self.reachable_graph(key);
        self.detector.detect_from(key, &graph)
    }

    fn build_lock(&self, key: TypeKey) -> Arc<Mutex<()>> {
        // 先克隆出锁再释放分片，递归构建期间不持有 DashMap 的引用
        Arc::clone(self.build_locks.entry(key).or_default().value())
    }

    /// 按声明顺序解析依赖并调用构造函数
    fn build(
        &self,
        key: TypeKey,
        constructor: &ErasedConstructor,
        context: &mut ResolveContext,
    ) -> DependencyResult<Instance> {
        let mut values = Vec::with_capacity(constructor.dependencies().len());

        for dependency in constructor.dependencies() {
            match self.resolve_in(dependency, context)? {
                Some(value) => values.push(value),
                None => {
                    return Err(DependencyError::BindingNotFound {
                        type_name: dependency.short_name(),
                        required_by: key.short_name(),
                    })
                }
            }
        }

        if self.log_resolution {
            debug!(
                "构建实例: {} via {} ({} 个依赖, 深度 {})",
                key,
                constructor.name(),
                values.len(),
                context.depth()
            );
        }

        constructor.construct(&values)
    }

    /// 构建并提交单例
    fn materialize(
        &self,
        key: TypeKey,
        binding: &Binding,
        constructor: &ErasedConstructor,
        context: &mut ResolveContext,
    ) -> DependencyResult<Instance> {
        match self.policy {
            SingletonPolicy::Relaxed => {
                let instance = self.build(key, constructor, context)?;
                Ok(self.registry.store(&key, binding.generation, instance))
            }
            SingletonPolicy::Strict => {
                let lock = self.build_lock(key);
                let _guard = lock.lock();

                // 拿到锁之后重新读取，别的线程可能已经完成构建或重新绑定
                let current = self.registry.lookup(&key).unwrap_or_else(|| binding.clone());
                match &current.target {
                    BindingTarget::Built(instance) => {
                        trace!("等待期间单例已构建: {}", key);
                        Ok(instance.clone())
                    }
                    BindingTarget::Unbuilt(latest) => {
                        let instance = self.build(key, latest, context)?;
                        if current.lifetime.is_singleton() {
                            Ok(self.registry.store(&key, current.generation, instance))
                        } else {
                            Ok(instance)
                        }
                    }
                }
            }
        }
    }
}

impl ComponentResolver for DependencyResolverImpl {
    fn resolve(&self, key: &TypeKey) -> DependencyResult<Option<Instance>> {
        let mut context = ResolveContext::new(self.options.clone());

        if self.options.detect_cycles {
            if let Some(binding) = self.registry.lookup(key) {
                // 已构建的绑定和叶子绑定没有出边，不可能成环
                if !binding.dependencies().is_empty() {
                    self.ensure_acyclic(*key)?;
                }
            }
        }

        self.resolve_in(key, &mut context)
    }

    fn resolve_in(&self, key: &TypeKey, context: &mut ResolveContext) -> DependencyResult<Option<Instance>> {
        let Some(binding) = self.registry.lookup(key) else {
            if self.log_resolution {
                debug!("没有绑定: {}", key);
            }
            return Ok(None);
        };

        let constructor = match &binding.target {
            BindingTarget::Built(instance) => return Ok(Some(instance.clone())),
            BindingTarget::Unbuilt(constructor) => constructor,
        };

        // 单例不可重入：即使关闭了循环检测，也不能在持有自身构建锁时再次构建
        if binding.lifetime.is_singleton() && context.resolution_chain.contains(key) {
            return Err(DependencyError::CircularDependency {
                dependency_chain: format_dependency_chain(&context.resolution_chain, *key),
            });
        }

        context.push_type(*key)?;
        let result = match binding.lifetime {
            Lifetime::Prototype => self.build(*key, constructor, context),
            Lifetime::Singleton => self.materialize(*key, &binding, constructor, context),
        };
        context.pop_type();

        result.map(Some)
    }

    fn can_resolve(&self, key: &TypeKey) -> bool {
        self.registry.contains(key)
    }
}

impl std::fmt::Debug for DependencyResolverImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DependencyResolverImpl")
            .field("registry", &self.registry)
            .field("options", &self.options)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
