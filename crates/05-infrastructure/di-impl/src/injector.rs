//! 注入器实现

use crate::policy::select_constructor;
use crate::provider::LazyProvider;
use crate::registry::BindingRegistryImpl;
use crate::resolver::DependencyResolverImpl;
use di_abstractions::{
    Binding, BindingDescriptor, BindingRegistry, CircularDependencyDetector,
    DefaultCircularDependencyDetector, ErasedConstructor, Implements, Injectable, Injector,
    InjectorConfig, Instance,
};
use infrastructure_common::{DependencyError, DependencyResult, Lifetime, TypeKey};
use std::sync::Arc;
use tracing::{error, info};

/// 具体的注入器实现
///
/// 克隆得到的是同一个注册表的另一个句柄。
#[derive(Debug, Clone)]
pub struct InjectorImpl {
    /// 绑定注册表
    registry: Arc<BindingRegistryImpl>,
    /// 组件解析器
    resolver: Arc<DependencyResolverImpl>,
    /// 注入器配置
    config: InjectorConfig,
}

impl InjectorImpl {
    /// 使用默认配置创建注入器
    pub fn new() -> Self {
        Self::with_config(InjectorConfig::default())
    }

    /// 使用给定配置创建注入器
    pub fn with_config(config: InjectorConfig) -> Self {
        let registry = Arc::new(BindingRegistryImpl::new());
        let resolver = Arc::new(DependencyResolverImpl::new(Arc::clone(&registry), &config));

        Self {
            registry,
            resolver,
            config,
        }
    }

    /// 获取注入器配置
    pub fn config(&self) -> &InjectorConfig {
        &self.config
    }

    /// 获取组件解析器
    pub fn resolver(&self) -> &Arc<DependencyResolverImpl> {
        &self.resolver
    }

    fn register<I, C>(&self, lifetime: Lifetime) -> DependencyResult<()>
    where
        I: ?Sized + Send + Sync + 'static,
        C: Injectable + Implements<I>,
    {
        let key = TypeKey::of::<I>();
        let implementation = TypeKey::of::<C>();

        let constructor = select_constructor::<C>().map_err(|e| {
            error!("绑定失败: {} -> {}: {}", key, implementation, e);
            e
        })?;

        info!(
            "绑定组件: {} -> {} ({}, 构造函数 {})",
            key,
            implementation,
            lifetime,
            constructor.name()
        );

        let binding = Binding::unbuilt(
            lifetime,
            implementation,
            ErasedConstructor::erase::<I, C>(constructor),
        );
        self.registry.insert(key, binding);

        Ok(())
    }
}

impl Default for InjectorImpl {
    fn default() -> Self {
        Self::new()
    }
}

impl Injector for InjectorImpl {
    type InstanceProvider<I: ?Sized + Send + Sync + 'static> = LazyProvider<I>;

    fn bind<I, C>(&self) -> DependencyResult<()>
    where
        I: ?Sized + Send + Sync + 'static,
        C: Injectable + Implements<I>,
    {
        self.register::<I, C>(Lifetime::Prototype)
    }

    fn bind_singleton<I, C>(&self) -> DependencyResult<()>
    where
        I: ?Sized + Send + Sync + 'static,
        C: Injectable + Implements<I>,
    {
        self.register::<I, C>(Lifetime::Singleton)
    }

    fn bind_instance<I>(&self, instance: Arc<I>)
    where
        I: ?Sized + Send + Sync + 'static,
    {
        let key = TypeKey::of::<I>();
        info!("注册单例实例: {}", key);

        self.registry
            .insert(key, Binding::built(key, Arc::new(instance) as Instance));
    }

    fn get_provider<I>(&self) -> LazyProvider<I>
    where
        I: ?Sized + Send + Sync + 'static,
    {
        LazyProvider::new(Arc::clone(&self.resolver))
    }

    fn is_bound<I: ?Sized + 'static>(&self) -> bool {
        self.registry.contains(&TypeKey::of::<I>())
    }

    fn registered_bindings(&self) -> Vec<BindingDescriptor> {
        let mut descriptors: Vec<_> = self
            .registry
            .snapshot()
            .iter()
            .map(|(key, binding)| BindingDescriptor::from_binding(*key, binding))
            .collect();
        descriptors.sort_by(|a, b| a.abstract_type.name.cmp(b.abstract_type.name));
        descriptors
    }

    fn validate(&self) -> Result<(), Vec<DependencyError>> {
        info!("验证绑定");

        let mut snapshot = self.registry.snapshot();
        snapshot.sort_by(|(a, _), (b, _)| a.name.cmp(b.name));

        let mut errors = Vec::new();
        for (key, binding) in &snapshot {
            for dependency in binding.dependencies() {
                if !self.registry.contains(dependency) {
                    errors.push(DependencyError::BindingNotFound {
                        type_name: dependency.short_name(),
                        required_by: key.short_name(),
                    });
                }
            }
        }

        let detector = DefaultCircularDependencyDetector;
        let graph = detector.build_dependency_graph(&snapshot);
        if let Err(e) = detector.detect_circular_dependencies(&graph) {
            errors.push(e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            for e in &errors {
                error!("绑定验证失败: {}", e);
            }
            Err(errors)
        }
    }
}
