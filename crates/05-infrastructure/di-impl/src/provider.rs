//! 延迟解析句柄实现

use crate::resolver::DependencyResolverImpl;
use di_abstractions::{downcast_instance, ComponentResolver, Provider};
use infrastructure_common::{DependencyResult, TypeKey};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// 延迟解析句柄
///
/// 创建时不做任何解析；每次调用 [`Provider::get_instance`] 都会走一遍解析流程，
/// 原型得到新实例，单例得到注册表中缓存的实例。
pub struct LazyProvider<I: ?Sized> {
    resolver: Arc<DependencyResolverImpl>,
    key: TypeKey,
    _marker: PhantomData<fn() -> Arc<I>>,
}

impl<I: ?Sized + 'static> LazyProvider<I> {
    pub(crate) fn new(resolver: Arc<DependencyResolverImpl>) -> Self {
        Self {
            resolver,
            key: TypeKey::of::<I>(),
            _marker: PhantomData,
        }
    }

    /// 句柄对应的抽象类型
    pub fn key(&self) -> TypeKey {
        self.key
    }
}

impl<I: ?Sized + Send + Sync + 'static> Provider<I> for LazyProvider<I> {
    fn get_instance(&self) -> DependencyResult<Option<Arc<I>>> {
        self.resolver
            .resolve(&self.key)?
            .map(|instance| downcast_instance::<I>(&instance))
            .transpose()
    }
}

impl<I: ?Sized> Clone for LazyProvider<I> {
    fn clone(&self) -> Self {
        Self {
            resolver: Arc::clone(&self.resolver),
            key: self.key,
            _marker: PhantomData,
        }
    }
}

impl<I: ?Sized> fmt::Debug for LazyProvider<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyProvider").field("key", &self.key).finish()
    }
}
