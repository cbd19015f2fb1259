//! 组件解析器抽象接口
//!
//! 提供依赖解析和组件实例化的能力

use crate::registry::{format_dependency_chain, Instance};
use infrastructure_common::{DependencyError, DependencyResult, TypeKey};
use std::any::type_name;
use std::sync::Arc;

/// 组件解析器 trait
///
/// 负责解析组件依赖并创建组件实例。
/// 没有绑定时返回 `Ok(None)`，与"绑定存在但依赖缺失"的错误区分开。
pub trait ComponentResolver: Send + Sync {
    /// 解析指定类型
    fn resolve(&self, key: &TypeKey) -> DependencyResult<Option<Instance>>;

    /// 在给定的解析上下文中解析指定类型
    fn resolve_in(&self, key: &TypeKey, context: &mut ResolveContext) -> DependencyResult<Option<Instance>>;

    /// 检查是否可以解析指定类型
    fn can_resolve(&self, key: &TypeKey) -> bool;
}

/// 把类型擦除的实例还原为 `Arc<I>`
pub fn downcast_instance<I: ?Sized + Send + Sync + 'static>(instance: &Instance) -> DependencyResult<Arc<I>> {
    instance
        .downcast_ref::<Arc<I>>()
        .cloned()
        .ok_or_else(|| DependencyError::TypeMismatch {
            type_name: type_name::<I>().to_string(),
        })
}

/// 解析上下文
#[derive(Debug, Clone)]
pub struct ResolveContext {
    /// 当前解析链，用于检测循环依赖
    pub resolution_chain: Vec<TypeKey>,
    /// 解析选项
    pub options: ResolveOptions,
}

impl ResolveContext {
    /// 创建新的解析上下文
    pub fn new(options: ResolveOptions) -> Self {
        Self {
            resolution_chain: Vec::new(),
            options,
        }
    }

    /// 添加类型到解析链
    pub fn push_type(&mut self, key: TypeKey) -> DependencyResult<()> {
        if self.options.detect_cycles && self.resolution_chain.contains(&key) {
            return Err(DependencyError::CircularDependency {
                dependency_chain: format_dependency_chain(&self.resolution_chain, key),
            });
        }
        if self.resolution_chain.len() >= self.options.max_depth {
            return Err(DependencyError::ResolutionDepthExceeded {
                type_name: key.short_name(),
                max_depth: self.options.max_depth,
            });
        }
        self.resolution_chain.push(key);
        Ok(())
    }

    /// 从解析链中移除类型
    pub fn pop_type(&mut self) {
        self.resolution_chain.pop();
    }

    /// 当前解析深度
    pub fn depth(&self) -> usize {
        self.resolution_chain.len()
    }

    /// 当前正在解析的类型
    pub fn current(&self) -> Option<TypeKey> {
        self.resolution_chain.last().copied()
    }
}

impl Default for ResolveContext {
    fn default() -> Self {
        Self::new(ResolveOptions::default())
    }
}

/// 解析选项
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// 是否检测循环依赖
    pub detect_cycles: bool,
    /// 最大递归深度
    pub max_depth: usize,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            detect_cycles: true,
            max_depth: 100,
        }
    }
}
