//! 注入器抽象接口
//!
//! 提供依赖注入容器的对外门面：绑定、单例绑定和延迟解析句柄

use crate::injectable::{Implements, Injectable};
use crate::registry::BindingDescriptor;
use crate::resolver::ResolveOptions;
use infrastructure_common::{DependencyError, DependencyResult};
use serde::Deserialize;
use std::sync::Arc;

/// 延迟解析句柄
///
/// 获取句柄本身不做任何构建，调用 [`Provider::get_instance`] 时才解析。
pub trait Provider<T: ?Sized>: Send + Sync {
    /// 解析实例，没有绑定时返回 `Ok(None)`
    fn get_instance(&self) -> DependencyResult<Option<Arc<T>>>;
}

/// 注入器 trait
pub trait Injector: Send + Sync {
    /// 关联的句柄类型
    type InstanceProvider<I: ?Sized + Send + Sync + 'static>: Provider<I>;

    /// 以原型生命周期绑定实现类型
    ///
    /// 实现类型不满足构造函数选择规则时立即返回错误，重复绑定覆盖旧值。
    fn bind<I, C>(&self) -> DependencyResult<()>
    where
        I: ?Sized + Send + Sync + 'static,
        C: Injectable + Implements<I>;

    /// 以单例生命周期绑定实现类型，首次解析时才构建
    fn bind_singleton<I, C>(&self) -> DependencyResult<()>
    where
        I: ?Sized + Send + Sync + 'static,
        C: Injectable + Implements<I>;

    /// 绑定已构建的单例实例
    fn bind_instance<I>(&self, instance: Arc<I>)
    where
        I: ?Sized + Send + Sync + 'static;

    /// 获取延迟解析句柄
    fn get_provider<I>(&self) -> Self::InstanceProvider<I>
    where
        I: ?Sized + Send + Sync + 'static;

    /// 检查是否已绑定
    fn is_bound<I: ?Sized + 'static>(&self) -> bool;

    /// 获取所有绑定的描述符
    fn registered_bindings(&self) -> Vec<BindingDescriptor>;

    /// 验证绑定：依赖是否都已绑定、是否存在循环依赖
    fn validate(&self) -> Result<(), Vec<DependencyError>>;
}

/// 单例构建策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SingletonPolicy {
    /// 每个单例同一时刻只允许一个构建过程
    #[default]
    Strict,
    /// 允许并发重复构建，最终只保留第一个提交的实例
    Relaxed,
}

/// 注入器配置
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct InjectorConfig {
    /// 是否启用循环依赖检测
    pub cycle_detection: bool,
    /// 最大解析深度
    pub max_resolution_depth: usize,
    /// 单例构建策略
    pub singleton_policy: SingletonPolicy,
    /// 是否记录每一步解析
    pub log_resolution: bool,
}

impl Default for InjectorConfig {
    fn default() -> Self {
        Self {
            cycle_detection: true,
            max_resolution_depth: 100,
            singleton_policy: SingletonPolicy::Strict,
            log_resolution: false,
        }
    }
}

impl From<&InjectorConfig> for ResolveOptions {
    fn from(config: &InjectorConfig) -> Self {
        Self {
            detect_cycles: config.cycle_detection,
            max_depth: config.max_resolution_depth,
        }
    }
}
