//! # Infrastructure Common
//!
//! 这个 crate 提供了 Lorn DI 容器各层共享的基础类型。
//!
//! ## 核心组件
//!
//! - [`TypeKey`] - 类型标识（抽象类型与依赖类型的键）
//! - [`Lifetime`] - 绑定的生命周期（原型 / 单例）
//! - [`DependencyError`] - 依赖注入错误分类
//! - [`ConfigError`] - 配置错误分类
//!
//! ## 设计原则
//!
//! - 基于 Rust 类型系统的编译时安全
//! - 错误在调用点同步返回，不做隐式恢复

pub mod errors;
pub mod lifecycle;
pub mod metadata;

pub use errors::*;
pub use lifecycle::*;
pub use metadata::*;
