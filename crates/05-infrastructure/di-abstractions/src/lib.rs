//! # Dependency Injection Abstractions
//!
//! 依赖注入抽象层，定义绑定注册和依赖解析的核心接口。
//!
//! ## 核心接口
//!
//! - [`Injectable`] - 可注入类型（声明构造函数）
//! - [`BindingRegistry`] - 绑定注册表接口
//! - [`ComponentResolver`] - 组件解析器接口
//! - [`Injector`] - 注入器门面
//! - [`Provider`] - 延迟解析句柄

pub mod container;
pub mod injectable;
pub mod registry;
pub mod resolver;

pub use container::*;
pub use injectable::*;
pub use registry::*;
pub use resolver::*;

pub use infrastructure_common::{DependencyError, DependencyResult, Lifetime, TypeKey};
