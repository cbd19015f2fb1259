//! 错误类型定义

use thiserror::Error;

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },

    #[error("配置解析失败: {source}")]
    ParseError {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("配置验证失败: {message}")]
    ValidationError { message: String },
}

/// 依赖注入错误类型
#[derive(Error, Debug)]
pub enum DependencyError {
    #[error("实现类型 {type_name} 标记了 {count} 个注入构造函数，入口不明确")]
    TooManyConstructors { type_name: String, count: usize },

    #[error("实现类型 {type_name} 既没有注入构造函数，也没有无参构造函数")]
    ConstructorNotFound { type_name: String },

    #[error("依赖未绑定: {type_name}（被 {required_by} 需要）")]
    BindingNotFound {
        type_name: String,
        required_by: String,
    },

    #[error("循环依赖检测到: {dependency_chain}")]
    CircularDependency { dependency_chain: String },

    #[error("解析深度超过上限 {max_depth}: {type_name}")]
    ResolutionDepthExceeded { type_name: String, max_depth: usize },

    #[error("类型转换失败: 期望 {type_name}")]
    TypeMismatch { type_name: String },

    #[error("组件创建失败: {type_name}, 原因: {source}")]
    ComponentCreationFailed {
        type_name: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl DependencyError {
    /// 实现类型不满足构造函数选择规则（绑定时错误）
    pub fn is_invalid_implementation(&self) -> bool {
        matches!(
            self,
            Self::TooManyConstructors { .. } | Self::ConstructorNotFound { .. }
        )
    }

    /// 创建组件创建失败错误
    pub fn creation_failed(
        type_name: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::ComponentCreationFailed {
            type_name: type_name.into(),
            source: source.into(),
        }
    }
}

/// 基础设施错误类型
#[derive(Error, Debug)]
pub enum InfrastructureError {
    #[error("配置错误: {source}")]
    ConfigError {
        #[from]
        source: ConfigError,
    },

    #[error("依赖注入错误: {source}")]
    DependencyError {
        #[from]
        source: DependencyError,
    },
}

/// 结果类型别名
pub type ConfigResult<T> = Result<T, ConfigError>;
pub type DependencyResult<T> = Result<T, DependencyError>;
pub type InfrastructureResult<T> = Result<T, InfrastructureError>;
