//! 绑定生命周期

use std::fmt;

/// 绑定的生命周期类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Lifetime {
    /// 原型模式 - 每次解析都创建新实例
    #[default]
    Prototype,
    /// 单例模式 - 首次解析时创建，之后由注册表持有并复用
    Singleton,
}

impl Lifetime {
    /// 是否为单例
    pub fn is_singleton(self) -> bool {
        matches!(self, Self::Singleton)
    }
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prototype => f.write_str("prototype"),
            Self::Singleton => f.write_str("singleton"),
        }
    }
}
