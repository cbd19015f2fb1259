//! 元数据定义
//!
//! 提供类型标识信息，用作绑定表和依赖列表的键

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

/// 类型标识
///
/// 相等性与哈希只取决于 [`TypeId`]，名称仅用于日志和错误信息。
/// 支持 `?Sized` 类型，因此 `dyn Trait` 也可以作为抽象类型。
#[derive(Clone, Copy)]
pub struct TypeKey {
    /// 类型ID
    pub id: TypeId,
    /// 完整类型名称（含模块路径）
    pub name: &'static str,
}

impl TypeKey {
    /// 从类型获取类型标识
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// 获取简短的类型名称（不包含模块路径）
    ///
    /// `dyn a::b::Animal` 得到 `dyn Animal`，`a::Pig` 得到 `Pig`。
    pub fn short_name(&self) -> String {
        short_type_name(self.name)
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypeKey").field(&self.name).finish()
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.short_name())
    }
}

/// 去掉类型名称中每一段路径的模块前缀
pub fn short_type_name(full: &str) -> String {
    let mut out = String::with_capacity(full.len());
    let mut segment = String::new();

    for ch in full.chars() {
        if ch.is_alphanumeric() || ch == '_' || ch == ':' {
            segment.push(ch);
        } else {
            out.push_str(last_path_segment(&segment));
            segment.clear();
            out.push(ch);
        }
    }
    out.push_str(last_path_segment(&segment));
    out
}

fn last_path_segment(path: &str) -> &str {
    path.rsplit("::").next().unwrap_or(path)
}
