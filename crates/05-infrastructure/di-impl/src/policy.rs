//! 构造函数选择规则
//!
//! 1. 标记为注入的构造函数多于一个：入口不明确，返回 `TooManyConstructors`；
//! 2. 恰好一个：选中它；
//! 3. 没有标记：选择无参构造函数，没有则返回 `ConstructorNotFound`，
//!    有多个无参构造函数同样视为入口不明确。
//!
//! 选择结果只取决于构造函数集合，与声明顺序无关。

use di_abstractions::{Constructor, Injectable};
use infrastructure_common::{DependencyError, DependencyResult};
use std::any::type_name;
use tracing::debug;

/// 为实现类型选出唯一的构造入口
pub fn select_constructor<C: Injectable>() -> DependencyResult<Constructor<C>> {
    select_from(C::constructors())
}

/// 从给定的构造函数集合中选出唯一的构造入口
pub fn select_from<C: 'static>(constructors: Vec<Constructor<C>>) -> DependencyResult<Constructor<C>> {
    let type_name = type_name::<C>();

    let (injected, plain): (Vec<_>, Vec<_>) = constructors
        .into_iter()
        .partition(Constructor::is_injected);

    let mut candidates = if injected.is_empty() {
        plain
            .into_iter()
            .filter(|constructor| constructor.arity() == 0)
            .collect::<Vec<_>>()
    } else {
        injected
    };

    match candidates.len() {
        0 => Err(DependencyError::ConstructorNotFound {
            type_name: type_name.to_string(),
        }),
        1 => {
            let selected = candidates.remove(0);
            debug!(
                "选中构造函数: {}::{} ({} 个依赖)",
                type_name,
                selected.name(),
                selected.arity()
            );
            Ok(selected)
        }
        count => Err(DependencyError::TooManyConstructors {
            type_name: type_name.to_string(),
            count,
        }),
    }
}
