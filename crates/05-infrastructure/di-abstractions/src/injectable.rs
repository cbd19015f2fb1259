//! 可注入类型与构造函数描述
//!
//! 每个实现类型通过 [`Injectable`] 声明自己的公开构造函数，
//! 每个构造函数带有依赖类型列表和工厂函数。容器在绑定时按规则选出唯一的入口。

use crate::registry::Instance;
use infrastructure_common::{DependencyError, DependencyResult, TypeKey};
use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// 构造函数工厂类型
pub type ConstructorFn<T> = Arc<dyn Fn(&Dependencies<'_>) -> DependencyResult<T> + Send + Sync>;

/// 可注入类型 trait
///
/// 返回该类型的全部公开构造函数。通常由 `#[injectable]` 宏生成，
/// 也可以使用 [`Constructor::builder`] 手写。
pub trait Injectable: Send + Sync + Sized + 'static {
    /// 获取构造函数列表
    fn constructors() -> Vec<Constructor<Self>>;
}

/// 实现关系 trait
///
/// 将实现类型的实例转换为抽象类型。每个类型都实现了到自身的转换，
/// trait 对象使用 [`implements!`](crate::implements) 声明。
pub trait Implements<I: ?Sized + 'static>: Send + Sync + 'static {
    /// 转换为抽象类型
    fn into_abstract(self: Arc<Self>) -> Arc<I>;
}

impl<T: Send + Sync + 'static> Implements<T> for T {
    fn into_abstract(self: Arc<Self>) -> Arc<T> {
        self
    }
}

/// 声明实现类型可以作为某个 trait 对象绑定
///
/// ```rust,ignore
/// implements!(Pig => dyn Animal);
/// implements!(Pig => dyn Animal, dyn Named);
/// ```
#[macro_export]
macro_rules! implements {
    ($implementation:ty => $($abstraction:ty),+ $(,)?) => {
        $(
            impl $crate::Implements<$abstraction> for $implementation {
                fn into_abstract(
                    self: ::std::sync::Arc<Self>,
                ) -> ::std::sync::Arc<$abstraction> {
                    self
                }
            }
        )+
    };
}

/// 构造函数描述符
pub struct Constructor<T> {
    name: &'static str,
    injected: bool,
    dependencies: Vec<TypeKey>,
    factory: ConstructorFn<T>,
}

impl<T: 'static> Constructor<T> {
    /// 创建构造函数构建器
    pub fn builder(name: &'static str) -> ConstructorBuilder<T> {
        ConstructorBuilder {
            name,
            injected: false,
            dependencies: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// 构造函数名称
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// 是否标记为注入入口
    pub fn is_injected(&self) -> bool {
        self.injected
    }

    /// 依赖类型列表（按参数顺序）
    pub fn dependencies(&self) -> &[TypeKey] {
        &self.dependencies
    }

    /// 参数个数
    pub fn arity(&self) -> usize {
        self.dependencies.len()
    }

    /// 使用已解析的依赖调用构造函数
    pub fn construct(&self, dependencies: &Dependencies<'_>) -> DependencyResult<T> {
        (self.factory)(dependencies)
    }

    pub(crate) fn into_parts(self) -> (&'static str, Vec<TypeKey>, ConstructorFn<T>) {
        (self.name, self.dependencies, self.factory)
    }
}

impl<T> Clone for Constructor<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            injected: self.injected,
            dependencies: self.dependencies.clone(),
            factory: Arc::clone(&self.factory),
        }
    }
}

impl<T> fmt::Debug for Constructor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constructor")
            .field("owner", &type_name::<T>())
            .field("name", &self.name)
            .field("injected", &self.injected)
            .field("dependencies", &self.dependencies)
            .field("factory", &"<function>")
            .finish()
    }
}

/// 构造函数构建器
pub struct ConstructorBuilder<T> {
    name: &'static str,
    injected: bool,
    dependencies: Vec<TypeKey>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: 'static> ConstructorBuilder<T> {
    /// 标记为注入入口
    pub fn inject(mut self) -> Self {
        self.injected = true;
        self
    }

    /// 追加一个依赖类型
    pub fn depends_on<D: ?Sized + 'static>(mut self) -> Self {
        self.dependencies.push(TypeKey::of::<D>());
        self
    }

    /// 设置工厂函数并完成构建
    pub fn build<F>(self, factory: F) -> Constructor<T>
    where
        F: Fn(&Dependencies<'_>) -> DependencyResult<T> + Send + Sync + 'static,
    {
        Constructor {
            name: self.name,
            injected: self.injected,
            dependencies: self.dependencies,
            factory: Arc::new(factory),
        }
    }
}

/// 已解析的依赖值
///
/// 按构造函数声明的参数顺序排列。
#[derive(Clone, Copy)]
pub struct Dependencies<'a> {
    keys: &'a [TypeKey],
    values: &'a [Instance],
}

impl<'a> Dependencies<'a> {
    /// 创建依赖视图
    pub fn new(keys: &'a [TypeKey], values: &'a [Instance]) -> Self {
        Self { keys, values }
    }

    /// 空依赖
    pub fn empty() -> Dependencies<'static> {
        Dependencies {
            keys: &[],
            values: &[],
        }
    }

    /// 依赖个数
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// 是否没有依赖
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// 获取第 `index` 个依赖
    pub fn get<D: ?Sized + Send + Sync + 'static>(&self, index: usize) -> DependencyResult<Arc<D>> {
        let mismatch = || DependencyError::TypeMismatch {
            type_name: type_name::<D>().to_string(),
        };

        if let Some(declared) = self.keys.get(index) {
            if *declared != TypeKey::of::<D>() {
                return Err(mismatch());
            }
        }

        self.values
            .get(index)
            .and_then(|value| value.downcast_ref::<Arc<D>>())
            .cloned()
            .ok_or_else(mismatch)
    }
}

impl fmt::Debug for Dependencies<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dependencies")
            .field("keys", &self.keys)
            .field("len", &self.values.len())
            .finish()
    }
}
