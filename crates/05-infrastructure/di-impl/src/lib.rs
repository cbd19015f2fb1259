//! # 依赖注入具体实现
//!
//! 提供具体的绑定注册表、构造函数选择规则、解析器、延迟解析句柄和注入器实现。
//!
//! ```rust,ignore
//! use di_abstractions::{Injector, Provider};
//! use di_impl::InjectorImpl;
//!
//! let injector = InjectorImpl::new();
//! injector.bind::<Heart, Heart>()?;
//! injector.bind::<Ear, Ear>()?;
//! injector.bind_singleton::<dyn Animal, Pig>()?;
//!
//! let animal = injector.get_provider::<dyn Animal>().get_instance()?;
//! ```

pub mod injector;
pub mod policy;
pub mod provider;
pub mod registry;
pub mod resolver;
pub mod settings;

pub use injector::InjectorImpl;
pub use policy::{select_constructor, select_from};
pub use provider::LazyProvider;
pub use registry::BindingRegistryImpl;
pub use resolver::DependencyResolverImpl;
pub use settings::{load_injector_config, load_injector_config_with_prefix};
