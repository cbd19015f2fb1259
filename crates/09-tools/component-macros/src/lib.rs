//! # Component Macros
//!
//! 这个 crate 提供了用于声明可注入组件构造函数的过程宏。
//!
//! ## 核心宏
//!
//! - [`injectable`] - 从 impl 块生成 `Injectable` 实现
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! use component_macros::injectable;
//! use std::sync::Arc;
//!
//! pub struct Pig {
//!     heart: Arc<Heart>,
//!     ear: Arc<Ear>,
//! }
//!
//! #[injectable]
//! impl Pig {
//!     #[inject]
//!     pub fn new(heart: Arc<Heart>, ear: Arc<Ear>) -> Self {
//!         Self { heart, ear }
//!     }
//! }
//! ```

use proc_macro::TokenStream;
use syn::{parse_macro_input, ItemImpl};

mod injectable;
mod utils;

/// 可注入组件宏
///
/// 作用于 impl 块，收集其中的构造函数并生成 `di_abstractions::Injectable` 实现。
///
/// 构造函数指无接收者、返回 `Self`（或 `Result<Self, E>`）的 `pub fn`。
/// 标记 `#[inject]` 的构造函数参数必须全部是 `Arc<T>`，依赖按参数顺序解析；
/// 未标记的构造函数只有无参的才会被收集。
///
/// # 示例
///
/// ```rust,ignore
/// #[injectable]
/// impl Engine {
///     pub fn new() -> Self {
///         Self { id: 0 }
///     }
/// }
///
/// #[injectable]
/// impl Car {
///     #[inject]
///     pub fn new(engine: Arc<Engine>) -> Self {
///         Self { engine }
///     }
/// }
/// ```
#[proc_macro_attribute]
pub fn injectable(args: TokenStream, input: TokenStream) -> TokenStream {
    if !args.is_empty() {
        return syn::Error::new(
            proc_macro2::Span::call_site(),
            "#[injectable] 不接受参数",
        )
        .to_compile_error()
        .into();
    }

    let item = parse_macro_input!(input as ItemImpl);
    injectable::injectable_impl(item)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
