//! 宏工具函数

use syn::{Attribute, GenericArgument, PathArguments, ReturnType, Type, TypePath};

/// 构造函数的返回形态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnKind {
    /// 直接返回 `Self`
    Value,
    /// 返回 `Result<Self, E>`
    Fallible,
}

/// 检查属性列表中是否有指定名称的属性
pub fn has_attribute(attrs: &[Attribute], name: &str) -> bool {
    attrs.iter().any(|attr| attr.path().is_ident(name))
}

/// 移除指定名称的属性
pub fn strip_attribute(attrs: &mut Vec<Attribute>, name: &str) {
    attrs.retain(|attr| !attr.path().is_ident(name));
}

/// 从 `Arc<T>` 中提取 `T`
///
/// 接受 `Arc<T>`、`sync::Arc<T>` 和 `std::sync::Arc<T>` 等写法。
pub fn extract_arc_inner(ty: &Type) -> Option<&Type> {
    let segment = last_segment(ty)?;
    if segment.ident != "Arc" {
        return None;
    }
    single_type_argument(&segment.arguments)
}

/// 判断返回类型是否为构造函数的返回形态
pub fn classify_return(output: &ReturnType, self_name: &str) -> Option<ReturnKind> {
    let ReturnType::Type(_, ty) = output else {
        return None;
    };

    if is_self_type(ty, self_name) {
        return Some(ReturnKind::Value);
    }

    let segment = last_segment(ty)?;
    if segment.ident != "Result" {
        return None;
    }
    match &segment.arguments {
        PathArguments::AngleBracketed(args) => match args.args.first() {
            Some(GenericArgument::Type(ok)) if is_self_type(ok, self_name) => {
                Some(ReturnKind::Fallible)
            }
            _ => None,
        },
        _ => None,
    }
}

/// 取类型路径的最后一段名称
pub fn type_name_of(ty: &Type) -> Option<String> {
    last_segment(ty).map(|segment| segment.ident.to_string())
}

/// 只接受 `Self` 或不带路径的实现类型名
fn is_self_type(ty: &Type, self_name: &str) -> bool {
    match ty {
        Type::Path(TypePath { qself: None, path }) => {
            path.is_ident("Self") || path.is_ident(self_name)
        }
        _ => false,
    }
}

fn last_segment(ty: &Type) -> Option<&syn::PathSegment> {
    match ty {
        Type::Path(TypePath { qself: None, path }) => path.segments.last(),
        _ => None,
    }
}

fn single_type_argument(arguments: &PathArguments) -> Option<&Type> {
    match arguments {
        PathArguments::AngleBracketed(args) if args.args.len() == 1 => match args.args.first() {
            Some(GenericArgument::Type(inner)) => Some(inner),
            _ => None,
        },
        _ => None,
    }
}
