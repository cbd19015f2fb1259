//! 可注入组件宏实现

use crate::utils::{
    classify_return, extract_arc_inner, has_attribute, strip_attribute, type_name_of, ReturnKind,
};
use proc_macro2::TokenStream;
use quote::quote;
use syn::{Error, FnArg, ImplItem, ImplItemFn, ItemImpl, Result, Type, Visibility};

/// 注入标记属性名
const INJECT_ATTRIBUTE: &str = "inject";

/// 从 impl 块中收集到的构造函数
struct ConstructorSignature<'a> {
    ident: &'a syn::Ident,
    injected: bool,
    dependencies: Vec<&'a Type>,
    kind: ReturnKind,
}

/// 实现 #[injectable] 宏
pub fn injectable_impl(mut item: ItemImpl) -> Result<TokenStream> {
    if let Some((_, path, _)) = &item.trait_ {
        return Err(Error::new_spanned(path, "#[injectable] 只能用于固有 impl 块"));
    }

    let self_name = type_name_of(&item.self_ty)
        .ok_or_else(|| Error::new_spanned(&item.self_ty, "#[injectable] 无法识别实现类型"))?;

    // 先记录标记再移除，输出中不保留 #[inject]
    let mut marked = Vec::new();
    for impl_item in &mut item.items {
        if let ImplItem::Fn(method) = impl_item {
            marked.push(has_attribute(&method.attrs, INJECT_ATTRIBUTE));
            strip_attribute(&mut method.attrs, INJECT_ATTRIBUTE);
        }
    }

    let methods = item.items.iter().filter_map(|impl_item| match impl_item {
        ImplItem::Fn(method) => Some(method),
        _ => None,
    });

    let mut signatures = Vec::new();
    let mut errors: Option<Error> = None;
    for (method, injected) in methods.zip(marked) {
        match collect_constructor(method, injected, &self_name) {
            Ok(Some(signature)) => signatures.push(signature),
            Ok(None) => {}
            Err(e) => match &mut errors {
                Some(existing) => existing.combine(e),
                None => errors = Some(e),
            },
        }
    }
    if let Some(errors) = errors {
        return Err(errors);
    }

    let constructors = signatures.iter().map(generate_constructor);
    let self_ty = &item.self_ty;
    let (impl_generics, _, where_clause) = item.generics.split_for_impl();

    Ok(quote! {
        #item

        impl #impl_generics ::di_abstractions::Injectable for #self_ty #where_clause {
            fn constructors() -> ::std::vec::Vec<::di_abstractions::Constructor<Self>> {
                ::std::vec![#(#constructors),*]
            }
        }
    })
}

/// 判断方法是否为构造函数
///
/// 标记了 `#[inject]` 的方法不满足构造函数形态时报编译错误，未标记的直接跳过。
fn collect_constructor<'a>(
    method: &'a ImplItemFn,
    injected: bool,
    self_name: &str,
) -> Result<Option<ConstructorSignature<'a>>> {
    let sig = &method.sig;
    let reject = |message: &str| -> Result<Option<ConstructorSignature<'a>>> {
        if injected {
            Err(Error::new_spanned(&sig.ident, message))
        } else {
            Ok(None)
        }
    };

    if !matches!(method.vis, Visibility::Public(_)) {
        return reject("#[inject] 构造函数必须是 pub fn");
    }
    if sig.receiver().is_some() {
        return reject("#[inject] 构造函数不能有 self 参数");
    }
    if sig.asyncness.is_some() || !sig.generics.params.is_empty() {
        return reject("#[inject] 构造函数不能是 async 或泛型函数");
    }
    let Some(kind) = classify_return(&sig.output, self_name) else {
        return reject("#[inject] 构造函数必须返回 Self 或 Result<Self, E>");
    };

    if !injected && !sig.inputs.is_empty() {
        return Ok(None);
    }

    let mut dependencies = Vec::with_capacity(sig.inputs.len());
    for input in &sig.inputs {
        let FnArg::Typed(arg) = input else {
            continue;
        };
        let inner = extract_arc_inner(&arg.ty)
            .ok_or_else(|| Error::new_spanned(&arg.ty, "#[inject] 构造函数的参数必须是 Arc<T>"))?;
        dependencies.push(inner);
    }

    Ok(Some(ConstructorSignature {
        ident: &sig.ident,
        injected,
        dependencies,
        kind,
    }))
}

/// 生成单个构造函数的构建器表达式
fn generate_constructor(signature: &ConstructorSignature<'_>) -> TokenStream {
    let ident = signature.ident;
    let name = ident.to_string();
    let inject = signature.injected.then(|| quote!(.inject()));
    let dependencies = &signature.dependencies;
    let arguments = dependencies
        .iter()
        .enumerate()
        .map(|(index, dependency)| quote!(deps.get::<#dependency>(#index)?));

    let call = quote!(Self::#ident(#(#arguments),*));
    let body = match signature.kind {
        ReturnKind::Value => quote!(::std::result::Result::Ok(#call)),
        ReturnKind::Fallible => quote! {
            #call.map_err(|e| {
                ::di_abstractions::DependencyError::creation_failed(::std::any::type_name::<Self>(), e)
            })
        },
    };
    let deps_pattern = if dependencies.is_empty() {
        quote!(_)
    } else {
        quote!(deps)
    };

    quote! {
        ::di_abstractions::Constructor::builder(#name)
            #inject
            #(.depends_on::<#dependencies>())*
            .build(|#deps_pattern: &::di_abstractions::Dependencies<'_>| #body)
    }
}
