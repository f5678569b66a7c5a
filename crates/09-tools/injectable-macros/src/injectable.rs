//! Injectable 派生宏实现

use crate::utils::{field_has_attribute, injected_type, InjectedType};
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    parenthesized, punctuated::Punctuated, Attribute, Data, DeriveInput, Error, Field, Fields,
    LitStr, Path, Result, Token, Type,
};

/// 结构体上的 `#[injectable(...)]` 参数
#[derive(Debug, Default)]
pub struct InjectableArgs {
    /// 声明的向上转换目标
    pub upcasts: Vec<Type>,
    /// 补充描述符（注册方法等）的函数
    pub extend: Option<Path>,
}

impl InjectableArgs {
    pub fn from_attributes(attrs: &[Attribute]) -> Result<Self> {
        let mut args = Self::default();

        for attr in attrs {
            if !attr.path().is_ident("injectable") {
                continue;
            }
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("upcast") {
                    let content;
                    parenthesized!(content in meta.input);
                    let targets = Punctuated::<Type, Token![,]>::parse_terminated(&content)?;
                    args.upcasts.extend(targets);
                    Ok(())
                } else if meta.path.is_ident("extend") {
                    args.extend = Some(meta.value()?.parse()?);
                    Ok(())
                } else if meta.path.is_ident("abstract") {
                    Err(meta.error("结构体总是可实例化的，abstract 只能用于手写的 trait 对象描述符"))
                } else {
                    Err(meta.error("未知的 injectable 参数，可用参数: upcast(..), extend = path"))
                }
            })?;
        }

        Ok(args)
    }
}

/// 字段上的 `#[inject(...)]` 参数
#[derive(Debug, Default, PartialEq, Eq)]
pub struct FieldArgs {
    /// 绑定名称
    pub named: Option<String>,
    /// 不注入，使用 `Default` 初始化
    pub default: bool,
}

impl FieldArgs {
    pub fn from_field(field: &Field) -> Result<Self> {
        let mut args = Self::default();
        if !field_has_attribute(field, "inject") {
            return Ok(args);
        }

        for attr in field.attrs.iter().filter(|attr| attr.path().is_ident("inject")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("named") {
                    let name: LitStr = meta.value()?.parse()?;
                    if name.value().is_empty() {
                        return Err(Error::new_spanned(name, "绑定名称不能为空"));
                    }
                    args.named = Some(name.value());
                    Ok(())
                } else if meta.path.is_ident("default") {
                    args.default = true;
                    Ok(())
                } else {
                    Err(meta.error("未知的 inject 参数，可用参数: named = \"..\", default"))
                }
            })?;
        }

        if args.default && args.named.is_some() {
            return Err(Error::new_spanned(
                field,
                "#[inject(default)] 字段不参与注入，不能同时指定 named",
            ));
        }
        Ok(args)
    }
}

/// 实现 #[derive(Injectable)] 宏
pub fn derive_injectable_impl(input: DeriveInput) -> TokenStream {
    match expand(&input) {
        Ok(tokens) => TokenStream::from(tokens),
        Err(e) => e.to_compile_error().into(),
    }
}

/// 构造函数的参数列表与字段初始化
struct ConstructorParts {
    parameters: Vec<TokenStream2>,
    body: TokenStream2,
}

pub(crate) fn expand(input: &DeriveInput) -> Result<TokenStream2> {
    let Data::Struct(data) = &input.data else {
        return Err(Error::new_spanned(
            &input.ident,
            "Injectable 只能派生于具名字段结构体或单元结构体",
        ));
    };
    let args = InjectableArgs::from_attributes(&input.attrs)?;
    let ConstructorParts { parameters, body } = constructor_parts(&data.fields)?;

    let struct_name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let args_pattern = if parameters.is_empty() {
        quote! { _ }
    } else {
        quote! { args }
    };
    let upcasts = args.upcasts.iter().map(|target| {
        quote! {
            .upcast::<#target>(|this: ::std::sync::Arc<Self>| -> ::std::sync::Arc<#target> { this })
        }
    });
    let finish = match &args.extend {
        Some(hook) => quote! { #hook(builder).build() },
        None => quote! { builder.build() },
    };

    Ok(quote! {
        impl #impl_generics ::di_abstractions::Reflect for #struct_name #ty_generics #where_clause {
            fn describe() -> ::di_abstractions::TypeDescriptor {
                let builder = ::di_abstractions::TypeDescriptor::builder::<Self>()
                    .constructor(::di_abstractions::ConstructorReflection::new::<Self, _>(
                        ::std::vec![#(#parameters),*],
                        |#args_pattern: &::di_abstractions::Arguments| {
                            ::std::result::Result::<Self, ::di_abstractions::MemberError>::Ok(#body)
                        },
                    ))
                    #(#upcasts)*;
                #finish
            }
        }
    })
}

fn constructor_parts(fields: &Fields) -> Result<ConstructorParts> {
    let named = match fields {
        Fields::Unit => {
            return Ok(ConstructorParts {
                parameters: Vec::new(),
                body: quote! { Self },
            })
        }
        Fields::Named(named) => named,
        Fields::Unnamed(_) => {
            return Err(Error::new_spanned(
                fields,
                "Injectable 不支持元组结构体，请使用具名字段",
            ))
        }
    };

    let mut parameters = Vec::new();
    let mut initializers = Vec::new();
    let mut errors: Option<Error> = None;

    for field in &named.named {
        let ident = &field.ident;
        let field_args = match FieldArgs::from_field(field) {
            Ok(field_args) => field_args,
            Err(e) => {
                push_error(&mut errors, e);
                continue;
            }
        };

        if field_args.default {
            initializers.push(quote! { #ident: ::std::default::Default::default() });
            continue;
        }

        let index = parameters.len();
        let (inner, accessor) = match injected_type(&field.ty) {
            Some(InjectedType::Required(inner)) => (inner, quote! { required }),
            Some(InjectedType::Optional(inner)) => (inner, quote! { optional }),
            None => {
                push_error(
                    &mut errors,
                    Error::new_spanned(
                        &field.ty,
                        "注入字段必须是 Arc<T> 或 Option<Arc<T>>，其他字段请标注 #[inject(default)]",
                    ),
                );
                continue;
            }
        };

        parameters.push(match &field_args.named {
            Some(name) => quote! { ::di_abstractions::ParameterReflection::named::<#inner>(#name) },
            None => quote! { ::di_abstractions::ParameterReflection::of::<#inner>() },
        });
        initializers.push(quote! { #ident: args.#accessor::<#inner>(#index)? });
    }

    if let Some(errors) = errors {
        return Err(errors);
    }
    Ok(ConstructorParts {
        parameters,
        body: quote! { Self { #(#initializers),* } },
    })
}

fn push_error(errors: &mut Option<Error>, error: Error) {
    match errors {
        Some(existing) => existing.combine(error),
        None => *errors = Some(error),
    }
}
