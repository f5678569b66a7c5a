//! 宏工具函数

use syn::{Field, GenericArgument, PathArguments, Type};

/// 可注入字段的类型形态
#[derive(Debug, Clone, Copy)]
pub enum InjectedType<'a> {
    /// `Arc<T>`，解析失败时构造函数报告缺少参数
    Required(&'a Type),
    /// `Option<Arc<T>>`
    Optional(&'a Type),
}

/// 从类型中提取第一个泛型参数
pub fn extract_generic_type(ty: &Type) -> Option<&Type> {
    let Type::Path(type_path) = ty else {
        return None;
    };
    let segment = type_path.path.segments.last()?;
    match &segment.arguments {
        PathArguments::AngleBracketed(args) => match args.args.first() {
            Some(GenericArgument::Type(inner_type)) => Some(inner_type),
            _ => None,
        },
        _ => None,
    }
}

/// 检查类型路径的最后一段是否为 `name`
pub fn is_type_named(ty: &Type, name: &str) -> bool {
    match ty {
        Type::Path(type_path) => type_path
            .path
            .segments
            .last()
            .is_some_and(|segment| segment.ident == name),
        _ => false,
    }
}

/// 检查类型是否为 Option<T>
pub fn is_option_type(ty: &Type) -> bool {
    is_type_named(ty, "Option")
}

/// 检查类型是否为 Arc<T>
pub fn is_arc_type(ty: &Type) -> bool {
    is_type_named(ty, "Arc")
}

/// 识别 `Arc<T>` 与 `Option<Arc<T>>` 字段，返回其中的 `T`
pub fn injected_type(ty: &Type) -> Option<InjectedType<'_>> {
    if is_arc_type(ty) {
        return extract_generic_type(ty).map(InjectedType::Required);
    }
    if is_option_type(ty) {
        let inner = extract_generic_type(ty)?;
        if is_arc_type(inner) {
            return extract_generic_type(inner).map(InjectedType::Optional);
        }
    }
    None
}

/// 检查字段是否有特定属性
pub fn field_has_attribute(field: &Field, attr_name: &str) -> bool {
    field.attrs.iter().any(|attr| attr.path().is_ident(attr_name))
}
