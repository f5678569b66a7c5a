//! 绑定注册表
//!
//! 保存 类型 → 名称 → 绑定 的映射，并实现解析时的匹配规则。

use di_abstractions::{primitive, Instance, ReflectionCatalog};
use infrastructure_common::TypeInfo;
use std::collections::HashMap;
use std::fmt;

/// 绑定
#[derive(Clone)]
pub enum Binding {
    /// 固定实例，每次解析返回同一个对象
    Value(Instance),
    /// 实现类型，每次解析重新实例化
    Class(TypeInfo),
    /// 容器自身
    Container,
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Binding::Value(instance) => f.debug_tuple("Value").field(instance).finish(),
            Binding::Class(implementation) => f
                .debug_tuple("Class")
                .field(&implementation.short_name())
                .finish(),
            Binding::Container => f.write_str("Container"),
        }
    }
}

/// 匹配方式，越靠前优先级越高
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchKind {
    /// 绑定类型即请求类型
    Exact,
    /// 绑定类型可以向上转换为请求类型
    Assignable,
    /// 基本类型与装箱类型对
    Primitive,
}

/// 匹配结果
#[derive(Debug, Clone)]
pub struct BindingMatch {
    pub bound_type: TypeInfo,
    pub kind: MatchKind,
    pub binding: Binding,
}

/// 绑定注册表
#[derive(Debug, Default)]
pub struct BindingRegistry {
    bindings: HashMap<TypeInfo, HashMap<String, Binding>>,
}

impl BindingRegistry {
    /// 创建空注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入绑定，返回被覆盖的旧绑定
    pub fn insert(&mut self, ty: TypeInfo, name: &str, binding: Binding) -> Option<Binding> {
        self.bindings
            .entry(ty)
            .or_default()
            .insert(name.to_string(), binding)
    }

    /// 移除类型的全部绑定，返回移除的数量
    pub fn remove_type(&mut self, ty: &TypeInfo) -> usize {
        self.bindings.remove(ty).map_or(0, |named| named.len())
    }

    /// 移除全部绑定
    pub fn clear(&mut self) {
        self.bindings.clear();
    }

    /// 精确查找
    pub fn get(&self, ty: &TypeInfo, name: &str) -> Option<&Binding> {
        self.bindings.get(ty)?.get(name)
    }

    /// `ty` 在 `name` 下是否存在精确绑定
    pub fn contains(&self, ty: &TypeInfo, name: &str) -> bool {
        self.get(ty, name).is_some()
    }

    /// 已绑定的类型，按名称排序
    pub fn types(&self) -> Vec<TypeInfo> {
        let mut types: Vec<_> = self.bindings.keys().copied().collect();
        types.sort();
        types
    }

    /// 绑定条目总数
    pub fn len(&self) -> usize {
        self.bindings.values().map(HashMap::len).sum()
    }

    /// 是否没有任何绑定
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 为请求类型查找绑定
    ///
    /// 候选：绑定类型即请求类型、可赋值给请求类型、或与请求类型构成基本类型对，
    /// 且在 `name` 下存在绑定。多个候选时依次按匹配方式、类型名称、`TypeId` 取第一个。
    pub fn find(
        &self,
        requested: &TypeInfo,
        name: &str,
        catalog: &ReflectionCatalog,
    ) -> Option<BindingMatch> {
        self.bindings
            .iter()
            .filter_map(|(bound, named)| {
                let binding = named.get(name)?;
                let kind = classify(requested, bound, catalog)?;
                Some((*bound, kind, binding))
            })
            .min_by(|(a, a_kind, _), (b, b_kind, _)| a_kind.cmp(b_kind).then_with(|| a.cmp(b)))
            .map(|(bound_type, kind, binding)| BindingMatch {
                bound_type,
                kind,
                binding: binding.clone(),
            })
    }
}

fn classify(requested: &TypeInfo, bound: &TypeInfo, catalog: &ReflectionCatalog) -> Option<MatchKind> {
    if requested == bound {
        Some(MatchKind::Exact)
    } else if catalog.is_assignable(requested, bound) {
        Some(MatchKind::Assignable)
    } else if primitive::can_assign(requested, bound) {
        Some(MatchKind::Primitive)
    } else {
        None
    }
}
