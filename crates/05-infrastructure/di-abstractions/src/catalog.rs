//! 反射目录
//!
//! 保存所有已登记的类型描述符，回答"某类型能否赋值给另一类型"之类的查询。

use crate::container::Inject;
use crate::instance::Instance;
use crate::primitive;
use crate::reflection::{MethodReflection, Reflect, TypeDescriptor};
use infrastructure_common::TypeInfo;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use tracing::debug;

/// 反射目录
#[derive(Debug, Default)]
pub struct ReflectionCatalog {
    descriptors: HashMap<TypeInfo, Arc<TypeDescriptor>>,
}

macro_rules! register_builtins {
    ($catalog:expr; $($ty:ty),* $(,)?) => {
        $(
            $catalog.register_descriptor(TypeDescriptor::builder::<$ty>().default_constructor().build());
            $catalog.register_descriptor(TypeDescriptor::builder::<Box<$ty>>().default_constructor().build());
            $catalog.register_descriptor(TypeDescriptor::sequence::<$ty>());
        )*
    };
}

impl ReflectionCatalog {
    /// 创建空目录
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建包含内置类型的目录
    ///
    /// 内置类型：所有基本类型及其 `Box` 形式、`String`、它们的 `Vec`，以及 `dyn Inject`。
    pub fn with_builtins() -> Self {
        let mut catalog = Self::new();
        register_builtins!(
            catalog;
            bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64,
            String,
        );
        catalog.register_descriptor(TypeDescriptor::builder::<dyn Inject>().abstract_type().build());
        catalog
    }

    /// 登记实现了 [`Reflect`] 的类型
    pub fn register<T: Reflect>(&mut self) -> &mut Self {
        self.register_descriptor(T::describe())
    }

    /// 登记描述符，同一类型再次登记时覆盖
    pub fn register_descriptor(&mut self, descriptor: TypeDescriptor) -> &mut Self {
        let type_info = descriptor.type_info();
        if self
            .descriptors
            .insert(type_info, Arc::new(descriptor))
            .is_some()
        {
            debug!("覆盖类型描述符: {}", type_info.short_name());
        }
        self
    }

    /// 查找描述符
    pub fn describe(&self, type_info: &TypeInfo) -> Option<Arc<TypeDescriptor>> {
        self.descriptors.get(type_info).cloned()
    }

    /// 是否包含该类型
    pub fn contains(&self, type_info: &TypeInfo) -> bool {
        self.descriptors.contains_key(type_info)
    }

    /// 按名称查找方法
    pub fn method(&self, type_info: &TypeInfo, name: &str) -> Option<Arc<MethodReflection>> {
        self.descriptors.get(type_info)?.method(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// `from` 的实例能否赋值给 `to`
    ///
    /// 同一类型，或 `from` 经已声明的向上转换（可传递）到达 `to`。
    pub fn is_assignable(&self, to: &TypeInfo, from: &TypeInfo) -> bool {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([*from]);

        while let Some(current) = queue.pop_front() {
            if current == *to {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            if let Some(descriptor) = self.descriptors.get(&current) {
                queue.extend(descriptor.upcasts().iter().map(|upcast| upcast.target()));
            }
        }

        false
    }

    /// 把实例转换为 `to` 类型
    ///
    /// 依次尝试：同一类型、基本类型对、向上转换链。无法转换时返回 `None`。
    pub fn convert(&self, instance: &Instance, to: &TypeInfo) -> Option<Instance> {
        let from = instance.type_info();
        if from == *to {
            return Some(instance.clone());
        }
        if let Some(conversion) = primitive::conversion(to, &from) {
            return conversion(instance);
        }

        let mut visited = HashSet::new();
        self.upcast_chain(instance, to, &mut visited)
    }

    fn upcast_chain(
        &self,
        instance: &Instance,
        to: &TypeInfo,
        visited: &mut HashSet<TypeInfo>,
    ) -> Option<Instance> {
        let from = instance.type_info();
        if from == *to {
            return Some(instance.clone());
        }
        if !visited.insert(from) {
            return None;
        }

        let descriptor = self.descriptors.get(&from)?;
        descriptor
            .upcasts()
            .iter()
            .filter_map(|upcast| upcast.apply(instance))
            .find_map(|next| self.upcast_chain(&next, to, visited))
    }
}
