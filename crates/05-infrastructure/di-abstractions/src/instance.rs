//! 类型擦除的实例句柄与参数列表

use infrastructure_common::{MemberError, TypeInfo};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// 类型擦除的实例句柄
///
/// 内部保存一个 `Arc<T>`（`T` 可以是 `dyn Trait`）及 `T` 的类型信息。
/// 克隆只增加引用计数，不复制值本身。
#[derive(Clone)]
pub struct Instance {
    type_info: TypeInfo,
    value: Arc<dyn Any + Send + Sync>,
}

impl Instance {
    /// 以 `T` 的身份包装一个共享值
    pub fn new<T>(value: Arc<T>) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
    {
        Self {
            type_info: TypeInfo::of::<T>(),
            value: Arc::new(value),
        }
    }

    /// 实例被登记的类型
    pub fn type_info(&self) -> TypeInfo {
        self.type_info
    }

    /// 取回 `Arc<T>`，类型不符时返回 `None`
    pub fn downcast<T>(&self) -> Option<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.value.downcast_ref::<Arc<T>>().cloned()
    }

    /// 实例是否以 `T` 的身份登记
    pub fn is<T>(&self) -> bool
    where
        T: ?Sized + 'static,
    {
        self.type_info == TypeInfo::of::<T>()
    }

    /// 两个句柄是否来自同一次包装
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.value, &b.value)
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("type", &self.type_info.short_name())
            .finish()
    }
}

/// 已解析的参数列表
///
/// 未能从容器中解析的参数为 `None`，由构造函数或方法自行决定如何处理。
#[derive(Debug, Clone, Default)]
pub struct Arguments {
    values: Vec<Option<Instance>>,
}

impl Arguments {
    pub fn new(values: Vec<Option<Instance>>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// 取第 `index` 个参数，未解析时返回 `Ok(None)`
    pub fn optional<T>(&self, index: usize) -> Result<Option<Arc<T>>, MemberError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let slot = self.values.get(index).ok_or(MemberError::ArgumentCount {
            expected: index + 1,
            actual: self.values.len(),
        })?;

        match slot {
            None => Ok(None),
            Some(instance) => instance
                .downcast::<T>()
                .map(Some)
                .ok_or_else(|| MemberError::ArgumentType {
                    index,
                    expected: TypeInfo::of::<T>().short_name(),
                    actual: instance.type_info().short_name(),
                }),
        }
    }

    /// 取第 `index` 个参数，未解析时返回 [`MemberError::MissingArgument`]
    pub fn required<T>(&self, index: usize) -> Result<Arc<T>, MemberError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.optional::<T>(index)?
            .ok_or_else(|| MemberError::MissingArgument {
                index,
                expected: TypeInfo::of::<T>().short_name(),
            })
    }
}
