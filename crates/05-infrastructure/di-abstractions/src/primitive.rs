//! 基本类型与其装箱形式（`T` ↔ `Box<T>`）之间的等价关系

use crate::instance::Instance;
use infrastructure_common::TypeInfo;
use once_cell::sync::Lazy;
use std::sync::Arc;

/// 实例转换函数
pub type Conversion = fn(&Instance) -> Option<Instance>;

/// 一对基本类型与装箱类型
#[derive(Debug, Clone, Copy)]
pub struct PrimitivePair {
    pub primitive: TypeInfo,
    pub boxed: TypeInfo,
    to_boxed: Conversion,
    to_primitive: Conversion,
}

macro_rules! primitive_pairs {
    ($($ty:ty),* $(,)?) => {
        vec![$(
            PrimitivePair {
                primitive: TypeInfo::of::<$ty>(),
                boxed: TypeInfo::of::<Box<$ty>>(),
                to_boxed: |instance| {
                    instance
                        .downcast::<$ty>()
                        .map(|value| Instance::new(Arc::new(Box::new(*value))))
                },
                to_primitive: |instance| {
                    instance
                        .downcast::<Box<$ty>>()
                        .map(|value| Instance::new(Arc::new(**value)))
                },
            }
        ),*]
    };
}

static PRIMITIVES: Lazy<Vec<PrimitivePair>> = Lazy::new(|| {
    primitive_pairs![
        bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64,
    ]
});

/// 所有已知的基本类型对
pub fn pairs() -> &'static [PrimitivePair] {
    &PRIMITIVES
}

/// `requested` 与 `bound` 是否构成基本类型 / 装箱类型对
pub fn can_assign(requested: &TypeInfo, bound: &TypeInfo) -> bool {
    conversion(requested, bound).is_some()
}

/// 把 `bound` 类型的实例转换为 `requested` 类型的转换函数
pub fn conversion(requested: &TypeInfo, bound: &TypeInfo) -> Option<Conversion> {
    PRIMITIVES.iter().find_map(|pair| {
        if pair.primitive == *requested && pair.boxed == *bound {
            Some(pair.to_primitive)
        } else if pair.boxed == *requested && pair.primitive == *bound {
            Some(pair.to_boxed)
        } else {
            None
        }
    })
}
