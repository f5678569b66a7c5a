//! 元数据定义
//!
//! 提供类型的运行时标识

use std::any::TypeId;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// 类型信息
///
/// 同时适用于具体类型与 trait 对象（`dyn Trait`）。相等性与哈希只取决于 `id`。
#[derive(Debug, Clone, Copy)]
pub struct TypeInfo {
    /// 类型名称
    pub name: &'static str,
    /// 类型ID
    pub id: TypeId,
}

impl TypeInfo {
    /// 从类型获取类型信息
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            name: std::any::type_name::<T>(),
            id: TypeId::of::<T>(),
        }
    }

    /// 类型ID
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// 完整类型名称
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// 获取简短的类型名称（去掉每一段路径中的模块前缀）
    ///
    /// `alloc::vec::Vec<alloc::string::String>` 变为 `Vec<String>`。
    pub fn short_name(&self) -> String {
        let mut result = String::with_capacity(self.name.len());
        let mut segment = String::new();

        for ch in self.name.chars() {
            if ch.is_alphanumeric() || ch == '_' || ch == ':' {
                segment.push(ch);
            } else {
                result.push_str(last_path_segment(&segment));
                segment.clear();
                result.push(ch);
            }
        }
        result.push_str(last_path_segment(&segment));

        result
    }
}

fn last_path_segment(path: &str) -> &str {
    path.rsplit("::").next().unwrap_or(path)
}

impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeInfo {}

impl Hash for TypeInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialOrd for TypeInfo {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TypeInfo {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.id == other.id {
            return Ordering::Equal;
        }
        self.name
            .cmp(other.name)
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
