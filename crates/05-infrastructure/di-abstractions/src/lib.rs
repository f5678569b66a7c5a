//! # Dependency Injection Abstractions
//!
//! 依赖注入抽象层，定义容器接口与容器所依赖的反射能力。
//!
//! ## 核心接口
//!
//! - [`Inject`] / [`InjectExt`] - 容器接口
//! - [`ReflectionCatalog`] - 类型描述符目录
//! - [`TypeDescriptor`] - 类型的构造函数、方法与向上转换
//! - [`Instance`] - 类型擦除的实例句柄
//! - [`ContainerConfig`] - 容器配置

pub mod catalog;
pub mod container;
pub mod instance;
pub mod primitive;
pub mod reflection;
pub mod resolver;

pub use catalog::*;
pub use container::*;
pub use instance::*;
pub use reflection::*;
pub use resolver::*;

pub use infrastructure_common::{InjectionError, InjectionResult, MemberError, TypeInfo};
