//! # 依赖注入具体实现
//!
//! 提供基于绑定注册表的依赖注入容器 [`Injector`]：
//!
//! - 以类型和名称绑定固定实例或实现类型
//! - 按 精确 → 可赋值 → 基本类型对 的规则解析实例
//! - 通过反射目录实例化类型、调用方法并注入参数
//! - 循环依赖检测与解析深度限制

pub mod builder;
pub mod injector;
pub mod registry;

pub use builder::InjectorBuilder;
pub use injector::Injector;
pub use registry::{Binding, BindingMatch, BindingRegistry, MatchKind};

pub use di_abstractions::{Inject, InjectExt, DEFAULT_NAME};
