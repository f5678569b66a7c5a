//! # Infrastructure Common
//!
//! 依赖注入容器各 crate 共用的错误类型与类型元数据。
//!
//! ## 核心类型
//!
//! - [`TypeInfo`] - 类型的运行时标识
//! - [`InjectionError`] - 依赖注入错误
//! - [`MemberError`] - 反射成员调用错误
//! - [`ConfigError`] - 容器配置错误

pub mod errors;
pub mod metadata;

pub use errors::*;
pub use metadata::*;
