//! # Injectable Macros
//!
//! 为依赖注入容器生成类型描述符的过程宏。
//!
//! ## 核心宏
//!
//! - [`Injectable`](macro@Injectable) - 派生 `di_abstractions::Reflect`
//!
//! ## 使用示例
//!
//! ```ignore
//! use di_abstractions::{InjectExt, TypeDescriptorBuilder};
//! use injectable_macros::Injectable;
//! use std::sync::Arc;
//!
//! trait Repository: Send + Sync {}
//!
//! #[derive(Injectable)]
//! #[injectable(upcast(dyn Repository))]
//! pub struct MemoryRepository;
//!
//! impl Repository for MemoryRepository {}
//!
//! #[derive(Injectable)]
//! pub struct UserService {
//!     repository: Arc<dyn Repository>,
//!     #[inject(named = "greeting")]
//!     greeting: Option<Arc<String>>,
//! }
//! ```

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

mod injectable;
mod utils;

/// 可注入类型派生宏
///
/// 为结构体实现 `Reflect`：生成一个公有构造函数，参数为各注入字段，按声明顺序排列。
///
/// # 字段
///
/// - `Arc<T>` - 必需参数，未能解析时构造失败
/// - `Option<Arc<T>>` - 可选参数
/// - `#[inject(named = "name")]` - 以指定名称解析
/// - `#[inject(default)]` - 不注入，使用 `Default::default()` 初始化
///
/// # 结构体参数
///
/// - `#[injectable(upcast(dyn A, dyn B))]` - 声明可向上转换的 trait 对象
/// - `#[injectable(extend = path)]` - 以
///   `fn(TypeDescriptorBuilder<Self>) -> TypeDescriptorBuilder<Self>` 补充描述符，
///   通常用于注册方法
///
/// # 示例
///
/// ```ignore
/// #[derive(Injectable)]
/// #[injectable(upcast(dyn Notifier), extend = notifier_methods)]
/// pub struct MailNotifier {
///     #[inject(named = "smtp")]
///     host: Arc<String>,
///     #[inject(default)]
///     sent: AtomicUsize,
/// }
/// ```
#[proc_macro_derive(Injectable, attributes(injectable, inject))]
pub fn derive_injectable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    injectable::derive_injectable_impl(input)
}
