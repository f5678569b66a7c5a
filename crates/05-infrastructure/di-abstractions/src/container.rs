//! 依赖注入容器抽象接口
//!
//! 提供依赖注入容器的核心抽象：类型擦除的 [`Inject`]，以及在其之上的泛型便捷接口 [`InjectExt`]。

use crate::catalog::ReflectionCatalog;
use crate::instance::Instance;
use crate::reflection::MethodReflection;
use infrastructure_common::{ConfigError, ConfigResult, InjectionError, InjectionResult, TypeInfo};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// 默认绑定名称
///
/// 未指定名称的绑定与以该名称绑定的条目占用同一个位置。
pub const DEFAULT_NAME: &str = "__default__";

/// 依赖注入容器 trait
///
/// 对象安全，容器可以以 `Arc<dyn Inject>` 的形式注入到它构造的对象中。
pub trait Inject: Send + Sync {
    /// 以 `ty` 类型、`name` 名称绑定一个固定实例
    fn bind_value_by_type(&self, ty: TypeInfo, name: &str, value: Instance) -> InjectionResult<()>;

    /// 以 `ty` 类型、`name` 名称绑定实现类型，每次解析都会重新实例化
    fn bind_class_by_type(
        &self,
        ty: TypeInfo,
        name: &str,
        implementation: TypeInfo,
    ) -> InjectionResult<()>;

    /// 移除类型的全部绑定
    fn unbind_by_type(&self, ty: TypeInfo);

    /// 清空全部绑定
    fn unbind_all(&self);

    /// 解析实例，未找到匹配的绑定时返回 `Ok(None)`
    fn resolve_by_type(&self, ty: TypeInfo, name: &str) -> InjectionResult<Option<Instance>>;

    /// 实例化类型并注入构造函数参数
    fn instantiate_by_type(&self, ty: TypeInfo) -> InjectionResult<Option<Instance>>;

    /// 在目标实例上调用方法并注入参数
    fn invoke_method(
        &self,
        target: &Instance,
        method: &MethodReflection,
    ) -> InjectionResult<Option<Instance>>;

    /// 调用关联函数并注入参数
    fn invoke_associated_method(
        &self,
        method: &MethodReflection,
    ) -> InjectionResult<Option<Instance>>;

    /// 容器使用的反射目录
    fn catalog(&self) -> &ReflectionCatalog;
}

/// [`Inject`] 的泛型便捷接口
pub trait InjectExt: Inject {
    /// 以默认名称绑定实例
    fn bind<T>(&self, value: Arc<T>) -> InjectionResult<()>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.bind_named(DEFAULT_NAME, value)
    }

    /// 以指定名称绑定实例
    fn bind_named<T>(&self, name: &str, value: Arc<T>) -> InjectionResult<()>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.bind_value_by_type(TypeInfo::of::<T>(), name, Instance::new(value))
    }

    /// 以默认名称绑定实现类型
    fn bind_class<T, I>(&self) -> InjectionResult<()>
    where
        T: ?Sized + 'static,
        I: ?Sized + 'static,
    {
        self.bind_class_named::<T, I>(DEFAULT_NAME)
    }

    /// 以指定名称绑定实现类型
    fn bind_class_named<T, I>(&self, name: &str) -> InjectionResult<()>
    where
        T: ?Sized + 'static,
        I: ?Sized + 'static,
    {
        self.bind_class_by_type(TypeInfo::of::<T>(), name, TypeInfo::of::<I>())
    }

    /// 移除类型的全部绑定
    fn unbind<T>(&self)
    where
        T: ?Sized + 'static,
    {
        self.unbind_by_type(TypeInfo::of::<T>());
    }

    /// 以默认名称解析实例
    fn get_instance<T>(&self) -> InjectionResult<Option<Arc<T>>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.get_instance_named(DEFAULT_NAME)
    }

    /// 以指定名称解析实例
    fn get_instance_named<T>(&self, name: &str) -> InjectionResult<Option<Arc<T>>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        Ok(self
            .resolve_by_type(TypeInfo::of::<T>(), name)?
            .and_then(|instance| instance.downcast::<T>()))
    }

    /// 实例化 `T`
    fn instantiate<T>(&self) -> InjectionResult<Option<Arc<T>>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        Ok(self
            .instantiate_by_type(TypeInfo::of::<T>())?
            .and_then(|instance| instance.downcast::<T>()))
    }

    /// 按名称调用 `target` 上的方法
    fn invoke<T>(&self, target: &Arc<T>, method: &str) -> InjectionResult<Option<Instance>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let method = self
            .catalog()
            .method(&TypeInfo::of::<T>(), method)
            .ok_or_else(|| missing_method::<T>(method))?;
        self.invoke_method(&Instance::new(Arc::clone(target)), &method)
    }

    /// 按名称调用 `T` 的关联函数
    fn invoke_associated<T>(&self, method: &str) -> InjectionResult<Option<Instance>>
    where
        T: ?Sized + 'static,
    {
        let method = self
            .catalog()
            .method(&TypeInfo::of::<T>(), method)
            .ok_or_else(|| missing_method::<T>(method))?;
        self.invoke_associated_method(&method)
    }
}

impl<C: Inject + ?Sized> InjectExt for C {}

fn missing_method<T: ?Sized + 'static>(method: &str) -> InjectionError {
    InjectionError::invalid_argument(
        "method",
        format!("{} 未声明方法 {}", TypeInfo::of::<T>().short_name(), method),
    )
}

/// 容器配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    /// 是否启用循环依赖检测
    pub circular_dependency_detection: bool,
    /// 最大解析深度，0 表示不限制
    pub max_resolution_depth: usize,
    /// 是否把容器自身绑定为 `dyn Inject`
    pub bind_self: bool,
}

impl ContainerConfig {
    /// 解析深度上限的最大允许值
    pub const MAX_DEPTH_LIMIT: usize = 10_000;

    /// 从 TOML 文本加载
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::ParseError {
            source: Box::new(e),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// 从 TOML 文件加载
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_resolution_depth > Self::MAX_DEPTH_LIMIT {
            return Err(ConfigError::ValidationError {
                message: format!(
                    "max_resolution_depth 不能超过 {}, 实际为 {}",
                    Self::MAX_DEPTH_LIMIT,
                    self.max_resolution_depth
                ),
            });
        }
        Ok(())
    }
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            circular_dependency_detection: true,
            max_resolution_depth: 64,
            bind_self: true,
        }
    }
}
