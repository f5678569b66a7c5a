//! 容器构建器

use crate::injector::Injector;
use di_abstractions::{ContainerConfig, Reflect, ReflectionCatalog, TypeDescriptor};
use infrastructure_common::ConfigResult;
use tracing::debug;

/// [`Injector`] 构建器
///
/// 默认携带内置类型目录（基本类型、装箱类型、`String`、`Vec<E>`）与默认配置。
#[derive(Debug)]
pub struct InjectorBuilder {
    catalog: ReflectionCatalog,
    config: ContainerConfig,
}

impl InjectorBuilder {
    pub fn new() -> Self {
        Self {
            catalog: ReflectionCatalog::with_builtins(),
            config: ContainerConfig::default(),
        }
    }

    /// 替换整个反射目录
    pub fn catalog(mut self, catalog: ReflectionCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// 注册实现了 [`Reflect`] 的类型
    pub fn register<T: Reflect>(mut self) -> Self {
        self.catalog.register::<T>();
        self
    }

    /// 注册手写的类型描述符
    pub fn register_descriptor(mut self, descriptor: TypeDescriptor) -> Self {
        self.catalog.register_descriptor(descriptor);
        self
    }

    pub fn config(mut self, config: ContainerConfig) -> Self {
        self.config = config;
        self
    }

    /// 验证配置并构建容器
    pub fn build(self) -> ConfigResult<Injector> {
        self.config.validate()?;
        debug!(
            "构建容器完成，类型描述 {} 个，配置 {:?}",
            self.catalog.len(),
            self.config
        );
        Ok(Injector::from_parts(self.catalog, self.config))
    }
}

impl Default for InjectorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
