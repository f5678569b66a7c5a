//! 解析上下文
//!
//! 记录正在实例化的类型链，用于检测循环依赖与限制解析深度。

use crate::container::ContainerConfig;
use infrastructure_common::{InjectionError, TypeInfo};

/// 解析上下文
#[derive(Debug, Clone)]
pub struct ResolveContext {
    /// 当前解析链
    pub resolution_chain: Vec<TypeInfo>,
    /// 解析选项
    pub options: ResolveOptions,
}

impl ResolveContext {
    /// 创建新的解析上下文
    pub fn new(options: ResolveOptions) -> Self {
        Self {
            resolution_chain: Vec::new(),
            options,
        }
    }

    /// 添加类型到解析链
    pub fn push_type(&mut self, type_info: TypeInfo) -> Result<(), InjectionError> {
        if self.options.detect_cycles && self.resolution_chain.contains(&type_info) {
            return Err(InjectionError::CircularDependency {
                chain: self.describe_chain(type_info),
            });
        }
        if self.options.max_depth > 0 && self.resolution_chain.len() >= self.options.max_depth {
            return Err(InjectionError::ResolutionDepthExceeded {
                depth: self.options.max_depth,
                type_name: type_info.short_name(),
            });
        }
        self.resolution_chain.push(type_info);
        Ok(())
    }

    /// 从解析链中移除类型
    pub fn pop_type(&mut self) {
        self.resolution_chain.pop();
    }

    /// 当前解析深度
    pub fn depth(&self) -> usize {
        self.resolution_chain.len()
    }

    fn describe_chain(&self, closing: TypeInfo) -> String {
        self.resolution_chain
            .iter()
            .chain(std::iter::once(&closing))
            .map(TypeInfo::short_name)
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}

/// 解析选项
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveOptions {
    /// 是否检测循环依赖
    pub detect_cycles: bool,
    /// 最大递归深度，0 表示不限制
    pub max_depth: usize,
}

impl ResolveOptions {
    /// 是否需要跟踪解析链
    pub fn is_guarded(&self) -> bool {
        self.detect_cycles || self.max_depth > 0
    }
}

impl Default for ResolveOptions {
    fn default() -> Self {
        ContainerConfig::default().into()
    }
}

impl From<&ContainerConfig> for ResolveOptions {
    fn from(config: &ContainerConfig) -> Self {
        Self {
            detect_cycles: config.circular_dependency_detection,
            max_depth: config.max_resolution_depth,
        }
    }
}

impl From<ContainerConfig> for ResolveOptions {
    fn from(config: ContainerConfig) -> Self {
        Self::from(&config)
    }
}
