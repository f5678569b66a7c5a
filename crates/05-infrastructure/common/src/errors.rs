//! 错误类型定义

use thiserror::Error;

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件读取失败: {source}")]
    FileReadError {
        #[from]
        source: std::io::Error,
    },

    #[error("配置解析失败: {source}")]
    ParseError {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("配置验证失败: {message}")]
    ValidationError { message: String },
}

/// 反射成员（构造函数 / 方法）调用错误
///
/// 由反射层产生，注入器统一包装为 [`InjectionError::InvocationFailed`]。
#[derive(Error, Debug)]
pub enum MemberError {
    #[error("成员不可访问: {member}")]
    Inaccessible { member: String },

    #[error("缺少参数: 第 {index} 个参数 ({expected}) 未能解析")]
    MissingArgument { index: usize, expected: String },

    #[error("参数类型不匹配: 第 {index} 个参数, 期望 {expected}, 实际 {actual}")]
    ArgumentType {
        index: usize,
        expected: String,
        actual: String,
    },

    #[error("参数数量不匹配: 期望至少 {expected} 个, 实际 {actual} 个")]
    ArgumentCount { expected: usize, actual: usize },

    #[error("调用目标类型不匹配: 期望 {expected}, 实际 {actual}")]
    TargetType { expected: String, actual: String },

    #[error("成员执行失败: {source}")]
    Raised {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl MemberError {
    /// 包装成员自身返回的错误
    pub fn raised(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Raised {
            source: source.into(),
        }
    }
}

/// 依赖注入错误类型
#[derive(Error, Debug)]
pub enum InjectionError {
    #[error("参数无效: {argument}, 原因: {message}")]
    InvalidArgument {
        argument: &'static str,
        message: String,
    },

    #[error("调用失败: {member}, 原因: {source}")]
    InvocationFailed {
        member: String,
        #[source]
        source: MemberError,
    },

    #[error("检测到循环依赖: {chain}")]
    CircularDependency { chain: String },

    #[error("解析深度超过上限 {depth}: {type_name}")]
    ResolutionDepthExceeded { depth: usize, type_name: String },
}

impl InjectionError {
    /// 创建参数无效错误
    pub fn invalid_argument(argument: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            argument,
            message: message.into(),
        }
    }

    /// 包装成员调用错误
    pub fn invocation_failed(member: impl Into<String>, source: MemberError) -> Self {
        Self::InvocationFailed {
            member: member.into(),
            source,
        }
    }

    /// 是否为参数无效错误
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument { .. })
    }
}

/// 结果类型别名
pub type ConfigResult<T> = Result<T, ConfigError>;
pub type InjectionResult<T> = Result<T, InjectionError>;
