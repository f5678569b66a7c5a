//! 反射能力抽象
//!
//! Rust 没有运行时反射，类型的构造函数、方法、参数以及向上转换关系
//! 通过 [`TypeDescriptor`] 静态登记（手写 builder 或 `#[derive(Injectable)]`）。
//! 注入器只通过这些描述符查询和调用成员。

use crate::instance::{Arguments, Instance};
use infrastructure_common::{MemberError, TypeInfo};
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// 参数描述
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterReflection {
    /// 声明类型
    pub type_info: TypeInfo,
    /// 名称限定（对应 `#[inject(named = "...")]`）
    pub qualifier: Option<String>,
}

impl ParameterReflection {
    /// 未限定名称的参数
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            type_info: TypeInfo::of::<T>(),
            qualifier: None,
        }
    }

    /// 带名称限定的参数
    pub fn named<T: ?Sized + 'static>(qualifier: impl Into<String>) -> Self {
        Self {
            type_info: TypeInfo::of::<T>(),
            qualifier: Some(qualifier.into()),
        }
    }
}

/// 成员可见性
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

/// 可临时提升访问权限的成员
pub trait Accessible {
    /// 成员名称，用于错误信息
    fn member_name(&self) -> String;

    /// 当前是否可以调用
    fn is_accessible(&self) -> bool;

    /// 增加一层访问覆盖
    fn grant_access(&self);

    /// 撤销一层访问覆盖，必须与 `grant_access` 成对调用
    fn revoke_access(&self);
}

/// 访问覆盖守卫
///
/// 创建时提升成员的访问权限，析构时撤销（包括调用失败和 panic 展开）。
/// 覆盖按层计数，多个线程交错持有守卫时，最后一个守卫释放后成员才恢复不可访问。
pub struct AccessOverride<'a> {
    member: &'a dyn Accessible,
}

impl<'a> AccessOverride<'a> {
    pub fn acquire(member: &'a dyn Accessible) -> Self {
        member.grant_access();
        Self { member }
    }
}

impl Drop for AccessOverride<'_> {
    fn drop(&mut self) {
        self.member.revoke_access();
    }
}

/// 访问控制状态
#[derive(Debug, Default)]
struct AccessState {
    visibility: Visibility,
    overrides: AtomicUsize,
}

impl AccessState {
    fn is_accessible(&self) -> bool {
        self.visibility == Visibility::Public || self.overrides.load(Ordering::Acquire) > 0
    }

    fn grant(&self) {
        self.overrides.fetch_add(1, Ordering::AcqRel);
    }

    fn revoke(&self) {
        // 未配对的撤销不会让计数回绕
        let _ = self
            .overrides
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |count| count.checked_sub(1));
    }
}

type ConstructorFn = Arc<dyn Fn(&Arguments) -> Result<Instance, MemberError> + Send + Sync>;
type MethodFn =
    Arc<dyn Fn(Option<&Instance>, &Arguments) -> Result<Option<Instance>, MemberError> + Send + Sync>;

/// 构造函数描述
pub struct ConstructorReflection {
    declaring: TypeInfo,
    parameters: Vec<ParameterReflection>,
    access: AccessState,
    invoke: ConstructorFn,
}

impl ConstructorReflection {
    /// 描述 `T` 的一个构造函数
    pub fn new<T, F>(parameters: Vec<ParameterReflection>, construct: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&Arguments) -> Result<T, MemberError> + Send + Sync + 'static,
    {
        Self {
            declaring: TypeInfo::of::<T>(),
            parameters,
            access: AccessState::default(),
            invoke: Arc::new(move |args: &Arguments| construct(args).map(|value| Instance::new(Arc::new(value)))),
        }
    }

    /// 设置可见性
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.access.visibility = visibility;
        self
    }

    pub fn declaring_type(&self) -> TypeInfo {
        self.declaring
    }

    pub fn parameters(&self) -> &[ParameterReflection] {
        &self.parameters
    }

    pub fn parameter_count(&self) -> usize {
        self.parameters.len()
    }

    pub fn visibility(&self) -> Visibility {
        self.access.visibility
    }

    /// 调用构造函数
    pub fn invoke(&self, args: &Arguments) -> Result<Instance, MemberError> {
        if !self.access.is_accessible() {
            return Err(MemberError::Inaccessible {
                member: self.member_name(),
            });
        }
        (self.invoke)(args)
    }
}

impl Accessible for ConstructorReflection {
    fn member_name(&self) -> String {
        format!(
            "{}::<constructor/{}>",
            self.declaring.short_name(),
            self.parameters.len()
        )
    }

    fn is_accessible(&self) -> bool {
        self.access.is_accessible()
    }

    fn grant_access(&self) {
        self.access.grant();
    }

    fn revoke_access(&self) {
        self.access.revoke();
    }
}

impl fmt::Debug for ConstructorReflection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorReflection")
            .field("declaring", &self.declaring.short_name())
            .field("parameters", &self.parameters)
            .field("access", &self.access)
            .finish()
    }
}

/// 方法描述
pub struct MethodReflection {
    declaring: TypeInfo,
    name: String,
    associated: bool,
    parameters: Vec<ParameterReflection>,
    access: AccessState,
    invoke: MethodFn,
}

impl MethodReflection {
    /// 描述 `T` 的实例方法
    pub fn new<T, F>(name: impl Into<String>, parameters: Vec<ParameterReflection>, method: F) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&T, &Arguments) -> Result<Option<Instance>, MemberError> + Send + Sync + 'static,
    {
        Self {
            declaring: TypeInfo::of::<T>(),
            name: name.into(),
            associated: false,
            parameters,
            access: AccessState::default(),
            invoke: Arc::new(move |target: Option<&Instance>, args: &Arguments| {
                let target = target.ok_or_else(|| MemberError::TargetType {
                    expected: TypeInfo::of::<T>().short_name(),
                    actual: "<none>".to_string(),
                })?;
                let receiver = target
                    .downcast::<T>()
                    .ok_or_else(|| MemberError::TargetType {
                        expected: TypeInfo::of::<T>().short_name(),
                        actual: target.type_info().short_name(),
                    })?;
                method(&*receiver, args)
            }),
        }
    }

    /// 描述 `T` 的关联函数（无接收者）
    pub fn associated<T, F>(
        name: impl Into<String>,
        parameters: Vec<ParameterReflection>,
        function: F,
    ) -> Self
    where
        T: ?Sized + 'static,
        F: Fn(&Arguments) -> Result<Option<Instance>, MemberError> + Send + Sync + 'static,
    {
        Self {
            declaring: TypeInfo::of::<T>(),
            name: name.into(),
            associated: true,
            parameters,
            access: AccessState::default(),
            invoke: Arc::new(move |_: Option<&Instance>, args: &Arguments| function(args)),
        }
    }

    /// 设置可见性
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.access.visibility = visibility;
        self
    }

    pub fn declaring_type(&self) -> TypeInfo {
        self.declaring
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 是否为关联函数
    pub fn is_associated(&self) -> bool {
        self.associated
    }

    pub fn parameters(&self) -> &[ParameterReflection] {
        &self.parameters
    }

    pub fn visibility(&self) -> Visibility {
        self.access.visibility
    }

    /// 调用方法；实例方法需要 `target`
    pub fn invoke(
        &self,
        target: Option<&Instance>,
        args: &Arguments,
    ) -> Result<Option<Instance>, MemberError> {
        if !self.access.is_accessible() {
            return Err(MemberError::Inaccessible {
                member: self.member_name(),
            });
        }
        (self.invoke)(target, args)
    }
}

impl Accessible for MethodReflection {
    fn member_name(&self) -> String {
        format!("{}::{}", self.declaring.short_name(), self.name)
    }

    fn is_accessible(&self) -> bool {
        self.access.is_accessible()
    }

    fn grant_access(&self) {
        self.access.grant();
    }

    fn revoke_access(&self) {
        self.access.revoke();
    }
}

impl fmt::Debug for MethodReflection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodReflection")
            .field("declaring", &self.declaring.short_name())
            .field("name", &self.name)
            .field("associated", &self.associated)
            .field("parameters", &self.parameters)
            .field("access", &self.access)
            .finish()
    }
}

/// 类型形态
#[derive(Debug, Clone, Copy)]
pub enum TypeShape {
    /// 可通过构造函数实例化
    Concrete,
    /// trait 对象等不可实例化的类型
    Abstract,
    /// `Vec<E>`，实例化时得到空序列
    Sequence {
        element: TypeInfo,
        empty: fn() -> Instance,
    },
}

type UpcastFn = Arc<dyn Fn(&Instance) -> Option<Instance> + Send + Sync>;

/// 声明的向上转换 `Arc<B> -> Arc<R>`
#[derive(Clone)]
pub struct Upcast {
    target: TypeInfo,
    convert: UpcastFn,
}

impl Upcast {
    pub fn new<B, R>(cast: fn(Arc<B>) -> Arc<R>) -> Self
    where
        B: ?Sized + Send + Sync + 'static,
        R: ?Sized + Send + Sync + 'static,
    {
        Self {
            target: TypeInfo::of::<R>(),
            convert: Arc::new(move |instance: &Instance| instance.downcast::<B>().map(|value| Instance::new(cast(value)))),
        }
    }

    pub fn target(&self) -> TypeInfo {
        self.target
    }

    /// 转换实例，来源类型不符时返回 `None`
    pub fn apply(&self, instance: &Instance) -> Option<Instance> {
        (self.convert)(instance)
    }
}

impl fmt::Debug for Upcast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Upcast")
            .field("target", &self.target.short_name())
            .finish()
    }
}

/// 类型描述符
#[derive(Debug)]
pub struct TypeDescriptor {
    type_info: TypeInfo,
    shape: TypeShape,
    constructors: Vec<Arc<ConstructorReflection>>,
    methods: Vec<Arc<MethodReflection>>,
    upcasts: Vec<Upcast>,
}

impl TypeDescriptor {
    /// 开始描述类型 `T`
    pub fn builder<T>() -> TypeDescriptorBuilder<T>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        TypeDescriptorBuilder {
            descriptor: TypeDescriptor {
                type_info: TypeInfo::of::<T>(),
                shape: TypeShape::Concrete,
                constructors: Vec::new(),
                methods: Vec::new(),
                upcasts: Vec::new(),
            },
            _marker: PhantomData,
        }
    }

    /// 描述 `Vec<E>`
    pub fn sequence<E>() -> TypeDescriptor
    where
        E: Send + Sync + 'static,
    {
        let mut descriptor = Self::builder::<Vec<E>>().descriptor;
        descriptor.shape = TypeShape::Sequence {
            element: TypeInfo::of::<E>(),
            empty: || Instance::new(Arc::new(Vec::<E>::new())),
        };
        descriptor
    }

    pub fn type_info(&self) -> TypeInfo {
        self.type_info
    }

    pub fn shape(&self) -> TypeShape {
        self.shape
    }

    pub fn constructors(&self) -> &[Arc<ConstructorReflection>] {
        &self.constructors
    }

    pub fn methods(&self) -> &[Arc<MethodReflection>] {
        &self.methods
    }

    /// 按名称查找方法
    pub fn method(&self, name: &str) -> Option<&Arc<MethodReflection>> {
        self.methods.iter().find(|method| method.name() == name)
    }

    pub fn upcasts(&self) -> &[Upcast] {
        &self.upcasts
    }
}

/// 类型描述符构建器
pub struct TypeDescriptorBuilder<T: ?Sized> {
    descriptor: TypeDescriptor,
    _marker: PhantomData<fn(Arc<T>)>,
}

impl<T> TypeDescriptorBuilder<T>
where
    T: ?Sized + Send + Sync + 'static,
{
    /// 标记为不可实例化
    pub fn abstract_type(mut self) -> Self {
        self.descriptor.shape = TypeShape::Abstract;
        self
    }

    /// 添加构造函数
    pub fn constructor(mut self, constructor: ConstructorReflection) -> Self {
        self.descriptor.constructors.push(Arc::new(constructor));
        self
    }

    /// 添加方法
    pub fn method(mut self, method: MethodReflection) -> Self {
        self.descriptor.methods.push(Arc::new(method));
        self
    }

    /// 声明 `T` 可以向上转换为 `S`
    pub fn upcast<S>(mut self, cast: fn(Arc<T>) -> Arc<S>) -> Self
    where
        S: ?Sized + Send + Sync + 'static,
    {
        self.descriptor.upcasts.push(Upcast::new::<T, S>(cast));
        self
    }

    pub fn build(self) -> TypeDescriptor {
        self.descriptor
    }
}

impl<T> TypeDescriptorBuilder<T>
where
    T: Default + Send + Sync + 'static,
{
    /// 以 `Default::default` 作为无参构造函数
    pub fn default_constructor(self) -> Self {
        self.constructor(ConstructorReflection::new::<T, _>(Vec::new(), |_| Ok(T::default())))
    }
}

/// 可以描述自身的类型
///
/// 通常由 `#[derive(Injectable)]` 生成。
pub trait Reflect: Send + Sync + 'static {
    fn describe() -> TypeDescriptor;
}
