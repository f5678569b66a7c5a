//! 依赖注入容器
//!
//! [`Injector`] 持有绑定注册表与反射目录，按匹配规则解析实例，
//! 并在实例化与方法调用时从注册表注入参数。

use crate::builder::InjectorBuilder;
use crate::registry::{Binding, BindingRegistry};
use di_abstractions::{
    AccessOverride, Accessible, Arguments, ContainerConfig, ConstructorReflection, Inject,
    Instance, MethodReflection, ParameterReflection, ReflectionCatalog, ResolveContext,
    ResolveOptions, TypeShape, DEFAULT_NAME,
};
use infrastructure_common::{InjectionError, InjectionResult, TypeInfo};
use parking_lot::RwLock;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace, warn};

struct InjectorInner {
    registry: RwLock<BindingRegistry>,
    catalog: ReflectionCatalog,
    config: ContainerConfig,
}

/// 依赖注入容器
///
/// 克隆得到的句柄共享同一份注册表。
#[derive(Clone)]
pub struct Injector {
    inner: Arc<InjectorInner>,
}

impl Injector {
    /// 使用内置类型目录和默认配置创建容器
    pub fn new() -> Self {
        Self::from_parts(ReflectionCatalog::with_builtins(), ContainerConfig::default())
    }

    /// 创建容器构建器
    pub fn builder() -> InjectorBuilder {
        InjectorBuilder::new()
    }

    /// 由目录和配置直接组装容器，不做配置验证
    pub fn from_parts(catalog: ReflectionCatalog, config: ContainerConfig) -> Self {
        let injector = Self {
            inner: Arc::new(InjectorInner {
                registry: RwLock::new(BindingRegistry::new()),
                catalog,
                config,
            }),
        };
        if injector.inner.config.bind_self {
            injector.bind_container();
        }
        injector
    }

    /// 容器配置
    pub fn config(&self) -> &ContainerConfig {
        &self.inner.config
    }

    /// 已绑定的类型
    pub fn registered_types(&self) -> Vec<TypeInfo> {
        self.inner.registry.read().types()
    }

    /// `ty` 在 `name` 下是否存在精确绑定
    pub fn is_bound_by_type(&self, ty: TypeInfo, name: &str) -> bool {
        self.inner.registry.read().contains(&ty, name)
    }

    /// `T` 在默认名称下是否存在精确绑定
    pub fn is_bound<T: ?Sized + 'static>(&self) -> bool {
        self.is_bound_by_type(TypeInfo::of::<T>(), DEFAULT_NAME)
    }

    fn bind_container(&self) {
        self.inner.registry.write().insert(
            TypeInfo::of::<dyn Inject>(),
            DEFAULT_NAME,
            Binding::Container,
        );
    }

    fn owner_key(&self) -> usize {
        Arc::as_ptr(&self.inner) as usize
    }

    fn produce(&self, binding: Binding) -> InjectionResult<Option<Instance>> {
        match binding {
            Binding::Value(instance) => Ok(Some(instance)),
            Binding::Class(implementation) => self.instantiate_by_type(implementation),
            Binding::Container => {
                let container: Arc<dyn Inject> = Arc::new(self.clone());
                Ok(Some(Instance::new(container)))
            }
        }
    }

    fn resolve_arguments(&self, parameters: &[ParameterReflection]) -> InjectionResult<Arguments> {
        let values = parameters
            .iter()
            .map(|parameter| {
                let name = parameter.qualifier.as_deref().unwrap_or(DEFAULT_NAME);
                self.resolve_by_type(parameter.type_info, name)
            })
            .collect::<InjectionResult<Vec<_>>>()?;
        Ok(Arguments::new(values))
    }

    fn enter(&self, ty: TypeInfo) -> InjectionResult<Option<ResolutionGuard>> {
        let options = ResolveOptions::from(&self.inner.config);
        if !options.is_guarded() {
            return Ok(None);
        }
        ResolutionGuard::enter(self.owner_key(), options, ty).map(Some)
    }
}

impl Default for Injector {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Injector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Injector")
            .field("bindings", &self.inner.registry.read().len())
            .field("descriptors", &self.inner.catalog.len())
            .field("config", &self.inner.config)
            .finish()
    }
}

impl Inject for Injector {
    fn bind_value_by_type(&self, ty: TypeInfo, name: &str, value: Instance) -> InjectionResult<()> {
        validate_name(name)?;
        let converted = self.inner.catalog.convert(&value, &ty).ok_or_else(|| {
            InjectionError::invalid_argument(
                "value",
                format!(
                    "{} 的实例不能赋值给 {}",
                    value.type_info().short_name(),
                    ty.short_name()
                ),
            )
        })?;

        debug!("绑定实例: {} [{}]", ty.short_name(), name);
        self.inner
            .registry
            .write()
            .insert(ty, name, Binding::Value(converted));
        Ok(())
    }

    fn bind_class_by_type(
        &self,
        ty: TypeInfo,
        name: &str,
        implementation: TypeInfo,
    ) -> InjectionResult<()> {
        validate_name(name)?;
        let catalog = &self.inner.catalog;
        if !catalog.contains(&implementation) {
            return Err(InjectionError::invalid_argument(
                "implementation",
                format!("{} 没有类型描述", implementation.short_name()),
            ));
        }
        if !catalog.is_assignable(&ty, &implementation) {
            return Err(InjectionError::invalid_argument(
                "implementation",
                format!(
                    "{} 不能赋值给 {}",
                    implementation.short_name(),
                    ty.short_name()
                ),
            ));
        }

        debug!(
            "绑定实现类型: {} [{}] -> {}",
            ty.short_name(),
            name,
            implementation.short_name()
        );
        self.inner
            .registry
            .write()
            .insert(ty, name, Binding::Class(implementation));
        Ok(())
    }

    fn unbind_by_type(&self, ty: TypeInfo) {
        let removed = self.inner.registry.write().remove_type(&ty);
        if removed > 0 {
            debug!("解除绑定: {} ({} 个名称)", ty.short_name(), removed);
        }
    }

    fn unbind_all(&self) {
        let mut registry = self.inner.registry.write();
        debug!("清空全部绑定: {} 个", registry.len());
        registry.clear();
    }

    fn resolve_by_type(&self, ty: TypeInfo, name: &str) -> InjectionResult<Option<Instance>> {
        validate_name(name)?;
        let found = self
            .inner
            .registry
            .read()
            .find(&ty, name, &self.inner.catalog);
        let Some(found) = found else {
            trace!("未找到绑定: {} [{}]", ty.short_name(), name);
            return Ok(None);
        };

        trace!(
            "解析 {} [{}]: 使用 {} ({:?})",
            ty.short_name(),
            name,
            found.bound_type.short_name(),
            found.kind
        );
        let produced = self.produce(found.binding)?;
        Ok(produced.and_then(|instance| self.inner.catalog.convert(&instance, &ty)))
    }

    fn instantiate_by_type(&self, ty: TypeInfo) -> InjectionResult<Option<Instance>> {
        let descriptor = self.inner.catalog.describe(&ty).ok_or_else(|| {
            InjectionError::invalid_argument("type", format!("{} 没有类型描述", ty.short_name()))
        })?;

        match descriptor.shape() {
            TypeShape::Sequence { empty, .. } => return Ok(Some(empty())),
            TypeShape::Abstract => return Ok(None),
            TypeShape::Concrete => {}
        }
        let Some(constructor) = select_constructor(descriptor.constructors()) else {
            return Ok(None);
        };
        debug!(
            "实例化 {}: 选用 {} 个参数的构造函数",
            ty.short_name(),
            constructor.parameter_count()
        );

        let _guard = self.enter(ty)?;
        let arguments = self.resolve_arguments(constructor.parameters())?;
        let _access = AccessOverride::acquire(&**constructor);
        constructor
            .invoke(&arguments)
            .map(Some)
            .map_err(|e| InjectionError::invocation_failed(constructor.member_name(), e))
    }

    fn invoke_method(
        &self,
        target: &Instance,
        method: &MethodReflection,
    ) -> InjectionResult<Option<Instance>> {
        if method.is_associated() {
            return Err(InjectionError::invalid_argument(
                "method",
                format!("{} 是关联函数", method.member_name()),
            ));
        }
        if target.type_info() != method.declaring_type() {
            return Err(InjectionError::invalid_argument(
                "target",
                format!(
                    "{} 不是 {} 的声明类型",
                    target.type_info().short_name(),
                    method.member_name()
                ),
            ));
        }

        trace!("调用方法: {}", method.member_name());
        let arguments = self.resolve_arguments(method.parameters())?;
        let _access = AccessOverride::acquire(method);
        method
            .invoke(Some(target), &arguments)
            .map_err(|e| InjectionError::invocation_failed(method.member_name(), e))
    }

    fn invoke_associated_method(
        &self,
        method: &MethodReflection,
    ) -> InjectionResult<Option<Instance>> {
        if !method.is_associated() {
            return Err(InjectionError::invalid_argument(
                "method",
                format!("{} 需要目标实例", method.member_name()),
            ));
        }

        trace!("调用关联函数: {}", method.member_name());
        let arguments = self.resolve_arguments(method.parameters())?;
        let _access = AccessOverride::acquire(method);
        method
            .invoke(None, &arguments)
            .map_err(|e| InjectionError::invocation_failed(method.member_name(), e))
    }

    fn catalog(&self) -> &ReflectionCatalog {
        &self.inner.catalog
    }
}

/// 零参数构造函数优先，其次参数最少者；数量相同取先声明的
fn select_constructor(
    constructors: &[Arc<ConstructorReflection>],
) -> Option<&Arc<ConstructorReflection>> {
    constructors
        .iter()
        .min_by_key(|constructor| constructor.parameter_count())
}

fn validate_name(name: &str) -> InjectionResult<()> {
    if name.is_empty() {
        return Err(InjectionError::invalid_argument("name", "绑定名称不能为空"));
    }
    Ok(())
}

thread_local! {
    static RESOLUTION_CONTEXTS: RefCell<HashMap<usize, ResolveContext>> =
        RefCell::new(HashMap::new());
}

/// 当前线程上某个容器的解析链守卫
///
/// 进入时把类型压入解析链，析构时弹出；链为空时移除该容器的上下文。
struct ResolutionGuard {
    owner: usize,
}

impl ResolutionGuard {
    fn enter(owner: usize, options: ResolveOptions, ty: TypeInfo) -> InjectionResult<Self> {
        RESOLUTION_CONTEXTS.with(|contexts| {
            let mut contexts = contexts.borrow_mut();
            let context = contexts
                .entry(owner)
                .or_insert_with(|| ResolveContext::new(options));
            let pushed = context.push_type(ty);
            let empty = context.depth() == 0;
            if empty {
                contexts.remove(&owner);
            }
            pushed
        })
        .inspect_err(|e| {
            if let InjectionError::CircularDependency { chain } = e {
                warn!("检测到循环依赖: {}", chain);
            }
        })?;
        Ok(Self { owner })
    }
}

impl Drop for ResolutionGuard {
    fn drop(&mut self) {
        let _ = RESOLUTION_CONTEXTS.try_with(|contexts| {
            let mut contexts = contexts.borrow_mut();
            if let Some(context) = contexts.get_mut(&self.owner) {
                context.pop_type();
                if context.depth() == 0 {
                    contexts.remove(&self.owner);
                }
            }
        });
    }
}
