//! Injector 集成测试：绑定、匹配规则、实例化与方法注入

use anyhow::Result;
use di_abstractions::{
    AccessOverride, Accessible, ContainerConfig, Inject, InjectExt, Instance, MemberError,
    TypeInfo, DEFAULT_NAME,
};
use di_impl::Injector;
use di_impl_integration_tests::{
    injector, injector_with, same_object, ArrayList, Chicken, Collection, ContainerAware, InjectMe,
    LinkedList, List, Sealed, Slow, Undescribed, SLOW_CONSTRUCTION,
};
use infrastructure_common::InjectionError;
use std::sync::Arc;

fn array_list(items: &[&str]) -> Instance {
    Instance::new(Arc::new(ArrayList::of(items)))
}

#[test]
fn test_mistyped_value_bind() -> Result<()> {
    let injector = injector()?;
    let error = injector
        .bind_value_by_type(
            TypeInfo::of::<dyn List>(),
            DEFAULT_NAME,
            Instance::new(Arc::new(5_i32)),
        )
        .unwrap_err();

    assert!(error.is_invalid_argument());
    Ok(())
}

#[test]
fn test_undescribed_class_bind() -> Result<()> {
    let injector = injector()?;

    assert!(injector
        .bind_class::<dyn List, Undescribed>()
        .unwrap_err()
        .is_invalid_argument());
    Ok(())
}

#[test]
fn test_unassignable_class_bind() -> Result<()> {
    let injector = injector()?;

    assert!(injector
        .bind_class::<dyn List, i32>()
        .unwrap_err()
        .is_invalid_argument());
    assert!(injector
        .bind_class::<ArrayList, dyn List>()
        .unwrap_err()
        .is_invalid_argument());
    Ok(())
}

#[test]
fn test_empty_name_bind() -> Result<()> {
    let injector = injector()?;
    let list: Arc<dyn List> = Arc::new(ArrayList::default());

    assert!(injector
        .bind_named("", list)
        .unwrap_err()
        .is_invalid_argument());
    assert!(injector
        .get_instance_named::<dyn List>("")
        .unwrap_err()
        .is_invalid_argument());
    Ok(())
}

#[test]
fn test_rejected_binds_leave_registry_unchanged() -> Result<()> {
    let injector = injector()?;
    let list = Arc::new(ArrayList::of(&["kept"]));
    injector.bind_value_by_type(
        TypeInfo::of::<dyn List>(),
        DEFAULT_NAME,
        Instance::new(Arc::clone(&list)),
    )?;
    let mut before = injector.registered_types();
    before.sort();

    assert!(injector
        .bind_value_by_type(
            TypeInfo::of::<dyn List>(),
            DEFAULT_NAME,
            Instance::new(Arc::new(5_i32)),
        )
        .unwrap_err()
        .is_invalid_argument());
    assert!(injector
        .bind_class::<dyn List, Undescribed>()
        .unwrap_err()
        .is_invalid_argument());
    let replacement: Arc<dyn List> = Arc::new(LinkedList::default());
    assert!(injector
        .bind_named("", replacement)
        .unwrap_err()
        .is_invalid_argument());

    let retrieved = injector.get_instance::<dyn List>()?.expect("原绑定仍在");
    assert!(same_object(&list, &retrieved));
    assert_eq!(retrieved.items(), vec!["kept".to_string()]);

    let mut after = injector.registered_types();
    after.sort();
    assert_eq!(before, after);
    Ok(())
}

#[test]
fn test_get_default_instance() -> Result<()> {
    let injector = injector()?;
    let list = Arc::new(ArrayList::default());
    injector.bind_value_by_type(
        TypeInfo::of::<dyn List>(),
        DEFAULT_NAME,
        Instance::new(Arc::clone(&list)),
    )?;

    let retrieved = injector.get_instance::<dyn List>()?.expect("已绑定");
    assert!(same_object(&list, &retrieved));
    Ok(())
}

#[test]
fn test_get_named_instance() -> Result<()> {
    let injector = injector()?;
    let list: Arc<dyn List> = Arc::new(ArrayList::default());
    let named_list: Arc<dyn List> = Arc::new(ArrayList::default());
    injector.bind(Arc::clone(&list))?;
    injector.bind_named("myList", Arc::clone(&named_list))?;

    let retrieved = injector
        .get_instance_named::<dyn List>("myList")?
        .expect("已绑定");
    assert!(same_object(&named_list, &retrieved));
    assert!(!same_object(&list, &retrieved));
    Ok(())
}

#[test]
fn test_class_binding_produces_fresh_instances() -> Result<()> {
    let injector = injector()?;
    injector.bind_class::<dyn List, ArrayList>()?;

    let first = injector.get_instance::<dyn List>()?.expect("已绑定");
    let second = injector.get_instance::<dyn List>()?.expect("已绑定");
    assert!(!same_object(&first, &second));
    Ok(())
}

#[test]
fn test_get_named_type() -> Result<()> {
    let injector = injector()?;
    injector.bind_class::<dyn List, ArrayList>()?;
    injector.bind_class_named::<dyn List, LinkedList>("myList")?;

    let retrieved = injector
        .get_instance_named::<dyn List>("myList")?
        .expect("已绑定");
    assert_eq!(retrieved.kind(), "LinkedList");
    Ok(())
}

#[test]
fn test_unbind() -> Result<()> {
    let injector = injector()?;
    injector.bind_class::<dyn List, ArrayList>()?;
    injector.bind_class_named::<dyn List, LinkedList>("myList")?;
    injector.unbind::<dyn List>();

    assert!(injector.get_instance::<dyn List>()?.is_none());
    assert!(injector.get_instance_named::<dyn List>("myList")?.is_none());
    // 未绑定的类型解除绑定不报错
    injector.unbind::<dyn List>();
    Ok(())
}

#[test]
fn test_get_default_supertype() -> Result<()> {
    let injector = injector()?;
    injector.bind_class::<dyn List, ArrayList>()?;

    let retrieved = injector.get_instance::<dyn Collection>()?.expect("可赋值");
    assert_eq!(retrieved.kind(), "ArrayList");
    Ok(())
}

#[test]
fn test_abstract_class_binding_yields_nothing() -> Result<()> {
    let injector = injector()?;
    injector.bind_class::<dyn List, dyn List>()?;

    assert!(injector.get_instance::<dyn Collection>()?.is_none());
    Ok(())
}

#[test]
fn test_get_default_subtype() -> Result<()> {
    let injector = injector()?;
    injector.bind_class::<dyn Collection, ArrayList>()?;

    assert!(injector.get_instance::<dyn List>()?.is_none());
    assert!(injector.get_instance::<dyn Collection>()?.is_some());
    Ok(())
}

#[test]
fn test_rebind_prefers_exact_type() -> Result<()> {
    let injector = injector()?;
    injector.bind_class::<dyn List, ArrayList>()?;
    injector.bind_class::<dyn Collection, LinkedList>()?;

    let retrieved = injector.get_instance::<dyn Collection>()?.expect("已绑定");
    assert_eq!(retrieved.kind(), "LinkedList");
    Ok(())
}

#[test]
fn test_rebind_same_key_overwrites() -> Result<()> {
    let injector = injector()?;
    injector.bind_class::<dyn List, ArrayList>()?;
    injector.bind_class::<dyn List, LinkedList>()?;

    let retrieved = injector.get_instance::<dyn List>()?.expect("已绑定");
    assert_eq!(retrieved.kind(), "LinkedList");
    Ok(())
}

#[test]
fn test_get_primitive_instance() -> Result<()> {
    let injector = injector()?;
    injector.bind(Arc::new(10_i32))?;

    assert_eq!(*injector.get_instance::<i32>()?.expect("已绑定"), 10);
    Ok(())
}

#[test]
fn test_get_primitive_from_boxed() -> Result<()> {
    let injector = injector()?;
    injector.bind(Arc::new(Box::new(10_i32)))?;

    assert_eq!(*injector.get_instance::<i32>()?.expect("基本类型对"), 10);
    Ok(())
}

#[test]
fn test_get_boxed_from_primitive() -> Result<()> {
    let injector = injector()?;
    injector.bind(Arc::new(10_i32))?;

    let boxed = injector.get_instance::<Box<i32>>()?.expect("基本类型对");
    assert_eq!(**boxed, 10);
    Ok(())
}

#[test]
fn test_instantiate() -> Result<()> {
    let injector = injector()?;
    injector.bind(Arc::new(Box::new(10_i32)))?;
    injector.bind_value_by_type(TypeInfo::of::<dyn List>(), DEFAULT_NAME, array_list(&["string"]))?;

    let inject_me = injector.instantiate::<InjectMe>()?.expect("可实例化");
    assert_eq!(inject_me.number(), 10);
    assert_eq!(inject_me.collection().items(), vec!["string".to_string()]);
    assert!(inject_me.message().is_none());
    Ok(())
}

#[test]
fn test_instantiate_undescribed_type() -> Result<()> {
    let injector = injector()?;

    assert!(injector
        .instantiate::<Undescribed>()
        .unwrap_err()
        .is_invalid_argument());
    Ok(())
}

#[test]
fn test_instantiate_trait_object_yields_nothing() -> Result<()> {
    let injector = injector()?;

    assert!(injector.instantiate::<dyn Collection>()?.is_none());
    Ok(())
}

#[test]
fn test_invoke() -> Result<()> {
    let injector = injector()?;
    injector.bind(Arc::new(String::from("message")))?;
    injector.bind_value_by_type(TypeInfo::of::<dyn List>(), DEFAULT_NAME, array_list(&["string"]))?;
    let inject_me = Arc::new(InjectMe::new(10, Arc::new(ArrayList::default())));

    let returned = injector.invoke(&inject_me, "set_values")?;
    assert!(returned.is_none());
    assert_eq!(inject_me.message().as_deref(), Some("message"));
    assert_eq!(inject_me.collection().items(), vec!["string".to_string()]);
    Ok(())
}

#[test]
fn test_invoke_private_method_restores_access() -> Result<()> {
    let injector = injector()?;
    let method = injector
        .catalog()
        .method(&TypeInfo::of::<InjectMe>(), "set_values")
        .expect("已描述");
    let inject_me = Arc::new(InjectMe::new(10, Arc::new(ArrayList::default())));

    // 没有可注入的 String，方法体报告缺少参数
    let error = injector.invoke(&inject_me, "set_values").unwrap_err();
    assert!(matches!(
        error,
        InjectionError::InvocationFailed {
            source: MemberError::MissingArgument { index: 0, .. },
            ..
        }
    ));
    assert!(!method.is_accessible());

    let direct = method.invoke(Some(&Instance::new(inject_me)), &Default::default());
    assert!(matches!(direct, Err(MemberError::Inaccessible { .. })));
    Ok(())
}

#[test]
fn test_invoke_unknown_method() -> Result<()> {
    let injector = injector()?;
    let inject_me = Arc::new(InjectMe::new(10, Arc::new(ArrayList::default())));

    assert!(injector
        .invoke(&inject_me, "missing")
        .unwrap_err()
        .is_invalid_argument());
    Ok(())
}

#[test]
fn test_invoke_rejects_foreign_target() -> Result<()> {
    let injector = injector()?;
    let method = injector
        .catalog()
        .method(&TypeInfo::of::<InjectMe>(), "set_values")
        .expect("已描述");

    assert!(injector
        .invoke_method(&array_list(&[]), &method)
        .unwrap_err()
        .is_invalid_argument());
    Ok(())
}

#[test]
fn test_invoke_associated() -> Result<()> {
    let injector = injector()?;
    injector.bind_named("number", Arc::new(7_i32))?;

    let described = injector
        .invoke_associated::<InjectMe>("describe_number")?
        .and_then(|instance| instance.downcast::<String>())
        .expect("返回字符串");
    assert_eq!(described.as_str(), "number 7");

    let inject_me = Arc::new(InjectMe::new(10, Arc::new(ArrayList::default())));
    assert!(injector
        .invoke(&inject_me, "describe_number")
        .unwrap_err()
        .is_invalid_argument());
    assert!(injector
        .invoke_associated::<InjectMe>("set_values")
        .unwrap_err()
        .is_invalid_argument());
    Ok(())
}

#[test]
fn test_instantiate_sequence_is_empty() -> Result<()> {
    let injector = injector()?;

    let values = injector.instantiate::<Vec<i32>>()?.expect("空序列");
    assert!(values.is_empty());
    Ok(())
}

#[test]
fn test_failed_private_constructor_restores_access() -> Result<()> {
    let injector = injector()?;
    let descriptor = injector
        .catalog()
        .describe(&TypeInfo::of::<Sealed>())
        .expect("已描述");
    let constructor = &descriptor.constructors()[0];

    let error = injector.instantiate::<Sealed>().unwrap_err();
    assert!(matches!(
        error,
        InjectionError::InvocationFailed {
            source: MemberError::Raised { .. },
            ..
        }
    ));
    assert!(!constructor.is_accessible());

    {
        let _access = AccessOverride::acquire(&**constructor);
        assert!(constructor.is_accessible());
    }
    assert!(!constructor.is_accessible());
    Ok(())
}

#[test]
fn test_overlapping_private_constructions_restore_access() -> Result<()> {
    let injector = injector()?;
    let descriptor = injector
        .catalog()
        .describe(&TypeInfo::of::<Slow>())
        .expect("已描述");
    let constructor = &descriptor.constructors()[0];

    std::thread::scope(|scope| {
        let first = injector.clone();
        scope.spawn(move || {
            assert!(first.instantiate::<Slow>().expect("实例化成功").is_some());
        });
        std::thread::sleep(SLOW_CONSTRUCTION / 3);
        let second = injector.clone();
        scope.spawn(move || {
            assert!(second.instantiate::<Slow>().expect("实例化成功").is_some());
        });
    });

    assert!(!constructor.is_accessible());
    Ok(())
}

#[test]
fn test_circular_dependency_is_reported() -> Result<()> {
    let injector = injector()?;
    injector.bind_class::<Chicken, Chicken>()?;
    injector.bind_class::<di_impl_integration_tests::Egg, di_impl_integration_tests::Egg>()?;

    match injector.instantiate::<Chicken>().unwrap_err() {
        InjectionError::CircularDependency { chain } => {
            assert_eq!(chain, "Chicken -> Egg -> Chicken");
        }
        other => panic!("unexpected error: {other}"),
    }

    // 失败后解析链已清空，后续解析不受影响
    injector.bind(Arc::new(1_i32))?;
    assert!(injector.get_instance::<i32>()?.is_some());
    Ok(())
}

#[test]
fn test_depth_limit_without_cycle_detection() -> Result<()> {
    let injector = injector_with(ContainerConfig {
        circular_dependency_detection: false,
        max_resolution_depth: 8,
        ..ContainerConfig::default()
    })?;
    injector.bind_class::<Chicken, Chicken>()?;
    injector.bind_class::<di_impl_integration_tests::Egg, di_impl_integration_tests::Egg>()?;

    assert!(matches!(
        injector.instantiate::<Chicken>(),
        Err(InjectionError::ResolutionDepthExceeded { depth: 8, .. })
    ));
    Ok(())
}

#[test]
fn test_self_injection() -> Result<()> {
    let injector = injector()?;
    injector.bind(Arc::new(String::from("shared")))?;

    let aware = injector.instantiate::<ContainerAware>()?.expect("可实例化");
    let shared = aware.injector.get_instance::<String>()?.expect("同一注册表");
    assert_eq!(shared.as_str(), "shared");

    // 通过注入得到的容器绑定，对原容器可见
    aware.injector.bind_named("late", Arc::new(3_i32))?;
    assert_eq!(*injector.get_instance_named::<i32>("late")?.expect("已绑定"), 3);
    Ok(())
}

#[test]
fn test_self_binding_disabled() -> Result<()> {
    let injector = injector_with(ContainerConfig {
        bind_self: false,
        ..ContainerConfig::default()
    })?;

    let error = injector.instantiate::<ContainerAware>().unwrap_err();
    assert!(matches!(
        error,
        InjectionError::InvocationFailed {
            source: MemberError::MissingArgument { .. },
            ..
        }
    ));
    Ok(())
}

#[test]
fn test_unbind_all() -> Result<()> {
    let injector = injector()?;
    injector.bind(Arc::new(1_i32))?;
    injector.bind_class::<dyn List, ArrayList>()?;
    assert!(injector.is_bound::<dyn Inject>());

    injector.unbind_all();

    assert!(injector.registered_types().is_empty());
    assert!(injector.get_instance::<i32>()?.is_none());
    assert!(injector.get_instance::<dyn Inject>()?.is_none());
    Ok(())
}

#[test]
fn test_registered_types() -> Result<()> {
    let injector = injector()?;
    injector.bind(Arc::new(1_i32))?;
    injector.bind_class_named::<dyn List, ArrayList>("primary")?;

    let types = injector.registered_types();
    assert!(types.contains(&TypeInfo::of::<i32>()));
    assert!(types.contains(&TypeInfo::of::<dyn List>()));
    assert!(injector.is_bound_by_type(TypeInfo::of::<dyn List>(), "primary"));
    assert!(!injector.is_bound_by_type(TypeInfo::of::<dyn List>(), DEFAULT_NAME));
    Ok(())
}

#[test]
fn test_concurrent_resolution() -> Result<()> {
    let injector = injector()?;
    injector.bind_class::<dyn List, ArrayList>()?;
    injector.bind(Arc::new(Box::new(4_i32)))?;

    std::thread::scope(|scope| {
        for _ in 0..4 {
            let injector: Injector = injector.clone();
            scope.spawn(move || {
                for _ in 0..100 {
                    let inject_me = injector
                        .instantiate::<InjectMe>()
                        .expect("解析成功")
                        .expect("可实例化");
                    assert_eq!(inject_me.number(), 4);
                }
            });
        }
    });
    Ok(())
}
