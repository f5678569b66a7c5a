//! # 示例应用程序
//!
//! 演示如何使用依赖注入容器：绑定实例与实现类型、按名称解析、
//! 实例化派生了 `Injectable` 的类型，以及注入参数调用方法。

use anyhow::Context;
use clap::Parser;
use di_abstractions::{
    Arguments, ContainerConfig, Inject, InjectExt, Instance, MethodReflection,
    ParameterReflection, TypeDescriptorBuilder,
};
use di_impl::Injector;
use injectable_macros::Injectable;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// 命令行参数
#[derive(Parser, Debug)]
#[command(name = "example-app")]
#[command(about = "依赖注入容器示例应用")]
struct Args {
    /// 容器配置文件路径（TOML）
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 日志过滤规则，例如 "info" 或 "di_impl=trace"
    #[arg(long, default_value = "info")]
    log_level: String,

    /// 下单的客户名称
    #[arg(long, default_value = "Ada")]
    customer: String,

    /// 下单数量
    #[arg(long, default_value_t = 3)]
    quantity: u32,
}

trait PriceList: Send + Sync {
    fn unit_price(&self) -> u64;
}

#[derive(Debug, Default, Injectable)]
#[injectable(upcast(dyn PriceList))]
struct StandardPrices;

impl PriceList for StandardPrices {
    fn unit_price(&self) -> u64 {
        1_250
    }
}

#[derive(Debug, Default, Injectable)]
#[injectable(upcast(dyn PriceList))]
struct DiscountPrices;

impl PriceList for DiscountPrices {
    fn unit_price(&self) -> u64 {
        990
    }
}

#[derive(Injectable)]
#[injectable(extend = order_service_methods)]
struct OrderService {
    prices: Arc<dyn PriceList>,
    #[inject(named = "currency")]
    currency: Arc<String>,
    container: Option<Arc<dyn Inject>>,
    #[inject(default)]
    revenue: AtomicU64,
}

impl OrderService {
    fn place(&self, customer: &str, quantity: u32) -> String {
        let total = self.prices.unit_price() * u64::from(quantity);
        self.revenue.fetch_add(total, Ordering::SeqCst);
        format!(
            "{customer} 订购 {quantity} 件，共 {}.{:02} {}",
            total / 100,
            total % 100,
            self.currency
        )
    }
}

fn order_service_methods(
    builder: TypeDescriptorBuilder<OrderService>,
) -> TypeDescriptorBuilder<OrderService> {
    builder.method(MethodReflection::new::<OrderService, _>(
        "place",
        vec![
            ParameterReflection::named::<String>("customer"),
            ParameterReflection::named::<u32>("quantity"),
        ],
        |service: &OrderService, args: &Arguments| {
            let customer = args.required::<String>(0)?;
            let quantity = args.required::<u32>(1)?;
            let receipt = service.place(&customer, *quantity);
            Ok(Some(Instance::new(Arc::new(receipt))))
        },
    ))
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("启动依赖注入示例应用");

    let config = load_config(&args)?;
    let injector = Injector::builder()
        .register::<StandardPrices>()
        .register::<DiscountPrices>()
        .register::<OrderService>()
        .config(config)
        .build()
        .context("构建容器失败")?;

    demonstrate_bindings(&injector)?;
    demonstrate_injection(&injector, &args)?;

    info!(
        "已绑定类型: {:?}",
        injector
            .registered_types()
            .iter()
            .map(|ty| ty.short_name())
            .collect::<Vec<_>>()
    );
    info!("示例应用结束");
    Ok(())
}

fn load_config(args: &Args) -> anyhow::Result<ContainerConfig> {
    match &args.config {
        Some(path) => {
            info!("加载容器配置: {}", path.display());
            ContainerConfig::from_file(path)
                .with_context(|| format!("无法加载配置文件 {}", path.display()))
        }
        None => Ok(ContainerConfig::default()),
    }
}

/// 演示绑定与按名称解析
fn demonstrate_bindings(injector: &Injector) -> anyhow::Result<()> {
    injector.bind_named("currency", Arc::new(String::from("CNY")))?;
    injector.bind_class::<dyn PriceList, StandardPrices>()?;
    injector.bind_class_named::<dyn PriceList, DiscountPrices>("discount")?;

    let standard = injector
        .get_instance::<dyn PriceList>()?
        .context("未绑定默认价目表")?;
    let discount = injector
        .get_instance_named::<dyn PriceList>("discount")?
        .context("未绑定折扣价目表")?;
    info!(
        "默认单价 {}，折扣单价 {}",
        standard.unit_price(),
        discount.unit_price()
    );
    Ok(())
}

/// 演示实例化与方法注入
fn demonstrate_injection(injector: &Injector, args: &Args) -> anyhow::Result<()> {
    let service = injector
        .instantiate::<OrderService>()?
        .context("OrderService 无法实例化")?;
    if service.container.is_none() {
        warn!("容器未绑定自身，OrderService 不持有容器");
    }

    injector.bind_named("customer", Arc::new(args.customer.clone()))?;
    injector.bind_named("quantity", Arc::new(args.quantity))?;

    let receipt = injector
        .invoke(&service, "place")?
        .and_then(|instance| instance.downcast::<String>())
        .context("place 没有返回收据")?;
    info!("{}", receipt);
    info!("累计收入 {}", service.revenue.load(Ordering::SeqCst));

    if let Some(container) = &service.container {
        let currency = container
            .get_instance_named::<String>("currency")?
            .context("未绑定货币")?;
        info!("通过注入的容器解析到货币: {}", currency);
    }
    Ok(())
}
