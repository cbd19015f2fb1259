//! # 示例应用程序
//!
//! 演示如何用 Lorn DI 绑定器官和动物，并通过延迟解析句柄获取实例

use anyhow::Context;
use clap::Parser;
use component_macros::injectable;
use di_abstractions::{implements, Injector, Provider};
use di_impl::{load_injector_config, InjectorImpl};
use rand::Rng;
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// 命令行参数
#[derive(Parser, Debug)]
#[command(name = "animal-farm")]
#[command(about = "Lorn DI 示例应用")]
struct Args {
    /// 注入器配置文件路径
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 日志级别
    #[arg(long, default_value = "info")]
    log_level: String,

    /// 以原型生命周期绑定动物
    #[arg(long)]
    prototype: bool,

    /// 并发解析任务数，0 表示不做并发演示
    #[arg(long, default_value_t = 0)]
    concurrency: usize,
}

/// 动物抽象
pub trait Animal: fmt::Display + Send + Sync {
    /// 动物编号
    fn id(&self) -> u64;
}

#[derive(Debug)]
pub struct Heart {
    id: u64,
}

#[injectable]
impl Heart {
    pub fn new() -> Self {
        Self { id: random_id() }
    }
}

#[derive(Debug)]
pub struct Ear {
    id: u64,
}

#[injectable]
impl Ear {
    pub fn new() -> Self {
        Self { id: random_id() }
    }
}

#[derive(Debug)]
pub struct Pig {
    heart: Arc<Heart>,
    ear: Arc<Ear>,
    pig_id: u64,
}

#[injectable]
impl Pig {
    #[inject]
    pub fn new(heart: Arc<Heart>, ear: Arc<Ear>) -> Self {
        Self {
            heart,
            ear,
            pig_id: random_id(),
        }
    }
}

impl Animal for Pig {
    fn id(&self) -> u64 {
        self.pig_id
    }
}

impl fmt::Display for Pig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Pig {{ heart: #{}, ear: #{}, pig_id: {} }}",
            self.heart.id, self.ear.id, self.pig_id
        )
    }
}

implements!(Pig => dyn Animal);

fn random_id() -> u64 {
    rand::thread_rng().gen_range(0..10_000)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 初始化日志，RUST_LOG 优先于命令行参数
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("启动 animal-farm 示例应用");

    let injector = build_injector(&args)?;

    let provider = injector.get_provider::<dyn Animal>();
    let first = provider
        .get_instance()?
        .context("dyn Animal 没有绑定")?;
    let second = provider
        .get_instance()?
        .context("dyn Animal 没有绑定")?;

    println!("{first}");
    println!("{second}");
    info!(
        "两次解析是否为同一实例: {} (编号 {} / {})",
        Arc::ptr_eq(&first, &second),
        first.id(),
        second.id()
    );

    if args.concurrency > 0 {
        demonstrate_concurrent_resolution(&injector, args.concurrency).await?;
    }

    for descriptor in injector.registered_bindings() {
        info!(
            "绑定: {} -> {} ({}, 已构建: {})",
            descriptor.abstract_type, descriptor.implementation, descriptor.lifetime, descriptor.materialized
        );
    }

    info!("应用已结束");
    Ok(())
}

/// 构建注入器并注册绑定
fn build_injector(args: &Args) -> anyhow::Result<InjectorImpl> {
    let config = load_injector_config(args.config.as_deref())
        .with_context(|| format!("加载注入器配置失败: {:?}", args.config))?;
    info!("注入器配置: {:?}", config);

    let injector = InjectorImpl::with_config(config);
    injector.bind::<Heart, Heart>()?;
    injector.bind::<Ear, Ear>()?;

    if args.prototype {
        injector.bind::<dyn Animal, Pig>()?;
    } else {
        injector.bind_singleton::<dyn Animal, Pig>()?;
    }

    if let Err(errors) = injector.validate() {
        for e in &errors {
            error!("绑定无效: {}", e);
        }
        anyhow::bail!("绑定验证失败，共 {} 个错误", errors.len());
    }

    Ok(injector)
}

/// 演示并发解析
async fn demonstrate_concurrent_resolution(
    injector: &InjectorImpl,
    concurrency: usize,
) -> anyhow::Result<()> {
    info!("并发解析: {} 个任务", concurrency);

    let mut handles = Vec::with_capacity(concurrency);
    for _ in 0..concurrency {
        let provider = injector.get_provider::<dyn Animal>();
        handles.push(tokio::task::spawn_blocking(move || provider.get_instance()));
    }

    // 按实例地址区分，随机编号可能重复
    let mut instances = BTreeSet::new();
    for handle in handles {
        if let Some(animal) = handle.await?? {
            instances.insert(Arc::as_ptr(&animal).cast::<()>() as usize);
        }
    }

    info!("并发解析得到 {} 个不同的动物", instances.len());
    Ok(())
}
