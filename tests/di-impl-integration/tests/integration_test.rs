//! Centralized integration tests for di-impl crate
use di_abstractions::{implements, Constructor, Injectable, Injector, InjectorConfig, Provider, SingletonPolicy};
use di_impl::InjectorImpl;
use infrastructure_common::{DependencyError, Lifetime};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn next_id() -> u64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

/// 测试抽象
trait TestClass: Send + Sync {
    fn id(&self) -> u64;
    fn kind(&self) -> &'static str;
}

#[derive(Debug, PartialEq)]
struct FirstDependency {
    init: bool,
}

impl Injectable for FirstDependency {
    fn constructors() -> Vec<Constructor<Self>> {
        vec![Constructor::builder("new").build(|_| Ok(Self { init: true }))]
    }
}

#[derive(Debug, PartialEq)]
struct SecondDependency {
    init: bool,
}

impl Injectable for SecondDependency {
    fn constructors() -> Vec<Constructor<Self>> {
        vec![Constructor::builder("new").build(|_| Ok(Self { init: true }))]
    }
}

/// 三个构造函数，只有一个标记注入
#[derive(Debug)]
struct Correct {
    id: u64,
    first: Option<Arc<FirstDependency>>,
    second: Option<Arc<SecondDependency>>,
}

impl TestClass for Correct {
    fn id(&self) -> u64 {
        self.id
    }

    fn kind(&self) -> &'static str {
        "Correct"
    }
}

implements!(Correct => dyn TestClass);

impl Injectable for Correct {
    fn constructors() -> Vec<Constructor<Self>> {
        vec![
            Constructor::builder("new").build(|_| {
                Ok(Self {
                    id: next_id(),
                    first: None,
                    second: None,
                })
            }),
            Constructor::builder("with_first")
                .depends_on::<FirstDependency>()
                .build(|deps| {
                    Ok(Self {
                        id: next_id(),
                        first: Some(deps.get::<FirstDependency>(0)?),
                        second: None,
                    })
                }),
            Constructor::builder("with_dependencies")
                .inject()
                .depends_on::<FirstDependency>()
                .depends_on::<SecondDependency>()
                .build(|deps| {
                    Ok(Self {
                        id: next_id(),
                        first: Some(deps.get::<FirstDependency>(0)?),
                        second: Some(deps.get::<SecondDependency>(1)?),
                    })
                }),
        ]
    }
}

#[derive(Debug, PartialEq)]
struct WithoutAnnotations {
    id: u64,
}

impl TestClass for WithoutAnnotations {
    fn id(&self) -> u64 {
        self.id
    }

    fn kind(&self) -> &'static str {
        "WithoutAnnotations"
    }
}

implements!(WithoutAnnotations => dyn TestClass);

impl Injectable for WithoutAnnotations {
    fn constructors() -> Vec<Constructor<Self>> {
        vec![Constructor::builder("new").build(|_| Ok(Self { id: next_id() }))]
    }
}

struct WithoutAnnotationsAndEmptyConstructor;

impl TestClass for WithoutAnnotationsAndEmptyConstructor {
    fn id(&self) -> u64 {
        0
    }

    fn kind(&self) -> &'static str {
        "WithoutAnnotationsAndEmptyConstructor"
    }
}

implements!(WithoutAnnotationsAndEmptyConstructor => dyn TestClass);

impl Injectable for WithoutAnnotationsAndEmptyConstructor {
    fn constructors() -> Vec<Constructor<Self>> {
        vec![Constructor::builder("with_first")
            .depends_on::<FirstDependency>()
            .build(|_| Ok(Self))]
    }
}

struct WithMultipleAnnotations;

impl TestClass for WithMultipleAnnotations {
    fn id(&self) -> u64 {
        0
    }

    fn kind(&self) -> &'static str {
        "WithMultipleAnnotations"
    }
}

implements!(WithMultipleAnnotations => dyn TestClass);

impl Injectable for WithMultipleAnnotations {
    fn constructors() -> Vec<Constructor<Self>> {
        vec![
            Constructor::builder("with_first")
                .inject()
                .depends_on::<FirstDependency>()
                .build(|_| Ok(Self)),
            Constructor::builder("with_second")
                .inject()
                .depends_on::<SecondDependency>()
                .build(|_| Ok(Self)),
        ]
    }
}

#[derive(Debug)]
struct Engine {
    id: u64,
}

impl Injectable for Engine {
    fn constructors() -> Vec<Constructor<Self>> {
        vec![Constructor::builder("new").build(|_| Ok(Self { id: next_id() }))]
    }
}

#[derive(Debug)]
struct Car {
    engine: Arc<Engine>,
}

impl Injectable for Car {
    fn constructors() -> Vec<Constructor<Self>> {
        vec![Constructor::builder("new")
            .inject()
            .depends_on::<Engine>()
            .build(|deps| {
                Ok(Self {
                    engine: deps.get::<Engine>(0)?,
                })
            })]
    }
}

fn bind_dependencies(injector: &InjectorImpl) {
    injector.bind::<FirstDependency, FirstDependency>().unwrap();
    injector.bind::<SecondDependency, SecondDependency>().unwrap();
}

#[test]
fn test_bind_without_annotation() {
    let injector = InjectorImpl::new();
    injector.bind::<dyn TestClass, WithoutAnnotations>().unwrap();

    let instance = injector
        .get_provider::<dyn TestClass>()
        .get_instance()
        .unwrap()
        .unwrap();
    assert_eq!(instance.kind(), "WithoutAnnotations");
}

#[test]
fn test_bind_without_annotations_and_empty_constructor() {
    let injector = InjectorImpl::new();
    let err = injector
        .bind::<dyn TestClass, WithoutAnnotationsAndEmptyConstructor>()
        .unwrap_err();

    assert!(matches!(err, DependencyError::ConstructorNotFound { .. }));
    assert!(!injector.is_bound::<dyn TestClass>());
}

#[test]
fn test_bind_with_multiple_annotations() {
    let injector = InjectorImpl::new();
    let err = injector
        .bind_singleton::<dyn TestClass, WithMultipleAnnotations>()
        .unwrap_err();

    assert!(matches!(
        err,
        DependencyError::TooManyConstructors { count: 2, .. }
    ));
    assert!(!injector.is_bound::<dyn TestClass>());
}

#[test]
fn test_correct_dependency_injection() -> anyhow::Result<()> {
    let injector = InjectorImpl::new();
    bind_dependencies(&injector);
    injector.bind::<Correct, Correct>()?;

    let correct = injector
        .get_provider::<Correct>()
        .get_instance()?
        .expect("Correct 已绑定");

    assert_eq!(
        correct.first.as_deref(),
        Some(&FirstDependency { init: true })
    );
    assert_eq!(
        correct.second.as_deref(),
        Some(&SecondDependency { init: true })
    );
    Ok(())
}

#[test]
fn test_missing_dependency_fails_at_resolution() {
    let injector = InjectorImpl::new();
    injector.bind::<FirstDependency, FirstDependency>().unwrap();
    // 依赖缺失不影响绑定
    injector.bind::<dyn TestClass, Correct>().unwrap();

    let provider = injector.get_provider::<dyn TestClass>();
    let err = provider.get_instance().err().expect("expected resolution error");

    match err {
        DependencyError::BindingNotFound {
            type_name,
            required_by,
        } => {
            assert_eq!(type_name, "SecondDependency");
            assert_eq!(required_by, "dyn TestClass");
        }
        other => panic!("意外的错误: {other}"),
    }
}

#[test]
fn test_missing_binding_is_absent() {
    let injector = InjectorImpl::new();

    assert!(injector
        .get_provider::<dyn TestClass>()
        .get_instance()
        .unwrap()
        .is_none());
    assert!(injector
        .get_provider::<Engine>()
        .get_instance()
        .unwrap()
        .is_none());
}

#[test]
fn test_singleton_bind() {
    let injector = InjectorImpl::new();
    // 单例先于依赖绑定
    injector.bind_singleton::<dyn TestClass, Correct>().unwrap();
    bind_dependencies(&injector);

    let first = injector
        .get_provider::<dyn TestClass>()
        .get_instance()
        .unwrap()
        .unwrap();
    let second = injector
        .get_provider::<dyn TestClass>()
        .get_instance()
        .unwrap()
        .unwrap();

    assert_eq!(first.id(), second.id());
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn test_prototype_bind() {
    let injector = InjectorImpl::new();
    injector.bind::<dyn TestClass, Correct>().unwrap();
    bind_dependencies(&injector);

    let provider = injector.get_provider::<dyn TestClass>();
    let first = provider.get_instance().unwrap().unwrap();
    let second = provider.get_instance().unwrap().unwrap();

    assert_ne!(first.id(), second.id());
    assert!(!Arc::ptr_eq(&first, &second));
}

#[test]
fn test_rebinding_replaces_previous_binding() {
    let injector = InjectorImpl::new();
    bind_dependencies(&injector);
    injector.bind::<dyn TestClass, WithoutAnnotations>().unwrap();
    injector.bind::<dyn TestClass, Correct>().unwrap();

    let instance = injector
        .get_provider::<dyn TestClass>()
        .get_instance()
        .unwrap()
        .unwrap();
    assert_eq!(instance.kind(), "Correct");

    let bindings = injector.registered_bindings();
    assert_eq!(bindings.len(), 3);
}

#[test]
fn test_rebinding_materialized_singleton_builds_again() {
    let injector = InjectorImpl::new();
    bind_dependencies(&injector);
    injector.bind_singleton::<dyn TestClass, Correct>().unwrap();

    let provider = injector.get_provider::<dyn TestClass>();
    let before = provider.get_instance().unwrap().unwrap();

    injector.bind_singleton::<dyn TestClass, Correct>().unwrap();
    let after = provider.get_instance().unwrap().unwrap();

    assert!(!Arc::ptr_eq(&before, &after));
    assert!(Arc::ptr_eq(&after, &provider.get_instance().unwrap().unwrap()));
}

#[test]
fn test_failed_bind_keeps_previous_binding() {
    let injector = InjectorImpl::new();
    injector.bind::<dyn TestClass, WithoutAnnotations>().unwrap();
    assert!(injector
        .bind::<dyn TestClass, WithMultipleAnnotations>()
        .is_err());

    let instance = injector
        .get_provider::<dyn TestClass>()
        .get_instance()
        .unwrap()
        .unwrap();
    assert_eq!(instance.kind(), "WithoutAnnotations");
}

#[test]
fn test_engine_car_scenario() {
    let injector = InjectorImpl::new();
    injector.bind::<Engine, Engine>().unwrap();
    injector.bind_singleton::<Car, Car>().unwrap();

    let provider = injector.get_provider::<Car>();
    let first = provider.get_instance().unwrap().unwrap();
    let second = provider.get_instance().unwrap().unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.engine.id, second.engine.id);

    // Engine 本身仍是原型
    let engine = injector.get_provider::<Engine>().get_instance().unwrap().unwrap();
    assert_ne!(engine.id, first.engine.id);

    let descriptors = injector.registered_bindings();
    let car = descriptors
        .iter()
        .find(|descriptor| descriptor.implementation.name.ends_with("Car"))
        .unwrap();
    assert_eq!(car.lifetime, Lifetime::Singleton);
    assert!(car.materialized);
}

#[test]
fn test_bind_instance_takes_precedence_over_factory() {
    let injector = InjectorImpl::new();
    injector.bind::<Engine, Engine>().unwrap();

    let engine = Arc::new(Engine { id: 4242 });
    injector.bind_instance::<Engine>(Arc::clone(&engine));

    let resolved = injector.get_provider::<Engine>().get_instance().unwrap().unwrap();
    assert!(Arc::ptr_eq(&engine, &resolved));
}

struct Chicken {
    _egg: Arc<Egg>,
}

struct Egg {
    _chicken: Arc<Chicken>,
}

impl Injectable for Chicken {
    fn constructors() -> Vec<Constructor<Self>> {
        vec![Constructor::builder("new")
            .inject()
            .depends_on::<Egg>()
            .build(|deps| {
                Ok(Self {
                    _egg: deps.get::<Egg>(0)?,
                })
            })]
    }
}

impl Injectable for Egg {
    fn constructors() -> Vec<Constructor<Self>> {
        vec![Constructor::builder("new")
            .inject()
            .depends_on::<Chicken>()
            .build(|deps| {
                Ok(Self {
                    _chicken: deps.get::<Chicken>(0)?,
                })
            })]
    }
}

#[test]
fn test_cyclic_bindings_are_reported() {
    let injector = InjectorImpl::new();
    injector.bind_singleton::<Chicken, Chicken>().unwrap();
    injector.bind::<Egg, Egg>().unwrap();

    let err = match injector.get_provider::<Chicken>().get_instance() {
        Err(err) => err,
        Ok(_) => panic!("循环依赖应当失败"),
    };
    match err {
        DependencyError::CircularDependency { dependency_chain } => {
            assert!(dependency_chain.contains("Chicken -> Egg -> Chicken"));
        }
        other => panic!("意外的错误: {other}"),
    }

    let errors = injector.validate().unwrap_err();
    assert!(errors
        .iter()
        .any(|e| matches!(e, DependencyError::CircularDependency { .. })));
}

#[test]
fn test_cyclic_bindings_hit_depth_limit_without_detection() {
    let injector = InjectorImpl::with_config(InjectorConfig {
        cycle_detection: false,
        max_resolution_depth: 32,
        ..InjectorConfig::default()
    });
    injector.bind::<Chicken, Chicken>().unwrap();
    injector.bind::<Egg, Egg>().unwrap();

    let err = match injector.get_provider::<Chicken>().get_instance() {
        Err(err) => err,
        Ok(_) => panic!("循环依赖应当失败"),
    };
    assert!(matches!(
        err,
        DependencyError::ResolutionDepthExceeded { max_depth: 32, .. }
    ));
}

#[test]
fn test_validate_reports_every_missing_dependency() {
    let injector = InjectorImpl::new();
    injector.bind::<dyn TestClass, Correct>().unwrap();
    injector.bind_singleton::<Car, Car>().unwrap();

    let errors = injector.validate().unwrap_err();
    assert_eq!(errors.len(), 3);

    bind_dependencies(&injector);
    injector.bind::<Engine, Engine>().unwrap();
    assert!(injector.validate().is_ok());
}

static SLOW_BUILDS: AtomicUsize = AtomicUsize::new(0);

/// 构建较慢的单例，用于并发测试
struct SlowSingleton {
    id: u64,
}

impl Injectable for SlowSingleton {
    fn constructors() -> Vec<Constructor<Self>> {
        vec![Constructor::builder("new").build(|_| {
            SLOW_BUILDS.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(20));
            Ok(Self { id: next_id() })
        })]
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_singleton_resolution_builds_once() {
    let injector = InjectorImpl::new();
    injector.bind_singleton::<SlowSingleton, SlowSingleton>().unwrap();

    let mut handles = Vec::new();
    for _ in 0..16 {
        let provider = injector.get_provider::<SlowSingleton>();
        handles.push(tokio::task::spawn_blocking(move || {
            provider.get_instance().map(|instance| instance.map(|s| s.id))
        }));
    }

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap().unwrap().unwrap());
    }

    assert!(ids.windows(2).all(|pair| pair[0] == pair[1]));
    assert_eq!(SLOW_BUILDS.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_relaxed_policy_exposes_single_instance() {
    let injector = InjectorImpl::with_config(InjectorConfig {
        singleton_policy: SingletonPolicy::Relaxed,
        ..InjectorConfig::default()
    });
    injector.bind::<Engine, Engine>().unwrap();
    injector.bind_singleton::<Car, Car>().unwrap();

    let mut handles = Vec::new();
    for _ in 0..16 {
        let injector = injector.clone();
        handles.push(tokio::task::spawn_blocking(move || {
            injector.get_provider::<Car>().get_instance()
        }));
    }

    let mut cars = Vec::new();
    for handle in handles {
        cars.push(handle.await.unwrap().unwrap().unwrap());
    }

    let canonical = injector.get_provider::<Car>().get_instance().unwrap().unwrap();
    assert!(cars.iter().all(|car| Arc::ptr_eq(car, &canonical)));
}

/// 按常量参数区分的独立组件，每个 `N` 都是不同的绑定键
struct Slot<const N: usize>;

impl<const N: usize> Slot<N> {
    fn index(&self) -> usize {
        N
    }
}

impl<const N: usize> Injectable for Slot<N> {
    fn constructors() -> Vec<Constructor<Self>> {
        vec![Constructor::builder("new").build(|_| Ok(Self))]
    }
}

macro_rules! bind_slots {
    ($injector:expr; $($n:literal),+) => {{
        $( $injector.bind::<Slot<$n>, Slot<$n>>()?; )+
        Ok::<(), DependencyError>(())
    }};
}

macro_rules! assert_slots_resolvable {
    ($injector:expr; $($n:literal),+) => {
        $(
            let slot = $injector
                .get_provider::<Slot<$n>>()
                .get_instance()
                .unwrap()
                .expect(concat!("Slot<", stringify!($n), "> 应当已绑定"));
            assert_eq!(slot.index(), $n);
        )+
    };
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_binds_of_distinct_keys_are_all_kept() {
    let injector = InjectorImpl::new();

    let handles = vec![
        {
            let injector = injector.clone();
            tokio::task::spawn_blocking(move || bind_slots!(injector; 0, 1, 2, 3, 4, 5, 6, 7))
        },
        {
            let injector = injector.clone();
            tokio::task::spawn_blocking(move || bind_slots!(injector; 8, 9, 10, 11, 12, 13, 14, 15))
        },
        {
            let injector = injector.clone();
            tokio::task::spawn_blocking(move || bind_slots!(injector; 16, 17, 18, 19, 20, 21, 22, 23))
        },
        {
            let injector = injector.clone();
            tokio::task::spawn_blocking(move || bind_slots!(injector; 24, 25, 26, 27, 28, 29, 30, 31))
        },
    ];
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(injector.registered_bindings().len(), 32);
    assert_slots_resolvable!(injector; 0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15);
    assert_slots_resolvable!(injector; 16, 17, 18, 19, 20, 21, 22, 23, 24, 25, 26, 27, 28, 29, 30, 31);
}

static V1_BUILD_STARTED: AtomicBool = AtomicBool::new(false);
static V1_BUILD_RELEASED: AtomicBool = AtomicBool::new(false);

/// 可替换实现的服务抽象
trait Service: Send + Sync {
    fn version(&self) -> &'static str;
}

/// 构建时阻塞到被放行为止
struct BlockingV1;

impl Injectable for BlockingV1 {
    fn constructors() -> Vec<Constructor<Self>> {
        vec![Constructor::builder("new").build(|_| {
            V1_BUILD_STARTED.store(true, Ordering::SeqCst);
            while !V1_BUILD_RELEASED.load(Ordering::SeqCst) {
                std::thread::sleep(Duration::from_millis(1));
            }
            Ok(Self)
        })]
    }
}

impl Service for BlockingV1 {
    fn version(&self) -> &'static str {
        "v1"
    }
}

implements!(BlockingV1 => dyn Service);

struct ReplacementV2;

impl Injectable for ReplacementV2 {
    fn constructors() -> Vec<Constructor<Self>> {
        vec![Constructor::builder("new").build(|_| Ok(Self))]
    }
}

impl Service for ReplacementV2 {
    fn version(&self) -> &'static str {
        "v2"
    }
}

implements!(ReplacementV2 => dyn Service);

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_rebinding_during_singleton_build_keeps_newest_binding() {
    let injector = InjectorImpl::new();
    injector.bind_singleton::<dyn Service, BlockingV1>().unwrap();

    let provider = injector.get_provider::<dyn Service>();
    let building = tokio::task::spawn_blocking(move || provider.get_instance());

    while !V1_BUILD_STARTED.load(Ordering::SeqCst) {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    injector.bind_singleton::<dyn Service, ReplacementV2>().unwrap();
    V1_BUILD_RELEASED.store(true, Ordering::SeqCst);

    // 进行中的调用拿到自己构建的旧实例，但不会提交到注册表
    let stale = building.await.unwrap().unwrap().unwrap();
    assert_eq!(stale.version(), "v1");

    let mut handles = Vec::new();
    for _ in 0..8 {
        let provider = injector.get_provider::<dyn Service>();
        handles.push(tokio::task::spawn_blocking(move || provider.get_instance()));
    }
    let mut services = Vec::new();
    for handle in handles {
        services.push(handle.await.unwrap().unwrap().unwrap());
    }

    let latest = injector
        .get_provider::<dyn Service>()
        .get_instance()
        .unwrap()
        .unwrap();
    assert_eq!(latest.version(), "v2");
    assert!(!Arc::ptr_eq(&stale, &latest));
    assert!(services.iter().all(|service| Arc::ptr_eq(service, &latest)));

    let descriptors = injector.registered_bindings();
    assert_eq!(descriptors.len(), 1);
    assert!(descriptors[0].materialized);
}
