//! 绑定注册表抽象接口

use crate::injectable::{Constructor, ConstructorFn, Dependencies, Implements};
use infrastructure_common::{DependencyError, DependencyResult, Lifetime, TypeKey};
use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// 类型擦除后的实例
///
/// 内部保存 `Arc<I>`，其中 `I` 是绑定的抽象类型。
pub type Instance = Arc<dyn Any + Send + Sync>;

/// 类型擦除后的实例工厂函数类型
pub type InstanceFactoryFn = Arc<dyn Fn(&Dependencies<'_>) -> DependencyResult<Instance> + Send + Sync>;

/// 绑定注册表 trait
///
/// 每个抽象类型至多对应一个绑定，重复绑定会覆盖旧值。
pub trait BindingRegistry: Send + Sync {
    /// 写入绑定并分配新的代数，返回被覆盖的旧绑定
    fn insert(&self, key: TypeKey, binding: Binding) -> Option<Binding>;

    /// 读取绑定（纯读取，不修改注册表）
    fn lookup(&self, key: &TypeKey) -> Option<Binding>;

    /// 提交已构建的单例实例
    ///
    /// 仅当槽位仍处于未构建状态且代数一致时才写入；
    /// 返回此后所有读者可见的实例。
    fn store(&self, key: &TypeKey, generation: u64, instance: Instance) -> Instance;

    /// 检查是否已绑定
    fn contains(&self, key: &TypeKey) -> bool;

    /// 获取所有绑定的快照
    fn snapshot(&self) -> Vec<(TypeKey, Binding)>;

    /// 绑定数量
    fn len(&self) -> usize;

    /// 是否为空
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 类型擦除后的构造函数
///
/// 绑定时选出的唯一构造入口，构建结果已转换为抽象类型。
#[derive(Clone)]
pub struct ErasedConstructor {
    name: &'static str,
    dependencies: Arc<[TypeKey]>,
    factory: InstanceFactoryFn,
}

impl ErasedConstructor {
    /// 擦除实现类型 `C`，构建结果作为抽象类型 `I` 保存
    pub fn erase<I, C>(constructor: Constructor<C>) -> Self
    where
        I: ?Sized + Send + Sync + 'static,
        C: Implements<I>,
    {
        let (name, dependencies, factory): (_, _, ConstructorFn<C>) = constructor.into_parts();

        Self {
            name,
            dependencies: dependencies.into(),
            factory: Arc::new(move |deps: &Dependencies<'_>| {
                let concrete = factory(deps)?;
                let abstraction: Arc<I> = Arc::new(concrete).into_abstract();
                Ok(Arc::new(abstraction) as Instance)
            }),
        }
    }

    /// 构造函数名称
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// 依赖类型列表
    pub fn dependencies(&self) -> &[TypeKey] {
        &self.dependencies
    }

    /// 使用已解析的依赖值构建实例
    pub fn construct(&self, values: &[Instance]) -> DependencyResult<Instance> {
        (self.factory)(&Dependencies::new(&self.dependencies, values))
    }
}

impl fmt::Debug for ErasedConstructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErasedConstructor")
            .field("name", &self.name)
            .field("dependencies", &self.dependencies)
            .field("factory", &"<function>")
            .finish()
    }
}

/// 绑定目标
#[derive(Clone)]
pub enum BindingTarget {
    /// 尚未构建，保存选中的构造函数
    Unbuilt(ErasedConstructor),
    /// 已构建的实例（仅单例）
    Built(Instance),
}

impl fmt::Debug for BindingTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unbuilt(constructor) => f.debug_tuple("Unbuilt").field(constructor).finish(),
            Self::Built(_) => f.write_str("Built(<instance>)"),
        }
    }
}

/// 绑定信息
#[derive(Debug, Clone)]
pub struct Binding {
    /// 生命周期
    pub lifetime: Lifetime,
    /// 实现类型
    pub implementation: TypeKey,
    /// 代数，由注册表在写入时分配
    pub generation: u64,
    /// 绑定目标
    pub target: BindingTarget,
}

impl Binding {
    /// 创建未构建的绑定
    pub fn unbuilt(lifetime: Lifetime, implementation: TypeKey, constructor: ErasedConstructor) -> Self {
        Self {
            lifetime,
            implementation,
            generation: 0,
            target: BindingTarget::Unbuilt(constructor),
        }
    }

    /// 创建已构建的单例绑定
    pub fn built(implementation: TypeKey, instance: Instance) -> Self {
        Self {
            lifetime: Lifetime::Singleton,
            implementation,
            generation: 0,
            target: BindingTarget::Built(instance),
        }
    }

    /// 是否已构建
    pub fn is_materialized(&self) -> bool {
        matches!(self.target, BindingTarget::Built(_))
    }

    /// 依赖类型列表，已构建的绑定没有待解析的依赖
    pub fn dependencies(&self) -> &[TypeKey] {
        match &self.target {
            BindingTarget::Unbuilt(constructor) => constructor.dependencies(),
            BindingTarget::Built(_) => &[],
        }
    }
}

/// 绑定描述符
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingDescriptor {
    /// 抽象类型
    pub abstract_type: TypeKey,
    /// 实现类型
    pub implementation: TypeKey,
    /// 生命周期
    pub lifetime: Lifetime,
    /// 选中的构造函数名称，已构建的绑定为 `None`
    pub constructor: Option<&'static str>,
    /// 依赖类型列表
    pub dependencies: Vec<TypeKey>,
    /// 是否已构建
    pub materialized: bool,
}

impl BindingDescriptor {
    /// 从绑定生成描述符
    pub fn from_binding(key: TypeKey, binding: &Binding) -> Self {
        let constructor = match &binding.target {
            BindingTarget::Unbuilt(constructor) => Some(constructor.name()),
            BindingTarget::Built(_) => None,
        };

        Self {
            abstract_type: key,
            implementation: binding.implementation,
            lifetime: binding.lifetime,
            constructor,
            dependencies: binding.dependencies().to_vec(),
            materialized: binding.is_materialized(),
        }
    }
}

/// 依赖图节点
#[derive(Debug, Clone)]
pub struct DependencyGraphNode {
    /// 抽象类型
    pub key: TypeKey,
    /// 依赖的类型列表
    pub dependencies: Vec<TypeKey>,
}

/// 循环依赖检测器
pub trait CircularDependencyDetector: Send + Sync {
    /// 检测整张图中的循环依赖
    fn detect_circular_dependencies(&self, graph: &[DependencyGraphNode]) -> DependencyResult<()>;

    /// 检测从 `root` 可达的子图中的循环依赖
    fn detect_from(&self, root: TypeKey, graph: &[DependencyGraphNode]) -> DependencyResult<()>;

    /// 构建依赖图
    fn build_dependency_graph(&self, bindings: &[(TypeKey, Binding)]) -> Vec<DependencyGraphNode> {
        bindings
            .iter()
            .map(|(key, binding)| DependencyGraphNode {
                key: *key,
                dependencies: binding.dependencies().to_vec(),
            })
            .collect()
    }
}

/// 默认循环依赖检测器
#[derive(Debug, Default)]
pub struct DefaultCircularDependencyDetector;

impl CircularDependencyDetector for DefaultCircularDependencyDetector {
    fn detect_circular_dependencies(&self, graph: &[DependencyGraphNode]) -> DependencyResult<()> {
        // 使用深度优先搜索检测循环依赖
        let edges = index_graph(graph);
        let mut visited = HashSet::new();
        let mut visiting = Vec::new();

        for node in graph {
            if !visited.contains(&node.key) {
                dfs_check(node.key, &edges, &mut visited, &mut visiting)?;
            }
        }

        Ok(())
    }

    fn detect_from(&self, root: TypeKey, graph: &[DependencyGraphNode]) -> DependencyResult<()> {
        let edges = index_graph(graph);
        let mut visited = HashSet::new();
        let mut visiting = Vec::new();
        dfs_check(root, &edges, &mut visited, &mut visiting)
    }
}

fn index_graph(graph: &[DependencyGraphNode]) -> HashMap<TypeKey, &[TypeKey]> {
    graph
        .iter()
        .map(|node| (node.key, node.dependencies.as_slice()))
        .collect()
}

fn dfs_check(
    current: TypeKey,
    edges: &HashMap<TypeKey, &[TypeKey]>,
    visited: &mut HashSet<TypeKey>,
    visiting: &mut Vec<TypeKey>,
) -> DependencyResult<()> {
    if visiting.contains(&current) {
        return Err(DependencyError::CircularDependency {
            dependency_chain: format_dependency_chain(visiting, current),
        });
    }

    if visited.contains(&current) {
        return Ok(());
    }

    visiting.push(current);

    // 未绑定的依赖没有出边
    if let Some(dependencies) = edges.get(&current) {
        for dependency in dependencies.iter() {
            dfs_check(*dependency, edges, visited, visiting)?;
        }
    }

    visiting.pop();
    visited.insert(current);

    Ok(())
}

/// 把解析路径渲染为 `A -> B -> A`，从重复类型第一次出现的位置开始
pub fn format_dependency_chain(path: &[TypeKey], repeated: TypeKey) -> String {
    let start = path.iter().position(|key| *key == repeated).unwrap_or(0);

    path[start..]
        .iter()
        .chain(std::iter::once(&repeated))
        .map(TypeKey::short_name)
        .collect::<Vec<_>>()
        .join(" -> ")
}
