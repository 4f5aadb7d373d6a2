//! Module dependency graph.
//!
//! Tracks, per module, the friend modules (test/production pairs and similar
//! arrangements that may see each other's internals) and the modules it
//! declares a `dependsOn` relation to. The stability classifier consults this
//! to decide whether a public property from another module can be trusted to
//! keep its default accessor.

use rustc_hash::FxHashSet;

/// Unique identifier for a module in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModuleId(pub u32);

impl ModuleId {
    pub const NONE: ModuleId = ModuleId(u32::MAX);

    #[inline]
    pub fn is_none(self) -> bool {
        self.0 == u32::MAX
    }
}

/// Information about a module in the dependency graph.
#[derive(Debug)]
pub struct ModuleData {
    pub name: String,
    /// Modules allowed to see this module's internals, and vice versa.
    pub friends: FxHashSet<ModuleId>,
    /// Modules this module refines (platform/common splits).
    pub depends_on: FxHashSet<ModuleId>,
}

#[derive(Debug, Default)]
pub struct ModuleGraph {
    modules: Vec<ModuleData>,
}

impl ModuleGraph {
    pub fn new() -> ModuleGraph {
        ModuleGraph::default()
    }

    pub fn add_module(&mut self, name: impl Into<String>) -> ModuleId {
        let id = ModuleId(self.modules.len() as u32);
        self.modules.push(ModuleData {
            name: name.into(),
            friends: FxHashSet::default(),
            depends_on: FxHashSet::default(),
        });
        id
    }

    pub fn add_friend(&mut self, module: ModuleId, friend: ModuleId) {
        if let Some(data) = self.modules.get_mut(module.0 as usize) {
            data.friends.insert(friend);
        }
    }

    pub fn add_depends_on(&mut self, module: ModuleId, dependency: ModuleId) {
        if let Some(data) = self.modules.get_mut(module.0 as usize) {
            data.depends_on.insert(dependency);
        }
    }

    #[inline]
    pub fn get(&self, id: ModuleId) -> Option<&ModuleData> {
        self.modules.get(id.0 as usize)
    }

    pub fn name(&self, id: ModuleId) -> &str {
        self.get(id).map_or("<no module>", |data| &data.name)
    }

    /// Whether `other` is the module itself, a friend, or a `dependsOn`
    /// dependency of `module`.
    pub fn is_friendly(&self, module: ModuleId, other: ModuleId) -> bool {
        if module == other {
            return true;
        }
        let Some(data) = self.get(module) else {
            return false;
        };
        data.friends.contains(&other) || data.depends_on.contains(&other)
    }
}
