//! The context: string dictionary, module table and diagnostic log.

use parking_lot::Mutex;
use tracing::{error, warn};

use crate::dict::{DictStr, Dictionary};
use crate::error::{Diagnostic, ErrorCode, Severity};
use crate::module::{Module, ModuleId};
use crate::options::ContextOptions;

/// Everything loaded for one schema universe.
///
/// Read-only use may happen from many threads at once. Adding modules or
/// implementing them needs `&mut self`, which serializes it against readers.
#[derive(Debug, Default)]
pub struct Context {
    dict: Dictionary,
    modules: Vec<Module>,
    options: ContextOptions,
    log: Mutex<Vec<Diagnostic>>,
}

impl Context {
    /// Creates an empty context with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty context with the given options.
    pub fn with_options(options: ContextOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Returns the context options.
    pub fn options(&self) -> &ContextOptions {
        &self.options
    }

    /// Returns the string dictionary.
    pub fn dict(&self) -> &Dictionary {
        &self.dict
    }

    /// Interns a string in the context dictionary.
    pub fn intern(&self, value: &str) -> DictStr {
        self.dict.insert(value)
    }

    /// Returns all loaded modules in load order.
    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    /// Resolves a module handle.
    pub fn module(&self, id: ModuleId) -> Option<&Module> {
        self.modules.get(id.index())
    }

    /// Resolves a module handle for modification.
    pub fn module_mut(&mut self, id: ModuleId) -> Option<&mut Module> {
        self.modules.get_mut(id.index())
    }

    /// Finds a module by name and exact revision, or its latest revision for `None`.
    pub fn get_module(&self, name: &str, revision: Option<&str>) -> Option<ModuleId> {
        match revision {
            Some(revision) => self
                .modules
                .iter()
                .find(|m| m.name == name && m.revision.as_deref() == Some(revision))
                .map(Module::id),
            None => self.get_module_latest(name),
        }
    }

    /// Finds the newest revision of a module.
    pub fn get_module_latest(&self, name: &str) -> Option<ModuleId> {
        // Revisions are YYYY-MM-DD, so string order is date order and a
        // module without revision sorts first.
        self.modules
            .iter()
            .filter(|m| m.name == name)
            .max_by(|a, b| a.revision.as_deref().cmp(&b.revision.as_deref()))
            .map(Module::id)
    }

    /// Finds the implemented revision of a module.
    pub fn get_module_implemented(&self, name: &str) -> Option<ModuleId> {
        self.modules
            .iter()
            .find(|m| m.implemented && m.name == name)
            .map(Module::id)
    }

    /// Finds a module by XML namespace, preferring the implemented one.
    pub fn module_by_namespace(&self, namespace: &str) -> Option<ModuleId> {
        let mut matching = self.modules.iter().filter(|m| m.namespace == namespace);
        let first = matching.next()?;
        if first.implemented {
            return Some(first.id());
        }
        matching
            .find(|m| m.implemented)
            .map(Module::id)
            .or(Some(first.id()))
    }

    /// Adds a module and assigns its handle.
    pub fn add_module(&mut self, mut module: Module) -> Result<ModuleId, Diagnostic> {
        let duplicate = self
            .modules
            .iter()
            .any(|m| m.name == module.name && m.revision == module.revision);
        if duplicate {
            return Err(Diagnostic::error(
                ErrorCode::DuplicateModule,
                format!("Module \"{}\" is already present in the context.", module.display_name()),
            ));
        }
        let index = u32::try_from(self.modules.len()).map_err(|_| {
            Diagnostic::error(ErrorCode::DuplicateModule, "Module table is full.")
        })?;
        let id = ModuleId(index);
        module.id = id;
        self.modules.push(module);
        Ok(id)
    }

    /// Removes the most recently added module, undoing a failed compilation.
    ///
    /// Only the last module can be removed, so no handle held elsewhere is
    /// invalidated. Returns false if `id` is not the last module.
    pub fn discard_module(&mut self, id: ModuleId) -> bool {
        if id.index() + 1 != self.modules.len() {
            return false;
        }
        self.modules.pop();
        self.dict.purge_unused();
        true
    }

    /// Marks a module implemented. Returns true if its state changed.
    pub fn set_implemented(&mut self, id: ModuleId) -> bool {
        match self.module_mut(id) {
            Some(module) if !module.implemented => {
                module.implemented = true;
                true
            }
            _ => false,
        }
    }

    /// Records a diagnostic in the context log.
    pub fn log(&self, diag: Diagnostic) {
        let path = diag.path.as_deref().unwrap_or("");
        match diag.severity {
            Severity::Error => error!(code = %diag.code, path, "{}", diag.full_message()),
            Severity::Warning => warn!(code = %diag.code, path, "{}", diag.full_message()),
        }
        self.log.lock().push(diag);
    }

    /// Returns the most recently logged diagnostic.
    pub fn last_error(&self) -> Option<Diagnostic> {
        self.log.lock().last().cloned()
    }

    /// Returns every logged diagnostic, oldest first.
    pub fn errors(&self) -> Vec<Diagnostic> {
        self.log.lock().clone()
    }

    /// Empties the diagnostic log.
    pub fn clear_errors(&self) {
        self.log.lock().clear();
    }
}
