use tracing::{debug, debug_span, warn};

use crate::entity::Entity;
use crate::error::Result;
use crate::registry::TwinRegistry;
use crate::settings::{CloneOptions, Settings};
use crate::twin::Twin;

/// Clones `source` through `rule` with default options.
pub fn clone_root(rule: &dyn Twin, source: &Entity) -> Result<Entity> {
    Cloner::default().clone_root(rule, source)
}

/// The outcome of one clone operation along with registry statistics.
#[derive(Debug)]
pub struct Cloned {
    pub entity: Entity,
    /// Distinct source objects that were cloned.
    pub objects: usize,
    /// Times an already kept clone was handed out again.
    pub reused: usize,
}

/// Runs clone operations with a fixed set of options. Each operation gets a
/// registry of its own, so a cloner can be shared between threads.
#[derive(Debug, Clone, Default)]
pub struct Cloner {
    options: CloneOptions,
}

impl Cloner {
    pub fn new(options: CloneOptions) -> Self {
        Self { options }
    }
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.clone.clone())
    }
    pub fn options(&self) -> &CloneOptions {
        &self.options
    }
    pub fn clone_root(&self, rule: &dyn Twin, source: &Entity) -> Result<Entity> {
        Ok(self.clone_with_report(rule, source)?.entity)
    }
    pub fn clone_with_report(&self, rule: &dyn Twin, source: &Entity) -> Result<Cloned> {
        let span = debug_span!("clone_root", rule = %rule.name());
        let _entered = span.enter();
        let mut registry = TwinRegistry::with_options(self.options.clone());
        match rule.twin(source, &mut registry) {
            Ok(entity) => {
                debug!(objects = registry.len(), reused = registry.reused(), "clone complete");
                Ok(Cloned {
                    entity,
                    objects: registry.len(),
                    reused: registry.reused(),
                })
            }
            Err(e) => {
                // partial clones go down with the registry
                warn!(error = %e, objects = registry.len(), "clone abandoned");
                Err(e)
            }
        }
    }
}
