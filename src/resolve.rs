//! Indirect references between rules.
//!
//! Rules that refer to each other cannot all be built first. A [`RuleRef`]
//! therefore holds either the rule itself, a function producing it, or a
//! dotted path into a [`TwinCatalog`]. Indirect references are resolved the
//! first time they are used and the result is cached in the reference.
//!
//! The catalog owns the rules registered in it. Path references only point
//! back at the catalog, so rules referring to themselves or to each other are
//! freed together with the catalog.
//!
//! ```
//! use std::sync::Arc;
//! use twin::entity::Kind;
//! use twin::resolve::{RuleRef, TwinCatalog};
//! use twin::twin::{Field, TypeRule};
//! use twin::types::Optional;
//!
//! let person = Kind::new("Person");
//! let catalog = Arc::new(TwinCatalog::new());
//! // the rule refers to itself through the catalog
//! let rule = TypeRule::new("PersonTwin", &person)
//!     .field(Field::twin("spouse", Optional::new(RuleRef::path(&catalog, "people.PersonTwin"))));
//! catalog.register("people.PersonTwin", rule).unwrap();
//! assert!(catalog.resolve("people.PersonTwin").is_ok());
//! ```

use std::any::{Any, type_name};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock, RwLock, Weak};

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, warn};

use crate::error::{Result, TwinError};
use crate::registry::OtherHasher;
use crate::twin::Twin;

lazy_static! {
    static ref DOTTED_PATH: Regex =
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)+$").unwrap();
}

type Creator = dyn Fn() -> Result<Arc<dyn Twin>> + Send + Sync;

#[derive(Clone)]
enum Source {
    Direct(Arc<dyn Twin>),
    Deferred(Arc<Creator>),
    // Rules in a catalog refer back to it, so path references hold it weakly.
    Path { catalog: Weak<TwinCatalog>, path: String },
}

// A rule found in a catalog is owned by the catalog, and may well be the
// rule holding this very reference. Only deferred rules are owned here.
enum Cached {
    Owned(Arc<dyn Twin>),
    Catalogued(Weak<dyn Twin>),
}

impl Cached {
    fn rule(&self) -> Option<Arc<dyn Twin>> {
        match self {
            Cached::Owned(rule) => Some(Arc::clone(rule)),
            Cached::Catalogued(rule) => rule.upgrade(),
        }
    }
}

// ------------- RuleRef -------------
#[derive(Clone)]
pub struct RuleRef {
    source: Source,
    resolved: Arc<OnceLock<Cached>>,
}

impl RuleRef {
    pub fn shared(rule: Arc<dyn Twin>) -> Self {
        Self::from_source(Source::Direct(rule))
    }
    pub fn deferred<F>(creator: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn Twin>> + Send + Sync + 'static,
    {
        Self::from_source(Source::Deferred(Arc::new(creator)))
    }
    /// A reference by dotted path. The catalog must outlive the clone
    /// operations using the reference.
    pub fn path(catalog: &Arc<TwinCatalog>, path: impl Into<String>) -> Self {
        Self::from_source(Source::Path {
            catalog: Arc::downgrade(catalog),
            path: path.into(),
        })
    }
    fn from_source(source: Source) -> Self {
        Self {
            source,
            resolved: Arc::new(OnceLock::new()),
        }
    }
    fn cached(&self) -> Option<Arc<dyn Twin>> {
        self.resolved.get().and_then(Cached::rule)
    }
    pub fn is_resolved(&self) -> bool {
        matches!(self.source, Source::Direct(_)) || self.cached().is_some()
    }
    pub fn resolve(&self) -> Result<Arc<dyn Twin>> {
        if let Some(rule) = self.cached() {
            return Ok(rule);
        }
        let (rule, cached) = match &self.source {
            Source::Direct(rule) => return Ok(Arc::clone(rule)),
            Source::Deferred(creator) => {
                let rule = creator()?;
                let cached = Cached::Owned(Arc::clone(&rule));
                (rule, cached)
            }
            Source::Path { catalog, path } => {
                let catalog = catalog
                    .upgrade()
                    .ok_or_else(|| TwinError::Resolution(format!("catalog dropped, cannot resolve '{}'", path)))?;
                let rule = catalog.resolve(path)?;
                let cached = Cached::Catalogued(Arc::downgrade(&rule));
                (rule, cached)
            }
        };
        // a concurrent resolution may have won the race, in which case its
        // rule is the one every user of this reference gets to see
        let _ = self.resolved.set(cached);
        Ok(self.cached().unwrap_or(rule))
    }
    // Describes the reference without resolving it.
    pub fn describe(&self) -> String {
        if let Some(rule) = self.cached() {
            return rule.name();
        }
        match &self.source {
            Source::Direct(rule) => rule.name(),
            Source::Deferred(_) => String::from("<deferred>"),
            Source::Path { path, .. } => path.clone(),
        }
    }
}

impl<T: Twin + 'static> From<T> for RuleRef {
    fn from(rule: T) -> Self {
        Self::shared(Arc::new(rule))
    }
}
impl From<Arc<dyn Twin>> for RuleRef {
    fn from(rule: Arc<dyn Twin>) -> Self {
        Self::shared(rule)
    }
}
impl fmt::Debug for RuleRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "RuleRef({})", self.describe())
    }
}

// ------------- TwinCatalog -------------
struct Symbol {
    value: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

// Looks up rules by dotted path, e.g. "library.models.AuthorTwin". Anything
// before the last dot is the module, the rest names the symbol within it.
pub struct TwinCatalog {
    symbols: RwLock<HashMap<String, Symbol, OtherHasher>>,
}

impl TwinCatalog {
    pub fn new() -> Self {
        Self {
            symbols: RwLock::new(HashMap::default()),
        }
    }
    pub fn register(&self, path: &str, rule: impl Twin + 'static) -> Result<()> {
        self.register_shared(path, Arc::new(rule))
    }
    pub fn register_shared(&self, path: &str, rule: Arc<dyn Twin>) -> Result<()> {
        self.insert(path, Arc::new(rule), type_name::<Arc<dyn Twin>>())
    }
    // Symbols that are not rules. Resolving one of these is a type mismatch.
    pub fn register_symbol<T: Any + Send + Sync>(&self, path: &str, value: T) -> Result<()> {
        self.insert(path, Arc::new(value), type_name::<T>())
    }
    fn insert(&self, path: &str, value: Arc<dyn Any + Send + Sync>, type_name: &'static str) -> Result<()> {
        check_path(path)?;
        let previous = self
            .symbols
            .write()?
            .insert(path.to_owned(), Symbol { value, type_name });
        if let Some(previous) = previous {
            warn!(path, replaced = previous.type_name, "catalog symbol replaced");
        } else {
            debug!(path, type_name, "catalog symbol registered");
        }
        Ok(())
    }
    pub fn resolve(&self, path: &str) -> Result<Arc<dyn Twin>> {
        check_path(path)?;
        // the regex guarantees at least one dot
        let (module, name) = path
            .rsplit_once('.')
            .ok_or_else(|| TwinError::Resolution(format!("'{}' is not a dotted path", path)))?;
        let symbols = self.symbols.read()?;
        let symbol = match symbols.get(path) {
            Some(symbol) => symbol,
            None => {
                let prefix = format!("{}.", module);
                return Err(if symbols.keys().any(|k| k.starts_with(&prefix)) {
                    TwinError::Resolution(format!("module '{}' has no symbol '{}'", module, name))
                } else {
                    TwinError::Resolution(format!("no module named '{}'", module))
                });
            }
        };
        match symbol.value.downcast_ref::<Arc<dyn Twin>>() {
            Some(rule) => Ok(Arc::clone(rule)),
            None => Err(TwinError::TypeMismatch {
                path: path.to_owned(),
                found: symbol.type_name.to_owned(),
            }),
        }
    }
    pub fn modules(&self) -> Result<Vec<String>> {
        let symbols = self.symbols.read()?;
        let mut modules: Vec<String> = Vec::new();
        for path in symbols.keys() {
            let mut prefix = path.as_str();
            while let Some((module, _)) = prefix.rsplit_once('.') {
                modules.push(module.to_owned());
                prefix = module;
            }
        }
        modules.sort_unstable();
        modules.dedup();
        Ok(modules)
    }
    pub fn len(&self) -> Result<usize> {
        Ok(self.symbols.read()?.len())
    }
}

impl Default for TwinCatalog {
    fn default() -> Self {
        Self::new()
    }
}
impl fmt::Debug for TwinCatalog {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.symbols.read() {
            Ok(symbols) => {
                let mut paths: Vec<&String> = symbols.keys().collect();
                paths.sort_unstable();
                f.debug_struct("TwinCatalog").field("paths", &paths).finish()
            }
            Err(_) => write!(f, "TwinCatalog(<poisoned>)"),
        }
    }
}

fn check_path(path: &str) -> Result<()> {
    if DOTTED_PATH.is_match(path) {
        Ok(())
    } else {
        Err(TwinError::Resolution(format!("'{}' is not a dotted path", path)))
    }
}
