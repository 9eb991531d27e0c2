use std::sync::{Arc, Mutex};

// fields are kept ordered so that debug output and field listings are stable
use std::collections::{BTreeMap, BTreeSet};

// custom made ordering and hashing for instances, which go by identity
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

// used to print out readable forms of an entity
use std::fmt;

// our own stuff that we need
use crate::datatype::{DataType, Value};
use crate::error::Result;

// ------------- Kind -------------
// The named type of an instance. A kind may derive from a parent, in which
// case instances of the kind are also instances of every ancestor.
#[derive(Debug)]
pub struct Kind {
    name: String,
    parent: Option<Arc<Kind>>,
}

impl Kind {
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            parent: None,
        })
    }
    pub fn derive(name: impl Into<String>, parent: &Arc<Kind>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            parent: Some(Arc::clone(parent)),
        })
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn parent(&self) -> Option<&Arc<Kind>> {
        self.parent.as_ref()
    }
    pub fn is_a(&self, other: &Kind) -> bool {
        let mut lineage = Some(self);
        while let Some(kind) = lineage {
            if kind.name == other.name {
                return true;
            }
            lineage = kind.parent.as_deref();
        }
        false
    }
}
impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

// ------------- Object -------------
#[derive(Debug)]
pub struct Object {
    kind: Arc<Kind>,
    fields: Mutex<BTreeMap<String, Entity>>,
}

impl Object {
    pub fn kind(&self) -> &Arc<Kind> {
        &self.kind
    }
    pub fn get(&self, field: &str) -> Result<Option<Entity>> {
        Ok(self.fields.lock()?.get(field).cloned())
    }
    pub fn set(&self, field: impl Into<String>, value: Entity) -> Result<Option<Entity>> {
        Ok(self.fields.lock()?.insert(field.into(), value))
    }
    pub fn field_names(&self) -> Result<Vec<String>> {
        Ok(self.fields.lock()?.keys().cloned().collect())
    }
    pub fn field_count(&self) -> Result<usize> {
        Ok(self.fields.lock()?.len())
    }
}

// ------------- Instance -------------
// Identity of an instance for the lifetime of the underlying object.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct ObjectId(usize);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

// A shared handle to an object. Two handles are equal only if they point at
// the very same object, regardless of what the objects contain.
#[derive(Clone)]
pub struct Instance(Arc<Object>);

impl Instance {
    pub fn new(kind: &Arc<Kind>) -> Self {
        Self(Arc::new(Object {
            kind: Arc::clone(kind),
            fields: Mutex::new(BTreeMap::new()),
        }))
    }
    pub fn id(&self) -> ObjectId {
        ObjectId(Arc::as_ptr(&self.0) as usize)
    }
    pub fn same_as(&self, other: &Instance) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
    // convenience for building up instances
    pub fn with(self, field: impl Into<String>, value: Entity) -> Result<Self> {
        self.set(field, value)?;
        Ok(self)
    }
}
impl std::ops::Deref for Instance {
    type Target = Object;
    fn deref(&self) -> &Object {
        &self.0
    }
}
impl PartialEq for Instance {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}
impl Eq for Instance {}
impl Ord for Instance {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id().cmp(&other.id())
    }
}
impl PartialOrd for Instance {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Hash for Instance {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}
// Fields are left out on purpose, since object graphs may be cyclic.
impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}@{}", self.kind.name(), self.id())
    }
}

// ------------- Entity -------------
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Entity {
    Absent,
    Value(Value),
    Object(Instance),
    Sequence(Vec<Entity>),
    Set(BTreeSet<Entity>),
}

impl Entity {
    pub fn value<V: DataType>(value: V) -> Self {
        Entity::Value(value.into_value())
    }
    pub fn object(instance: &Instance) -> Self {
        Entity::Object(instance.clone())
    }
    pub fn sequence(entities: impl IntoIterator<Item = Entity>) -> Self {
        Entity::Sequence(entities.into_iter().collect())
    }
    pub fn set(entities: impl IntoIterator<Item = Entity>) -> Self {
        Entity::Set(entities.into_iter().collect())
    }
    pub fn is_absent(&self) -> bool {
        matches!(self, Entity::Absent)
    }
    pub fn as_instance(&self) -> Option<&Instance> {
        match self {
            Entity::Object(instance) => Some(instance),
            _ => None,
        }
    }
    pub fn as_value<V: DataType>(&self) -> Option<&V> {
        match self {
            Entity::Value(value) => V::from_value(value),
            _ => None,
        }
    }
    pub fn as_sequence(&self) -> Option<&[Entity]> {
        match self {
            Entity::Sequence(entities) => Some(entities),
            _ => None,
        }
    }
    pub fn as_set(&self) -> Option<&BTreeSet<Entity>> {
        match self {
            Entity::Set(entities) => Some(entities),
            _ => None,
        }
    }
    // The runtime type name, as reported in validation errors.
    pub fn type_name(&self) -> String {
        match self {
            Entity::Absent => String::from("None"),
            Entity::Value(value) => value.data_type().to_owned(),
            Entity::Object(instance) => instance.kind().name().to_owned(),
            Entity::Sequence(_) => String::from("Sequence"),
            Entity::Set(_) => String::from("Set"),
        }
    }
}
impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Entity::Absent => write!(f, "None"),
            Entity::Value(value) => write!(f, "{}", value),
            Entity::Object(instance) => write!(f, "{:?}", instance),
            Entity::Sequence(entities) => {
                let mut s = String::new();
                for e in entities {
                    s += &(e.to_string() + ",");
                }
                s.pop();
                write!(f, "[{}]", s)
            }
            Entity::Set(entities) => {
                let mut s = String::new();
                for e in entities {
                    s += &(e.to_string() + ",");
                }
                s.pop();
                write!(f, "{{{}}}", s)
            }
        }
    }
}
