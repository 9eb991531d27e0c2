//! The clone rule contract and the rules that deal with single entities.
//!
//! Every rule implements [`Twin`]: it knows which entities it accepts and how
//! to produce their clone while consulting the [`TwinRegistry`] of the running
//! operation. A [`TypeRule`] describes one kind of object field by field, and
//! [`Scalar`] covers plain values. The combinators composing these live in
//! [`crate::types`].

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use tracing::trace;

use crate::datatype::DataType;
use crate::entity::{Entity, Instance, Kind};
use crate::error::{Result, TwinError};
use crate::registry::TwinRegistry;
use crate::resolve::RuleRef;

// ------------- Meta -------------
/// What a rule produces. Only used for introspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Model {
    None,
    Value(&'static str),
    Object(String),
    Sequence,
    Set,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Meta {
    pub model: Model,
}

// ------------- Twin -------------
pub trait Twin: fmt::Debug + Send + Sync {
    /// Name used when the rule shows up in error messages.
    fn name(&self) -> String;
    fn meta(&self) -> Meta;
    /// Whether this rule accepts `entity`. This may need to resolve an inner
    /// rule reference, hence the `Result`.
    fn is_correct_type(&self, entity: &Entity) -> Result<bool>;
    fn validate(&self, entity: &Entity) -> Result<()> {
        if self.is_correct_type(entity)? {
            Ok(())
        } else {
            Err(TwinError::Validation {
                expected: self.name(),
                found: entity.type_name(),
            })
        }
    }
    /// Produces the clone of `entity`, reusing clones already kept in the
    /// registry.
    fn twin(&self, entity: &Entity, registry: &mut TwinRegistry) -> Result<Entity>;
}

// ------------- Inspector -------------
/// Moves field values between a source object and its clone.
pub trait Inspector: fmt::Debug + Send + Sync {
    fn instantiate(&self, source: &Instance) -> Result<Instance>;
    fn read(&self, source: &Instance, field: &str) -> Result<Entity>;
    fn write(&self, target: &Instance, field: &str, value: Entity) -> Result<()>;
}

#[derive(Debug, Clone, Copy)]
pub struct FieldInspector {
    lenient: bool,
}

impl FieldInspector {
    /// Reading a field the source does not have is an error.
    pub fn strict() -> Self {
        Self { lenient: false }
    }
    /// Reading a field the source does not have yields `Entity::Absent`.
    pub fn lenient() -> Self {
        Self { lenient: true }
    }
}
impl Default for FieldInspector {
    fn default() -> Self {
        Self::strict()
    }
}
impl Inspector for FieldInspector {
    fn instantiate(&self, source: &Instance) -> Result<Instance> {
        Ok(Instance::new(source.kind()))
    }
    fn read(&self, source: &Instance, field: &str) -> Result<Entity> {
        match source.get(field)? {
            Some(value) => Ok(value),
            None if self.lenient => Ok(Entity::Absent),
            None => Err(TwinError::MissingField {
                kind: source.kind().name().to_owned(),
                field: field.to_owned(),
            }),
        }
    }
    fn write(&self, target: &Instance, field: &str, value: Entity) -> Result<()> {
        target.set(field, value)?;
        Ok(())
    }
}

// ------------- Field -------------
#[derive(Debug, Clone)]
pub enum Attribute {
    /// Clone the value through the referenced rule.
    Twin(RuleRef),
    /// Carry the value over as is. Objects inside it stay shared with the source.
    Copy,
    /// Write this value into the clone regardless of the source.
    Fixed(Entity),
}

#[derive(Debug, Clone)]
pub struct Field {
    name: String,
    attribute: Attribute,
}

impl Field {
    pub fn twin(name: impl Into<String>, rule: impl Into<RuleRef>) -> Self {
        Self {
            name: name.into(),
            attribute: Attribute::Twin(rule.into()),
        }
    }
    pub fn copy(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attribute: Attribute::Copy,
        }
    }
    pub fn fixed(name: impl Into<String>, value: Entity) -> Self {
        Self {
            name: name.into(),
            attribute: Attribute::Fixed(value),
        }
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn attribute(&self) -> &Attribute {
        &self.attribute
    }
}

// ------------- TypeRule -------------
/// Clone rule for objects of one kind (or of a kind deriving from it).
///
/// Only declared fields end up in the clone. The clone is kept in the
/// registry before its fields are filled in, so reference cycles among
/// objects are reproduced instead of recursed into forever.
#[derive(Debug)]
pub struct TypeRule {
    name: String,
    kind: Arc<Kind>,
    fields: Vec<Field>,
    inspector: Arc<dyn Inspector>,
}

impl TypeRule {
    pub fn new(name: impl Into<String>, kind: &Arc<Kind>) -> Self {
        Self {
            name: name.into(),
            kind: Arc::clone(kind),
            fields: Vec::new(),
            inspector: Arc::new(FieldInspector::default()),
        }
    }
    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }
    pub fn inspector(mut self, inspector: Arc<dyn Inspector>) -> Self {
        self.inspector = inspector;
        self
    }
    pub fn kind(&self) -> &Arc<Kind> {
        &self.kind
    }
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }
}

impl Twin for TypeRule {
    fn name(&self) -> String {
        self.name.clone()
    }
    fn meta(&self) -> Meta {
        Meta {
            model: Model::Object(self.kind.name().to_owned()),
        }
    }
    fn is_correct_type(&self, entity: &Entity) -> Result<bool> {
        Ok(match entity {
            Entity::Object(instance) => instance.kind().is_a(&self.kind),
            _ => false,
        })
    }
    fn twin(&self, entity: &Entity, registry: &mut TwinRegistry) -> Result<Entity> {
        self.validate(entity)?;
        let source = entity.as_instance().ok_or_else(|| {
            TwinError::Invariant(format!("{} accepted a non-object {}", self.name, entity.type_name()))
        })?;
        let (target, previously_kept) = registry.keep(source, || self.inspector.instantiate(source))?;
        if previously_kept {
            return Ok(Entity::Object(target));
        }
        trace!(rule = %self.name, source = ?source, twin = ?target, "cloning fields");
        for field in &self.fields {
            let value = match &field.attribute {
                Attribute::Twin(rule) => {
                    let value = self.inspector.read(source, &field.name)?;
                    rule.resolve()?.twin(&value, registry)?
                }
                Attribute::Copy => self.inspector.read(source, &field.name)?,
                Attribute::Fixed(value) => value.clone(),
            };
            self.inspector.write(&target, &field.name, value)?;
        }
        Ok(Entity::Object(target))
    }
}

// ------------- Scalar -------------
/// Clone rule for plain values of one data type. Values are immutable, so the
/// clone is a copy.
pub struct Scalar<V: DataType> {
    marker: PhantomData<fn() -> V>,
}

impl<V: DataType> Scalar<V> {
    pub fn new() -> Self {
        Self {
            marker: PhantomData,
        }
    }
}
impl<V: DataType> Default for Scalar<V> {
    fn default() -> Self {
        Self::new()
    }
}
impl<V: DataType> fmt::Debug for Scalar<V> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Scalar<{}>", V::DATA_TYPE)
    }
}

impl<V: DataType> Twin for Scalar<V> {
    fn name(&self) -> String {
        V::DATA_TYPE.to_owned()
    }
    fn meta(&self) -> Meta {
        Meta {
            model: Model::Value(V::DATA_TYPE),
        }
    }
    fn is_correct_type(&self, entity: &Entity) -> Result<bool> {
        Ok(entity.as_value::<V>().is_some())
    }
    fn twin(&self, entity: &Entity, _registry: &mut TwinRegistry) -> Result<Entity> {
        self.validate(entity)?;
        Ok(entity.clone())
    }
}
