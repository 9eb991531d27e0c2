//! Combinators describing composite shapes.
//!
//! Each combinator wraps one or more inner rules given as anything that turns
//! into a [`RuleRef`]: a rule, a shared rule, a deferred creator function or
//! a dotted catalog path.
//!
//! * [`Optional`] – the entity may be absent.
//! * [`Sequence`] – an ordered collection, cloned element by element.
//! * [`UnorderedSet`] – a set, cloned element by element.
//! * [`OneOf`] – a union, cloned through the first matching candidate.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::entity::Entity;
use crate::error::{Result, TwinError};
use crate::registry::TwinRegistry;
use crate::resolve::RuleRef;
use crate::twin::{Meta, Model, Twin};

// ------------- Optional -------------
/// Absent entities are returned as they are, anything else goes through the
/// inner rule.
#[derive(Debug, Clone)]
pub struct Optional {
    inner: RuleRef,
}

impl Optional {
    pub fn new(inner: impl Into<RuleRef>) -> Self {
        Self {
            inner: inner.into(),
        }
    }
    pub fn inner(&self) -> &RuleRef {
        &self.inner
    }
}

impl Twin for Optional {
    fn name(&self) -> String {
        format!("Optional({})", self.inner.describe())
    }
    fn meta(&self) -> Meta {
        Meta { model: Model::None }
    }
    fn is_correct_type(&self, entity: &Entity) -> Result<bool> {
        Ok(entity.is_absent() || self.inner.resolve()?.is_correct_type(entity)?)
    }
    fn validate(&self, entity: &Entity) -> Result<()> {
        if self.is_correct_type(entity)? {
            return Ok(());
        }
        Err(TwinError::Validation {
            expected: format!("None or {}", self.inner.resolve()?.name()),
            found: entity.type_name(),
        })
    }
    fn twin(&self, entity: &Entity, registry: &mut TwinRegistry) -> Result<Entity> {
        self.validate(entity)?;
        if entity.is_absent() {
            return Ok(Entity::Absent);
        }
        self.inner.resolve()?.twin(entity, registry)
    }
}

// ------------- Sequence -------------
/// The clone has the same length and order as the source. A source object
/// appearing at several positions appears as the same clone at all of them.
#[derive(Debug, Clone)]
pub struct Sequence {
    inner: RuleRef,
}

impl Sequence {
    pub fn new(inner: impl Into<RuleRef>) -> Self {
        Self {
            inner: inner.into(),
        }
    }
    pub fn inner(&self) -> &RuleRef {
        &self.inner
    }
}

impl Twin for Sequence {
    fn name(&self) -> String {
        format!("Sequence({})", self.inner.describe())
    }
    fn meta(&self) -> Meta {
        Meta {
            model: Model::Sequence,
        }
    }
    fn is_correct_type(&self, entity: &Entity) -> Result<bool> {
        Ok(entity.as_sequence().is_some())
    }
    fn twin(&self, entity: &Entity, registry: &mut TwinRegistry) -> Result<Entity> {
        self.validate(entity)?;
        let inner = self.inner.resolve()?;
        let elements = entity.as_sequence().unwrap_or_default();
        if registry.options().validate_elements {
            for element in elements {
                inner.validate(element)?;
            }
        }
        let mut cloned = Vec::with_capacity(elements.len());
        for element in elements {
            cloned.push(inner.twin(element, registry)?);
        }
        Ok(Entity::Sequence(cloned))
    }
}

// ------------- UnorderedSet -------------
/// Every element is cloned through the inner rule. Clones that compare equal
/// collapse into one, so the clone may hold fewer elements than the source.
#[derive(Debug, Clone)]
pub struct UnorderedSet {
    inner: RuleRef,
}

impl UnorderedSet {
    pub fn new(inner: impl Into<RuleRef>) -> Self {
        Self {
            inner: inner.into(),
        }
    }
    pub fn inner(&self) -> &RuleRef {
        &self.inner
    }
}

impl Twin for UnorderedSet {
    fn name(&self) -> String {
        format!("Set({})", self.inner.describe())
    }
    fn meta(&self) -> Meta {
        Meta { model: Model::Set }
    }
    fn is_correct_type(&self, entity: &Entity) -> Result<bool> {
        Ok(entity.as_set().is_some())
    }
    fn twin(&self, entity: &Entity, registry: &mut TwinRegistry) -> Result<Entity> {
        self.validate(entity)?;
        let inner = self.inner.resolve()?;
        let Some(elements) = entity.as_set() else {
            return Ok(Entity::Set(BTreeSet::new()));
        };
        if registry.options().validate_elements {
            for element in elements {
                inner.validate(element)?;
            }
        }
        let mut cloned = BTreeSet::new();
        for element in elements {
            cloned.insert(inner.twin(element, registry)?);
        }
        Ok(Entity::Set(cloned))
    }
}

// ------------- OneOf -------------
/// A union of candidate rules. Candidates are tried in declaration order and
/// the first one accepting the entity clones it.
#[derive(Debug, Clone)]
pub struct OneOf {
    candidates: Vec<RuleRef>,
}

impl OneOf {
    pub fn new<I, R>(candidates: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<RuleRef>,
    {
        Self {
            candidates: candidates.into_iter().map(Into::into).collect(),
        }
    }
    // Appends a candidate, tried after all the ones already there.
    pub fn or(mut self, candidate: impl Into<RuleRef>) -> Self {
        self.candidates.push(candidate.into());
        self
    }
    pub fn candidates(&self) -> &[RuleRef] {
        &self.candidates
    }
    pub fn select(&self, entity: &Entity) -> Result<Option<Arc<dyn Twin>>> {
        for candidate in &self.candidates {
            let rule = candidate.resolve()?;
            if rule.is_correct_type(entity)? {
                return Ok(Some(rule));
            }
        }
        Ok(None)
    }
}

impl Twin for OneOf {
    fn name(&self) -> String {
        let names: Vec<String> = self.candidates.iter().map(RuleRef::describe).collect();
        format!("OneOf({})", names.join(","))
    }
    fn meta(&self) -> Meta {
        Meta { model: Model::None }
    }
    fn is_correct_type(&self, entity: &Entity) -> Result<bool> {
        Ok(self.select(entity)?.is_some())
    }
    fn validate(&self, entity: &Entity) -> Result<()> {
        if self.is_correct_type(entity)? {
            return Ok(());
        }
        let mut names = Vec::with_capacity(self.candidates.len());
        for candidate in &self.candidates {
            names.push(candidate.resolve()?.name());
        }
        Err(TwinError::Validation {
            expected: format!("one of: {}", names.join(",")),
            found: entity.type_name(),
        })
    }
    fn twin(&self, entity: &Entity, registry: &mut TwinRegistry) -> Result<Entity> {
        self.validate(entity)?;
        match self.select(entity)? {
            Some(rule) => rule.twin(entity, registry),
            None => Err(TwinError::Invariant(format!(
                "no candidate of {} selected for {} after validation passed",
                self.name(),
                entity.type_name()
            ))),
        }
    }
}
