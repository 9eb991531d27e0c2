//! Twin – a declarative, identity preserving clone engine for object graphs.
//!
//! Cloning is driven by *rules* rather than by the objects themselves. A rule
//! describes the shape of what it clones:
//! * A [`twin::TypeRule`] describes one [`entity::Kind`] of object, field by field.
//! * A [`twin::Scalar`] clones plain values of one [`datatype::DataType`].
//! * The combinators in [`types`] compose rules into optional values,
//!   sequences, sets and unions.
//!
//! Every rule implements the [`twin::Twin`] trait. During one clone operation
//! all rules share a [`registry::TwinRegistry`] that maps each source object,
//! by identity, to its clone. An object reachable through several paths is
//! therefore cloned exactly once, and every reference to it in the result
//! points at that single clone.
//!
//! ## Modules
//! * [`entity`] – Entities, instances (compared by identity) and kinds.
//! * [`datatype`] – The [`datatype::DataType`] trait and the scalar values.
//! * [`registry`] – The per-operation registry of kept clones.
//! * [`twin`] – The rule contract, type-level rules, inspectors and scalars.
//! * [`types`] – Rule combinators.
//! * [`resolve`] – Direct, deferred and path based references between rules.
//! * [`clone`] – Entry points owning the registry of one operation.
//! * [`settings`] – Configuration and logging setup.
//!
//! ## Rule References
//! Rules frequently refer to one another, e.g. an author has books and a book
//! has authors. A rule may be given directly, through a creator function, or
//! through a dotted path into a [`resolve::TwinCatalog`]. Indirect references
//! are resolved on first use and cached.
//!
//! ## Quick Start
//! ```
//! use twin::entity::{Entity, Instance, Kind};
//! use twin::twin::{Field, Scalar, TypeRule};
//! use twin::types::{Optional, Sequence};
//! use twin::clone_root;
//!
//! let person = Kind::new("Person");
//! let rule = TypeRule::new("PersonTwin", &person)
//!     .field(Field::twin("name", Scalar::<String>::new()));
//! let alice = Instance::new(&person)
//!     .with("name", Entity::value(String::from("Alice")))
//!     .unwrap();
//! let people = Entity::sequence([Entity::object(&alice), Entity::Absent, Entity::object(&alice)]);
//! let cloned = clone_root(&Sequence::new(Optional::new(rule)), &people).unwrap();
//! let cloned = cloned.as_sequence().unwrap();
//! assert_eq!(cloned[0], cloned[2]);
//! assert_ne!(cloned[0], Entity::object(&alice));
//! assert!(cloned[1].is_absent());
//! ```
//!
//! ## Errors
//! Nothing is caught or retried inside the engine. Any failure propagates to
//! the caller of [`clone_root`] and the partial clone is discarded together
//! with its registry.

pub mod clone;
pub mod datatype;
pub mod entity;
pub mod error;
pub mod registry;
pub mod resolve;
pub mod settings;
pub mod twin;
pub mod types;

pub use clone::{Cloned, Cloner, clone_root};
pub use error::{Result, TwinError};
