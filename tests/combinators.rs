use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use twin::entity::{Entity, Instance, Kind};
use twin::registry::TwinRegistry;
use twin::settings::CloneOptions;
use twin::twin::{Field, Meta, Model, Scalar, Twin, TypeRule};
use twin::types::{OneOf, Optional, Sequence, UnorderedSet};
use twin::{Cloner, Result, TwinError, clone_root};

struct Zoo {
    animal: Arc<Kind>,
    dog: Arc<Kind>,
    cat: Arc<Kind>,
    bird: Arc<Kind>,
}

fn setup() -> Zoo {
    let animal = Kind::new("Animal");
    Zoo {
        dog: Kind::derive("Dog", &animal),
        cat: Kind::derive("Cat", &animal),
        bird: Kind::derive("Bird", &animal),
        animal,
    }
}

// Stamps every clone with the rule it went through.
fn stamped(name: &str, kind: &Arc<Kind>) -> TypeRule {
    TypeRule::new(name, kind)
        .field(Field::copy("name"))
        .field(Field::fixed("via", Entity::value(name.to_string())))
}

fn pet(kind: &Arc<Kind>, name: &str) -> Instance {
    Instance::new(kind)
        .with("name", Entity::value(name.to_string()))
        .expect("set name")
}

fn via(entity: &Entity) -> String {
    let instance = entity.as_instance().expect("object");
    let via = instance.get("via").unwrap().expect("via set");
    via.as_value::<String>().expect("string").clone()
}

// Maps every value to the same constant.
#[derive(Debug)]
struct Flatten;
impl Twin for Flatten {
    fn name(&self) -> String {
        String::from("Flatten")
    }
    fn meta(&self) -> Meta {
        Meta { model: Model::Value("i64") }
    }
    fn is_correct_type(&self, entity: &Entity) -> Result<bool> {
        Ok(matches!(entity, Entity::Value(_)))
    }
    fn twin(&self, _entity: &Entity, _registry: &mut TwinRegistry) -> Result<Entity> {
        Ok(Entity::value(0i64))
    }
}

// Accepts integers and counts how many it cloned.
#[derive(Debug, Default)]
struct Counting {
    cloned: Arc<AtomicUsize>,
}
impl Twin for Counting {
    fn name(&self) -> String {
        String::from("Counting")
    }
    fn meta(&self) -> Meta {
        Meta { model: Model::Value("i64") }
    }
    fn is_correct_type(&self, entity: &Entity) -> Result<bool> {
        Ok(entity.as_value::<i64>().is_some())
    }
    fn twin(&self, entity: &Entity, _registry: &mut TwinRegistry) -> Result<Entity> {
        self.validate(entity)?;
        self.cloned.fetch_add(1, Ordering::SeqCst);
        Ok(entity.clone())
    }
}

// Accepts the first entity it is asked about and nothing after that.
#[derive(Debug, Default)]
struct Fickle {
    asked: AtomicUsize,
}
impl Twin for Fickle {
    fn name(&self) -> String {
        String::from("Fickle")
    }
    fn meta(&self) -> Meta {
        Meta { model: Model::None }
    }
    fn is_correct_type(&self, _entity: &Entity) -> Result<bool> {
        Ok(self.asked.fetch_add(1, Ordering::SeqCst) == 0)
    }
    fn twin(&self, entity: &Entity, _registry: &mut TwinRegistry) -> Result<Entity> {
        Ok(entity.clone())
    }
}

// ------------- Optional -------------
#[test]
fn optional_keeps_absent() {
    let rule = Optional::new(Scalar::<i64>::new());
    let cloned = clone_root(&rule, &Entity::Absent).expect("clone ok");
    assert!(cloned.is_absent());
}

#[test]
fn optional_present_matches_inner_clone() {
    let zoo = setup();
    let rex = pet(&zoo.dog, "Rex");
    let optional = clone_root(&Optional::new(stamped("DogTwin", &zoo.dog)), &Entity::object(&rex)).expect("clone ok");
    let direct = clone_root(&stamped("DogTwin", &zoo.dog), &Entity::object(&rex)).expect("clone ok");
    let (optional, direct) = (optional.as_instance().unwrap(), direct.as_instance().unwrap());
    assert_eq!(optional.kind().name(), direct.kind().name());
    assert_eq!(optional.get("name").unwrap(), direct.get("name").unwrap());
    assert_eq!(optional.get("via").unwrap(), direct.get("via").unwrap());
    let number = clone_root(&Optional::new(Scalar::<i64>::new()), &Entity::value(5i64)).expect("clone ok");
    assert_eq!(number, Entity::value(5i64));
}

#[test]
fn optional_rejects_mismatched_value() {
    let rule = Optional::new(Scalar::<i64>::new());
    let err = rule.validate(&Entity::value(String::from("five"))).unwrap_err();
    match err {
        TwinError::Validation { expected, found } => {
            assert_eq!(expected, "None or i64");
            assert_eq!(found, "String");
        }
        other => panic!("unexpected error {other}"),
    }
    assert!(clone_root(&rule, &Entity::value(String::from("five"))).is_err());
}

// ------------- Sequence -------------
#[test]
fn sequence_preserves_order_and_length() {
    let input = Entity::sequence([3i64, 1, 2, 1].map(Entity::value));
    let cloned = clone_root(&Sequence::new(Scalar::<i64>::new()), &input).expect("clone ok");
    assert_eq!(cloned, input);
    assert_eq!(cloned.as_sequence().unwrap().len(), 4);
}

#[test]
fn sequence_of_objects_keeps_positions() {
    let zoo = setup();
    let pets = [pet(&zoo.dog, "Rex"), pet(&zoo.dog, "Fido"), pet(&zoo.dog, "Bolt")];
    let input = Entity::sequence(pets.iter().map(Entity::object));
    let cloned = clone_root(&Sequence::new(stamped("DogTwin", &zoo.dog)), &input).expect("clone ok");
    let cloned = cloned.as_sequence().unwrap();
    for (source, clone) in pets.iter().zip(cloned) {
        let clone = clone.as_instance().expect("object");
        assert!(!clone.same_as(source));
        assert_eq!(clone.get("name").unwrap(), source.get("name").unwrap());
    }
}

#[test]
fn sequence_rejects_non_sequence() {
    let rule = Sequence::new(Scalar::<i64>::new());
    let err = clone_root(&rule, &Entity::set([Entity::value(1i64)])).unwrap_err();
    assert!(matches!(err, TwinError::Validation { .. }));
    assert!(format!("{}", err).contains("got Set"));
}

#[test]
fn sequence_elements_validated_up_front_when_asked() {
    let input = Entity::sequence([Entity::value(1i64), Entity::value(2i64), Entity::value(String::from("three"))]);

    let counting = Counting::default();
    let cloned = Arc::clone(&counting.cloned);
    let rule = Sequence::new(counting);
    let strict = Cloner::new(CloneOptions {
        validate_elements: true,
        ..CloneOptions::default()
    });
    assert!(matches!(strict.clone_root(&rule, &input), Err(TwinError::Validation { .. })));
    assert_eq!(cloned.load(Ordering::SeqCst), 0, "nothing cloned before validation failed");

    // without up-front validation elements are cloned until one fails
    let counting = Counting::default();
    let cloned = Arc::clone(&counting.cloned);
    let rule = Sequence::new(counting);
    assert!(clone_root(&rule, &input).is_err());
    assert_eq!(cloned.load(Ordering::SeqCst), 2);
}

// ------------- UnorderedSet -------------
#[test]
fn set_clones_every_element() {
    let zoo = setup();
    let rex = pet(&zoo.dog, "Rex");
    let fido = pet(&zoo.dog, "Fido");
    let input = Entity::set([Entity::object(&rex), Entity::object(&fido)]);
    let cloned = clone_root(&UnorderedSet::new(stamped("DogTwin", &zoo.dog)), &input).expect("clone ok");
    let cloned = cloned.as_set().expect("set");
    assert_eq!(cloned.len(), 2);
    for clone in cloned {
        let clone = clone.as_instance().expect("object");
        assert!(!clone.same_as(&rex) && !clone.same_as(&fido));
    }
}

#[test]
fn set_shrinks_when_clones_compare_equal() {
    let input = Entity::set([1i64, 2, 3].map(Entity::value));
    let cloned = clone_root(&UnorderedSet::new(Flatten), &input).expect("clone ok");
    assert_eq!(cloned, Entity::set([Entity::value(0i64)]));
}

#[test]
fn set_rejects_sequence() {
    let rule = UnorderedSet::new(Scalar::<i64>::new());
    assert!(rule.validate(&Entity::sequence(Vec::new())).is_err());
    assert!(rule.validate(&Entity::set(Vec::new())).is_ok());
}

// ------------- OneOf -------------
#[test]
fn one_of_selects_matching_candidate() {
    let zoo = setup();
    let tom = pet(&zoo.cat, "Tom");
    let rule = OneOf::new([stamped("DogTwin", &zoo.dog), stamped("CatTwin", &zoo.cat)]);
    let cloned = clone_root(&rule, &Entity::object(&tom)).expect("clone ok");
    assert_eq!(cloned.as_instance().unwrap().kind().name(), "Cat");
    assert_eq!(via(&cloned), "CatTwin");
}

#[test]
fn one_of_prefers_first_declared_candidate() {
    let zoo = setup();
    let tom = pet(&zoo.cat, "Tom");
    let animal_first = OneOf::new([stamped("AnimalTwin", &zoo.animal), stamped("CatTwin", &zoo.cat)]);
    for _ in 0..3 {
        let cloned = clone_root(&animal_first, &Entity::object(&tom)).expect("clone ok");
        assert_eq!(via(&cloned), "AnimalTwin");
    }
    let cat_first = OneOf::new([stamped("CatTwin", &zoo.cat)]).or(stamped("AnimalTwin", &zoo.animal));
    let cloned = clone_root(&cat_first, &Entity::object(&tom)).expect("clone ok");
    assert_eq!(via(&cloned), "CatTwin");
}

#[test]
fn one_of_rejection_names_all_candidates() {
    let zoo = setup();
    let tweety = pet(&zoo.bird, "Tweety");
    let rule = OneOf::new([stamped("DogTwin", &zoo.dog), stamped("CatTwin", &zoo.cat)]);
    assert!(!rule.is_correct_type(&Entity::object(&tweety)).unwrap());
    let err = clone_root(&rule, &Entity::object(&tweety)).unwrap_err();
    let msg = format!("{}", err);
    assert!(msg.contains("one of: DogTwin,CatTwin"), "{msg}");
    assert!(msg.contains("got Bird"), "{msg}");
}

#[test]
fn one_of_reports_divergent_selection() {
    let rule = OneOf::new([Fickle::default()]);
    let err = clone_root(&rule, &Entity::value(1i64)).unwrap_err();
    assert!(matches!(err, TwinError::Invariant(_)), "{err}");
}

// ------------- Meta -------------
#[test]
fn combinators_describe_their_model() {
    let zoo = setup();
    assert_eq!(Sequence::new(Scalar::<i64>::new()).meta().model, Model::Sequence);
    assert_eq!(UnorderedSet::new(Scalar::<i64>::new()).meta().model, Model::Set);
    assert_eq!(Optional::new(Scalar::<i64>::new()).meta().model, Model::None);
    assert_eq!(OneOf::new([Scalar::<i64>::new()]).meta().model, Model::None);
    assert_eq!(Scalar::<bool>::new().meta().model, Model::Value("bool"));
    assert_eq!(stamped("DogTwin", &zoo.dog).meta().model, Model::Object(String::from("Dog")));
    assert_eq!(Sequence::new(Optional::new(stamped("DogTwin", &zoo.dog))).name(), "Sequence(Optional(DogTwin))");
}
