//! Clones a small sample library and reports what was shared.
//!
//! Settings come from an optional `twin.toml` and `TWIN_*` environment
//! variables, e.g. `TWIN_LOG_FILTER=twin=debug`.

use std::sync::Arc;

use tracing::info;

use twin::datatype::Time;
use twin::entity::{Entity, Instance, Kind};
use twin::resolve::{RuleRef, TwinCatalog};
use twin::settings::{Settings, init_tracing};
use twin::twin::{Field, Scalar, TypeRule};
use twin::types::{OneOf, Optional, Sequence, UnorderedSet};
use twin::{Cloner, Result};

fn main() -> Result<()> {
    let settings = Settings::load()?;
    init_tracing(&settings.log_filter);

    // ------------- Kinds -------------
    let author = Kind::new("Author");
    let book = Kind::new("Book");
    let novel = Kind::derive("Novel", &book);
    let library = Kind::new("Library");

    // ------------- Rules -------------
    // Authors and books refer to each other, so they are wired through a catalog.
    let catalog = Arc::new(TwinCatalog::new());
    catalog.register(
        "library.AuthorTwin",
        TypeRule::new("AuthorTwin", &author)
            .field(Field::twin("name", Scalar::<String>::new()))
            .field(Field::twin("mentor", Optional::new(RuleRef::path(&catalog, "library.AuthorTwin")))),
    )?;
    catalog.register(
        "library.BookTwin",
        TypeRule::new("BookTwin", &book)
            .field(Field::twin("title", Scalar::<String>::new()))
            .field(Field::twin("authors", Sequence::new(RuleRef::path(&catalog, "library.AuthorTwin")))),
    )?;
    catalog.register(
        "library.NovelTwin",
        TypeRule::new("NovelTwin", &novel)
            .field(Field::twin("title", Scalar::<String>::new()))
            .field(Field::twin("authors", Sequence::new(RuleRef::path(&catalog, "library.AuthorTwin"))))
            .field(Field::copy("genre")),
    )?;
    let library_rule = TypeRule::new("LibraryTwin", &library)
        .field(Field::twin(
            "books",
            Sequence::new(OneOf::new([
                RuleRef::path(&catalog, "library.NovelTwin"),
                RuleRef::path(&catalog, "library.BookTwin"),
            ])),
        ))
        .field(Field::twin("authors", UnorderedSet::new(RuleRef::path(&catalog, "library.AuthorTwin"))))
        .field(Field::fixed("opened", Entity::value(Time::new())));

    // ------------- Graph -------------
    let tolkien = Instance::new(&author).with("name", Entity::value(String::from("J. R. R. Tolkien")))?;
    let lewis = Instance::new(&author)
        .with("name", Entity::value(String::from("C. S. Lewis")))?
        .with("mentor", Entity::object(&tolkien))?;
    tolkien.set("mentor", Entity::object(&lewis))?;
    let hobbit = Instance::new(&novel)
        .with("title", Entity::value(String::from("The Hobbit")))?
        .with("authors", Entity::sequence([Entity::object(&tolkien)]))?
        .with("genre", Entity::value(String::from("fantasy")))?;
    let letters = Instance::new(&book)
        .with("title", Entity::value(String::from("Collected Letters")))?
        .with("authors", Entity::sequence([Entity::object(&lewis), Entity::object(&tolkien)]))?;
    let shelf = Instance::new(&library)
        .with("books", Entity::sequence([Entity::object(&hobbit), Entity::object(&letters)]))?
        .with("authors", Entity::set([Entity::object(&tolkien), Entity::object(&lewis)]))?;

    // ------------- Clone -------------
    let cloner = Cloner::from_settings(&settings);
    let cloned = cloner.clone_with_report(&library_rule, &Entity::object(&shelf))?;
    info!(objects = cloned.objects, reused = cloned.reused, "library cloned");
    if let Some(copy) = cloned.entity.as_instance() {
        for field in copy.field_names()? {
            if let Some(value) = copy.get(&field)? {
                info!(field = %field, value = %value, "cloned field");
            }
        }
    }
    Ok(())
}
