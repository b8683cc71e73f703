//! Catalog data loaded from a JSON file at startup.
//!
//! People are referenced by a fixture-local `key`. Loading is idempotent:
//! existing people (same names and birth date) and movies (same slug) are
//! reused and updated.

use std::{collections::HashMap, path::Path};

use anyhow::Context;
use serde::Deserialize;

use crate::{
    catalog::Catalog,
    error::{AppError, AppResult},
    models::{MovieInput, PersonInput, Rating},
    slug::slugify,
};

#[derive(Debug, Deserialize)]
pub struct Fixtures {
    #[serde(default)]
    pub people: Vec<PersonFixture>,
    #[serde(default)]
    pub movies: Vec<MovieFixture>,
}

#[derive(Debug, Deserialize)]
pub struct PersonFixture {
    pub key: String,
    pub first_name: String,
    pub last_name: String,
    pub born: jiff::civil::Date,
    pub died: Option<jiff::civil::Date>,
}

#[derive(Debug, Deserialize)]
pub struct MovieFixture {
    pub title: String,
    #[serde(default)]
    pub plot: String,
    pub year: i32,
    #[serde(default)]
    pub rating: Rating,
    pub runtime: i32,
    pub website: Option<String>,
    pub director: Option<String>,
    #[serde(default)]
    pub writers: Vec<String>,
    #[serde(default)]
    pub actors: Vec<ActorFixture>,
}

#[derive(Debug, Deserialize)]
pub struct ActorFixture {
    pub person: String,
    pub role: String,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub people: usize,
    pub movies: usize,
}

pub async fn load_file(catalog: &Catalog, path: &Path) -> anyhow::Result<LoadSummary> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading fixtures {}", path.display()))?;
    let fixtures: Fixtures =
        serde_json::from_str(&raw).with_context(|| format!("parsing fixtures {}", path.display()))?;
    load(catalog, &fixtures).await.with_context(|| format!("loading fixtures {}", path.display()))
}

pub async fn load(catalog: &Catalog, fixtures: &Fixtures) -> AppResult<LoadSummary> {
    let mut people = HashMap::new();
    for fixture in &fixtures.people {
        let input = PersonInput {
            first_name: fixture.first_name.clone(),
            last_name: fixture.last_name.clone(),
            born: fixture.born,
            died: fixture.died,
        };
        let person = match catalog.find_person(&input).await? {
            Some(person) => person,
            None => catalog.create_person(&input).await?,
        };
        people.insert(fixture.key.as_str(), person.id);
    }

    let lookup = |key: &str| {
        people
            .get(key)
            .copied()
            .ok_or_else(|| AppError::Validation(format!("unknown person key {key:?}")))
    };

    for fixture in &fixtures.movies {
        let input = MovieInput {
            title: fixture.title.clone(),
            plot: fixture.plot.clone(),
            year: fixture.year,
            rating: fixture.rating,
            runtime: fixture.runtime,
            website: fixture.website.clone(),
            director_id: fixture.director.as_deref().map(lookup).transpose()?,
        };
        let existing = catalog.find_movie_by_slug(&slugify(&fixture.title)).await?;
        let movie = catalog.save_movie(existing.map(|m| m.id), &input).await?;

        for writer in &fixture.writers {
            catalog.add_writer(movie.id, lookup(writer)?).await?;
        }
        for actor in &fixture.actors {
            catalog.add_role(movie.id, lookup(&actor.person)?, &actor.role).await?;
        }
    }

    let summary = LoadSummary { people: fixtures.people.len(), movies: fixtures.movies.len() };
    tracing::info!(people = summary.people, movies = summary.movies, "loaded fixtures");
    Ok(summary)
}
