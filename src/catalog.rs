use sea_orm::{
    ActiveModelTrait, ActiveValue::Unchanged, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

use crate::{
    entities::{movie, movie_image, movie_writer, person, role, vote},
    error::{AppError, AppResult},
    models::{
        ActorCredit, MovieDetail, MovieInput, MoviePage, PageNumber, PersonDetail, PersonInput, Rating,
        RoleCredit, TopMovie,
    },
    slug::slugify,
};

pub const PAGE_SIZE: u64 = 10;
const MAX_TITLE_LEN: usize = 140;
const MAX_SLUG_LEN: usize = 200;
const MAX_NAME_LEN: usize = 140;

/// Reads and writes movies, people and their credits.
#[derive(Clone)]
pub struct Catalog {
    db: DatabaseConnection,
}

impl Catalog {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list_movies(&self, page: PageNumber) -> AppResult<MoviePage> {
        let paginator = movie::Entity::find()
            .order_by_desc(movie::Column::Year)
            .order_by_asc(movie::Column::Title)
            .paginate(&self.db, PAGE_SIZE);

        // an empty catalog still renders one empty page
        let num_pages = paginator.num_pages().await?.max(1);
        let page = match page {
            PageNumber::Number(number) => number,
            PageNumber::Last => num_pages,
        };
        if page == 0 || page > num_pages {
            return Err(AppError::not_found(format!("page {page}")));
        }

        let movies = paginator.fetch_page(page - 1).await?;
        Ok(MoviePage { movies, number: page, num_pages })
    }

    pub async fn get_movie(&self, id: i32) -> AppResult<movie::Model> {
        movie::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::not_found(format!("movie {id}")))
    }

    pub async fn find_movie_by_slug(&self, slug: &str) -> AppResult<Option<movie::Model>> {
        Ok(movie::Entity::find().filter(movie::Column::Slug.eq(slug)).one(&self.db).await?)
    }

    pub async fn get_person(&self, id: i32) -> AppResult<person::Model> {
        person::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::not_found(format!("person {id}")))
    }

    /// Sum of the movie's vote values, zero when nobody voted.
    pub async fn score(&self, movie_id: i32) -> AppResult<i64> {
        let score: Option<Option<i64>> = vote::Entity::find()
            .select_only()
            .column_as(vote::Column::Value.sum(), "score")
            .filter(vote::Column::MovieId.eq(movie_id))
            .into_tuple()
            .one(&self.db)
            .await?;
        Ok(score.flatten().unwrap_or(0))
    }

    pub async fn movie_detail(&self, id: i32) -> AppResult<MovieDetail> {
        let movie = self.get_movie(id).await?;

        let director = match movie.director_id {
            Some(director_id) => person::Entity::find_by_id(director_id).one(&self.db).await?,
            None => None,
        };

        let writers = person::Entity::find()
            .inner_join(movie_writer::Entity)
            .filter(movie_writer::Column::MovieId.eq(id))
            .order_by_asc(person::Column::LastName)
            .order_by_asc(person::Column::FirstName)
            .all(&self.db)
            .await?;

        let actors = role::Entity::find()
            .filter(role::Column::MovieId.eq(id))
            .find_also_related(person::Entity)
            .order_by_asc(person::Column::LastName)
            .order_by_asc(person::Column::FirstName)
            .order_by_asc(role::Column::Name)
            .all(&self.db)
            .await?
            .into_iter()
            .filter_map(|(role, person)| person.map(|person| ActorCredit { person, role: role.name }))
            .collect();

        let images = movie_image::Entity::find()
            .filter(movie_image::Column::MovieId.eq(id))
            .order_by_desc(movie_image::Column::Uploaded)
            .all(&self.db)
            .await?;

        let score = self.score(id).await?;
        let rating = Rating::from_code(movie.rating).unwrap_or_default();

        Ok(MovieDetail { movie, rating, director, writers, actors, images, score })
    }

    /// Movies with at least one vote, highest score first.
    pub async fn top_movies(&self, limit: u64) -> AppResult<Vec<TopMovie>> {
        let top = movie::Entity::find()
            .select_only()
            .column(movie::Column::Id)
            .column(movie::Column::Title)
            .column(movie::Column::Year)
            .column_as(vote::Column::Value.sum(), "score")
            .inner_join(vote::Entity)
            .group_by(movie::Column::Id)
            .group_by(movie::Column::Title)
            .group_by(movie::Column::Year)
            .order_by_desc(vote::Column::Value.sum())
            .order_by_desc(movie::Column::Year)
            .order_by_asc(movie::Column::Title)
            .limit(limit)
            .into_model::<TopMovie>()
            .all(&self.db)
            .await?;
        Ok(top)
    }

    pub async fn person_detail(&self, id: i32) -> AppResult<PersonDetail> {
        let person = self.get_person(id).await?;

        let directed = movie::Entity::find()
            .filter(movie::Column::DirectorId.eq(id))
            .order_by_desc(movie::Column::Year)
            .order_by_asc(movie::Column::Title)
            .all(&self.db)
            .await?;

        let written = movie::Entity::find()
            .inner_join(movie_writer::Entity)
            .filter(movie_writer::Column::PersonId.eq(id))
            .order_by_desc(movie::Column::Year)
            .order_by_asc(movie::Column::Title)
            .all(&self.db)
            .await?;

        let roles = role::Entity::find()
            .filter(role::Column::PersonId.eq(id))
            .find_also_related(movie::Entity)
            .order_by_desc(movie::Column::Year)
            .order_by_asc(movie::Column::Title)
            .all(&self.db)
            .await?
            .into_iter()
            .filter_map(|(role, movie)| movie.map(|movie| RoleCredit { movie, role: role.name }))
            .collect();

        Ok(PersonDetail { person, directed, written, roles })
    }

    /// Inserts a movie, or updates movie `id`. The slug is always rebuilt
    /// from the title.
    pub async fn save_movie(&self, id: Option<i32>, input: &MovieInput) -> AppResult<movie::Model> {
        let title = input.title.trim();
        if title.is_empty() || title.chars().count() > MAX_TITLE_LEN {
            return Err(AppError::Validation(format!(
                "title must be between 1 and {MAX_TITLE_LEN} characters"
            )));
        }
        if input.year < 0 || input.runtime < 0 {
            return Err(AppError::Validation("year and runtime must not be negative".into()));
        }

        let slug = slugify(title);
        if slug.is_empty() || slug.len() > MAX_SLUG_LEN {
            return Err(AppError::Validation(format!("cannot derive a slug from {title:?}")));
        }
        if let Some(other) = self.find_movie_by_slug(&slug).await? {
            if Some(other.id) != id {
                return Err(AppError::Validation(format!("a movie with slug {slug} already exists")));
            }
        }

        if let Some(director_id) = input.director_id {
            self.get_person(director_id).await?;
        }

        let mut model = movie::ActiveModel {
            id: Default::default(),
            title: Set(title.to_string()),
            slug: Set(slug),
            plot: Set(input.plot.clone()),
            year: Set(input.year),
            rating: Set(input.rating.as_code()),
            runtime: Set(input.runtime),
            website: Set(input.website.clone().filter(|w| !w.trim().is_empty())),
            director_id: Set(input.director_id),
        };

        let saved = match id {
            Some(id) => {
                self.get_movie(id).await?;
                model.id = Unchanged(id);
                model.update(&self.db).await?
            }
            None => model.insert(&self.db).await?,
        };

        tracing::debug!(id = saved.id, slug = %saved.slug, "saved movie");
        Ok(saved)
    }

    pub async fn find_person(&self, input: &PersonInput) -> AppResult<Option<person::Model>> {
        Ok(person::Entity::find()
            .filter(person::Column::FirstName.eq(input.first_name.trim()))
            .filter(person::Column::LastName.eq(input.last_name.trim()))
            .filter(person::Column::Born.eq(input.born.to_string()))
            .one(&self.db)
            .await?)
    }

    pub async fn create_person(&self, input: &PersonInput) -> AppResult<person::Model> {
        let first_name = input.first_name.trim();
        let last_name = input.last_name.trim();
        for name in [first_name, last_name] {
            if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
                return Err(AppError::Validation(format!(
                    "names must be between 1 and {MAX_NAME_LEN} characters"
                )));
            }
        }
        if input.died.is_some_and(|died| died < input.born) {
            return Err(AppError::Validation(format!(
                "{first_name} {last_name} cannot die before being born"
            )));
        }

        let model = person::ActiveModel {
            id: Default::default(),
            first_name: Set(first_name.to_string()),
            last_name: Set(last_name.to_string()),
            born: Set(input.born.to_string()),
            died: Set(input.died.map(|d| d.to_string())),
        };
        Ok(model.insert(&self.db).await?)
    }

    /// Adds a writing credit; adding an existing one is a no-op.
    pub async fn add_writer(&self, movie_id: i32, person_id: i32) -> AppResult<()> {
        let existing = movie_writer::Entity::find_by_id((movie_id, person_id)).one(&self.db).await?;
        if existing.is_some() {
            return Ok(());
        }

        let model = movie_writer::ActiveModel { movie_id: Set(movie_id), person_id: Set(person_id) };
        movie_writer::Entity::insert(model).exec_without_returning(&self.db).await?;
        Ok(())
    }

    /// Adds an acting credit; (movie, person, name) is unique.
    pub async fn add_role(&self, movie_id: i32, person_id: i32, name: &str) -> AppResult<()> {
        let name = name.trim();
        if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
            return Err(AppError::Validation(format!(
                "role names must be between 1 and {MAX_NAME_LEN} characters"
            )));
        }

        let existing = role::Entity::find()
            .filter(role::Column::MovieId.eq(movie_id))
            .filter(role::Column::PersonId.eq(person_id))
            .filter(role::Column::Name.eq(name))
            .one(&self.db)
            .await?;
        if existing.is_some() {
            return Ok(());
        }

        let model = role::ActiveModel {
            id: Default::default(),
            movie_id: Set(movie_id),
            person_id: Set(person_id),
            name: Set(name.to_string()),
        };
        role::Entity::insert(model).exec_without_returning(&self.db).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[tokio::test]
    async fn slug_follows_title_on_every_save() {
        let db = testing::test_db().await;
        let catalog = Catalog::new(db);

        let movie = catalog.save_movie(None, &testing::movie_input("Инопланетянин", 1982)).await.unwrap();
        assert_eq!(movie.slug, "inoplanetyanin");

        let mut input = testing::movie_input("E.T. the Extra-Terrestrial", 1982);
        input.plot = "A boy befriends an alien.".into();
        let updated = catalog.save_movie(Some(movie.id), &input).await.unwrap();
        assert_eq!(updated.id, movie.id);
        assert_eq!(updated.slug, "et-the-extra-terrestrial");
        assert_eq!(catalog.get_movie(movie.id).await.unwrap().slug, "et-the-extra-terrestrial");
    }

    #[tokio::test]
    async fn duplicate_slug_is_rejected() {
        let catalog = Catalog::new(testing::test_db().await);
        catalog.save_movie(None, &testing::movie_input("Heat", 1995)).await.unwrap();

        let err = catalog.save_movie(None, &testing::movie_input("HEAT", 2001)).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn list_is_paginated_by_year_then_title() {
        let catalog = Catalog::new(testing::test_db().await);
        for i in 0..12 {
            catalog
                .save_movie(None, &testing::movie_input(&format!("Movie {i:02}"), 1990 + i % 3))
                .await
                .unwrap();
        }

        let first = catalog.list_movies(PageNumber::Number(1)).await.unwrap();
        assert_eq!(first.movies.len(), 10);
        assert_eq!(first.num_pages, 2);
        assert!(first.is_first());
        assert!(!first.is_last());
        assert_eq!(first.movies[0].year, 1992);
        assert_eq!(first.movies[0].title, "Movie 02");
        assert_eq!(first.movies[1].title, "Movie 05");

        let second = catalog.list_movies(PageNumber::Number(2)).await.unwrap();
        assert_eq!(second.movies.len(), 2);
        assert!(second.is_last());

        assert!(matches!(catalog.list_movies(PageNumber::Number(3)).await, Err(AppError::NotFound(_))));
        assert!(matches!(catalog.list_movies(PageNumber::Number(0)).await, Err(AppError::NotFound(_))));

        let last = catalog.list_movies(PageNumber::Last).await.unwrap();
        assert_eq!(last.number, 2);
        assert!(last.is_last());
    }

    #[tokio::test]
    async fn empty_catalog_has_one_page() {
        let catalog = Catalog::new(testing::test_db().await);
        let page = catalog.list_movies(PageNumber::Number(1)).await.unwrap();
        assert!(page.movies.is_empty());
        assert!(page.is_first() && page.is_last());
    }

    #[tokio::test]
    async fn score_is_sum_of_votes() {
        let db = testing::test_db().await;
        let catalog = Catalog::new(db.clone());
        let et = catalog.save_movie(None, &testing::movie_input("Инопланетянин", 1982)).await.unwrap();
        let quiet = catalog.save_movie(None, &testing::movie_input("Quiet", 2000)).await.unwrap();

        for (name, value) in [("anna", 1), ("boris", 1), ("vera", -1)] {
            let user = testing::user(&db, name).await;
            testing::vote(&db, user.id, et.id, value).await;
        }

        assert_eq!(catalog.score(et.id).await.unwrap(), 1);
        assert_eq!(catalog.score(quiet.id).await.unwrap(), 0);

        let top = catalog.top_movies(10).await.unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].id, et.id);
        assert_eq!(top[0].score, 1);
    }

    #[tokio::test]
    async fn top_movies_keeps_voted_movies_with_non_positive_scores() {
        let db = testing::test_db().await;
        let catalog = Catalog::new(db.clone());
        let split = catalog.save_movie(None, &testing::movie_input("Split", 2016)).await.unwrap();
        let panned = catalog.save_movie(None, &testing::movie_input("Panned", 2010)).await.unwrap();
        let unseen = catalog.save_movie(None, &testing::movie_input("Unseen", 2020)).await.unwrap();
        let anna = testing::user(&db, "anna").await;
        let boris = testing::user(&db, "boris").await;

        testing::vote(&db, anna.id, split.id, 1).await;
        testing::vote(&db, boris.id, split.id, -1).await;
        testing::vote(&db, anna.id, panned.id, -1).await;

        let top = catalog.top_movies(10).await.unwrap();
        let ranked: Vec<(i32, i64)> = top.iter().map(|t| (t.id, t.score)).collect();
        assert_eq!(ranked, vec![(split.id, 0), (panned.id, -1)]);
        assert!(top.iter().all(|t| t.id != unseen.id));
    }

    #[tokio::test]
    async fn top_movies_capped_and_descending() {
        let db = testing::test_db().await;
        let catalog = Catalog::new(db.clone());
        let mut users = Vec::new();
        for i in 0..12 {
            users.push(testing::user(&db, &format!("user{i}")).await);
        }
        for i in 0..12 {
            let movie =
                catalog.save_movie(None, &testing::movie_input(&format!("Film {i}"), 2000)).await.unwrap();
            for user in users.iter().take(i + 1) {
                testing::vote(&db, user.id, movie.id, 1).await;
            }
        }

        let top = catalog.top_movies(10).await.unwrap();
        assert_eq!(top.len(), 10);
        assert_eq!(top[0].score, 12);
        assert!(top.windows(2).all(|w| w[0].score > w[1].score));
    }

    #[tokio::test]
    async fn movie_detail_loads_credits() {
        let db = testing::test_db().await;
        let catalog = Catalog::new(db.clone());
        let spielberg = testing::person(&catalog, "Steven", "Spielberg").await;
        let mathison = testing::person(&catalog, "Melissa", "Mathison").await;
        let thomas = testing::person(&catalog, "Henry", "Thomas").await;

        let mut input = testing::movie_input("E.T.", 1982);
        input.director_id = Some(spielberg.id);
        input.rating = Rating::PG;
        let et = catalog.save_movie(None, &input).await.unwrap();
        catalog.add_writer(et.id, mathison.id).await.unwrap();
        catalog.add_writer(et.id, mathison.id).await.unwrap();
        catalog.add_role(et.id, thomas.id, "Elliott").await.unwrap();
        catalog.add_role(et.id, thomas.id, "Elliott").await.unwrap();

        let detail = catalog.movie_detail(et.id).await.unwrap();
        assert_eq!(detail.director.as_ref().map(|p| p.id), Some(spielberg.id));
        assert_eq!(detail.writers.len(), 1);
        assert_eq!(detail.actors.len(), 1);
        assert_eq!(detail.actors[0].role, "Elliott");
        assert_eq!(detail.rating, Rating::PG);
        assert_eq!(detail.score, 0);

        let person = catalog.person_detail(spielberg.id).await.unwrap();
        assert_eq!(person.directed.len(), 1);
        let person = catalog.person_detail(mathison.id).await.unwrap();
        assert_eq!(person.written.len(), 1);
        let person = catalog.person_detail(thomas.id).await.unwrap();
        assert_eq!(person.roles[0].movie.id, et.id);

        assert!(matches!(catalog.movie_detail(et.id + 100).await, Err(AppError::NotFound(_))));
        assert!(matches!(catalog.person_detail(999).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn person_display_and_validation() {
        let catalog = Catalog::new(testing::test_db().await);
        let born = jiff::civil::date(1950, 1, 2);
        let input = PersonInput {
            first_name: "Ann".into(),
            last_name: "Lee".into(),
            born,
            died: Some(jiff::civil::date(2010, 5, 6)),
        };
        let ann = catalog.create_person(&input).await.unwrap();
        assert_eq!(ann.display_name(), "Lee, Ann (1950-01-02-2010-05-06)");
        assert_eq!(catalog.find_person(&input).await.unwrap().map(|p| p.id), Some(ann.id));

        let bad = PersonInput { died: Some(jiff::civil::date(1940, 1, 1)), ..input };
        assert!(matches!(catalog.create_person(&bad).await, Err(AppError::Validation(_))));
    }
}
