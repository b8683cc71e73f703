use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    sea_query::OnConflict,
};

use crate::{
    entities::vote,
    error::{AppError, AppResult},
    models::{ViewerVote, VoteValue},
};

#[derive(Clone)]
pub struct VoteStore {
    db: DatabaseConnection,
}

impl VoteStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn find(&self, movie_id: i32, user_id: i32) -> AppResult<Option<vote::Model>> {
        Ok(vote::Entity::find()
            .filter(vote::Column::MovieId.eq(movie_id))
            .filter(vote::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?)
    }

    /// The user's saved vote on the movie, or an unsaved blank one.
    pub async fn vote_or_blank(&self, movie_id: i32, user_id: i32) -> AppResult<ViewerVote> {
        let vote = self.find(movie_id, user_id).await?;
        Ok(match vote {
            Some(vote) => ViewerVote {
                id: Some(vote.id),
                movie_id,
                user_id,
                value: VoteValue::from_value(vote.value),
            },
            None => ViewerVote { id: None, movie_id, user_id, value: None },
        })
    }

    /// Records the user's vote. A user holds one vote per movie, so voting
    /// again replaces the value of the existing vote.
    pub async fn create(&self, user_id: i32, movie_id: i32, value: VoteValue) -> AppResult<vote::Model> {
        let model = vote::ActiveModel {
            id: Default::default(),
            value: Set(value.as_value()),
            user_id: Set(user_id),
            movie_id: Set(movie_id),
            voted_on: Set(now_sec()),
        };

        vote::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([vote::Column::UserId, vote::Column::MovieId])
                    .update_columns([vote::Column::Value, vote::Column::VotedOn])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        let vote = self
            .find(movie_id, user_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("vote of user {user_id} on movie {movie_id} vanished"))?;
        tracing::debug!(vote = vote.id, movie_id, user_id, value = vote.value, "vote recorded");
        Ok(vote)
    }

    /// Vote `vote_id`, which must belong to `movie_id` and be owned by
    /// `user_id`.
    pub async fn get_owned(&self, vote_id: i32, movie_id: i32, user_id: i32) -> AppResult<vote::Model> {
        let vote = vote::Entity::find_by_id(vote_id)
            .one(&self.db)
            .await?
            .filter(|v| v.movie_id == movie_id)
            .ok_or_else(|| AppError::not_found(format!("vote {vote_id}")))?;

        if vote.user_id != user_id {
            tracing::warn!(vote = vote_id, owner = vote.user_id, user_id, "rejected vote change");
            return Err(AppError::Forbidden("cannot change another user vote".into()));
        }
        Ok(vote)
    }

    pub async fn set_value(&self, vote: vote::Model, value: VoteValue) -> AppResult<vote::Model> {
        let mut model: vote::ActiveModel = vote.into();
        model.value = Set(value.as_value());
        model.voted_on = Set(now_sec());
        Ok(model.update(&self.db).await?)
    }
}

fn now_sec() -> i64 {
    jiff::Timestamp::now().as_second()
}

#[cfg(test)]
mod tests {
    use sea_orm::PaginatorTrait;

    use super::*;
    use crate::{catalog::Catalog, testing};

    #[tokio::test]
    async fn second_vote_updates_instead_of_duplicating() {
        let db = testing::test_db().await;
        let catalog = Catalog::new(db.clone());
        let votes = VoteStore::new(db.clone());
        let movie = catalog.save_movie(None, &testing::movie_input("Alien", 1979)).await.unwrap();
        let ripley = testing::user(&db, "ripley").await;

        let first = votes.create(ripley.id, movie.id, VoteValue::Up).await.unwrap();
        let second = votes.create(ripley.id, movie.id, VoteValue::Down).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.value, -1);
        assert_eq!(vote::Entity::find().count(&db).await.unwrap(), 1);
        assert_eq!(catalog.score(movie.id).await.unwrap(), -1);
    }

    #[tokio::test]
    async fn blank_vote_until_saved() {
        let db = testing::test_db().await;
        let catalog = Catalog::new(db.clone());
        let votes = VoteStore::new(db.clone());
        let movie = catalog.save_movie(None, &testing::movie_input("Alien", 1979)).await.unwrap();
        let ripley = testing::user(&db, "ripley").await;

        let blank = votes.vote_or_blank(movie.id, ripley.id).await.unwrap();
        assert_eq!(blank.id, None);
        assert_eq!(blank.value, None);
        assert_eq!(blank.form_action(), format!("/movie/{}/vote/", movie.id));

        let saved = votes.create(ripley.id, movie.id, VoteValue::Up).await.unwrap();
        let viewer = votes.vote_or_blank(movie.id, ripley.id).await.unwrap();
        assert_eq!(viewer.id, Some(saved.id));
        assert_eq!(viewer.value, Some(VoteValue::Up));
        assert_eq!(viewer.form_action(), format!("/movie/{}/vote/{}/", movie.id, saved.id));
    }

    #[tokio::test]
    async fn update_requires_ownership() {
        let db = testing::test_db().await;
        let catalog = Catalog::new(db.clone());
        let votes = VoteStore::new(db.clone());
        let movie = catalog.save_movie(None, &testing::movie_input("Alien", 1979)).await.unwrap();
        let other = catalog.save_movie(None, &testing::movie_input("Aliens", 1986)).await.unwrap();
        let ripley = testing::user(&db, "ripley").await;
        let ash = testing::user(&db, "ash").await;

        let vote = votes.create(ripley.id, movie.id, VoteValue::Up).await.unwrap();

        let err = votes.get_owned(vote.id, movie.id, ash.id).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let err = votes.get_owned(vote.id, other.id, ripley.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let err = votes.get_owned(vote.id + 50, movie.id, ripley.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let owned = votes.get_owned(vote.id, movie.id, ripley.id).await.unwrap();
        let updated = votes.set_value(owned, VoteValue::Down).await.unwrap();
        assert_eq!(updated.value, -1);
        assert_eq!(catalog.score(movie.id).await.unwrap(), -1);
    }
}
