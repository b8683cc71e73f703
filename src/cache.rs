use sea_orm::{DatabaseConnection, EntityTrait, Set};
use serde::{Serialize, de::DeserializeOwned};

use crate::{catalog::Catalog, entities::cache_entry, error::AppResult, models::TopMovie};

pub const TOP_MOVIES_LIMIT: u64 = 10;

/// Cached values are only trusted when written by the same build.
pub const CACHE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Clone)]
pub struct CacheManager {
    db: DatabaseConnection,
    ttl_seconds: i64,
    version: String,
}

impl CacheManager {
    pub fn new(db: DatabaseConnection, ttl_seconds: i64) -> Self {
        Self::with_version(db, ttl_seconds, CACHE_VERSION)
    }

    pub fn with_version(db: DatabaseConnection, ttl_seconds: i64, version: impl Into<String>) -> Self {
        Self { db, ttl_seconds, version: version.into() }
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> AppResult<Option<T>> {
        let Some(entry) = cache_entry::Entity::find_by_id(key.to_string()).one(&self.db).await? else {
            return Ok(None);
        };

        if entry.version != self.version {
            tracing::debug!(key, cached = %entry.version, current = %self.version, "cache version mismatch");
            return Ok(None);
        }
        if !self.is_fresh(entry.cached_at) {
            return Ok(None);
        }

        match serde_json::from_str(&entry.value) {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                tracing::warn!(key, error = %err, "discarding unreadable cache entry");
                Ok(None)
            }
        }
    }

    pub async fn set<T: Serialize>(&self, key: &str, value: &T) -> AppResult<()> {
        let model = cache_entry::ActiveModel {
            key: Set(key.to_string()),
            version: Set(self.version.clone()),
            value: Set(serde_json::to_string(value)?),
            cached_at: Set(now_sec()),
        };

        cache_entry::Entity::insert(model)
            .on_conflict(
                sea_orm::sea_query::OnConflict::column(cache_entry::Column::Key)
                    .update_columns([
                        cache_entry::Column::Version,
                        cache_entry::Column::Value,
                        cache_entry::Column::CachedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        Ok(())
    }

    /// Top movies by score, served from the `top_movies_<limit>` entry when
    /// it is present and current.
    pub async fn top_movies(&self, catalog: &Catalog) -> AppResult<Vec<TopMovie>> {
        let key = format!("top_movies_{TOP_MOVIES_LIMIT}");
        if let Some(cached) = self.get::<Vec<TopMovie>>(&key).await? {
            return Ok(cached);
        }

        let top = catalog.top_movies(TOP_MOVIES_LIMIT).await?;
        self.set(&key, &top).await?;
        Ok(top)
    }

    fn is_fresh(&self, cached_at: i64) -> bool {
        self.ttl_seconds <= 0 || now_sec().saturating_sub(cached_at) <= self.ttl_seconds
    }
}

fn now_sec() -> i64 {
    jiff::Timestamp::now().as_second()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[tokio::test]
    async fn top_movies_served_from_cache() {
        let db = testing::test_db().await;
        let catalog = Catalog::new(db.clone());
        let cache = CacheManager::new(db.clone(), 0);
        let movie = catalog.save_movie(None, &testing::movie_input("Solaris", 1972)).await.unwrap();
        let user = testing::user(&db, "kris").await;
        testing::vote(&db, user.id, movie.id, 1).await;

        let first = cache.top_movies(&catalog).await.unwrap();
        assert_eq!(first.len(), 1);

        let other = catalog.save_movie(None, &testing::movie_input("Stalker", 1979)).await.unwrap();
        testing::vote(&db, user.id, other.id, 1).await;

        // no invalidation on votes: the stored entry is still served
        let second = cache.top_movies(&catalog).await.unwrap();
        assert_eq!(second, first);
    }

    #[tokio::test]
    async fn version_mismatch_recomputes() {
        let db = testing::test_db().await;
        let catalog = Catalog::new(db.clone());
        let old = CacheManager::with_version(db.clone(), 0, "0.0.1");
        let movie = catalog.save_movie(None, &testing::movie_input("Solaris", 1972)).await.unwrap();

        assert!(old.top_movies(&catalog).await.unwrap().is_empty());

        let user = testing::user(&db, "kris").await;
        testing::vote(&db, user.id, movie.id, 1).await;

        let current = CacheManager::with_version(db.clone(), 0, "0.0.2");
        let top = current.top_movies(&catalog).await.unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].score, 1);
    }

    #[tokio::test]
    async fn get_and_set_round_trip() {
        let db = testing::test_db().await;
        let cache = CacheManager::new(db, 60);
        assert_eq!(cache.get::<Vec<i32>>("numbers").await.unwrap(), None);
        cache.set("numbers", &vec![1, 2, 3]).await.unwrap();
        cache.set("numbers", &vec![4]).await.unwrap();
        assert_eq!(cache.get::<Vec<i32>>("numbers").await.unwrap(), Some(vec![4]));
        assert_eq!(cache.get::<String>("numbers").await.unwrap(), None);
    }
}
