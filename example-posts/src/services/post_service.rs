use serde_json::json;
use stowage::prelude::*;

use crate::error::AppError;
use crate::models::post::Post;

pub struct PostService {
    adapter: SqlxAdapter,
}

impl PostService {
    /// Bind the posts schema to a fresh adapter and open its connection.
    ///
    /// Existing rows are cleared once connected, so every run starts empty.
    pub async fn start(options: DataSourceOptions, soft_delete: bool) -> Result<Self, AppError> {
        let adapter = SqlxAdapter::new(options);
        let settings = ServiceSettings {
            use_soft_delete: soft_delete,
        };
        adapter.init(Post::schema(), settings)?;
        adapter.connect().await?;
        tracing::info!("Connected successfully");

        let cleared = adapter.clear().await?;
        tracing::debug!(cleared, "posts table cleared");
        Ok(Self { adapter })
    }

    pub async fn stop(&self) -> Result<(), AppError> {
        Ok(self.adapter.disconnect().await?)
    }

    pub async fn create(&self, post: &Post) -> Result<Post, AppError> {
        let saved = self.adapter.insert(post.to_record()?).await?;
        Ok(Post::from_record(saved)?)
    }

    pub async fn create_many(&self, posts: &[Post]) -> Result<Vec<Post>, AppError> {
        let records = posts.iter().map(Post::to_record).collect::<Result<Vec<_>, _>>()?;
        let saved = self.adapter.insert_many(records).await?;
        Ok(saved.into_iter().map(Post::from_record).collect::<Result<_, _>>()?)
    }

    pub async fn get(&self, id: i64) -> Result<Post, AppError> {
        let record = self
            .adapter
            .find_by_id(json!(id))
            .await?
            .ok_or(AppError::NotFound(id))?;
        Ok(Post::from_record(record)?)
    }

    pub async fn list(&self, params: &FindParams) -> Result<Vec<Post>, AppError> {
        let records = self.adapter.find(Some(params)).await?;
        Ok(records.into_iter().map(Post::from_record).collect::<Result<_, _>>()?)
    }

    pub async fn count(&self, params: Option<&FindParams>) -> Result<u64, AppError> {
        Ok(self.adapter.count(params).await?)
    }

    pub async fn vote(&self, id: i64) -> Result<Post, AppError> {
        self.add_votes(id, 1).await
    }

    pub async fn unvote(&self, id: i64) -> Result<Post, AppError> {
        self.add_votes(id, -1).await
    }

    async fn add_votes(&self, id: i64, delta: i64) -> Result<Post, AppError> {
        let post = self.get(id).await?;
        let patch = UpdatePatch::default().field("votes", post.votes + delta);
        let updated = self
            .adapter
            .update_by_id(json!(id), patch)
            .await?
            .ok_or(AppError::NotFound(id))?;
        Ok(Post::from_record(updated)?)
    }

    pub async fn remove(&self, id: i64) -> Result<(), AppError> {
        self.adapter.remove_by_id(json!(id)).await?;
        Ok(())
    }

    pub async fn restore(&self, id: i64) -> Result<bool, AppError> {
        Ok(self.adapter.restore_by_id(json!(id)).await?.affected > 0)
    }
}
