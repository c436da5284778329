use stowage::prelude::*;

mod error;
mod models;
mod services;

use error::AppError;
use models::post::Post;
use services::post_service::PostService;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    stowage::init_tracing();

    let config = StowageConfig::load("dev").unwrap_or_else(|_| StowageConfig::empty());
    let options: DataSourceOptions = config.section().unwrap_or_default();
    let soft_delete = config.get_or("posts.soft_delete", true);

    let posts = PostService::start(options, soft_delete).await?;

    let first = posts.create(&Post::draft("Hello", "First post", 1)).await?;
    posts
        .create_many(&[
            Post::draft("Second", "Another post", 1),
            Post::draft("Third", "Yet another", 2),
        ])
        .await?;

    let Some(id) = first.id else {
        return Err(AppError::Data(DataError::Decode(
            "inserted post has no id".into(),
        )));
    };
    posts.vote(id).await?;
    posts.vote(id).await?;
    let post = posts.unvote(id).await?;
    tracing::info!(id, votes = post.votes, "voted");

    let by_author = FindParams::new()
        .query(Filter::new().eq("author", 1))
        .sort("-votes title")
        .limit(10i64);
    for post in posts.list(&by_author).await? {
        tracing::info!(id = ?post.id, title = %post.title, votes = post.votes, "post");
    }

    posts.remove(id).await?;
    tracing::info!(remaining = posts.count(None).await?, "after removal");
    if posts.restore(id).await? {
        tracing::info!(remaining = posts.count(None).await?, "after restore");
    }

    posts.stop().await
}
