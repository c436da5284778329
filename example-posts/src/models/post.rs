use serde::{Deserialize, Serialize};
use stowage::prelude::*;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub title: String,
    pub content: String,
    pub votes: i64,
    pub status: bool,
    pub author: i64,
}

impl Post {
    pub fn draft(title: &str, content: &str, author: i64) -> Self {
        Self {
            id: None,
            title: title.to_string(),
            content: content.to_string(),
            votes: 0,
            status: true,
            author,
        }
    }
}

impl Entity for Post {
    fn schema() -> EntitySchema {
        EntitySchema::new("posts")
            .column(ColumnDef::primary_generated("id"))
            .column(ColumnDef::new("title", ColumnType::Text).not_null())
            .column(ColumnDef::new("content", ColumnType::Text).not_null())
            .column(ColumnDef::new("votes", ColumnType::Integer).not_null())
            .column(ColumnDef::new("status", ColumnType::Boolean).not_null())
            .column(ColumnDef::new("author", ColumnType::Integer).not_null())
            .delete_date_column("deleted_at")
    }
}
