use serde::Deserialize;

use crate::validation::{length, required, FieldErrors};

pub const POST_MAX: usize = 140;

#[derive(Debug, Default, Deserialize)]
pub struct PostForm {
    #[serde(default)]
    pub post: String,
}

impl PostForm {
    pub fn body(&self) -> &str {
        self.post.trim()
    }

    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        if required(&mut errors, "post", self.body()) {
            length(&mut errors, "post", self.body(), 1, POST_MAX);
        }
        errors.into_result()
    }
}

/// `?page=N`, 1-based.
#[derive(Debug, Default, Deserialize)]
pub struct FeedQuery {
    pub page: Option<i64>,
}

impl FeedQuery {
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn offset(&self, per_page: i64) -> i64 {
        (self.page() - 1).saturating_mul(per_page)
    }
}
