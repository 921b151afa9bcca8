use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Teacher {
    #[schema(example = 7)]
    pub id: u64,

    #[schema(example = "Anika")]
    pub first_name: String,

    #[schema(example = "Chowdhury")]
    pub last_name: String,

    #[schema(example = "anika.chowdhury@school.edu")]
    pub email: String,

    #[schema(example = "Mathematics", nullable = true)]
    pub subject: Option<String>,
}
