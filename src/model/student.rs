use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "student_code": "STU-0001",
        "first_name": "Mina",
        "last_name": "Rahman",
        "grade": "5A",
        "parent_name": "Farid Rahman",
        "parent_email": "farid.rahman@example.com",
        "parent_phone": "+8801712345678"
    })
)]
pub struct Student {
    #[schema(example = 1)]
    pub id: u64,

    /// Stable roster identifier referenced by attendance entries.
    #[schema(example = "STU-0001")]
    pub student_code: String,

    #[schema(example = "Mina")]
    pub first_name: String,

    #[schema(example = "Rahman")]
    pub last_name: String,

    #[schema(example = "5A")]
    pub grade: String,

    #[schema(example = "Farid Rahman", nullable = true)]
    pub parent_name: Option<String>,

    #[schema(example = "farid.rahman@example.com", nullable = true)]
    pub parent_email: Option<String>,

    #[schema(example = "+8801712345678", nullable = true)]
    pub parent_phone: Option<String>,
}

impl Student {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
