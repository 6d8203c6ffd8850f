use uuid::Uuid;

/// Stored user record; the password field only ever holds a hash
#[derive(Debug, Clone, PartialEq)]
pub struct UserModel {
    pub id: String, // UUID v4 as string
    pub username: String,
    pub password_hash: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl UserModel {
    /// Creates a new user with a generated ID
    pub fn new(
        username: String,
        password_hash: String,
        email: String,
        phone: Option<String>,
        address: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            username,
            password_hash,
            email,
            phone,
            address,
        }
    }
}
