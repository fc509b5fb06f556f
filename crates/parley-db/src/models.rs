use parley_types::UserId;

/// Database row for an account. Chats and messages map straight onto the
/// parley-types models; users stay here because the password hash must
/// never reach the API layer by accident.
pub struct UserRow {
    pub id: UserId,
    pub login: String,
    pub password: String,
}
