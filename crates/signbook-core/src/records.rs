use serde::{Deserialize, Serialize};

/// Column names of the persisted user table, in on-disk order.
pub const FIELD_NAMES: [&str; 5] = ["name", "email", "phone", "password", "gender"];

/// One user's persisted field tuple.
///
/// Field declaration order is the column order of the store; serializers
/// rely on it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserRecord {
    pub name: String,
    /// Unique key within the store, compared case-sensitively.
    pub email: String,
    pub phone: String,
    /// Plaintext credential, stored and compared verbatim.
    pub password: String,
    pub gender: String,
}

impl UserRecord {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
        password: impl Into<String>,
        gender: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            phone: phone.into(),
            password: password.into(),
            gender: gender.into(),
        }
    }

    /// Copy with leading/trailing whitespace removed from every field.
    pub fn trimmed(&self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self.phone.trim().to_string(),
            password: self.password.trim().to_string(),
            gender: self.gender.trim().to_string(),
        }
    }

    pub fn has_email(&self, email: &str) -> bool {
        self.email == email
    }
}

/// A user record as exposed to listing clients: everything but the password.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PublicUserRecord {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub gender: String,
}

impl From<UserRecord> for PublicUserRecord {
    fn from(record: UserRecord) -> Self {
        Self {
            name: record.name,
            email: record.email,
            phone: record.phone,
            gender: record.gender,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trimmed_strips_every_field() {
        let record = UserRecord::new(" Ann ", "a@x.com\t", " 123 ", " pw ", "female ");
        assert_eq!(
            record.trimmed(),
            UserRecord::new("Ann", "a@x.com", "123", "pw", "female")
        );
    }

    #[test]
    fn public_record_drops_password_key() {
        let public: PublicUserRecord =
            UserRecord::new("Ann", "a@x.com", "1234567890", "pass12", "female").into();
        let json = serde_json::to_value(&public).expect("serialize");
        let obj = json.as_object().expect("object");

        assert!(!obj.contains_key("password"));
        assert_eq!(obj.len(), 4);
        assert_eq!(obj["email"], "a@x.com");
    }
}
