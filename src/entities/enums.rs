use poem_openapi::Enum;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Enum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[oai(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    #[sea_orm(string_value = "USER")]
    User,
    #[sea_orm(string_value = "ADMIN")]
    Admin,
    #[sea_orm(string_value = "ADMIN_ROOT")]
    AdminRoot,
}

impl Role {
    pub fn is_admin(self) -> bool {
        matches!(self, Role::Admin | Role::AdminRoot)
    }
}

/// Feed category of a post. Stored as a small integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Enum)]
#[sea_orm(rs_type = "i16", db_type = "SmallInteger")]
#[oai(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PostType {
    #[sea_orm(num_value = 0)]
    QuestionAnswer,
    #[sea_orm(num_value = 1)]
    BulletinBoard,
    #[sea_orm(num_value = 2)]
    Feedback,
    #[sea_orm(num_value = 3)]
    Other,
}

impl PostType {
    /// Label shown by the frontend for the category.
    pub fn label(self) -> &'static str {
        match self {
            PostType::QuestionAnswer => "Dúvidas & Sugestões",
            PostType::BulletinBoard => "Avisos",
            PostType::Feedback => "Reclamações",
            PostType::Other => "Outros",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_admin_roles_are_admin() {
        assert!(!Role::User.is_admin());
        assert!(Role::Admin.is_admin());
        assert!(Role::AdminRoot.is_admin());
    }

    #[test]
    fn post_type_labels() {
        assert_eq!(PostType::BulletinBoard.label(), "Avisos");
        assert_eq!(PostType::Other.label(), "Outros");
    }
}
