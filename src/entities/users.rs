use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub username: String,
    #[sea_orm(unique)]
    pub email: Option<String>,
    pub password_hash: String,
    pub full_name: Option<String>,
    pub disabled: bool,
    /// Space-separated list of access scopes
    pub scopes: String,
    /// True if the account was created via an OAuth provider
    pub is_oauth: bool,
    pub oauth_provider: Option<String>,
    pub oauth_id: Option<String>,
    pub created_at: Option<DateTimeUtc>,
    pub updated_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::audio_files::Entity")]
    OwnedFiles,
    #[sea_orm(has_many = "super::user_audio::Entity")]
    UserAudio,
}

impl Related<super::audio_files::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OwnedFiles.def()
    }
}

impl Related<super::user_audio::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserAudio.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
