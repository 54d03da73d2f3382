use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Join table linking audio files to the users authorized to read them.
/// The owner is always inserted here at upload time.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_audio")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub audio_file_id: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::audio_files::Entity",
        from = "Column::AudioFileId",
        to = "super::audio_files::Column::Id",
        on_delete = "Cascade"
    )]
    AudioFile,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::audio_files::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AudioFile.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
