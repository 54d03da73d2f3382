use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Supported audio formats, stored as their MIME type.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(32))")]
pub enum ContentType {
    #[sea_orm(string_value = "audio/mpeg")]
    #[serde(rename = "audio/mpeg")]
    Mp3,
    #[sea_orm(string_value = "audio/wav")]
    #[serde(rename = "audio/wav")]
    Wav,
    #[sea_orm(string_value = "audio/ogg")]
    #[serde(rename = "audio/ogg")]
    Ogg,
    #[sea_orm(string_value = "audio/flac")]
    #[serde(rename = "audio/flac")]
    Flac,
    #[sea_orm(string_value = "audio/aac")]
    #[serde(rename = "audio/aac")]
    Aac,
    #[sea_orm(string_value = "audio/mp4")]
    #[serde(rename = "audio/mp4")]
    Mp4Audio,
}

impl ContentType {
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime {
            "audio/mpeg" => Some(Self::Mp3),
            "audio/wav" => Some(Self::Wav),
            "audio/ogg" => Some(Self::Ogg),
            "audio/flac" => Some(Self::Flac),
            "audio/aac" => Some(Self::Aac),
            "audio/mp4" => Some(Self::Mp4Audio),
            _ => None,
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            ".mp3" => Some(Self::Mp3),
            ".wav" => Some(Self::Wav),
            ".ogg" => Some(Self::Ogg),
            ".flac" => Some(Self::Flac),
            ".aac" => Some(Self::Aac),
            ".mp4" => Some(Self::Mp4Audio),
            _ => None,
        }
    }

    pub fn as_mime(&self) -> &'static str {
        match self {
            Self::Mp3 => "audio/mpeg",
            Self::Wav => "audio/wav",
            Self::Ogg => "audio/ogg",
            Self::Flac => "audio/flac",
            Self::Aac => "audio/aac",
            Self::Mp4Audio => "audio/mp4",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mp3 => ".mp3",
            Self::Wav => ".wav",
            Self::Ogg => ".ogg",
            Self::Flac => ".flac",
            Self::Aac => ".aac",
            Self::Mp4Audio => ".mp4",
        }
    }
}

/// Music genre classification.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(32))")]
#[serde(rename_all = "lowercase")]
pub enum Genre {
    #[sea_orm(string_value = "pop")]
    Pop,
    #[sea_orm(string_value = "rock")]
    Rock,
    #[sea_orm(string_value = "jazz")]
    Jazz,
    #[sea_orm(string_value = "classical")]
    Classical,
    #[sea_orm(string_value = "electronic")]
    Electronic,
    #[sea_orm(string_value = "hiphop")]
    Hiphop,
    #[sea_orm(string_value = "country")]
    Country,
    #[sea_orm(string_value = "rnb")]
    Rnb,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "audio_files")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub filename: String,
    pub content_type: ContentType,
    pub genre: Option<Genre>,
    pub size: i64,
    /// Storage-relative location, never exposed to clients
    pub path: String,
    pub owner_id: i64,
    pub created_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::OwnerId",
        to = "super::users::Column::Id"
    )]
    Owner,
    #[sea_orm(has_many = "super::user_audio::Entity")]
    UserAudio,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl Related<super::user_audio::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserAudio.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_mime_round_trip() {
        for mime in [
            "audio/mpeg",
            "audio/wav",
            "audio/ogg",
            "audio/flac",
            "audio/aac",
            "audio/mp4",
        ] {
            let ct = ContentType::from_mime(mime).unwrap();
            assert_eq!(ct.as_mime(), mime);
        }
        assert!(ContentType::from_mime("text/plain").is_none());
        assert!(ContentType::from_mime("audio/webm").is_none());
    }

    #[test]
    fn test_extension_mapping() {
        assert_eq!(ContentType::from_extension(".mp3"), Some(ContentType::Mp3));
        assert_eq!(
            ContentType::from_extension(".flac"),
            Some(ContentType::Flac)
        );
        assert!(ContentType::from_extension(".txt").is_none());
        assert!(ContentType::from_extension("mp3").is_none());
    }
}
