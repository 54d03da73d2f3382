pub use super::audio_files::Entity as AudioFiles;
pub use super::user_audio::Entity as UserAudio;
pub use super::users::Entity as Users;
