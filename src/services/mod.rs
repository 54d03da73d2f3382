pub mod audio;
pub mod auth;
pub mod storage;
pub mod users;
pub mod yandex;
