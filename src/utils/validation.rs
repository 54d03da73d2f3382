use std::path::Path;

/// Extension of a declared filename, lower-cased and dot-prefixed.
///
/// Only the extension is ever derived from user-supplied filename text; the
/// storage name itself is always generated.
pub fn file_extension(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("song.mp3"), Some(".mp3".to_string()));
        assert_eq!(file_extension("SONG.MP3"), Some(".mp3".to_string()));
        assert_eq!(file_extension("a.b.flac"), Some(".flac".to_string()));
        assert_eq!(file_extension("noext"), None);
        assert_eq!(file_extension("../../etc/passwd.mp3"), Some(".mp3".to_string()));
    }
}
