pub mod fakes;

pub mod fixtures {
    use std::fs;
    use std::io;
    use std::path::{Path, PathBuf};

    use chirp_core::config::{self, Config};
    use chirp_core::{Fields, Post, PostId};

    pub fn root() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("tests")
            .join("fixtures")
    }

    pub fn path(relative: impl AsRef<Path>) -> PathBuf {
        root().join(relative.as_ref())
    }

    pub fn read(relative: impl AsRef<Path>) -> io::Result<String> {
        fs::read_to_string(path(relative))
    }

    /// Fields of a post document fixture, e.g. `post_fields("with-photo.json")`.
    pub fn post_fields(name: &str) -> Fields {
        let raw = read_or_panic(Path::new("posts").join(name));
        serde_json::from_str(&raw)
            .unwrap_or_else(|error| panic!("post fixture {name} is not a JSON object: {error}"))
    }

    /// A decoded post fixture; the id is the file stem.
    pub fn post(name: &str) -> Post {
        let id = Path::new(name)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or(name);
        Post::from_document(PostId::from(id), &post_fields(name))
            .unwrap_or_else(|error| panic!("post fixture {name} does not decode: {error}"))
    }

    pub fn config(name: &str) -> Config {
        let raw = read_or_panic(Path::new("config").join(name));
        config::load_config_from_str(&raw)
            .unwrap_or_else(|error| panic!("config fixture {name} is invalid: {error}"))
    }

    fn read_or_panic(relative: impl AsRef<Path>) -> String {
        let relative = relative.as_ref();
        read(relative).unwrap_or_else(|error| {
            panic!(
                "failed to read fixture {}: {error}",
                relative.to_string_lossy()
            )
        })
    }
}
