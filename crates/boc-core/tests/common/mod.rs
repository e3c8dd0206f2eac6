use std::fs;
use std::path::Path;

pub fn read_file(path: &Path) -> String {
    fs::read_to_string(path).expect("Failed to read file")
}

pub fn read_sample(name: &str) -> String {
    read_file(&Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/samples").join(name))
}
