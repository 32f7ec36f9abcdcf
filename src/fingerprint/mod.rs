mod capture;
mod compare;
mod entry;

pub use capture::{expand_classpath, ClasspathFingerprint};
pub use compare::{compare, ValidationVerdict};
pub use entry::{sha256_bytes, sha256_file, ClasspathEntry};
