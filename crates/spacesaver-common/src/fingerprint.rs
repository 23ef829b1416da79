//! Fast file-content fingerprinting.
//!
//! Trades collision resistance for speed on large media files: only the
//! first 64 KiB of content is hashed, concatenated with the decimal file
//! size. Two files are considered identical by the Scanner iff both this
//! hash and their path match.

use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;

const PREFIX_LEN: usize = 64 * 1024;

/// Hash the first 64 KiB of `path` concatenated with its decimal size.
///
/// # Errors
///
/// Propagates the I/O error from opening, reading, or stat-ing the file.
pub fn hash_file(path: &Path) -> std::io::Result<String> {
    let mut file = File::open(path)?;
    let size = file.metadata()?.len();

    let mut buf = vec![0u8; PREFIX_LEN];
    let mut total_read = 0;
    loop {
        let n = file.read(&mut buf[total_read..])?;
        if n == 0 {
            break;
        }
        total_read += n;
        if total_read == buf.len() {
            break;
        }
    }

    let mut hasher = Sha256::new();
    hasher.update(&buf[..total_read]);
    hasher.update(size.to_string().as_bytes());

    Ok(hex::encode(hasher.finalize()))
}
