use std::fs;
use std::path::Path;

use log::info;
use rand::RngCore;

use crate::error::FixtureError;
use crate::http::request::FilePart;

pub const FIXTURE_BYTES: usize = 1024 * 1024;
pub const FIXTURE_FIELD: &str = "file";
pub const FIXTURE_MIME: &str = "video/mp4";

/// Load the upload fixture, creating it with random bytes when it does not
/// exist yet. An existing file is used as is.
pub fn load_upload_fixture(path: &Path) -> Result<FilePart, FixtureError> {
    if !path.exists() {
        info!("creating upload fixture {}", path.display());
        let create_err = |source| FixtureError::Create {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(create_err)?;
        }
        let mut bytes = vec![0u8; FIXTURE_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        fs::write(path, bytes).map_err(create_err)?;
    }

    let bytes = fs::read(path).map_err(|source| FixtureError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload.bin".to_string());

    Ok(FilePart {
        field: FIXTURE_FIELD.to_string(),
        file_name,
        mime: FIXTURE_MIME.to_string(),
        bytes,
    })
}
