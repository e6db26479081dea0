use std::io::{self, Write};
use std::path::Path;

use tempfile::Builder;

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

/// Replaces `path` with `contents` so concurrent readers never see a torn file.
///
/// The payload is fsync'd into a sibling temporary file before being renamed
/// over the destination.
pub(crate) fn atomic_write(path: &Path, contents: &[u8]) -> io::Result<()> {
    let directory = path.parent().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::NotFound,
            "target path did not have a parent directory",
        )
    })?;

    let mut builder = Builder::new();
    builder.prefix(".drover-");
    #[cfg(unix)]
    {
        use std::fs::Permissions;
        // Registry entries are read by operators on other accounts.
        builder.permissions(Permissions::from_mode(0o644));
    }

    let mut file = builder.tempfile_in(directory)?;
    file.write_all(contents)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|error| error.error)?;
    Ok(())
}

/// Returns true for the temporary files `atomic_write` leaves mid-flight.
pub(crate) fn is_temporary(name: &str) -> bool {
    name.starts_with(".drover-")
}
