use std::path::PathBuf;

use crate::utils::filename::extension_of;

/// A file whose bytes have been written to the destination directory under
/// its temporary name but not yet renamed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedFile {
    /// Generated at receipt time, unique per request.
    pub temporary_name: String,
    /// Client-supplied name. Untrusted; only its extension is used.
    pub original_name: String,
    pub size: u64,
    /// Where the bytes currently live (`dest_dir/temporary_name`).
    pub temp_path: PathBuf,
}

impl ReceivedFile {
    pub fn extension(&self) -> &str {
        extension_of(&self.original_name)
    }

    pub fn final_name(&self) -> String {
        format!("{}.{}", self.temporary_name, self.extension())
    }
}
