//! Zip bundling of a batch's successful videos.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{info, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use promo_models::{sanitize_product_name, Batch, BatchItemStatus};

use crate::error::PipelineResult;

/// Bundle every successful video in the batch into one zip archive.
///
/// Entries are prefixed with a 1-based index so duplicate product names
/// stay distinct. Returns `None` when the batch has no successful items.
/// Files that vanished since the batch finished are skipped.
pub fn create_zip(batch: &Batch, zip_dir: &Path) -> PipelineResult<Option<PathBuf>> {
    let successful: Vec<_> = batch
        .items
        .iter()
        .filter(|i| i.status == BatchItemStatus::Success && !i.video_path.is_empty())
        .collect();
    if successful.is_empty() {
        return Ok(None);
    }

    std::fs::create_dir_all(zip_dir)?;
    let zip_path = zip_dir.join(format!("{}.zip", batch.batch_id));

    let file = std::fs::File::create(&zip_path)?;
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for (idx, item) in successful.iter().enumerate() {
        let source = Path::new(&item.video_path);
        if !source.exists() {
            warn!("Skipping vanished video {}", source.display());
            continue;
        }
        let safe_name = sanitize_product_name(&item.product_name);
        writer.start_file(format!("{:02}_{safe_name}.mp4", idx + 1), options)?;
        let mut reader = std::fs::File::open(source)?;
        io::copy(&mut reader, &mut writer)?;
    }

    writer.flush()?;
    writer.finish()?;
    info!(batch_id = %batch.batch_id, "Batch archive written to {}", zip_path.display());
    Ok(Some(zip_path))
}
