//! Optional path-based image loading, gated behind the `image-io` feature.
//! Kept fully outside the extraction path: the core never imports this
//! module, only the orchestrator's path-input convenience calls it.

use std::path::Path;

use crate::error::{FieldlensError, Result};
use crate::ocr::Image;

#[cfg(feature = "image-io")]
pub fn load(path: &Path) -> Result<Image> {
    let decoded = image::open(path)
        .map_err(|err| FieldlensError::invalid_image_with_source(format!("failed to decode image at {}", path.display()), err))?;
    let rgb = decoded.to_rgb8();
    let (width, height) = (rgb.width(), rgb.height());
    Ok(Image::new(width, height, rgb.into_raw()))
}

#[cfg(not(feature = "image-io"))]
pub fn load(_path: &Path) -> Result<Image> {
    Err(FieldlensError::invalid_image("path-based image loading requires the `image-io` feature"))
}
