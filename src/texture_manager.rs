use egui::{ColorImage, Context, TextureHandle, TextureId, TextureOptions};
use image::RgbaImage;
use std::collections::HashMap;
use thiserror::Error;

use crate::element::ObjectId;

/// Errors that can occur during texture generation
#[derive(Error, Debug)]
pub enum TextureGenerationError {
    #[error("Failed to generate texture")]
    GenerationFailed,
    #[error("Invalid texture dimensions")]
    InvalidDimensions,
}

/// Key for the opened background image, which is not a scene object
pub const BACKGROUND_KEY: &str = "background";

/// Texture cache for raster-backed objects: blur patches, the spotlight
/// overlay and the background image.
///
/// Raster content never changes under a given key (a regenerated overlay
/// gets a fresh id, recomputed blur pixels a fresh image key), so entries
/// only go away through LRU eviction or explicit invalidation.
pub struct TextureManager {
    texture_cache: HashMap<TextureKey, TextureHandle>,
    /// Tracks when each texture was last used
    last_used: HashMap<TextureKey, u64>,
    current_frame: u64,
    max_cache_size: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TextureKey {
    Object(ObjectId),
    Named(&'static str),
}

impl From<ObjectId> for TextureKey {
    fn from(id: ObjectId) -> Self {
        TextureKey::Object(id)
    }
}

impl TextureManager {
    pub fn new(max_cache_size: usize) -> Self {
        Self {
            texture_cache: HashMap::new(),
            last_used: HashMap::new(),
            current_frame: 0,
            max_cache_size,
        }
    }

    /// Increments the frame counter, should be called at the start of each frame
    pub fn begin_frame(&mut self) {
        self.current_frame += 1;
    }

    pub fn get_or_create_texture<F>(
        &mut self,
        key: impl Into<TextureKey>,
        generator: F,
        ctx: &Context,
    ) -> Result<TextureId, TextureGenerationError>
    where
        F: FnOnce() -> Result<ColorImage, TextureGenerationError>,
    {
        let key = key.into();
        if let Some(handle) = self.texture_cache.get(&key) {
            self.last_used.insert(key, self.current_frame);
            return Ok(handle.id());
        }

        self.prune_cache_if_needed();

        let image = generator()?;
        let name = match &key {
            TextureKey::Object(id) => format!("object_{id}"),
            TextureKey::Named(name) => (*name).to_owned(),
        };
        let handle = ctx.load_texture(name, image, TextureOptions::LINEAR);

        let id = handle.id();
        self.texture_cache.insert(key.clone(), handle);
        self.last_used.insert(key, self.current_frame);
        Ok(id)
    }

    pub fn invalidate(&mut self, key: impl Into<TextureKey>) {
        let key = key.into();
        self.texture_cache.remove(&key);
        self.last_used.remove(&key);
    }

    /// Evict least recently used entries above the size limit
    fn prune_cache_if_needed(&mut self) {
        if self.texture_cache.len() < self.max_cache_size {
            return;
        }

        let mut entries: Vec<(TextureKey, u64)> = self.last_used.iter().map(|(k, v)| (k.clone(), *v)).collect();
        entries.sort_by_key(|(_, frame)| *frame);

        // Leave room for the entry about to be inserted
        let to_remove = entries.len() + 1 - self.max_cache_size;
        for (key, _) in entries.into_iter().take(to_remove) {
            self.texture_cache.remove(&key);
            self.last_used.remove(&key);
        }
    }

    pub fn clear_cache(&mut self) {
        self.texture_cache.clear();
        self.last_used.clear();
    }

    pub fn cache_size(&self) -> usize {
        self.texture_cache.len()
    }

    #[cfg(test)]
    pub fn get_texture(&self, key: impl Into<TextureKey>) -> Option<&TextureHandle> {
        self.texture_cache.get(&key.into())
    }
}

/// Convert a straight-alpha RGBA raster for upload
pub fn color_image(image: &RgbaImage) -> Result<ColorImage, TextureGenerationError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(TextureGenerationError::InvalidDimensions);
    }
    Ok(ColorImage::from_rgba_unmultiplied(
        [image.width() as usize, image.height() as usize],
        image.as_raw(),
    ))
}
