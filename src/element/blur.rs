use base64::{Engine as _, engine::general_purpose};
use egui::{Pos2, Rect, Vec2};
use image::RgbaImage;
use serde::{Deserialize, Serialize};

use super::{Element, ElementKind, ObjectId, Transform};
use crate::element::common;
use crate::error::ElementError;
use crate::presets::BlurStyle;

/// Already-processed RGBA pixels of a blur patch.
///
/// Serialized as base64 so snapshots stay plain JSON.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "EncodedPatch", try_from = "EncodedPatch")]
pub struct PatchImage {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

// Custom Debug implementation so pixel buffers don't flood the logs
impl std::fmt::Debug for PatchImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatchImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("data_len", &self.rgba.len())
            .finish()
    }
}

impl PatchImage {
    pub fn from_rgba_image(image: RgbaImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
            rgba: image.into_raw(),
        }
    }

    pub fn to_rgba_image(&self) -> Option<RgbaImage> {
        RgbaImage::from_raw(self.width, self.height, self.rgba.clone())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn rgba(&self) -> &[u8] {
        &self.rgba
    }
}

#[derive(Clone, Serialize, Deserialize)]
struct EncodedPatch {
    width: u32,
    height: u32,
    rgba: String,
}

impl From<PatchImage> for EncodedPatch {
    fn from(patch: PatchImage) -> Self {
        Self {
            width: patch.width,
            height: patch.height,
            rgba: general_purpose::STANDARD.encode(&patch.rgba),
        }
    }
}

impl TryFrom<EncodedPatch> for PatchImage {
    type Error = String;

    fn try_from(encoded: EncodedPatch) -> Result<Self, Self::Error> {
        let rgba = general_purpose::STANDARD
            .decode(encoded.rgba.as_bytes())
            .map_err(|e| format!("invalid blur patch data: {e}"))?;
        let expected = encoded.width as usize * encoded.height as usize * 4;
        if rgba.len() != expected {
            return Err(format!(
                "blur patch size mismatch: expected {expected} bytes, got {}",
                rgba.len()
            ));
        }
        Ok(Self {
            width: encoded.width,
            height: encoded.height,
            rgba,
        })
    }
}

/// Static image of a blurred or pixelated region, baked at creation time
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlurPatch {
    pub id: ObjectId,
    pub rect: Rect,
    pub style: BlurStyle,
    pub intensity: u8,
    pub image: PatchImage,
    /// Identifies the current pixels; changes whenever `image` is replaced
    #[serde(default = "ObjectId::new")]
    pub image_key: ObjectId,
    #[serde(default)]
    pub transform: Transform,
}

impl BlurPatch {
    pub fn new(rect: Rect, style: BlurStyle, intensity: u8, image: PatchImage) -> Self {
        Self {
            id: ObjectId::new(),
            rect,
            style,
            intensity,
            image,
            image_key: ObjectId::new(),
            transform: Transform::default(),
        }
    }

    /// Swap in recomputed pixels
    pub fn replace_image(&mut self, rect: Rect, style: BlurStyle, intensity: u8, image: PatchImage) {
        self.rect = rect;
        self.style = style;
        self.intensity = intensity;
        self.image = image;
        self.image_key = ObjectId::new();
    }
}

impl Element for BlurPatch {
    fn id(&self) -> ObjectId {
        self.id
    }

    fn kind(&self) -> ElementKind {
        ElementKind::Blur
    }

    fn rect(&self) -> Rect {
        self.rect
    }

    fn hit_test(&self, pos: Pos2) -> bool {
        self.rect.contains(self.transform.to_local(pos, self.rect.center()))
    }

    fn translate(&mut self, delta: Vec2) {
        self.rect = self.rect.translate(delta);
    }

    fn resize(&mut self, new_rect: Rect) -> Result<(), ElementError> {
        common::validate_rect(&new_rect)?;
        self.rect = new_rect;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::{pos2, vec2};

    #[test]
    fn patch_survives_json() {
        let image = RgbaImage::from_pixel(3, 2, image::Rgba([1, 2, 3, 4]));
        let patch = BlurPatch::new(
            Rect::from_min_size(pos2(0.0, 0.0), vec2(3.0, 2.0)),
            BlurStyle::Mosaic,
            40,
            PatchImage::from_rgba_image(image),
        );
        let json = serde_json::to_string(&patch).unwrap();
        let back: BlurPatch = serde_json::from_str(&json).unwrap();
        assert_eq!(back, patch);
        assert_eq!(back.image.rgba().len(), 24);
    }

    #[test]
    fn replaced_pixels_get_a_fresh_key() {
        let rect = Rect::from_min_size(pos2(0.0, 0.0), vec2(4.0, 4.0));
        let pixels = || PatchImage::from_rgba_image(RgbaImage::new(4, 4));
        let mut patch = BlurPatch::new(rect, BlurStyle::Gaussian, 50, pixels());
        let (id, key) = (patch.id, patch.image_key);

        patch.replace_image(rect, BlurStyle::Mosaic, 10, pixels());

        assert_eq!(patch.id, id);
        assert_ne!(patch.image_key, key);
        assert_eq!((patch.style, patch.intensity), (BlurStyle::Mosaic, 10));
    }

    #[test]
    fn truncated_patch_is_rejected() {
        let json = r#"{"width":4,"height":4,"rgba":"AAAA"}"#;
        assert!(serde_json::from_str::<PatchImage>(json).is_err());
    }
}
