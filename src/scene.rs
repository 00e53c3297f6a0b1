//! Ordered scene list. Z-order is the index; the spotlight overlay, when
//! present, always sits at index 0.

use egui::{Pos2, Vec2};
use log::debug;

use crate::element::{Element, ElementType, ObjectId};
use crate::overlay::{CropMask, SpotlightOverlay};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scene {
    elements: Vec<ElementType>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a scene from restored objects, keeping their order.
    pub fn from_objects(objects: Vec<ElementType>) -> Self {
        Self { elements: objects }
    }

    /// Append on top of everything else.
    pub fn create(&mut self, element: ElementType) -> ObjectId {
        let id = element.id();
        debug!("Scene: created {:?} {}", element.kind(), id);
        self.elements.push(element);
        id
    }

    /// Remove a user object. Overlays and unknown ids are left alone.
    pub fn remove(&mut self, id: ObjectId) -> Option<ElementType> {
        let index = self.index_of(id)?;
        if self.elements[index].is_overlay() {
            debug!("Scene: refusing to remove overlay {}", id);
            return None;
        }
        Some(self.elements.remove(index))
    }

    /// In-place update that keeps the z-order. Returns false for unknown ids.
    pub fn mutate(&mut self, id: ObjectId, f: impl FnOnce(&mut ElementType)) -> bool {
        match self.get_mut(id) {
            Some(element) => {
                f(element);
                true
            }
            None => false,
        }
    }

    /// Duplicate `id` shifted by `offset` and put the copy on top.
    pub fn clone_element(&mut self, id: ObjectId, offset: Vec2) -> Option<ObjectId> {
        let copy = self.get(id)?.duplicate(offset)?;
        Some(self.create(copy))
    }

    pub fn get(&self, id: ObjectId) -> Option<&ElementType> {
        self.elements.iter().find(|e| e.id() == id)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut ElementType> {
        self.elements.iter_mut().find(|e| e.id() == id)
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.index_of(id).is_some()
    }

    pub fn index_of(&self, id: ObjectId) -> Option<usize> {
        self.elements.iter().position(|e| e.id() == id)
    }

    /// Topmost selectable object under `pos`.
    pub fn element_at(&self, pos: Pos2) -> Option<&ElementType> {
        self.elements
            .iter()
            .rev()
            .filter(|e| e.is_selectable())
            .find(|e| e.hit_test(pos))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ElementType> {
        self.elements.iter()
    }

    /// Everything except the derived overlays
    pub fn user_objects(&self) -> impl Iterator<Item = &ElementType> {
        self.elements.iter().filter(|e| !e.is_overlay())
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn clear(&mut self) {
        self.elements.clear();
    }

    pub fn spotlight_overlay(&self) -> Option<&SpotlightOverlay> {
        self.elements.iter().find_map(|e| match e {
            ElementType::SpotlightOverlay(o) => Some(o),
            _ => None,
        })
    }

    /// Drop the current spotlight overlay and install `overlay` at the back.
    pub fn replace_spotlight_overlay(&mut self, overlay: Option<SpotlightOverlay>) {
        self.elements.retain(|e| !matches!(e, ElementType::SpotlightOverlay(_)));
        if let Some(overlay) = overlay {
            self.elements.insert(0, ElementType::SpotlightOverlay(overlay));
        }
    }

    pub fn crop_mask(&self) -> Option<&CropMask> {
        self.elements.iter().find_map(|e| match e {
            ElementType::CropMask(m) => Some(m),
            _ => None,
        })
    }

    pub fn crop_mask_mut(&mut self) -> Option<&mut CropMask> {
        self.elements.iter_mut().find_map(|e| match e {
            ElementType::CropMask(m) => Some(m),
            _ => None,
        })
    }

    /// Drop every crop mask and install `mask`, if any.
    pub fn replace_crop_mask(&mut self, mask: Option<CropMask>) {
        self.elements.retain(|e| !matches!(e, ElementType::CropMask(_)));
        if let Some(mask) = mask {
            self.elements.push(ElementType::CropMask(mask));
        }
    }

    /// Objects that go into a history snapshot. The spotlight overlay is left
    /// out; it is rebuilt from the stored hole list on restore.
    pub fn snapshot_objects(&self) -> Vec<ElementType> {
        self.elements
            .iter()
            .filter(|e| !matches!(e, ElementType::SpotlightOverlay(_)))
            .cloned()
            .collect()
    }

    /// Highest badge number currently in the scene
    pub fn max_badge_number(&self) -> Option<u32> {
        self.elements.iter().filter_map(|e| e.as_badge()).map(|b| b.number).max()
    }
}
