//! The canvas engine.
//!
//! `EditorContext` owns one canvas: the scene, the overlay side-channel
//! state, the snapshot history, the active tool and the collaborators it
//! talks to. Every mutation goes through [`EditorContext::execute`], which
//! applies a [`Command`] and snapshots the result when the command is
//! history-relevant.
//!
//! After any operation that replaces the scene wholesale (undo, redo,
//! session load) the derived overlays are rebuilt before control returns,
//! so the next render never sees a stale overlay.

use egui::{Key, Modifiers, Pos2, Rect, Vec2, vec2};
use image::RgbaImage;
use log::{debug, info, warn};
use std::sync::Arc;

use super::{SessionStore, ToolConfig};
use crate::capture::{Background, CaptureProvider, ExportSink, FontProvider, ImageFit, NoCapture, crop_image};
use crate::command::{Alignment, Command, CommandError, CommandResult, History, SceneSnapshot};
use crate::element::{Element, ElementKind, ElementType, ObjectId, PatchImage, factory, rotated_corners};
use crate::export::{ExportError, ExportOptions, ExportOutcome, ExportPlan, ExportedRaster};
use crate::input;
use crate::overlay::{CropRect, OverlayState, derive_crop_mask, derive_spotlight_overlay};
use crate::presets::{self, BlurStyle};
use crate::raster::{self, FontCache};
use crate::scene::Scene;
use crate::tools::{Tool, ToolContext, ToolKind, ToolType};

/// A blur region waiting for its capture
#[derive(Clone, Copy, Debug, PartialEq)]
struct PendingCapture {
    rect: Rect,
    style: BlurStyle,
    intensity: u8,
    /// Existing patch to refresh in place; `None` adds a new patch
    target: Option<ObjectId>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PointerPhase {
    Down,
    Move,
    Up,
}

/// One annotation canvas and everything it needs
pub struct EditorContext {
    scene: Scene,
    overlays: OverlayState,
    history: History,
    canvas: Rect,
    tool: ToolType,
    config: ToolConfig,
    selection: Option<ObjectId>,
    clipboard: Option<ElementType>,
    editing_text: Option<ObjectId>,
    next_badge: u32,
    modifiers: Modifiers,
    background: Background,
    pending_captures: Vec<PendingCapture>,
    capture: Arc<dyn CaptureProvider>,
    store: Arc<dyn SessionStore>,
    fonts: Option<Arc<dyn FontProvider>>,
}

impl std::fmt::Debug for EditorContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorContext")
            .field("objects", &self.scene.len())
            .field("overlays", &self.overlays)
            .field("history_len", &self.history.len())
            .field("history_index", &self.history.index())
            .field("tool", &self.tool.kind())
            .field("selection", &self.selection)
            .field("editing_text", &self.editing_text)
            .finish_non_exhaustive()
    }
}

impl EditorContext {
    /// Create a canvas of `canvas_size` and restore the session kept in
    /// `store`, unless this is the first canvas of the process.
    pub fn new(canvas_size: Vec2, config: ToolConfig, store: Arc<dyn SessionStore>) -> Self {
        let overlays = OverlayState {
            spotlight: config.spotlight_params(),
            ..OverlayState::default()
        };
        let initial = encode_snapshot(&SceneSnapshot::empty(&overlays.spotlight)).unwrap_or_default();
        let mut context = Self {
            scene: Scene::new(),
            overlays,
            history: History::new(initial),
            canvas: Rect::from_min_size(Pos2::ZERO, canvas_size),
            tool: ToolType::default(),
            config,
            selection: None,
            clipboard: None,
            editing_text: None,
            next_badge: 1,
            modifiers: Modifiers::default(),
            background: Background::Screen { scale_factor: 1.0 },
            pending_captures: Vec::new(),
            capture: Arc::new(NoCapture),
            store,
            fonts: None,
        };
        context.load_session();
        context
    }

    pub fn with_capture(mut self, capture: Arc<dyn CaptureProvider>) -> Self {
        self.capture = capture;
        self
    }

    pub fn with_fonts(mut self, fonts: Arc<dyn FontProvider>) -> Self {
        self.fonts = Some(fonts);
        self
    }

    fn load_session(&mut self) {
        if self.store.take_fresh_process_start() {
            debug!("Fresh process start, discarding stored session");
            if let Err(e) = self.store.clear() {
                warn!("Failed to clear stored session: {e}");
            }
            return;
        }

        match self.store.read_history() {
            Ok(Some(record)) => match History::from_record(record) {
                Some(history) => {
                    self.history = history;
                    let current = self.history.current().to_owned();
                    if self.restore(&current) {
                        info!("Restored session history ({} entries)", self.history.len());
                    } else {
                        self.history = History::new(encode_snapshot(&self.snapshot()).unwrap_or_default());
                        self.persist();
                    }
                    return;
                }
                None => warn!("Stored history is inconsistent, ignoring it"),
            },
            Ok(None) => {}
            Err(e) => warn!("Failed to read stored history: {e}"),
        }

        match self.store.read_scene_snapshot() {
            Ok(Some(json)) => {
                self.restore(&json);
                if let Some(current) = encode_snapshot(&self.snapshot()) {
                    self.history = History::new(current);
                }
                info!("Restored session snapshot");
            }
            Ok(None) => {}
            Err(e) => warn!("Failed to read stored snapshot: {e}"),
        }
    }

    // ---- accessors ----

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn overlays(&self) -> &OverlayState {
        &self.overlays
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn canvas(&self) -> Rect {
        self.canvas
    }

    pub fn selection(&self) -> Option<ObjectId> {
        self.selection
    }

    pub fn selected_element(&self) -> Option<&ElementType> {
        self.selection.and_then(|id| self.scene.get(id))
    }

    pub fn editing_text(&self) -> Option<ObjectId> {
        self.editing_text
    }

    pub fn config(&self) -> &ToolConfig {
        &self.config
    }

    /// Style panel access. Changes only seed new objects; see [`Command::ApplyStyle`].
    pub fn config_mut(&mut self) -> &mut ToolConfig {
        &mut self.config
    }

    pub fn active_tool(&self) -> ToolKind {
        self.tool.kind()
    }

    pub fn tool(&self) -> &ToolType {
        &self.tool
    }

    /// Ghost object of the gesture in progress
    pub fn preview(&self) -> Option<&ElementType> {
        self.tool.preview()
    }

    pub fn background(&self) -> &Background {
        &self.background
    }

    pub fn next_badge_number(&self) -> u32 {
        self.next_badge
    }

    pub fn has_pending_captures(&self) -> bool {
        !self.pending_captures.is_empty()
    }

    pub fn clipboard(&self) -> Option<&ElementType> {
        self.clipboard.as_ref()
    }

    /// Families offered by the font picker
    pub fn available_fonts(&self) -> Vec<String> {
        self.fonts.as_ref().map(|f| f.list_fonts()).unwrap_or_default()
    }

    // ---- input ----

    pub fn pointer_down(&mut self, pos: Pos2, modifiers: Modifiers) -> CommandResult {
        self.dispatch_pointer(PointerPhase::Down, pos, modifiers)
    }

    pub fn pointer_move(&mut self, pos: Pos2, modifiers: Modifiers) -> CommandResult {
        self.dispatch_pointer(PointerPhase::Move, pos, modifiers)
    }

    pub fn pointer_up(&mut self, pos: Pos2, modifiers: Modifiers) -> CommandResult {
        self.dispatch_pointer(PointerPhase::Up, pos, modifiers)
    }

    fn dispatch_pointer(&mut self, phase: PointerPhase, pos: Pos2, modifiers: Modifiers) -> CommandResult {
        self.modifiers = modifiers;
        let ctx = ToolContext {
            scene: &self.scene,
            config: &self.config,
            modifiers,
            selection: self.selection,
            editing_text: self.editing_text,
            crop_active: self.overlays.crop.is_some(),
            next_badge: self.next_badge,
        };
        let command = match phase {
            PointerPhase::Down => self.tool.on_pointer_down(pos, &ctx),
            PointerPhase::Move => self.tool.on_pointer_move(pos, &ctx),
            PointerPhase::Up => self.tool.on_pointer_up(pos, &ctx),
        };
        match command {
            Some(command) => self.execute(command),
            None => Ok(()),
        }
    }

    /// Run the shortcut bound to `key`, if any
    pub fn handle_key(&mut self, key: Key, modifiers: Modifiers) -> CommandResult {
        self.modifiers = modifiers;
        match input::keymap(key, modifiers, self.editing_text.is_some()) {
            Some(command) => self.execute(command),
            None => Ok(()),
        }
    }

    /// Typed text goes to the text object being edited; ignored otherwise.
    pub fn insert_text(&mut self, text: &str) -> CommandResult {
        if self.editing_text.is_none() || text.is_empty() {
            return Ok(());
        }
        self.execute(Command::InsertText(text.to_owned()))
    }

    // ---- commands ----

    /// Apply `command`, then snapshot the scene if the command is history-relevant.
    pub fn execute(&mut self, command: Command) -> CommandResult {
        if command.requires_selection() && self.selection.is_none() {
            return Err(CommandError::NoSelection);
        }
        let records = command.records_history();
        self.apply(command)?;
        if records {
            self.record_history();
        }
        Ok(())
    }

    fn apply(&mut self, command: Command) -> CommandResult {
        match command {
            Command::AddElement(element) => self.add_element(element),
            Command::AddSpotlightHole(hole) => {
                debug!("Adding spotlight hole {:?}", hole);
                self.overlays.holes.push(hole);
                self.regenerate_spotlight();
            }
            Command::ClearSpotlight => {
                self.overlays.holes.clear();
                self.regenerate_spotlight();
            }
            Command::SetCrop(crop) => {
                if let Some(previous) = self.overlays.crop {
                    debug!("Replacing crop {:?}", previous);
                }
                self.overlays.crop = Some(crop);
                self.scene.replace_crop_mask(Some(derive_crop_mask(self.canvas, crop)));
            }
            Command::ClearCrop => {
                self.overlays.crop = None;
                self.scene.replace_crop_mask(None);
            }
            Command::CaptureBlur { rect, style, intensity } => {
                self.pending_captures.push(PendingCapture {
                    rect,
                    style,
                    intensity,
                    target: None,
                });
            }
            Command::ReplaceBlurImage {
                id,
                rect,
                style,
                intensity,
                image,
            } => {
                if self.user_object(id)?.kind() != ElementKind::Blur {
                    return Err(CommandError::UnknownObject(id));
                }
                self.scene.mutate(id, |e| {
                    if let ElementType::Blur(patch) = e {
                        patch.replace_image(rect, style, intensity, image);
                    }
                });
            }
            Command::Select(id) => {
                if let Some(id) = id {
                    self.user_object(id)?;
                }
                self.selection = id;
            }
            Command::MoveElement { id, delta } => {
                self.user_object(id)?;
                self.scene.mutate(id, |e| e.translate(delta));
            }
            Command::ResizeElement { id, rect } => {
                self.user_object(id)?;
                if let Some(element) = self.scene.get_mut(id) {
                    element.resize(rect)?;
                }
            }
            Command::SetRotation { id, degrees } => {
                self.user_object(id)?;
                self.scene.mutate(id, |e| e.set_rotation(degrees));
            }
            Command::FinishTransform => {}
            Command::PlaceText(text) => {
                if self.editing_text.is_some() {
                    self.execute(Command::CommitText)?;
                }
                let id = self.scene.create(ElementType::Text(text));
                self.editing_text = Some(id);
                self.selection = Some(id);
            }
            Command::BeginTextEdit(id) => {
                if self.user_object(id)?.as_text().is_none() {
                    return Err(CommandError::UnknownObject(id));
                }
                self.editing_text = Some(id);
                self.selection = Some(id);
            }
            Command::InsertText(text) => {
                let id = self.editing_text.ok_or(CommandError::NotEditing)?;
                self.scene.mutate(id, |e| {
                    if let Some(t) = e.as_text_mut() {
                        t.insert_str(&text);
                    }
                });
            }
            Command::Backspace => {
                let id = self.editing_text.ok_or(CommandError::NotEditing)?;
                self.scene.mutate(id, |e| {
                    if let Some(t) = e.as_text_mut() {
                        t.backspace();
                    }
                });
            }
            Command::CommitText => {
                let id = self.editing_text.take().ok_or(CommandError::NotEditing)?;
                let blank = self.scene.get(id).and_then(|e| e.as_text()).is_some_and(|t| t.is_blank());
                if blank {
                    debug!("Removing empty text {id}");
                    self.scene.remove(id);
                    if self.selection == Some(id) {
                        self.selection = None;
                    }
                }
            }
            Command::DeleteSelected => {
                let id = self.require_selection()?;
                self.user_object(id)?;
                self.scene.remove(id);
                self.selection = None;
                if self.editing_text == Some(id) {
                    self.editing_text = None;
                }
            }
            Command::Duplicate => {
                let id = self.require_selection()?;
                self.user_object(id)?;
                let copy = self
                    .scene
                    .clone_element(id, Vec2::splat(presets::CLONE_OFFSET))
                    .ok_or(CommandError::UnknownObject(id))?;
                self.selection = Some(copy);
            }
            Command::Copy => {
                let id = self.require_selection()?;
                self.clipboard = Some(self.user_object(id)?.clone());
            }
            Command::Cut => {
                let id = self.require_selection()?;
                self.clipboard = Some(self.user_object(id)?.clone());
                self.scene.remove(id);
                self.selection = None;
                if self.editing_text == Some(id) {
                    self.editing_text = None;
                }
            }
            Command::Paste => {
                // Empty clipboard is a silent no-op
                let Some(copy) = self
                    .clipboard
                    .as_ref()
                    .and_then(|c| c.duplicate(Vec2::splat(presets::CLONE_OFFSET)))
                else {
                    return Ok(());
                };
                // Repeated pastes cascade instead of stacking
                self.clipboard = Some(copy.clone());
                self.selection = Some(self.scene.create(copy));
            }
            Command::FlipHorizontal => self.mutate_selected(|e| e.flip_horizontal())?,
            Command::FlipVertical => self.mutate_selected(|e| e.flip_vertical())?,
            Command::Rotate(degrees) => self.mutate_selected(|e| e.rotate_by(degrees))?,
            Command::Nudge(delta) => self.mutate_selected(|e| e.translate(delta))?,
            Command::Align(alignment) => {
                let id = self.require_selection()?;
                let element = self.user_object(id)?;
                let delta = alignment_delta(self.canvas, visual_bounds(element), alignment);
                self.scene.mutate(id, |e| e.translate(delta));
            }
            Command::ApplyStyle => {
                let id = self.require_selection()?;
                let element = self.user_object(id)?;
                if element.kind() == ElementKind::Blur {
                    // Pixels are baked, so a new style needs a fresh capture
                    let rect = element.rect();
                    self.pending_captures.push(PendingCapture {
                        rect,
                        style: self.config.blur_style,
                        intensity: self.config.blur_intensity,
                        target: Some(id),
                    });
                } else {
                    let config = &self.config;
                    self.scene.mutate(id, |e| e.apply_config(config));
                }
            }
            Command::SetSpotlightColor(color) => {
                self.overlays.spotlight.color = color;
                self.config.spotlight_color = color;
                self.regenerate_spotlight();
            }
            Command::SetSpotlightDarkness(darkness) => {
                let darkness = darkness.clamp(0.0, 1.0);
                self.overlays.spotlight.darkness = darkness;
                self.config.spotlight_darkness = darkness;
                self.regenerate_spotlight();
            }
            Command::SetTool(kind) => self.set_tool(kind),
            Command::Cancel => {
                if self.tool.is_busy() {
                    debug!("Cancelling {} gesture", self.tool.name());
                    self.tool.deactivate();
                } else if self.editing_text.is_some() {
                    self.execute(Command::CommitText)?;
                } else {
                    self.selection = None;
                }
            }
            Command::Undo => self.undo()?,
            Command::Redo => self.redo()?,
            Command::ClearAll => self.clear_all(),
        }
        Ok(())
    }

    fn add_element(&mut self, element: ElementType) {
        if let Some(badge) = element.as_badge() {
            self.next_badge = self.next_badge.max(badge.number + 1);
        }
        let is_shape = matches!(
            element.kind(),
            ElementKind::Rectangle | ElementKind::Ellipse | ElementKind::Line | ElementKind::Arrow
        );
        let id = self.scene.create(element);
        if is_shape && self.tool.kind().reverts_to_select() {
            self.set_tool(ToolKind::Select);
            self.selection = Some(id);
        }
    }

    fn require_selection(&self) -> Result<ObjectId, CommandError> {
        self.selection.ok_or(CommandError::NoSelection)
    }

    /// Look up a user object, refusing overlays
    fn user_object(&self, id: ObjectId) -> Result<&ElementType, CommandError> {
        match self.scene.get(id) {
            Some(element) if element.is_overlay() => Err(CommandError::Protected(id)),
            Some(element) => Ok(element),
            None => Err(CommandError::UnknownObject(id)),
        }
    }

    fn mutate_selected(&mut self, f: impl FnOnce(&mut ElementType)) -> CommandResult {
        let id = self.require_selection()?;
        self.user_object(id)?;
        self.scene.mutate(id, f);
        Ok(())
    }

    /// Switch tools. The old tool's gesture is discarded and an open text
    /// editor is committed.
    pub fn set_tool(&mut self, kind: ToolKind) {
        if self.tool.kind() == kind {
            return;
        }
        self.tool.deactivate();
        if self.editing_text.is_some() {
            if let Err(e) = self.execute(Command::CommitText) {
                warn!("Failed to commit text on tool switch: {e}");
            }
        }
        self.tool = ToolType::new(kind);
        self.tool.activate();
        info!("Switched to {} tool", kind.name());
    }

    // ---- overlays ----

    fn regenerate_spotlight(&mut self) {
        let overlay = derive_spotlight_overlay(self.canvas, &self.overlays.holes, &self.overlays.spotlight);
        self.scene.replace_spotlight_overlay(overlay);
    }

    /// Rebuild both overlays from source state. The crop rect is read back
    /// from the crop mask in the scene, which is where snapshots carry it.
    fn resync_overlays(&mut self) {
        self.regenerate_spotlight();
        self.overlays.crop = self.scene.crop_mask().map(|m| m.crop);
        let canvas = self.canvas;
        if let Some(mask) = self.scene.crop_mask_mut() {
            let id = mask.id;
            *mask = derive_crop_mask(canvas, mask.crop);
            mask.id = id;
        }
    }

    fn set_crop_mask_visible(&mut self, visible: bool) {
        if let Some(mask) = self.scene.crop_mask_mut() {
            mask.visible = visible;
        }
    }

    pub fn set_canvas_size(&mut self, size: Vec2) {
        let canvas = Rect::from_min_size(Pos2::ZERO, size);
        if canvas == self.canvas {
            return;
        }
        self.canvas = canvas;
        if let Background::Image { image, fit } = &mut self.background {
            *fit = ImageFit::contain(image.width(), image.height(), size);
        }
        self.resync_overlays();
    }

    pub fn set_background(&mut self, background: Background) {
        self.background = background;
    }

    /// Track the display's physical pixels per logical pixel. Image mode
    /// maps through its own fit and is left alone.
    pub fn set_scale_factor(&mut self, scale_factor: f32) {
        if let Background::Screen { scale_factor: current } = &mut self.background {
            if *current != scale_factor {
                debug!("Screen scale factor {current} -> {scale_factor}");
                *current = scale_factor;
            }
        }
    }

    /// Open `image` letterboxed into the canvas (image mode)
    pub fn open_image(&mut self, image: RgbaImage) {
        info!("Opened {}x{} image", image.width(), image.height());
        self.background = Background::image(image, self.canvas.size());
    }

    // ---- history ----

    fn snapshot(&self) -> SceneSnapshot {
        SceneSnapshot {
            objects: self.scene.snapshot_objects(),
            holes: self.overlays.holes.clone(),
            spotlight_color: self.overlays.spotlight.color,
            spotlight_darkness: self.overlays.spotlight.darkness,
        }
    }

    fn record_history(&mut self) {
        let Some(json) = encode_snapshot(&self.snapshot()) else {
            return;
        };
        if self.history.push(json) {
            self.persist();
        }
    }

    /// Best effort; the in-memory state stays authoritative.
    fn persist(&self) {
        if let Err(e) = self.store.write_history(&self.history.record()) {
            warn!("Failed to persist history: {e}");
        }
        if let Err(e) = self.store.write_scene_snapshot(self.history.current()) {
            warn!("Failed to persist scene snapshot: {e}");
        }
    }

    /// Replace the scene with a serialized snapshot and re-derive everything
    /// that depends on it. A corrupt snapshot yields an empty scene and
    /// returns false.
    fn restore(&mut self, json: &str) -> bool {
        let (snapshot, valid) = match SceneSnapshot::from_json(json) {
            Ok(snapshot) => (snapshot, true),
            Err(e) => {
                warn!("Corrupt snapshot, starting from an empty scene: {e}");
                (SceneSnapshot::empty(&self.overlays.spotlight), false)
            }
        };
        self.tool.deactivate();
        self.overlays.holes = snapshot.holes.clone();
        self.overlays.spotlight = snapshot.spotlight_params();
        self.config.spotlight_color = self.overlays.spotlight.color;
        self.config.spotlight_darkness = self.overlays.spotlight.darkness;
        self.scene = Scene::from_objects(snapshot.objects);
        self.resync_overlays();

        if self.selection.is_some_and(|id| !self.scene.contains(id)) {
            self.selection = None;
        }
        self.editing_text = None;
        self.next_badge = self.scene.max_badge_number().map_or(1, |n| n + 1);
        valid
    }

    pub fn undo(&mut self) -> CommandResult {
        let json = self.history.undo()?.to_owned();
        self.restore(&json);
        self.persist();
        debug!("Undo to history index {}", self.history.index());
        Ok(())
    }

    pub fn redo(&mut self) -> CommandResult {
        let json = self.history.redo()?.to_owned();
        self.restore(&json);
        self.persist();
        debug!("Redo to history index {}", self.history.index());
        Ok(())
    }

    /// Empty the canvas and start a fresh history
    pub fn clear_all(&mut self) {
        self.tool.deactivate();
        self.scene.clear();
        self.overlays.clear();
        self.selection = None;
        self.clipboard = None;
        self.editing_text = None;
        self.next_badge = 1;
        self.pending_captures.clear();
        let initial = encode_snapshot(&SceneSnapshot::empty(&self.overlays.spotlight)).unwrap_or_default();
        self.history.clear(initial);
        self.persist();
        info!("Canvas cleared");
    }

    // ---- capture ----

    /// Resolve queued blur captures into blur patches. Regions that cannot
    /// be captured get a placeholder fill. Returns the number of patches
    /// added or refreshed.
    pub async fn process_pending_captures(&mut self) -> usize {
        let pending = std::mem::take(&mut self.pending_captures);
        let mut resolved = 0;
        for capture in pending {
            // Only the part over actual background pixels can be captured
            let clipped = capture.rect.intersect(self.capture_bounds());
            let rect = if clipped.is_positive() { clipped } else { capture.rect };
            let width = rect.width().round().max(1.0) as u32;
            let height = rect.height().round().max(1.0) as u32;
            let processed = match self.capture_region(rect).await {
                Some(source) => raster::process_patch(&source, capture.style, capture.intensity),
                None => {
                    warn!("Blur region capture failed, using placeholder");
                    raster::placeholder_patch(width, height)
                }
            };
            let image = PatchImage::from_rgba_image(processed);
            let command = match capture.target {
                Some(id) => Command::ReplaceBlurImage {
                    id,
                    rect,
                    style: capture.style,
                    intensity: capture.intensity,
                    image,
                },
                None => Command::AddElement(factory::create_blur(rect, capture.style, capture.intensity, image)),
            };
            match self.execute(command) {
                Ok(()) => resolved += 1,
                Err(e) => warn!("Failed to store blur patch: {e}"),
            }
        }
        resolved
    }

    /// Canvas area backed by capturable pixels
    fn capture_bounds(&self) -> Rect {
        match &self.background {
            Background::Image { fit, .. } => fit.display_rect().intersect(self.canvas),
            Background::Screen { .. } => self.canvas,
        }
    }

    /// Pixels under a canvas rect, from the opened image or the screen
    async fn capture_region(&self, rect: Rect) -> Option<RgbaImage> {
        match &self.background {
            Background::Image { image, fit } => {
                let r = fit.rect_to_original(rect);
                let (x, y) = (r.min.x.max(0.0).floor() as u32, r.min.y.max(0.0).floor() as u32);
                let w = (r.max.x.ceil() - x as f32).max(0.0) as u32;
                let h = (r.max.y.ceil() - y as f32).max(0.0) as u32;
                crop_image(image, x, y, w, h)
            }
            Background::Screen { scale_factor } => {
                let s = *scale_factor;
                let x = (rect.min.x * s).max(0.0).round() as u32;
                let y = (rect.min.y * s).max(0.0).round() as u32;
                let w = (rect.max.x * s).round().max(0.0) as u32;
                let h = (rect.max.y * s).round().max(0.0) as u32;
                if w <= x || h <= y {
                    return None;
                }
                self.capture.capture_region(x, y, w - x, h - y).await
            }
        }
    }

    // ---- export ----

    /// Flatten the canvas into a PNG and hand it to `sink`.
    ///
    /// The crop mask is hidden while rasterizing and shown again afterwards
    /// whatever the outcome. A successful export resets the canvas.
    pub async fn export(&mut self, sink: &dyn ExportSink, options: ExportOptions) -> Result<ExportOutcome, ExportError> {
        self.tool.deactivate();
        self.set_crop_mask_visible(false);
        let composed = self.compose(&options).await;
        self.set_crop_mask_visible(true);

        let image = composed?;
        let raster = ExportedRaster::encode(&image)?;
        let path = sink.save_raster(&raster, options.overwrite_path.as_deref())?;
        info!("Exported {}x{} image to {}", raster.width(), raster.height(), path.display());

        self.clear_all();
        Ok(ExportOutcome {
            path,
            width: raster.width(),
            height: raster.height(),
        })
    }

    async fn compose(&self, options: &ExportOptions) -> Result<RgbaImage, ExportError> {
        let plan = ExportPlan::new(self.canvas, self.overlays.crop, &self.background, options)?;
        let background = if options.include_background {
            self.background_image().await
        } else {
            None
        };
        plan.render(&self.scene, background.as_deref(), FontCache::new(self.fonts.clone()))
    }

    async fn background_image(&self) -> Option<Arc<RgbaImage>> {
        match &self.background {
            Background::Image { image, .. } => Some(image.clone()),
            Background::Screen { .. } => {
                let capture = self.capture.capture_full_background().await;
                if capture.is_none() {
                    warn!("Background capture failed, exporting on transparent");
                }
                capture.map(Arc::new)
            }
        }
    }

    /// Crop rect currently installed, if any
    pub fn crop(&self) -> Option<CropRect> {
        self.overlays.crop
    }
}

fn encode_snapshot(snapshot: &SceneSnapshot) -> Option<String> {
    match snapshot.to_json() {
        Ok(json) => Some(json),
        Err(e) => {
            warn!("Failed to serialize snapshot: {e}");
            None
        }
    }
}

/// Axis-aligned bounds of an element as drawn, rotation included
fn visual_bounds(element: &ElementType) -> Rect {
    let corners = rotated_corners(element.rect(), element.rotation());
    corners
        .iter()
        .fold(Rect::NOTHING, |acc, p| acc.union(Rect::from_min_max(*p, *p)))
}

fn alignment_delta(canvas: Rect, bounds: Rect, alignment: Alignment) -> Vec2 {
    match alignment {
        Alignment::Left => vec2(canvas.min.x - bounds.min.x, 0.0),
        Alignment::HorizontalCenter => vec2(canvas.center().x - bounds.center().x, 0.0),
        Alignment::Right => vec2(canvas.max.x - bounds.max.x, 0.0),
        Alignment::Top => vec2(0.0, canvas.min.y - bounds.min.y),
        Alignment::VerticalCenter => vec2(0.0, canvas.center().y - bounds.center().y),
        Alignment::Bottom => vec2(0.0, canvas.max.y - bounds.max.y),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::MemorySessionStore;
    use egui::pos2;

    fn context() -> EditorContext {
        EditorContext::new(vec2(800.0, 600.0), ToolConfig::default(), Arc::new(MemorySessionStore::new()))
    }

    #[test]
    fn align_uses_rotated_bounds() {
        let bounds = Rect::from_min_max(pos2(100.0, 100.0), pos2(200.0, 150.0));
        let canvas = Rect::from_min_size(Pos2::ZERO, vec2(800.0, 600.0));
        assert_eq!(alignment_delta(canvas, bounds, Alignment::Right), vec2(600.0, 0.0));
        assert_eq!(alignment_delta(canvas, bounds, Alignment::VerticalCenter), vec2(0.0, 175.0));
    }

    #[test]
    fn place_type_commit_text() {
        let mut ctx = context();
        ctx.set_tool(ToolKind::Text);
        ctx.pointer_down(pos2(50.0, 50.0), Modifiers::default()).unwrap();
        assert!(ctx.editing_text().is_some());
        ctx.insert_text("hello").unwrap();
        ctx.handle_key(Key::Backspace, Modifiers::default()).unwrap();
        ctx.handle_key(Key::Escape, Modifiers::default()).unwrap();
        assert!(ctx.editing_text().is_none());
        let text = ctx.scene().iter().find_map(|e| e.as_text()).unwrap();
        assert_eq!(text.content, "hell");
        assert_eq!(ctx.history().len(), 2);
    }

    #[test]
    fn committing_empty_text_removes_it() {
        let mut ctx = context();
        ctx.set_tool(ToolKind::Text);
        ctx.pointer_down(pos2(50.0, 50.0), Modifiers::default()).unwrap();
        ctx.pointer_down(pos2(500.0, 500.0), Modifiers::default()).unwrap();
        assert!(ctx.scene().is_empty());
        assert_eq!(ctx.history().len(), 1);
    }

    #[test]
    fn cancel_discards_preview() {
        let mut ctx = context();
        ctx.set_tool(ToolKind::Rectangle);
        ctx.pointer_down(pos2(10.0, 10.0), Modifiers::default()).unwrap();
        ctx.pointer_move(pos2(100.0, 100.0), Modifiers::default()).unwrap();
        assert!(ctx.preview().is_some());
        ctx.execute(Command::Cancel).unwrap();
        assert!(ctx.preview().is_none());
        ctx.pointer_up(pos2(100.0, 100.0), Modifiers::default()).unwrap();
        assert!(ctx.scene().is_empty());
    }

    #[test]
    fn commands_needing_selection_fail_without_one() {
        let mut ctx = context();
        assert_eq!(ctx.execute(Command::DeleteSelected), Err(CommandError::NoSelection));
        assert_eq!(ctx.execute(Command::Paste), Ok(()));
        assert_eq!(ctx.history().len(), 1);
    }
}
