use std::{collections::BTreeMap, path::Path, sync::Arc};

use crate::{
    core::BezPath,
    error::{HanoivizError, HanoivizResult},
    model::{Asset, Composition, TextAsset},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AssetId(pub u32);

/// RGBA8 brush color used by Parley text layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TextBrushRgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

pub struct PreparedShape {
    pub path: BezPath,
}

pub struct PreparedText {
    pub layout: Arc<parley::Layout<TextBrushRgba8>>,
    pub font: vello_cpu::peniko::FontData,
    pub width: f32,
    pub height: f32,
}

pub enum PreparedAsset {
    Shape(PreparedShape),
    Text(PreparedText),
}

/// Immutable store of decode-once assets, built up-front from a composition.
pub struct PreparedAssetStore {
    ids: BTreeMap<String, AssetId>,
    items: Vec<PreparedAsset>,
}

impl PreparedAssetStore {
    pub fn prepare(comp: &Composition, assets_root: impl AsRef<Path>) -> HanoivizResult<Self> {
        let root = assets_root.as_ref();
        let mut engine = TextLayoutEngine::new();
        let mut ids = BTreeMap::new();
        let mut items = Vec::new();

        for (key, asset) in &comp.assets {
            let prepared = match asset {
                Asset::Shape(a) => PreparedAsset::Shape(PreparedShape {
                    path: a.shape.to_bez_path()?,
                }),
                Asset::Text(a) => PreparedAsset::Text(prepare_text(&mut engine, a, root)?),
            };
            let id = AssetId(items.len() as u32);
            items.push(prepared);
            ids.insert(key.clone(), id);
        }

        Ok(Self { ids, items })
    }

    pub fn id_for_key(&self, key: &str) -> HanoivizResult<AssetId> {
        self.ids.get(key).copied().ok_or_else(|| {
            HanoivizError::evaluation(format!("asset key '{key}' is not prepared"))
        })
    }

    pub fn get(&self, id: AssetId) -> HanoivizResult<&PreparedAsset> {
        self.items
            .get(id.0 as usize)
            .ok_or_else(|| HanoivizError::evaluation(format!("asset id {} out of range", id.0)))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

fn prepare_text(
    engine: &mut TextLayoutEngine,
    asset: &TextAsset,
    root: &Path,
) -> HanoivizResult<PreparedText> {
    let rel = normalize_rel_path(&asset.font_source)?;
    let path = root.join(Path::new(&rel));
    let font_bytes = std::fs::read(&path).map_err(|e| {
        HanoivizError::evaluation(format!("failed to read font '{}': {e}", path.display()))
    })?;

    let [r, g, b, a] = asset.color_rgba8;
    let layout = engine.layout_plain(
        &asset.text,
        &font_bytes,
        asset.size_px,
        TextBrushRgba8 { r, g, b, a },
    )?;
    let width = layout.width();
    let height = layout.height();

    let font = vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::from(font_bytes), 0);

    Ok(PreparedText {
        layout: Arc::new(layout),
        font,
        width,
        height,
    })
}

/// Normalize and validate composition-relative asset paths.
///
/// The normalized result uses `/` separators, removes `.` segments, and
/// rejects absolute paths or parent traversals (`..`).
pub fn normalize_rel_path(source: &str) -> HanoivizResult<String> {
    let s = source.replace('\\', "/");
    if s.starts_with('/') {
        return Err(HanoivizError::validation("asset paths must be relative"));
    }
    if s.is_empty() {
        return Err(HanoivizError::validation("asset path must be non-empty"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(HanoivizError::validation("asset paths must not contain '..'"));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(HanoivizError::validation(
            "asset path must contain a file name",
        ));
    }

    Ok(out.join("/"))
}

/// Stateful helper for building Parley text layouts from raw font bytes.
pub struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
}

impl Default for TextLayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TextLayoutEngine {
    pub fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
        }
    }

    pub fn layout_plain(
        &mut self,
        text: &str,
        font_bytes: &[u8],
        size_px: f32,
        brush: TextBrushRgba8,
    ) -> HanoivizResult<parley::Layout<TextBrushRgba8>> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(HanoivizError::validation(
                "text size_px must be finite and > 0",
            ));
        }

        let families = self
            .font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font_bytes.to_vec()), None);
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            HanoivizError::validation("no font families registered from font bytes")
        })?;

        let family_name = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| HanoivizError::validation("registered font family has no name"))?
            .to_string();

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(family_name)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(None);

        Ok(layout)
    }
}
