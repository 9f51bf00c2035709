use fontdb::{Database, Family, Query, Stretch, Style, Weight};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Mutex;
use ttf_parser::Face;

use crate::config::TextConfig;
use crate::measure::{HeuristicMeasurer, LabelMeasurer, LabelMetrics};

static FONT_LIBRARY: Lazy<Mutex<FontLibrary>> = Lazy::new(|| Mutex::new(FontLibrary::new()));

/// Label measurer backed by the system font matching the configured family.
///
/// Falls back to [`HeuristicMeasurer`] for glyphs (or whole families) the
/// font database cannot resolve.
#[derive(Debug, Clone)]
pub struct FontMeasurer {
    family: String,
    fallback: HeuristicMeasurer,
}

impl FontMeasurer {
    pub fn new(config: &TextConfig) -> Self {
        Self {
            family: config.font_family.clone(),
            fallback: HeuristicMeasurer::new(config),
        }
    }

    fn line_width(&self, line: &str) -> f32 {
        let font_size = self.fallback.font_size;
        if line.is_empty() || font_size <= 0.0 {
            return 0.0;
        }
        let measured = FONT_LIBRARY
            .lock()
            .ok()
            .and_then(|mut library| library.measure(line, font_size, &self.family));
        measured.unwrap_or_else(|| self.fallback.line_width(line))
    }
}

impl LabelMeasurer for FontMeasurer {
    fn measure_label(&self, text: &str) -> LabelMetrics {
        let mut width = 0.0f32;
        let mut count = 0usize;
        for line in text.split('\n') {
            width = width.max(self.line_width(&line.replace('\t', "    ")));
            count += 1;
        }
        LabelMetrics {
            width,
            height: count as f32 * self.fallback.font_size * self.fallback.line_height,
        }
    }
}

struct FontLibrary {
    db: Database,
    system_loaded: bool,
    faces: HashMap<String, Option<LoadedFace>>,
}

impl FontLibrary {
    fn new() -> Self {
        Self {
            db: Database::new(),
            system_loaded: false,
            faces: HashMap::new(),
        }
    }

    fn measure(&mut self, text: &str, font_size: f32, family: &str) -> Option<f32> {
        let key = family.trim().to_ascii_lowercase();
        if !self.faces.contains_key(&key) {
            let face = self.load(family);
            if face.is_none() {
                tracing::debug!(family, "no system font matched; using glyph estimates");
            }
            self.faces.insert(key.clone(), face);
        }
        self.faces.get_mut(&key)?.as_mut()?.width(text, font_size)
    }

    fn load(&mut self, family: &str) -> Option<LoadedFace> {
        let names: Vec<String> = family
            .split(',')
            .map(|part| part.trim().trim_matches('"').trim_matches('\'').to_string())
            .filter(|part| !part.is_empty())
            .collect();
        let mut families: Vec<Family<'_>> = names
            .iter()
            .map(|name| match name.to_ascii_lowercase().as_str() {
                "serif" => Family::Serif,
                "sans-serif" | "system-ui" | "ui-sans-serif" => Family::SansSerif,
                "monospace" | "ui-monospace" => Family::Monospace,
                _ => Family::Name(name.as_str()),
            })
            .collect();
        if families.is_empty() {
            families.push(Family::SansSerif);
        }

        if !self.system_loaded {
            self.db.load_system_fonts();
            self.system_loaded = true;
        }
        let id = self.db.query(&Query {
            families: &families,
            weight: Weight::NORMAL,
            stretch: Stretch::Normal,
            style: Style::Normal,
        })?;
        self.db
            .with_face_data(id, |data, index| LoadedFace::parse(data.to_vec(), index))
            .flatten()
    }
}

struct LoadedFace {
    data: Vec<u8>,
    index: u32,
    units_per_em: f32,
    advances: HashMap<char, Option<u16>>,
}

impl LoadedFace {
    fn parse(data: Vec<u8>, index: u32) -> Option<Self> {
        let units_per_em = Face::parse(&data, index).ok()?.units_per_em().max(1) as f32;
        Some(Self {
            data,
            index,
            units_per_em,
            advances: HashMap::new(),
        })
    }

    fn width(&mut self, text: &str, font_size: f32) -> Option<f32> {
        let face = Face::parse(&self.data, self.index).ok()?;
        let scale = font_size / self.units_per_em;
        let mut width = 0.0f32;
        for ch in text.chars() {
            let advance = *self.advances.entry(ch).or_insert_with(|| {
                face.glyph_index(ch)
                    .and_then(|glyph| face.glyph_hor_advance(glyph))
            });
            width += match advance {
                Some(units) => units as f32 * scale,
                None => crate::measure::glyph_width_factor(ch) * font_size,
            };
        }
        Some(width.max(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_label_has_zero_width() {
        let m = FontMeasurer::new(&TextConfig::default());
        let metrics = m.measure_label("");
        assert_eq!(metrics.width, 0.0);
        assert_eq!(metrics.height, 24.0);
    }

    #[test]
    fn longer_labels_measure_wider() {
        let m = FontMeasurer::new(&TextConfig::default());
        let short = m.measure_label("Raw");
        let long = m.measure_label("Raw ingestion layer");
        assert!(long.width > short.width);
    }
}
