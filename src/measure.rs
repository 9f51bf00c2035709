use crate::config::TextConfig;

/// Measured extent of a (possibly multi-line) label.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LabelMetrics {
    pub width: f32,
    pub height: f32,
}

/// Text-measurement service used for minimum sizes and leaf auto-sizing.
///
/// Implementations must be deterministic: the cascade relies on measuring
/// the same label twice giving the same answer.
pub trait LabelMeasurer {
    fn measure_label(&self, text: &str) -> LabelMetrics;
}

impl<F> LabelMeasurer for F
where
    F: Fn(&str) -> LabelMetrics,
{
    fn measure_label(&self, text: &str) -> LabelMetrics {
        self(text)
    }
}

/// Every glyph has the same advance. Handy for tests and for terminals.
#[derive(Debug, Clone, Copy)]
pub struct FixedMeasurer {
    pub char_width: f32,
    pub line_height: f32,
}

impl FixedMeasurer {
    pub fn new(char_width: f32, line_height: f32) -> Self {
        Self {
            char_width,
            line_height,
        }
    }
}

impl LabelMeasurer for FixedMeasurer {
    fn measure_label(&self, text: &str) -> LabelMetrics {
        let lines: Vec<&str> = text.split('\n').collect();
        let widest = lines
            .iter()
            .map(|line| line.chars().count())
            .max()
            .unwrap_or(0);
        LabelMetrics {
            width: widest as f32 * self.char_width,
            height: lines.len() as f32 * self.line_height,
        }
    }
}

/// Proportional estimate from per-class glyph widths of a sans-serif face.
#[derive(Debug, Clone)]
pub struct HeuristicMeasurer {
    pub font_size: f32,
    pub line_height: f32,
}

impl HeuristicMeasurer {
    pub fn new(config: &TextConfig) -> Self {
        Self {
            font_size: config.font_size,
            line_height: config.line_height,
        }
    }

    pub fn line_width(&self, line: &str) -> f32 {
        line.chars()
            .map(|ch| glyph_width_factor(ch) * self.font_size)
            .sum()
    }
}

impl LabelMeasurer for HeuristicMeasurer {
    fn measure_label(&self, text: &str) -> LabelMetrics {
        let mut width = 0.0f32;
        let mut count = 0usize;
        for line in text.split('\n') {
            width = width.max(self.line_width(line));
            count += 1;
        }
        LabelMetrics {
            width,
            height: count as f32 * self.font_size * self.line_height,
        }
    }
}

/// Advance width as a fraction of the font size.
pub(crate) fn glyph_width_factor(ch: char) -> f32 {
    match ch {
        ' ' => 0.306,
        '\t' => 0.306 * 4.0,
        'i' | 'j' | 'l' | 'I' | '\'' | '|' | '!' => 0.26,
        '.' | ',' | ':' | ';' | '(' | ')' | '[' | ']' | '{' | '}' | '\\' | '/' => 0.321,
        'f' | 't' | 'r' => 0.34,
        'm' | 'w' => 0.84,
        'M' | 'W' => 0.93,
        '_' | '-' => 0.5,
        '0'..='9' => 0.6,
        'A'..='Z' => 0.66,
        'a'..='z' => 0.56,
        ch if ch.is_ascii() => 0.58,
        // CJK and other wide scripts.
        ch if ch as u32 >= 0x2E80 => 1.0,
        _ => 0.62,
    }
}

/// Measurer for the configured text settings: font-backed when the `fonts`
/// feature is on and the family resolves, heuristic otherwise.
pub fn default_measurer(config: &TextConfig) -> Box<dyn LabelMeasurer> {
    #[cfg(feature = "fonts")]
    {
        Box::new(crate::text_metrics::FontMeasurer::new(config))
    }
    #[cfg(not(feature = "fonts"))]
    {
        Box::new(HeuristicMeasurer::new(config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_measurer_counts_lines() {
        let m = FixedMeasurer::new(8.0, 24.0);
        let metrics = m.measure_label("abc\nabcdef");
        assert_eq!(metrics.width, 48.0);
        assert_eq!(metrics.height, 48.0);
    }

    #[test]
    fn heuristic_width_scales_with_font_size() {
        let small = HeuristicMeasurer {
            font_size: 16.0,
            line_height: 1.5,
        };
        let large = HeuristicMeasurer {
            font_size: 32.0,
            line_height: 1.5,
        };
        let a = small.measure_label("Staging");
        let b = large.measure_label("Staging");
        assert!((b.width - a.width * 2.0).abs() < 0.01);
        assert_eq!(a.height, 24.0);
    }

    #[test]
    fn every_glyph_has_positive_width() {
        for ch in ['a', 'Z', ' ', '0', '@', '\u{4e2d}', '\u{e9}'] {
            assert!(glyph_width_factor(ch) > 0.0, "char {ch:?} has zero width");
        }
    }

    #[test]
    fn closures_are_measurers() {
        let m = |text: &str| LabelMetrics {
            width: text.len() as f32,
            height: 1.0,
        };
        assert_eq!(m.measure_label("four").width, 4.0);
    }
}
