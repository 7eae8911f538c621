//! Scroll-reveal and parallax styling.
//!
//! Pure functions turning viewport, scroll and pointer state into CSS
//! transform strings for the page templates. Nothing here touches data.

use serde::{Deserialize, Serialize};

/// Distance an element travels while it reveals.
const REVEAL_OFFSET_PX: i32 = 20;

/// Intersection ratio at which an element counts as visible.
pub const DEFAULT_THRESHOLD: f64 = 0.1;

/// Extra delay per child of a staggered group.
pub const DEFAULT_STAGGER_MS: u32 = 100;

/// Pixel travel of each parallax layer at the viewport edge.
const BACKGROUND_RANGE: f64 = 15.0;
const MIDGROUND_RANGE: f64 = 30.0;
const FOREGROUND_RANGE: f64 = 45.0;
const FLOATING_RANGE: f64 = 60.0;

/// Side an element slides in from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RevealDirection {
    #[default]
    Up,
    Down,
    Left,
    Right,
}

impl RevealDirection {
    /// Transform applied while the element is still hidden.
    pub fn hidden_transform(&self) -> String {
        match self {
            RevealDirection::Up => format!("translateY({}px)", REVEAL_OFFSET_PX),
            RevealDirection::Down => format!("translateY({}px)", -REVEAL_OFFSET_PX),
            RevealDirection::Left => format!("translateX({}px)", REVEAL_OFFSET_PX),
            RevealDirection::Right => format!("translateX({}px)", -REVEAL_OFFSET_PX),
        }
    }
}

/// Whether an observed element is inside the viewport enough to reveal.
pub fn is_revealed(intersection_ratio: f64, threshold: f64) -> bool {
    intersection_ratio > 0.0 && intersection_ratio >= threshold
}

/// Inline style of a reveal wrapper.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevealStyle {
    pub opacity: f64,
    pub transform: String,
    pub transition: String,
}

impl RevealStyle {
    pub fn new(visible: bool, direction: RevealDirection, delay_ms: u32) -> Self {
        Self {
            opacity: if visible { 1.0 } else { 0.0 },
            transform: if visible {
                "none".to_string()
            } else {
                direction.hidden_transform()
            },
            transition: format!("all 0.6s ease-out {}ms", delay_ms),
        }
    }

    /// Render as a CSS declaration list.
    pub fn to_css(&self) -> String {
        format!(
            "opacity: {}; transform: {}; transition: {};",
            self.opacity, self.transform, self.transition
        )
    }
}

/// Styles for `count` children revealed one after another. Delays saturate
/// at `u32::MAX` milliseconds.
pub fn stagger(
    count: usize,
    visible: bool,
    direction: RevealDirection,
    delay_ms: u32,
    stagger_ms: u32,
) -> Vec<RevealStyle> {
    (0..count)
        .map(|i| {
            let step = u32::try_from(i).unwrap_or(u32::MAX);
            let delay = delay_ms.saturating_add(step.saturating_mul(stagger_ms));
            RevealStyle::new(visible, direction, delay)
        })
        .collect()
}

/// A 2D pixel offset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Offset {
    pub x: f64,
    pub y: f64,
}

impl Offset {
    /// `translate3d` of this offset scaled per axis.
    pub fn translate3d(&self, factor_x: f64, factor_y: f64) -> String {
        format!(
            "translate3d({}px, {}px, 0)",
            self.x * factor_x,
            self.y * factor_y
        )
    }
}

/// Viewport size in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

/// Per-layer offsets derived from the pointer position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ParallaxLayers {
    pub background: Offset,
    pub midground: Offset,
    pub foreground: Offset,
    pub floating: Offset,
}

impl ParallaxLayers {
    /// Layers for a pointer at (`x`, `y`). The pointer is normalized to
    /// [-1, 1] around the viewport center; a degenerate viewport yields rest.
    pub fn from_pointer(x: f64, y: f64, viewport: Viewport) -> Self {
        let center_x = viewport.width / 2.0;
        let center_y = viewport.height / 2.0;
        if center_x <= 0.0 || center_y <= 0.0 {
            return Self::default();
        }

        let nx = (x - center_x) / center_x;
        let ny = (y - center_y) / center_y;
        let layer = |range: f64| Offset {
            x: nx * range,
            y: ny * range,
        };

        Self {
            background: layer(BACKGROUND_RANGE),
            midground: layer(MIDGROUND_RANGE),
            foreground: layer(FOREGROUND_RANGE),
            floating: layer(FLOATING_RANGE),
        }
    }
}

/// Vertical offset of a scroll-linked element moving at `speed`.
pub fn scroll_offset(scroll_y: f64, speed: f64) -> f64 {
    scroll_y * speed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hidden_transforms() {
        assert_eq!(RevealDirection::Up.hidden_transform(), "translateY(20px)");
        assert_eq!(RevealDirection::Down.hidden_transform(), "translateY(-20px)");
        assert_eq!(RevealDirection::Left.hidden_transform(), "translateX(20px)");
        assert_eq!(RevealDirection::Right.hidden_transform(), "translateX(-20px)");
    }

    #[test]
    fn test_reveal_style() {
        let hidden = RevealStyle::new(false, RevealDirection::Left, 0);
        assert_eq!(hidden.opacity, 0.0);
        assert_eq!(
            hidden.to_css(),
            "opacity: 0; transform: translateX(20px); transition: all 0.6s ease-out 0ms;"
        );

        let shown = RevealStyle::new(true, RevealDirection::Left, 250);
        assert_eq!(shown.opacity, 1.0);
        assert_eq!(shown.transform, "none");
        assert_eq!(shown.transition, "all 0.6s ease-out 250ms");
    }

    #[test]
    fn test_stagger_delays() {
        let styles = stagger(3, true, RevealDirection::Up, 50, DEFAULT_STAGGER_MS);
        let transitions: Vec<_> = styles.iter().map(|s| s.transition.as_str()).collect();
        assert_eq!(
            transitions,
            vec![
                "all 0.6s ease-out 50ms",
                "all 0.6s ease-out 150ms",
                "all 0.6s ease-out 250ms"
            ]
        );
        assert!(stagger(0, true, RevealDirection::Up, 0, 100).is_empty());
    }

    #[test]
    fn test_stagger_delays_saturate() {
        let styles = stagger(3, true, RevealDirection::Up, u32::MAX - 10, 1_000_000);
        assert_eq!(styles.len(), 3);
        assert_eq!(styles[0].transition, format!("all 0.6s ease-out {}ms", u32::MAX - 10));
        assert_eq!(styles[1].transition, format!("all 0.6s ease-out {}ms", u32::MAX));

        let styles = stagger(2, false, RevealDirection::Left, 0, u32::MAX);
        assert_eq!(styles[1].transition, "all 0.6s ease-out 4294967295ms");
    }

    #[test]
    fn test_is_revealed() {
        assert!(!is_revealed(0.0, 0.0));
        assert!(!is_revealed(0.05, DEFAULT_THRESHOLD));
        assert!(is_revealed(0.1, DEFAULT_THRESHOLD));
        assert!(is_revealed(1.0, DEFAULT_THRESHOLD));
    }

    #[test]
    fn test_parallax_layers() {
        let viewport = Viewport {
            width: 1000.0,
            height: 800.0,
        };

        let centered = ParallaxLayers::from_pointer(500.0, 400.0, viewport);
        assert_eq!(centered, ParallaxLayers::default());

        let corner = ParallaxLayers::from_pointer(1000.0, 0.0, viewport);
        assert_eq!(corner.background, Offset { x: 15.0, y: -15.0 });
        assert_eq!(corner.midground, Offset { x: 30.0, y: -30.0 });
        assert_eq!(corner.foreground, Offset { x: 45.0, y: -45.0 });
        assert_eq!(corner.floating, Offset { x: 60.0, y: -60.0 });

        assert_eq!(
            corner.midground.translate3d(0.5, 0.5),
            "translate3d(15px, -15px, 0)"
        );
    }

    #[test]
    fn test_degenerate_viewport_rests() {
        let layers = ParallaxLayers::from_pointer(
            10.0,
            10.0,
            Viewport {
                width: 0.0,
                height: 600.0,
            },
        );
        assert_eq!(layers, ParallaxLayers::default());
    }

    #[test]
    fn test_scroll_offset() {
        assert_eq!(scroll_offset(200.0, 0.5), 100.0);
        assert_eq!(scroll_offset(200.0, -0.25), -50.0);
    }
}
