//! RGB colour type and the `aarrggbb` wire format

/// RGB color value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RgbColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl RgbColor {
    /// Black (key off)
    pub const BLACK: Self = Self { r: 0, g: 0, b: 0 };
    /// White (all channels full)
    pub const WHITE: Self = Self {
        r: 255,
        g: 255,
        b: 255,
    };
    /// Red
    pub const RED: Self = Self { r: 255, g: 0, b: 0 };
    /// Green
    pub const GREEN: Self = Self { r: 0, g: 255, b: 0 };
    /// Blue
    pub const BLUE: Self = Self { r: 0, g: 0, b: 255 };

    /// Create a new RGB color
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Create color from HSV values (h: 0-360, s: 0-1, v: 0-1)
    pub fn from_hsv(h: f32, s: f32, v: f32) -> Self {
        let h = h.rem_euclid(360.0);
        let s = s.clamp(0.0, 1.0);
        let v = v.clamp(0.0, 1.0);

        let c = v * s;
        let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
        let m = v - c;

        let (r, g, b) = match (h / 60.0) as i32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };

        Self {
            r: ((r + m) * 255.0) as u8,
            g: ((g + m) * 255.0) as u8,
            b: ((b + m) * 255.0) as u8,
        }
    }

    /// Scale brightness by a factor in [0, 1].
    pub fn scale(self, factor: f32) -> Self {
        let f = factor.clamp(0.0, 1.0);
        Self {
            r: (self.r as f32 * f) as u8,
            g: (self.g as f32 * f) as u8,
            b: (self.b as f32 * f) as u8,
        }
    }

    /// Linearly interpolate between two colors.
    pub fn lerp(a: Self, b: Self, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        Self {
            r: (a.r as f32 + (b.r as f32 - a.r as f32) * t) as u8,
            g: (a.g as f32 + (b.g as f32 - a.g as f32) * t) as u8,
            b: (a.b as f32 + (b.b as f32 - a.b as f32) * t) as u8,
        }
    }

    /// Parse a color string.
    ///
    /// Accepts `#RRGGBB`, bare `RRGGBB`, the host's `AARRGGBB` (alpha is
    /// dropped) and a handful of color names.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let hex = s.strip_prefix('#').unwrap_or(s);
        let channels = match hex.len() {
            6 if hex.chars().all(|c| c.is_ascii_hexdigit()) => Some(&hex[0..6]),
            8 if hex.chars().all(|c| c.is_ascii_hexdigit()) => Some(&hex[2..8]),
            _ => None,
        };
        if let Some(rgb) = channels {
            let r = u8::from_str_radix(&rgb[0..2], 16).ok()?;
            let g = u8::from_str_radix(&rgb[2..4], 16).ok()?;
            let b = u8::from_str_radix(&rgb[4..6], 16).ok()?;
            return Some(Self::new(r, g, b));
        }

        match s.to_ascii_lowercase().as_str() {
            "black" | "off" => Some(Self::BLACK),
            "red" => Some(Self::RED),
            "green" => Some(Self::GREEN),
            "blue" => Some(Self::BLUE),
            "yellow" => Some(Self::new(255, 255, 0)),
            "cyan" => Some(Self::new(0, 255, 255)),
            "magenta" | "pink" => Some(Self::new(255, 0, 255)),
            "white" => Some(Self::WHITE),
            "orange" => Some(Self::new(255, 165, 0)),
            "purple" => Some(Self::new(128, 0, 255)),
            _ => None,
        }
    }

    /// Format as the host's lowercase `aarrggbb` hex string.
    pub fn to_argb_hex(self, alpha: u8) -> String {
        format!("{alpha:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}
