/// Placement of a shrunk image on its square transparent canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThumbnailGeometry {
    /// Canvas width and height.
    pub side: u32,
    /// Size of the image after shrinking.
    pub width: u32,
    pub height: u32,
    /// Top-left corner of the image on the canvas.
    pub offset_x: u32,
    pub offset_y: u32,
}

impl ThumbnailGeometry {
    /// Computes the layout for a `width`×`height` source.
    ///
    /// The canvas side is `min(longest side, max_side)`. Images are only ever
    /// shrunk, keeping aspect ratio, so the longest side ends up equal to the
    /// canvas side. Returns `None` for empty sources or a zero `max_side`.
    pub fn fit(width: u32, height: u32, max_side: u32) -> Option<Self> {
        if width == 0 || height == 0 || max_side == 0 {
            return None;
        }
        let longest = width.max(height);
        let side = longest.min(max_side);
        let (width, height) = if longest == side {
            (width, height)
        } else {
            (scale(width, side, longest), scale(height, side, longest))
        };
        Some(Self {
            side,
            width,
            height,
            offset_x: (side - width) / 2,
            offset_y: (side - height) / 2,
        })
    }

    /// True when the source needs no resampling.
    pub fn is_identity(&self, width: u32, height: u32) -> bool {
        self.width == width && self.height == height
    }
}

// Round-to-nearest of `value * side / longest`, never below one pixel.
fn scale(value: u32, side: u32, longest: u32) -> u32 {
    let scaled = (u64::from(value) * u64::from(side) + u64::from(longest) / 2) / u64::from(longest);
    (scaled as u32).clamp(1, side)
}
