/// A straight-alpha RGBA8 raster.
///
/// Freshly allocated canvases are transparent black. During tile assembly a
/// single canvas is owned by the compositing thread; tiles are copied in with
/// [`Canvas::blit`], which replaces destination pixels outright (no
/// blending), so tile boundaries stay exact.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0u8; width as usize * height as usize * 4],
        }
    }

    /// Wraps an existing RGBA8 buffer. Returns `None` when the buffer length
    /// does not match `width * height * 4`.
    pub fn from_rgba8(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        if data.len() != width as usize * height as usize * 4 {
            return None;
        }
        Some(Self {
            width,
            height,
            data,
        })
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = (y as usize * self.width as usize + x as usize) * 4;
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }

    pub fn put_pixel(&mut self, x: u32, y: u32, px: [u8; 4]) {
        let i = (y as usize * self.width as usize + x as usize) * 4;
        self.data[i..i + 4].copy_from_slice(&px);
    }

    /// Copies `src` into this canvas with its top-left corner at `(x, y)`.
    ///
    /// Source pixels replace destination pixels (opaque copy). Portions of
    /// `src` falling outside the canvas are clipped.
    pub fn blit(&mut self, src: &Canvas, x: u32, y: u32) {
        if x >= self.width || y >= self.height {
            return;
        }
        let copy_w = src.width.min(self.width - x) as usize;
        let copy_h = src.height.min(self.height - y) as usize;

        let dst_stride = self.width as usize * 4;
        let src_stride = src.width as usize * 4;
        let row_bytes = copy_w * 4;

        for sy in 0..copy_h {
            let dst_off = (y as usize + sy) * dst_stride + x as usize * 4;
            let src_off = sy * src_stride;
            self.data[dst_off..dst_off + row_bytes]
                .copy_from_slice(&src.data[src_off..src_off + row_bytes]);
        }
    }
}
