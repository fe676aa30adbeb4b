/// Pixel layout of a frame's raw buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorFormat {
    Rgb24,
    Rgba32,
    Bgra32,
    Gray8,
    /// Android camera preview layout: full-resolution Y plane followed by
    /// interleaved V/U at quarter resolution.
    YuvNv21,
}

impl ColorFormat {
    /// Expected buffer length for a `width` x `height` frame in this format.
    pub fn buffer_len(self, width: u32, height: u32) -> usize {
        let pixels = (width as usize) * (height as usize);
        match self {
            ColorFormat::Rgb24 => pixels * 3,
            ColorFormat::Rgba32 | ColorFormat::Bgra32 => pixels * 4,
            ColorFormat::Gray8 => pixels,
            ColorFormat::YuvNv21 => pixels + 2 * (width as usize).div_ceil(2) * (height as usize).div_ceil(2),
        }
    }
}

/// Rotation the consumer must apply to display the frame upright.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Rotation {
    #[default]
    None,
    Cw90,
    Ccw90,
    Rotate180,
}

impl Rotation {
    /// Maps a clockwise angle in degrees (0, 90, 180, 270) to a rotation.
    pub fn from_degrees(degrees: i32) -> Self {
        match degrees.rem_euclid(360) {
            90 => Rotation::Cw90,
            180 => Rotation::Rotate180,
            270 => Rotation::Ccw90,
            _ => Rotation::None,
        }
    }

    pub fn swaps_axes(self) -> bool {
        matches!(self, Rotation::Cw90 | Rotation::Ccw90)
    }
}

/// A single timestamped image submitted for detection.
///
/// Immutable once constructed. The pipeline takes ownership on submission
/// and drops the frame after its one engine call has been dispatched.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    format: ColorFormat,
    rotation: Rotation,
    timestamp: f64,
}

impl Frame {
    pub fn new(
        data: Vec<u8>,
        width: u32,
        height: u32,
        format: ColorFormat,
        rotation: Rotation,
        timestamp: f64,
    ) -> Self {
        debug_assert_eq!(
            data.len(),
            format.buffer_len(width, height),
            "data length must match width, height and color format"
        );
        Self {
            data,
            width,
            height,
            format,
            rotation,
            timestamp,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> ColorFormat {
        self.format
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Producer-assigned timestamp in seconds.
    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    /// Width and height as seen after applying the target rotation.
    pub fn display_size(&self) -> (u32, u32) {
        if self.rotation.swaps_axes() {
            (self.height, self.width)
        } else {
            (self.width, self.height)
        }
    }

    /// Returns a copy of this frame carrying a different timestamp.
    ///
    /// Used by live sources that re-stamp decoded frames with capture time.
    pub fn with_timestamp(self, timestamp: f64) -> Self {
        Self { timestamp, ..self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_construction_and_accessors() {
        let data = vec![0u8; 12]; // 2x2 RGB
        let frame = Frame::new(data.clone(), 2, 2, ColorFormat::Rgb24, Rotation::None, 1.5);
        assert_eq!(frame.width(), 2);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.format(), ColorFormat::Rgb24);
        assert_eq!(frame.rotation(), Rotation::None);
        assert_eq!(frame.timestamp(), 1.5);
        assert_eq!(frame.data(), &data[..]);
    }

    #[test]
    #[should_panic(expected = "data length must match width, height and color format")]
    fn test_mismatched_data_length_panics_in_debug() {
        Frame::new(vec![0u8; 10], 2, 2, ColorFormat::Rgb24, Rotation::None, 0.0);
    }

    #[rstest]
    #[case(ColorFormat::Rgb24, 4, 2, 24)]
    #[case(ColorFormat::Rgba32, 4, 2, 32)]
    #[case(ColorFormat::Bgra32, 4, 2, 32)]
    #[case(ColorFormat::Gray8, 4, 2, 8)]
    #[case(ColorFormat::YuvNv21, 4, 2, 12)]
    #[case(ColorFormat::YuvNv21, 3, 3, 17)]
    fn test_buffer_len(
        #[case] format: ColorFormat,
        #[case] width: u32,
        #[case] height: u32,
        #[case] expected: usize,
    ) {
        assert_eq!(format.buffer_len(width, height), expected);
    }

    #[rstest]
    #[case(Rotation::None, (4, 2))]
    #[case(Rotation::Rotate180, (4, 2))]
    #[case(Rotation::Cw90, (2, 4))]
    #[case(Rotation::Ccw90, (2, 4))]
    fn test_display_size_swaps_for_quarter_turns(
        #[case] rotation: Rotation,
        #[case] expected: (u32, u32),
    ) {
        let frame = Frame::new(vec![0u8; 8], 4, 2, ColorFormat::Gray8, rotation, 0.0);
        assert_eq!(frame.display_size(), expected);
    }

    #[rstest]
    #[case(0, Rotation::None)]
    #[case(90, Rotation::Cw90)]
    #[case(180, Rotation::Rotate180)]
    #[case(270, Rotation::Ccw90)]
    #[case(-90, Rotation::Ccw90)]
    #[case(45, Rotation::None)]
    fn test_rotation_from_degrees(#[case] degrees: i32, #[case] expected: Rotation) {
        assert_eq!(Rotation::from_degrees(degrees), expected);
    }

    #[test]
    fn test_with_timestamp_keeps_pixels() {
        let frame = Frame::new(vec![7u8; 4], 2, 2, ColorFormat::Gray8, Rotation::Cw90, 0.0);
        let restamped = frame.with_timestamp(3.25);
        assert_eq!(restamped.timestamp(), 3.25);
        assert_eq!(restamped.data(), &[7u8; 4]);
        assert_eq!(restamped.rotation(), Rotation::Cw90);
    }
}
