use std::path::Path;

use ffmpeg_next::format::context::Input;
use ffmpeg_next::software::scaling;
use ffmpeg_next::util::frame::video::Video;
use ffmpeg_next::Rational;

use crate::shared::frame::{ColorFormat, Frame, Rotation};
use crate::video::domain::frame_source::{FrameSource, SourceError, SourceInfo};

/// Decodes a video file with ffmpeg-next into RGB24 frames stamped with
/// their presentation time in seconds.
pub struct FfmpegFrameSource {
    input_ctx: Option<Input>,
    video_stream_index: usize,
    info: Option<SourceInfo>,
}

// Safety: FfmpegFrameSource is only used from a single thread at a time.
// The raw pointers inside ffmpeg types are not shared across threads.
unsafe impl Send for FfmpegFrameSource {}

impl FfmpegFrameSource {
    pub fn new() -> Self {
        Self {
            input_ctx: None,
            video_stream_index: 0,
            info: None,
        }
    }

    pub fn info(&self) -> Option<&SourceInfo> {
        self.info.as_ref()
    }

    fn decoding_iter(&mut self) -> Result<FfmpegFrameIter<'_>, SourceError> {
        let (Some(ictx), Some(info)) = (self.input_ctx.as_mut(), self.info.as_ref()) else {
            return Err(SourceError::NotOpen);
        };

        let stream = ictx
            .stream(self.video_stream_index)
            .ok_or(SourceError::NotOpen)?;
        let time_base = stream.time_base();
        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
        let decoder = codec_ctx.decoder().video()?;

        let width = decoder.width();
        let height = decoder.height();
        let scaler = scaling::Context::get(
            decoder.format(),
            width,
            height,
            ffmpeg_next::format::Pixel::RGB24,
            width,
            height,
            scaling::Flags::BILINEAR,
        )?;

        Ok(FfmpegFrameIter {
            decoder,
            scaler,
            width,
            height,
            rotation: info.rotation,
            time_base,
            fps: info.fps,
            video_stream_index: self.video_stream_index,
            frame_index: 0,
            flushing: false,
            done: false,
            ictx,
        })
    }
}

impl Default for FfmpegFrameSource {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSource for FfmpegFrameSource {
    fn open(&mut self, path: &Path) -> Result<SourceInfo, SourceError> {
        ffmpeg_next::init()?;

        let ictx = ffmpeg_next::format::input(path)?;

        let stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or_else(|| SourceError::NoVideoStream(path.to_path_buf()))?;

        let video_stream_index = stream.index();
        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
        let decoder = codec_ctx.decoder().video()?;

        let info = SourceInfo {
            width: decoder.width(),
            height: decoder.height(),
            fps: rational_to_f64(stream.rate()),
            total_frames: usize::try_from(stream.frames()).unwrap_or(0),
            rotation: Rotation::from_degrees(extract_rotation(&stream)),
            codec: decoder
                .codec()
                .map(|c| c.name().to_string())
                .unwrap_or_default(),
            source_path: Some(path.to_path_buf()),
        };
        log::debug!(
            "Opened {}: {}x{} @ {:.2} fps, {:?}",
            path.display(),
            info.width,
            info.height,
            info.fps,
            info.rotation
        );

        self.video_stream_index = video_stream_index;
        self.info = Some(info.clone());
        self.input_ctx = Some(ictx);

        Ok(info)
    }

    fn frames(&mut self) -> Box<dyn Iterator<Item = Result<Frame, SourceError>> + '_> {
        match self.decoding_iter() {
            Ok(iter) => Box::new(iter),
            Err(e) => Box::new(std::iter::once(Err(e))),
        }
    }

    fn close(&mut self) {
        self.input_ctx = None;
        self.info = None;
    }
}

/// Lazy iterator that decodes one frame at a time.
struct FfmpegFrameIter<'a> {
    ictx: &'a mut Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: scaling::Context,
    width: u32,
    height: u32,
    rotation: Rotation,
    time_base: Rational,
    fps: f64,
    video_stream_index: usize,
    frame_index: usize,
    flushing: bool,
    done: bool,
}

impl FfmpegFrameIter<'_> {
    fn try_receive(&mut self) -> Option<Result<Frame, SourceError>> {
        let mut decoded = Video::empty();
        if self.decoder.receive_frame(&mut decoded).is_err() {
            return None;
        }

        let mut rgb_frame = Video::empty();
        if let Err(e) = self.scaler.run(&decoded, &mut rgb_frame) {
            return Some(Err(e.into()));
        }

        let timestamp = frame_timestamp(
            decoded.timestamp().or(decoded.pts()),
            self.time_base,
            self.frame_index,
            self.fps,
        );
        let pixels = extract_rgb_pixels(&rgb_frame, self.width, self.height);
        self.frame_index += 1;
        Some(Ok(Frame::new(
            pixels,
            self.width,
            self.height,
            ColorFormat::Rgb24,
            self.rotation,
            timestamp,
        )))
    }
}

impl Iterator for FfmpegFrameIter<'_> {
    type Item = Result<Frame, SourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        if let Some(result) = self.try_receive() {
            return Some(result);
        }

        if self.flushing {
            self.done = true;
            return None;
        }

        loop {
            let Some((stream, packet)) = self.ictx.packets().next() else {
                let _ = self.decoder.send_eof();
                self.flushing = true;
                if let Some(result) = self.try_receive() {
                    return Some(result);
                }
                self.done = true;
                return None;
            };

            if stream.index() != self.video_stream_index {
                continue;
            }

            if self.decoder.send_packet(&packet).is_err() {
                continue;
            }

            if let Some(result) = self.try_receive() {
                return Some(result);
            }
        }
    }
}

fn rational_to_f64(r: Rational) -> f64 {
    if r.denominator() != 0 {
        r.numerator() as f64 / r.denominator() as f64
    } else {
        0.0
    }
}

/// Presentation time in seconds. Falls back to `index / fps` when the
/// decoder reports no timestamp or the stream has no usable time base.
fn frame_timestamp(pts: Option<i64>, time_base: Rational, index: usize, fps: f64) -> f64 {
    let base = rational_to_f64(time_base);
    match pts {
        Some(pts) if base > 0.0 => pts as f64 * base,
        _ if fps > 0.0 => index as f64 / fps,
        _ => index as f64,
    }
}

/// Rotation angle from the stream's display matrix, falling back to the
/// `"rotate"` metadata tag. Returns 0, 90, 180, or 270.
fn extract_rotation(stream: &ffmpeg_next::format::stream::Stream) -> i32 {
    for side_data in stream.side_data() {
        if side_data.kind() == ffmpeg_next::codec::packet::side_data::Type::DisplayMatrix {
            if let Some(angle) = parse_display_matrix(side_data.data()) {
                return normalize_rotation(angle);
            }
        }
    }

    stream
        .metadata()
        .get("rotate")
        .and_then(|s| s.parse::<i32>().ok())
        .map(normalize_rotation)
        .unwrap_or(0)
}

/// Angle of a 3x3 display matrix (9 x i32, 16.16 fixed point, little
/// endian). Negated, since the matrix stores the inverse transform.
fn parse_display_matrix(data: &[u8]) -> Option<i32> {
    if data.len() < 36 {
        return None;
    }

    let m00 = i32::from_le_bytes(data[0..4].try_into().ok()?) as f64 / 65536.0;
    let m10 = i32::from_le_bytes(data[4..8].try_into().ok()?) as f64 / 65536.0;

    Some(-m10.atan2(m00).to_degrees().round() as i32)
}

fn normalize_rotation(angle: i32) -> i32 {
    match angle.rem_euclid(360) {
        45..=134 => 90,
        135..=224 => 180,
        225..=315 => 270,
        _ => 0,
    }
}

/// Copies the RGB plane into a tightly packed buffer, dropping row padding.
fn extract_rgb_pixels(rgb_frame: &Video, width: u32, height: u32) -> Vec<u8> {
    let stride = rgb_frame.stride(0);
    let data = rgb_frame.data(0);
    let row_len = width as usize * 3;

    let mut pixels = Vec::with_capacity(row_len * height as usize);
    for row in 0..height as usize {
        let start = row * stride;
        pixels.extend_from_slice(&data[start..start + row_len]);
    }
    pixels
}
