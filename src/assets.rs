use std::io::Cursor;
use std::path::Path;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum ImageFormat {
    Jpeg,
    Png,
}

#[derive(Clone)]
pub(crate) struct LogoImage {
    pub(crate) data: Vec<u8>,
    pub(crate) format: ImageFormat,
    pub(crate) pixel_width: u32,
    pub(crate) pixel_height: u32,
}

impl LogoImage {
    /// Largest size that fits `max_w × max_h` with the image's aspect ratio.
    pub(crate) fn fit_within(&self, max_w: f32, max_h: f32) -> (f32, f32) {
        if self.pixel_width == 0 || self.pixel_height == 0 {
            return (0.0, 0.0);
        }
        let (pw, ph) = (self.pixel_width as f32, self.pixel_height as f32);
        let scale = (max_w / pw).min(max_h / ph);
        (pw * scale, ph * scale)
    }
}

fn sniff_format(data: &[u8]) -> Option<ImageFormat> {
    if data.starts_with(&[0x89, b'P', b'N', b'G']) {
        Some(ImageFormat::Png)
    } else if data.starts_with(&[0xFF, 0xD8]) {
        Some(ImageFormat::Jpeg)
    } else {
        None
    }
}

/// Read the logo; any failure is logged and the header is drawn without it.
pub(crate) fn load_logo(path: &Path) -> Option<LogoImage> {
    let data = match std::fs::read(path) {
        Ok(d) => d,
        Err(e) => {
            log::warn!("Logo not loaded: {} ({e})", path.display());
            return None;
        }
    };
    let Some(format) = sniff_format(&data) else {
        log::warn!("Logo {} is neither PNG nor JPEG — skipping", path.display());
        return None;
    };
    let image_format = match format {
        ImageFormat::Png => image::ImageFormat::Png,
        ImageFormat::Jpeg => image::ImageFormat::Jpeg,
    };
    let reader = image::ImageReader::with_format(Cursor::new(&data), image_format);
    let (pixel_width, pixel_height) = match reader.into_dimensions() {
        Ok(dims) => dims,
        Err(e) => {
            log::warn!("Logo {} unreadable: {e}", path.display());
            return None;
        }
    };
    log::debug!(
        "Logo {}: {:?} {}x{}",
        path.display(),
        format,
        pixel_width,
        pixel_height
    );
    Some(LogoImage {
        data,
        format,
        pixel_width,
        pixel_height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn logo(w: u32, h: u32) -> LogoImage {
        LogoImage {
            data: Vec::new(),
            format: ImageFormat::Png,
            pixel_width: w,
            pixel_height: h,
        }
    }

    #[test]
    fn fit_keeps_aspect_ratio() {
        let close = |(w, h): (f32, f32), (ew, eh): (f32, f32)| {
            (w - ew).abs() < 1e-3 && (h - eh).abs() < 1e-3
        };
        assert!(close(logo(300, 100).fit_within(150.0, 48.0), (144.0, 48.0)));
        assert!(close(logo(600, 100).fit_within(150.0, 48.0), (150.0, 25.0)));
        assert_eq!(logo(0, 100).fit_within(150.0, 48.0), (0.0, 0.0));
    }

    #[test]
    fn format_is_sniffed_from_magic_bytes() {
        assert_eq!(sniff_format(b"\x89PNG\r\n\x1a\n"), Some(ImageFormat::Png));
        assert_eq!(sniff_format(&[0xFF, 0xD8, 0xFF, 0xE0]), Some(ImageFormat::Jpeg));
        assert_eq!(sniff_format(b"GIF89a"), None);
    }

    #[test]
    fn missing_logo_is_none() {
        assert!(load_logo(Path::new("does/not/exist.png")).is_none());
    }
}
