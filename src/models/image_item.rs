#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn from_flag(is_video: bool) -> Self {
        if is_video {
            Self::Video
        } else {
            Self::Image
        }
    }

    /// Guess the kind from a file name, for records that carry no flag.
    pub fn from_name(name: &str) -> Option<Self> {
        let ext = name.rsplit_once('.')?.1;
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" | "png" | "webp" | "bmp" => Some(Self::Image),
            "gif" | "webm" | "mp4" | "mkv" | "mov" => Some(Self::Video),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// One remote media asset. Immutable once mapped from a server record.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageItem {
    /// Unique within a feed snapshot; used as the dedup and favorite key.
    pub name: String,
    /// Absolute location of the full-resolution asset.
    pub uri: String,
    /// Absolute location of the low-res preview, if the server has one.
    pub thumb: Option<String>,
    pub kind: MediaKind,
    pub size: Option<u64>,
    pub dimensions: Option<Dimensions>,
    /// Upload time as a unix timestamp in seconds.
    pub upload_date: Option<i64>,
}

impl ImageItem {
    pub fn new(name: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            uri: uri.into(),
            thumb: None,
            kind: MediaKind::Image,
            size: None,
            dimensions: None,
            upload_date: None,
        }
    }

    pub fn with_thumb(mut self, thumb: impl Into<String>) -> Self {
        self.thumb = Some(thumb.into());
        self
    }

    pub fn with_kind(mut self, kind: MediaKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_upload_date(mut self, timestamp: i64) -> Self {
        self.upload_date = Some(timestamp);
        self
    }

    pub fn is_video(&self) -> bool {
        self.kind == MediaKind::Video
    }

    /// Size in bytes, with unknown sizes counting as zero.
    pub fn size_or_zero(&self) -> u64 {
        self.size.unwrap_or(0)
    }

    /// Source to show in small previews: the thumbnail, else the asset itself.
    pub fn preview_uri(&self) -> &str {
        self.thumb.as_deref().unwrap_or(&self.uri)
    }

    pub fn aspect_ratio(&self) -> f32 {
        match self.dimensions {
            Some(Dimensions { width, height }) if height > 0 => width as f32 / height as f32,
            _ => 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_name() {
        assert_eq!(MediaKind::from_name("a.PNG"), Some(MediaKind::Image));
        assert_eq!(MediaKind::from_name("clip.webm"), Some(MediaKind::Video));
        assert_eq!(MediaKind::from_name("notes.txt"), None);
        assert_eq!(MediaKind::from_name("noext"), None);
    }

    #[test]
    fn test_preview_falls_back_to_uri() {
        let item = ImageItem::new("a.png", "http://host/a.png");
        assert_eq!(item.preview_uri(), "http://host/a.png");

        let item = item.with_thumb("http://host/t/a.jpg");
        assert_eq!(item.preview_uri(), "http://host/t/a.jpg");
    }

    #[test]
    fn test_aspect_ratio() {
        let mut item = ImageItem::new("a.png", "u");
        assert_eq!(item.aspect_ratio(), 1.0);
        item.dimensions = Some(Dimensions {
            width: 200,
            height: 100,
        });
        assert_eq!(item.aspect_ratio(), 2.0);
    }
}
