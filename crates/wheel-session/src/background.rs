//! Background media selection: kind classification and last-wins ordering
//! for the asynchronous per-list background requests.

/// How a background media reference should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Classify a MIME-type-like string.  The engine contract only ever
    /// produces the `image/` and `video/` families, but anything else is
    /// treated as undisplayable rather than an error.
    pub fn classify(mime: &str) -> Option<Self> {
        if mime.starts_with("image/") {
            Some(Self::Image)
        } else if mime.starts_with("video/") {
            Some(Self::Video)
        } else {
            None
        }
    }
}

/// A displayable background: content locator plus presentation kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Background {
    pub source: String,
    pub kind: MediaKind,
}

impl Background {
    /// Build from the engine's `(locator, mime)` reply.  `None` in, or an
    /// unclassifiable kind, means no background.
    pub fn from_media(media: Option<(String, String)>) -> Option<Self> {
        let (source, mime) = media?;
        let kind = MediaKind::classify(&mime)?;
        Some(Self { source, kind })
    }
}

/// Monotonic token source enforcing last-wins for superseding requests.
///
/// Requests are never cancelled; a response is simply discarded when a
/// newer request has been issued since it was sent.
#[derive(Debug, Default)]
pub struct Generation {
    current: u64,
}

impl Generation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new request, invalidating every earlier token.
    pub fn begin(&mut self) -> u64 {
        self.current += 1;
        self.current
    }

    /// Whether a response carrying `token` is still the latest request.
    pub fn is_current(&self, token: u64) -> bool {
        self.current == token
    }
}
