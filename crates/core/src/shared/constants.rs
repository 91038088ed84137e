/// Frames an action overlay stays on screen after the frame that set it.
pub const OVERLAY_FRAME_COUNT: usize = 16;

/// Scheduler yield before wiping the enrollment database.
pub const DELETE_SETTLE_MS: u64 = 10;

/// Capacity of the bounded queues wired by the bootstrap.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 2;

/// Recognizer label for identities enrolled as foes.
pub const FOE_LABEL: &str = "fo";
/// Recognizer label for identities enrolled as friends.
pub const FRIEND_LABEL: &str = "fr";

/// Horizontal advance of one overlay glyph, in pixels.
pub const GLYPH_ADVANCE: u32 = 14;
/// Top row of the overlay text line.
pub const OVERLAY_TEXT_ROW: u32 = 10;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];
