/// Application name
pub const APP_NAME: &str = "camerabot";

/// Default bound of the result channel
pub const RESULT_QUEUE_SIZE: usize = 1024;

/// Default bound of each DVR upload queue
pub const UPLOAD_QUEUE_SIZE: usize = 64;

/// Seconds to wait between DVR upload attempts
pub const UPLOAD_RETRY_WAIT_SECS: u64 = 5;

/// Maximum DVR upload attempts per destination
pub const UPLOAD_RETRY_ATTEMPTS: u32 = 5;

/// Suffix of the thumbnail generated next to each DVR file
pub const THUMBNAIL_SUFFIX: &str = "-thumb.jpg";

/// Default delay between two alert notifications of one camera, in seconds
pub const ALERT_DELAY_SECS: u64 = 15;

/// Wait before reopening a finished or failed alert stream, in seconds
pub const ALERT_RECONNECT_SECS: u64 = 5;
