//! DVR file entity.
//!
//! A [`DvrFile`] is created when a recording segment is finished, enriched
//! once with probe metadata and a thumbnail, then shared between every upload
//! destination. Its lock count starts at the number of destinations and only
//! goes down; when it reaches zero the file may be cleaned up.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};

use tracing::{debug, error, warn};

use camerabot_shared::camera::CameraInfo;
use camerabot_shared::constants::THUMBNAIL_SUFFIX;
use camerabot_shared::DvrError;

use crate::probe::{MediaProber, ProbeContext, VideoMetadata};
use crate::thumbnail::Thumbnailer;

#[derive(Debug)]
pub struct DvrFile {
    name: String,
    full_path: PathBuf,
    thumbnail_path: PathBuf,
    cam: CameraInfo,
    lock_count: AtomicU32,
    broken: bool,
    metadata: Option<VideoMetadata>,
}

impl DvrFile {
    pub fn new(
        name: impl Into<String>,
        lock_count: i64,
        storage_path: &Path,
        cam: CameraInfo,
    ) -> Result<Self, DvrError> {
        if lock_count <= 0 {
            return Err(DvrError::InvalidLockCount(lock_count));
        }
        let lock_count =
            u32::try_from(lock_count).map_err(|_| DvrError::InvalidLockCount(lock_count))?;

        let name = name.into();
        let full_path = storage_path.join(&name);
        let thumbnail_path = storage_path.join(format!("{name}{THUMBNAIL_SUFFIX}"));

        Ok(Self {
            name,
            full_path,
            thumbnail_path,
            cam,
            lock_count: AtomicU32::new(lock_count),
            broken: false,
            metadata: None,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn full_path(&self) -> &Path {
        &self.full_path
    }

    pub fn cam(&self) -> &CameraInfo {
        &self.cam
    }

    pub fn lock_count(&self) -> u32 {
        self.lock_count.load(Ordering::SeqCst)
    }

    pub fn is_locked(&self) -> bool {
        self.lock_count() != 0
    }

    /// Release one destination's hold on the file. Never goes below zero.
    ///
    /// Returns the count after the decrement.
    pub fn decrement_lock_count(&self) -> u32 {
        let previous = self
            .lock_count
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |count| {
                count.checked_sub(1)
            });
        match previous {
            Ok(previous) => {
                let current = previous - 1;
                debug!(file = %self.name, lock_count = current, "Decremented DVR file lock");
                current
            }
            Err(_) => {
                warn!(file = %self.name, "DVR file lock count is already zero");
                0
            }
        }
    }

    pub fn is_broken(&self) -> bool {
        self.broken
    }

    fn mark_as_broken(&mut self, reason: &str) {
        warn!(file = %self.name, reason, "Marking DVR file as broken");
        self.broken = true;
    }

    pub fn duration(&self) -> Option<u32> {
        self.metadata.map(|m| m.duration)
    }

    pub fn width(&self) -> Option<u32> {
        self.metadata.map(|m| m.width)
    }

    pub fn height(&self) -> Option<u32> {
        self.metadata.map(|m| m.height)
    }

    /// Thumbnail location, whether or not it has been rendered.
    pub fn thumbnail_path(&self) -> &Path {
        &self.thumbnail_path
    }

    /// Thumbnail path, only if the thumbnail file exists.
    pub fn thumbnail(&self) -> Option<&Path> {
        self.thumbnail_path
            .is_file()
            .then_some(self.thumbnail_path.as_path())
    }

    pub fn exists(&self) -> bool {
        self.full_path.is_file()
    }

    /// Probe the file and render its thumbnail concurrently.
    ///
    /// A failed or incomplete probe marks the file broken. A failed thumbnail
    /// is only logged; the upload goes out without one.
    pub async fn make_context(&mut self, prober: &dyn MediaProber, thumbnailer: &dyn Thumbnailer) {
        let (probed, thumbnail) = tokio::join!(
            prober.probe(&self.full_path),
            thumbnailer.make_thumbnail(&self.thumbnail_path, &self.full_path),
        );

        if let Err(e) = thumbnail {
            error!(file = %self.name, error = %e, "Failed to make thumbnail");
        }
        self.apply_probe(probed);
    }

    fn apply_probe(&mut self, probed: Result<Option<ProbeContext>, DvrError>) {
        let context = match probed {
            Ok(Some(context)) => context,
            Ok(None) => return self.mark_as_broken("probe returned nothing"),
            Err(e) => return self.mark_as_broken(&e.to_string()),
        };
        match context.video_metadata() {
            Ok(metadata) => {
                debug!(
                    file = %self.name,
                    duration = metadata.duration,
                    width = metadata.width,
                    height = metadata.height,
                    "Probed DVR file"
                );
                self.metadata = Some(metadata);
            }
            Err(e) => self.mark_as_broken(&e.to_string()),
        }
    }

    /// Upload preconditions, checked in order: exists, not broken, not empty.
    pub async fn check_uploadable(&self) -> Result<(), DvrError> {
        let metadata = match tokio::fs::metadata(&self.full_path).await {
            Ok(metadata) if metadata.is_file() => metadata,
            _ => return Err(DvrError::NotFound(self.full_path.clone())),
        };
        if self.broken {
            return Err(DvrError::Broken(self.full_path.clone()));
        }
        if metadata.len() == 0 {
            return Err(DvrError::Empty(self.full_path.clone()));
        }
        Ok(())
    }
}

impl fmt::Display for DvrFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
