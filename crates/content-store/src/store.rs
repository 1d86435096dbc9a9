//! The refcounted video catalog.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use clipforge_common::error::{ForgeError, ForgeResult};
use clipforge_project_model::video::Video;

/// Catalog of content-addressed source videos, keyed by digest.
///
/// All refcount mutations happen under the catalog lock, so two
/// concurrent uploads of the same content cannot both observe
/// `ref_count == 1` and race a decrement to zero later.
pub struct VideoStore {
    root: PathBuf,
    videos: Mutex<HashMap<String, Video>>,
}

impl VideoStore {
    /// Open the catalog at the given library root.
    pub fn open(root: impl AsRef<Path>) -> ForgeResult<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(root.join("sources"))?;

        let catalog_path = root.join("videos.json");
        let videos = if catalog_path.exists() {
            let content = std::fs::read_to_string(&catalog_path)?;
            serde_json::from_str(&content)?
        } else {
            HashMap::new()
        };

        Ok(Self {
            root,
            videos: Mutex::new(videos),
        })
    }

    /// Look up a video by content digest.
    pub fn find_by_digest(&self, digest: &str) -> Option<Video> {
        let videos = self.videos.lock().expect("video catalog lock poisoned");
        videos.get(digest).cloned()
    }

    /// Look up a video by record id.
    pub fn get(&self, video_id: &str) -> ForgeResult<Video> {
        let videos = self.videos.lock().expect("video catalog lock poisoned");
        videos
            .values()
            .find(|video| video.id == video_id)
            .cloned()
            .ok_or_else(|| ForgeError::not_found(format!("video {video_id}")))
    }

    /// Absolute path of a video's physical file.
    pub fn physical_path(&self, video: &Video) -> PathBuf {
        self.root.join(&video.file_path)
    }

    /// Register a video for a new upload with `ref_count = 1`.
    ///
    /// Callers run [`VideoStore::deduplicate`] first. A digest that is
    /// already cataloged here means two ingests of the same content
    /// raced past that check; the late one becomes another owner of the
    /// existing record rather than an error. The physical file is
    /// content-addressed, so the racing writes landed on the same path
    /// with identical bytes.
    pub fn register(&self, file_path: &Path, digest: &str) -> ForgeResult<Video> {
        let size_bytes = std::fs::metadata(self.root.join(file_path))?.len();
        let mut videos = self.videos.lock().expect("video catalog lock poisoned");
        if let Some(video) = videos.get_mut(digest) {
            video.ref_count += 1;
            let updated = video.clone();
            self.persist(&videos)?;
            tracing::info!(
                digest,
                ref_count = updated.ref_count,
                "Upload raced an existing registration; aliased"
            );
            return Ok(updated);
        }
        let video = Video::new(digest, file_path.to_path_buf(), size_bytes);
        videos.insert(digest.to_string(), video.clone());
        self.persist(&videos)?;
        tracing::info!(digest, size_bytes, "Registered new source video");
        Ok(video)
    }

    /// Deduplicate a freshly uploaded file against the catalog.
    ///
    /// If a video with the same digest exists, the duplicate physical
    /// file is deleted, the existing record's `ref_count` is
    /// incremented, and the existing record is returned: the upload is
    /// now an alias. Returns `None` when no match exists and the caller
    /// should register the upload as a first-class video.
    pub fn deduplicate(&self, new_file: &Path, digest: &str) -> ForgeResult<Option<Video>> {
        let mut videos = self.videos.lock().expect("video catalog lock poisoned");
        let Some(video) = videos.get_mut(digest) else {
            return Ok(None);
        };
        std::fs::remove_file(new_file)?;
        video.ref_count += 1;
        let updated = video.clone();
        self.persist(&videos)?;
        tracing::info!(
            digest,
            ref_count = updated.ref_count,
            "Deduplicated upload against existing video"
        );
        Ok(Some(updated))
    }

    /// Drop one logical owner of a video. The count never goes below
    /// zero; the physical file is untouched either way.
    pub fn release(&self, digest: &str) -> ForgeResult<u64> {
        let mut videos = self.videos.lock().expect("video catalog lock poisoned");
        let video = videos
            .get_mut(digest)
            .ok_or_else(|| ForgeError::not_found(format!("video digest {digest}")))?;
        video.ref_count = video.ref_count.saturating_sub(1);
        let count = video.ref_count;
        self.persist(&videos)?;
        Ok(count)
    }

    /// Videos with no remaining logical owners.
    ///
    /// Read-only: deleting orphaned source files is a manual follow-up,
    /// never automatic.
    pub fn unused(&self) -> Vec<Video> {
        let videos = self.videos.lock().expect("video catalog lock poisoned");
        videos
            .values()
            .filter(|video| video.ref_count == 0)
            .cloned()
            .collect()
    }

    fn persist(&self, videos: &HashMap<String, Video>) -> ForgeResult<()> {
        let json = serde_json::to_string_pretty(videos)?;
        std::fs::write(self.root.join("videos.json"), json)?;
        Ok(())
    }
}
