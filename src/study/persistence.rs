#[cfg(feature = "serde")]
use std::collections::HashMap;

#[cfg(feature = "serde")]
use crate::trial::TrialRecord;
#[cfg(feature = "serde")]
use crate::types::Direction;

#[cfg(feature = "serde")]
use super::Study;

/// A serializable snapshot of a study's history.
///
/// The search space, sampler, and objective are code, not data, and are not
/// part of the snapshot. To resume, rebuild the study with the same space and
/// objective and hand it the recorded trials:
///
/// ```no_run
/// use tuner::prelude::*;
/// use tuner::StudySnapshot;
///
/// let snapshot = StudySnapshot::load("study.json").unwrap();
/// let space = SearchSpace::builder().float("x", 0.0, 1.0).build().unwrap();
/// let study = Study::builder()
///     .direction(snapshot.direction)
///     .space(space)
///     .objective(|c: &Configuration| Ok::<_, Error>(c.float("x").unwrap_or_default()))
///     .history(snapshot.trials)
///     .next_trial_id(snapshot.next_trial_id)
///     .build()
///     .unwrap();
/// study.run(10).unwrap();
/// ```
///
/// # Schema versioning
///
/// The `version` field allows the format to evolve. The current version is
/// `1`.
#[cfg(feature = "serde")]
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct StudySnapshot {
    /// Schema version for forward compatibility.
    pub version: u32,
    pub direction: Direction,
    /// Every recorded trial, in recording order.
    pub trials: Vec<TrialRecord>,
    /// The next trial id to assign.
    pub next_trial_id: u64,
    /// Free-form metadata.
    pub metadata: HashMap<String, String>,
}

#[cfg(feature = "serde")]
impl StudySnapshot {
    /// Reads a snapshot written by [`Study::save`].
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<std::path::Path>) -> std::io::Result<Self> {
        let file = std::fs::File::open(path)?;
        serde_json::from_reader(std::io::BufReader::new(file))
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}

#[cfg(feature = "serde")]
impl Study {
    /// Returns a snapshot of the current history.
    #[must_use]
    pub fn snapshot(&self) -> StudySnapshot {
        let mut metadata = HashMap::new();
        metadata.insert("n_hyperparameters".to_owned(), self.space.len().to_string());
        StudySnapshot {
            version: 1,
            direction: self.direction,
            trials: self.trials(),
            next_trial_id: self.next_id.load(core::sync::atomic::Ordering::SeqCst),
            metadata,
        }
    }

    /// Saves the history to a JSON file.
    ///
    /// The file is written next to its destination first and then renamed,
    /// so a crash mid-write never leaves a truncated snapshot behind.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be created or written.
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> std::io::Result<()> {
        let path = path.as_ref();
        let snapshot = self.snapshot();

        let parent = path.parent().unwrap_or(std::path::Path::new("."));
        let tmp_path = parent.join(format!(
            ".{}.tmp",
            path.file_name().unwrap_or_default().to_string_lossy()
        ));
        let mut writer = std::io::BufWriter::new(std::fs::File::create(&tmp_path)?);
        serde_json::to_writer_pretty(&mut writer, &snapshot).map_err(std::io::Error::other)?;
        std::io::Write::flush(&mut writer)?;
        drop(writer);
        std::fs::rename(&tmp_path, path)
    }
}
