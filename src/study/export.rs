use core::fmt;
use std::collections::BTreeSet;

use crate::configuration::Configuration;
use crate::types::{Direction, TrialState};

use super::Study;

impl Study {
    /// Writes the history as CSV, one row per trial in recording order.
    ///
    /// Columns: `trial_id`, `outer_fold_id`, `state`, `value`,
    /// `duration_s`, `n_failed_folds`, one column per hyperparameter (in
    /// search-space order), and `failure`. Inactive hyperparameters and the
    /// value of failed trials are empty cells. Categorical cells hold the
    /// choice label.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if writing fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use tuner::prelude::*;
    ///
    /// let space = SearchSpace::builder().float("x", 0.0, 10.0).build().unwrap();
    /// let study = Study::builder()
    ///     .space(space)
    ///     .objective(|c: &Configuration| Ok::<_, Error>(c.float("x").unwrap_or_default()))
    ///     .build()
    ///     .unwrap();
    /// study.run(3).unwrap();
    ///
    /// let mut buf = Vec::new();
    /// study.to_csv(&mut buf).unwrap();
    /// let csv = String::from_utf8(buf).unwrap();
    /// assert!(csv.starts_with("trial_id,"));
    /// assert_eq!(csv.lines().count(), 4);
    /// ```
    pub fn to_csv(&self, mut writer: impl std::io::Write) -> std::io::Result<()> {
        let trials = self.history.read();

        // Space order first, then anything only seen in the history.
        let mut columns: Vec<String> = self
            .space
            .hyperparameters()
            .iter()
            .map(|p| p.name().to_owned())
            .collect();
        let extra: BTreeSet<&str> = trials
            .iter()
            .flat_map(|t| t.configuration().iter().map(|(name, _)| name))
            .filter(|name| self.space.get(name).is_none())
            .collect();
        columns.extend(extra.into_iter().map(str::to_owned));

        write!(
            writer,
            "trial_id,outer_fold_id,state,value,duration_s,n_failed_folds"
        )?;
        for name in &columns {
            write!(writer, ",{}", csv_escape(name))?;
        }
        writeln!(writer, ",failure")?;

        for trial in trials.iter() {
            write!(writer, "{}", trial.id())?;
            match trial.outer_fold_id() {
                Some(fold) => write!(writer, ",{fold}")?,
                None => write!(writer, ",")?,
            }
            write!(writer, ",{}", state_name(trial.state()))?;
            match trial.value() {
                Some(value) => write!(writer, ",{value}")?,
                None => write!(writer, ",")?,
            }
            write!(
                writer,
                ",{},{}",
                trial.duration().as_secs_f64(),
                trial.n_failed_folds()
            )?;
            for name in &columns {
                write!(writer, ",{}", csv_escape(&cell(trial.configuration(), name)))?;
            }
            let failure = trial.failure().map(ToString::to_string).unwrap_or_default();
            writeln!(writer, ",{}", csv_escape(&failure))?;
        }

        Ok(())
    }

    /// Writes [`to_csv`](Self::to_csv) output to a file.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be created or written.
    pub fn export_csv(&self, path: impl AsRef<std::path::Path>) -> std::io::Result<()> {
        let file = std::fs::File::create(path)?;
        self.to_csv(std::io::BufWriter::new(file))
    }

    /// Returns a human-readable summary: direction, trial counts, and the
    /// best trial when there is one.
    #[must_use]
    pub fn summary(&self) -> String {
        use fmt::Write;

        let direction = match self.direction {
            Direction::Minimize => "Minimize",
            Direction::Maximize => "Maximize",
        };
        let mut s = format!(
            "Study: {direction} | {} trials ({} complete, {} failed)",
            self.n_trials(),
            self.n_complete(),
            self.n_failed()
        );
        if let Ok(best) = self.best_trial() {
            if let Some(value) = best.value() {
                let _ = write!(s, "\nBest value: {value} (trial #{})", best.id());
            }
            let _ = write!(s, "\nBest configuration: {}", best.configuration());
        }
        s
    }
}

impl fmt::Display for Study {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

#[cfg(feature = "serde")]
impl Study {
    /// Writes the history as a pretty-printed JSON array of
    /// [`TrialRecord`](crate::TrialRecord)s.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be created or written.
    pub fn export_json(&self, path: impl AsRef<std::path::Path>) -> std::io::Result<()> {
        let file = std::fs::File::create(path)?;
        let trials = self.trials();
        serde_json::to_writer_pretty(file, &trials).map_err(std::io::Error::other)
    }
}

fn state_name(state: TrialState) -> &'static str {
    match state {
        TrialState::Complete => "Complete",
        TrialState::Failed => "Failed",
    }
}

fn cell(config: &Configuration, name: &str) -> String {
    match (config.choice(name), config.get(name)) {
        (Some(label), _) => label.to_owned(),
        (None, Some(value)) => value.to_string(),
        (None, None) => String::new(),
    }
}

/// Quotes a CSV field if it contains a comma, quote, or line break.
fn csv_escape(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, FailureCause};
    use crate::objective::Evaluation;
    use crate::space::{Condition, Hyperparameter, SearchSpace};
    use crate::trial::TrialRecord;

    #[test]
    fn inactive_and_failed_cells_are_empty() {
        let space = SearchSpace::builder()
            .categorical("kernel", ["linear", "poly"])
            .add(
                Hyperparameter::int("degree", 2, 5)
                    .active_when(Condition::equals("kernel", "poly")),
            )
            .build()
            .unwrap();
        let linear = space.configuration().choice("kernel", "linear").build().unwrap();
        let poly = space
            .configuration()
            .choice("kernel", "poly")
            .int("degree", 3)
            .build()
            .unwrap();
        let study = Study::builder()
            .space(space)
            .objective(|_: &Configuration| Ok::<_, Error>(1.0))
            .build()
            .unwrap();
        study.record(TrialRecord::complete(0, linear, Evaluation::from_value(0.5)));
        study.record(TrialRecord::failed(
            1,
            poly,
            FailureCause::Objective("a, b".into()),
        ));

        let mut buf = Vec::new();
        study.to_csv(&mut buf).unwrap();
        let csv = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines[0],
            "trial_id,outer_fold_id,state,value,duration_s,n_failed_folds,kernel,degree,failure"
        );
        assert_eq!(lines[1], "0,,Complete,0.5,0,0,linear,,");
        assert_eq!(lines[2], "1,,Failed,,0,0,poly,3,\"objective failed: a, b\"");
    }
}
