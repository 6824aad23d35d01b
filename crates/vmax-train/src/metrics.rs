//! Metric logging.
//!
//! [`log_metrics`] writes every metric to the log and forwards it to an
//! optional [`MetricsSink`] under a grouped tag: keys without a `/` go
//! under `metrics/`, keys mentioning `steps` or `rewards` under
//! `training/`, and other namespaced keys are passed through.

use std::io::Write;

use indexmap::IndexMap;
use serde::Serialize;
use tracing::info;

use crate::error::TrainError;

/// Runtime keys reported alongside training progress.
pub const RUNTIME_KEYS: [(&str, &str); 4] = [
    ("runtime/data_time", "data time"),
    ("runtime/training_time", "training time"),
    ("runtime/log_time", "log time"),
    ("runtime/eval_time", "eval time"),
];

/// Destination for scalar metrics.
pub trait MetricsSink {
    /// Record one scalar under `tag` at `step`.
    fn add_scalar(&mut self, tag: &str, value: f64, step: Option<u64>) -> Result<(), TrainError>;
}

/// Training progress.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Progress {
    /// Environment steps taken so far.
    pub current_step: u64,
    /// Planned total.
    pub total_timesteps: u64,
}

impl Progress {
    /// Completion in percent.
    pub fn percent(&self) -> f64 {
        if self.total_timesteps == 0 {
            return 0.0;
        }
        self.current_step as f64 / self.total_timesteps as f64 * 100.0
    }
}

/// Sink tag for a metric key.
pub fn metric_tag(key: &str) -> String {
    if key.contains("steps") || key.contains("rewards") {
        format!("training/{key}")
    } else if !key.contains('/') {
        format!("metrics/{key}")
    } else {
        key.to_string()
    }
}

/// Log a metrics snapshot and forward it to `sink`.
///
/// With `progress`, the completion and the four [`RUNTIME_KEYS`] are
/// logged first; a missing runtime key is an error.
pub fn log_metrics(
    step: Option<u64>,
    metrics: &IndexMap<String, f64>,
    progress: Option<Progress>,
    mut sink: Option<&mut dyn MetricsSink>,
) -> Result<(), TrainError> {
    if let Some(progress) = progress {
        info!(
            "-> Step {}/{} - {:.2}%",
            progress.current_step,
            progress.total_timesteps,
            progress.percent()
        );
        for (key, label) in RUNTIME_KEYS {
            let value = metrics.get(key).ok_or_else(|| TrainError::MissingKey {
                key: key.to_string(),
            })?;
            info!("-> {label:<14}: {value:.2}s");
        }
    }

    for (key, &value) in metrics {
        if let Some(sink) = sink.as_deref_mut() {
            sink.add_scalar(&metric_tag(key), value, step)?;
        }
        info!("{key}: {value}");
    }
    Ok(())
}

#[derive(Serialize)]
struct ScalarRecord<'a> {
    tag: &'a str,
    value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    step: Option<u64>,
}

/// Sink writing one JSON object per scalar, one per line.
#[derive(Debug)]
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    /// Wrap a writer.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Unwrap the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> MetricsSink for JsonLinesSink<W> {
    fn add_scalar(&mut self, tag: &str, value: f64, step: Option<u64>) -> Result<(), TrainError> {
        let record = ScalarRecord { tag, value, step };
        serde_json::to_writer(&mut self.writer, &record).map_err(|e| TrainError::Serialize {
            reason: e.to_string(),
        })?;
        self.writer
            .write_all(b"\n")
            .map_err(|source| TrainError::Io {
                path: "<metrics sink>".into(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder(Vec<(String, f64, Option<u64>)>);

    impl MetricsSink for Recorder {
        fn add_scalar(&mut self, tag: &str, value: f64, step: Option<u64>) -> Result<(), TrainError> {
            self.0.push((tag.to_string(), value, step));
            Ok(())
        }
    }

    fn runtime() -> IndexMap<String, f64> {
        RUNTIME_KEYS.iter().map(|(k, _)| (k.to_string(), 0.5)).collect()
    }

    #[test]
    fn tags_follow_prefix_rule() {
        assert_eq!(metric_tag("loss"), "metrics/loss");
        assert_eq!(metric_tag("episode/accuracy"), "episode/accuracy");
        assert_eq!(metric_tag("num_steps"), "training/num_steps");
        assert_eq!(metric_tag("train/rewards"), "training/train/rewards");
    }

    #[test]
    fn every_metric_reaches_sink_in_order() {
        let mut metrics = IndexMap::new();
        metrics.insert("loss".to_string(), 1.5);
        metrics.insert("eval/ep_len".to_string(), 80.0);
        let mut rec = Recorder::default();
        log_metrics(Some(42), &metrics, None, Some(&mut rec)).unwrap();
        assert_eq!(
            rec.0,
            vec![
                ("metrics/loss".to_string(), 1.5, Some(42)),
                ("eval/ep_len".to_string(), 80.0, Some(42)),
            ]
        );
    }

    #[test]
    fn progress_requires_runtime_keys() {
        let progress = Progress {
            current_step: 50,
            total_timesteps: 200,
        };
        assert_eq!(progress.percent(), 25.0);
        assert!(log_metrics(None, &runtime(), Some(progress), None).is_ok());

        let err = log_metrics(None, &IndexMap::new(), Some(progress), None).unwrap_err();
        assert!(matches!(err, TrainError::MissingKey { ref key } if key == "runtime/data_time"));
    }

    #[test]
    fn json_lines_sink_writes_records() {
        let mut sink = JsonLinesSink::new(Vec::new());
        sink.add_scalar("metrics/loss", 0.25, Some(3)).unwrap();
        sink.add_scalar("metrics/kl", 1.0, None).unwrap();
        let text = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], r#"{"tag":"metrics/loss","value":0.25,"step":3}"#);
        assert_eq!(lines[1], r#"{"tag":"metrics/kl","value":1.0}"#);
    }
}
