//! Output directory naming.

use chrono::{DateTime, Local};
use tracing::info;

use crate::encoder::EncoderKind;

/// Experiment directory used when none is named.
pub const DEFAULT_EXPERIMENT: &str = "runs";

/// Inputs to [`resolve_output_dir`].
#[derive(Clone, Debug)]
pub struct RunNaming<'a> {
    /// Algorithm name, e.g. `sac`.
    pub algorithm: &'a str,
    /// Observation type, e.g. `vec`.
    pub observation: &'a str,
    /// Reward type, e.g. `linear`.
    pub reward: &'a str,
    /// Encoder in use.
    pub encoder: EncoderKind,
    /// Explicit run name; replaces the generated one.
    pub run_name: Option<&'a str>,
    /// Experiment directory.
    pub experiment: Option<&'a str>,
}

/// Output directory of a training run.
///
/// Generated names look like `SAC_VEC_LINEAR_WAYFORMER_18-10_14:03:59/`
/// under the experiment directory; the encoder part is omitted when no
/// encoder is used.
pub fn resolve_output_dir(naming: &RunNaming<'_>, now: DateTime<Local>) -> String {
    let experiment = naming.experiment.unwrap_or(DEFAULT_EXPERIMENT);
    let run = match naming.run_name {
        Some(name) => name.to_string(),
        None => {
            let mut run = format!(
                "{}_{}_{}",
                naming.algorithm.to_uppercase(),
                naming.observation.to_uppercase(),
                naming.reward.to_uppercase()
            );
            if naming.encoder.needs_unflatten() {
                run.push('_');
                run.push_str(&naming.encoder.name().to_uppercase());
            }
            run.push_str(&now.format("_%d-%m_%H:%M:%S/").to_string());
            run
        }
    };
    let output_dir = format!("{experiment}/{run}");
    info!(%output_dir, "output directory");
    output_dir
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn naming(encoder: EncoderKind) -> RunNaming<'static> {
        RunNaming {
            algorithm: "sac",
            observation: "vec",
            reward: "linear",
            encoder,
            run_name: None,
            experiment: None,
        }
    }

    fn when() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 3, 7, 9, 5, 2).unwrap()
    }

    #[test]
    fn generated_name_with_encoder() {
        let dir = resolve_output_dir(&naming(EncoderKind::Wayformer), when());
        assert_eq!(dir, "runs/SAC_VEC_LINEAR_WAYFORMER_07-03_09:05:02/");
    }

    #[test]
    fn generated_name_without_encoder() {
        let mut n = naming(EncoderKind::None);
        n.experiment = Some("exp");
        let dir = resolve_output_dir(&n, when());
        assert_eq!(dir, "exp/SAC_VEC_LINEAR_07-03_09:05:02/");
    }

    #[test]
    fn explicit_run_name_wins() {
        let mut n = naming(EncoderKind::Mlp);
        n.run_name = Some("baseline");
        assert_eq!(resolve_output_dir(&n, when()), "runs/baseline");
    }
}
