//! Scripted intents for `lectern simulate`
//!
//! A script is a comma-separated list of `TIME:ACTION` steps, where `TIME`
//! is virtual seconds since the session started, for example
//! `5:next,12:repeat,20:speed=2,30:repeat,35:pause=1.5`.

use anyhow::{anyhow, bail, Context, Result};
use serde::Serialize;
use std::fmt;

/// One UI intent
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum ScriptAction {
    TogglePlayPause,
    Next,
    Previous,
    ToggleRepeat,
    Speed(f32),
    Pause(f64),
    Seek(f64),
    Fail,
    Stop,
}

impl fmt::Display for ScriptAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TogglePlayPause => write!(f, "toggle play/pause"),
            Self::Next => write!(f, "next segment"),
            Self::Previous => write!(f, "previous segment"),
            Self::ToggleRepeat => write!(f, "toggle repeat"),
            Self::Speed(speed) => write!(f, "speed {}x", speed),
            Self::Pause(secs) => write!(f, "pause {}s between segments", secs),
            Self::Seek(fraction) => write!(f, "seek to {:.0}%", fraction * 100.0),
            Self::Fail => write!(f, "transport failure"),
            Self::Stop => write!(f, "stop"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScriptStep {
    pub at: f64,
    pub action: ScriptAction,
}

/// Parses a script, returning its steps ordered by time
///
/// Steps sharing a time keep their written order.
pub fn parse_script(script: &str) -> Result<Vec<ScriptStep>> {
    let mut steps = script
        .split(',')
        .map(str::trim)
        .filter(|step| !step.is_empty())
        .map(|step| parse_step(step).with_context(|| format!("Invalid script step '{}'", step)))
        .collect::<Result<Vec<_>>>()?;

    steps.sort_by(|a, b| a.at.total_cmp(&b.at));
    Ok(steps)
}

fn parse_step(step: &str) -> Result<ScriptStep> {
    let (at, action) = step
        .split_once(':')
        .ok_or_else(|| anyhow!("expected TIME:ACTION"))?;

    let at: f64 = at.trim().parse().context("time is not a number")?;
    if !at.is_finite() || at < 0.0 {
        bail!("time must be a non-negative number of seconds");
    }

    Ok(ScriptStep {
        at,
        action: parse_action(action.trim())?,
    })
}

fn parse_action(action: &str) -> Result<ScriptAction> {
    let (name, value) = match action.split_once('=') {
        Some((name, value)) => (name.trim(), Some(value.trim())),
        None => (action, None),
    };

    let action = match (name.to_ascii_lowercase().as_str(), value) {
        ("toggle" | "play" | "pause-toggle", None) => ScriptAction::TogglePlayPause,
        ("next", None) => ScriptAction::Next,
        ("prev" | "previous", None) => ScriptAction::Previous,
        ("repeat", None) => ScriptAction::ToggleRepeat,
        ("fail", None) => ScriptAction::Fail,
        ("stop", None) => ScriptAction::Stop,
        ("speed", Some(v)) => ScriptAction::Speed(v.parse().context("speed is not a number")?),
        ("pause", Some(v)) => ScriptAction::Pause(v.parse().context("pause is not a number")?),
        ("seek", Some(v)) => ScriptAction::Seek(v.parse().context("seek is not a number")?),
        ("speed" | "pause" | "seek", None) => bail!("'{}' needs a value, e.g. {}=1.5", name, name),
        (_, _) => bail!("unknown action '{}'", action),
    };
    Ok(action)
}
