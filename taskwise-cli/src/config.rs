use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use taskwise_core::{SystemDate, WorkWindow};

use crate::state::data_dir;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub schedule: ScheduleSection,
    pub clock: ClockSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleSection {
    pub work_start_hour: u32,
    pub work_end_hour: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockSection {
    /// IANA timezone used to decide what "today" means.
    pub timezone: String,
}

impl Default for ScheduleSection {
    fn default() -> Self {
        let w = WorkWindow::default();
        Self {
            work_start_hour: w.start_hour,
            work_end_hour: w.end_hour,
        }
    }
}

impl Default for ClockSection {
    fn default() -> Self {
        Self {
            timezone: "UTC".to_string(),
        }
    }
}

impl Config {
    /// Work window with optional one-off overrides from the command line.
    pub fn work_window(&self, start: Option<u32>, end: Option<u32>) -> Result<WorkWindow> {
        let start = start.unwrap_or(self.schedule.work_start_hour);
        let end = end.unwrap_or(self.schedule.work_end_hour);
        if end > 24 {
            bail!("work end hour must be at most 24 (got {end})");
        }
        if start >= end {
            bail!("work window is empty: start {start} must be before end {end}");
        }
        Ok(WorkWindow::new(start, end))
    }

    pub fn date_provider(&self) -> Result<SystemDate> {
        SystemDate::new(&self.clock.timezone).context("bad [clock] timezone in config.toml")
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(data_dir()?.join("config.toml"))
}

pub fn parse_config(s: &str) -> Result<Config> {
    toml::from_str(s).context("parse config.toml")
}

pub fn load_config() -> Result<Config> {
    let p = config_path()?;
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    parse_config(&s)
}

pub fn save_config(cfg: &Config) -> Result<()> {
    let p = config_path()?;
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config(&Config::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_fills_defaults() {
        let cfg = parse_config("[schedule]\nwork_start_hour = 8\n").unwrap();
        assert_eq!(cfg.schedule.work_start_hour, 8);
        assert_eq!(cfg.schedule.work_end_hour, 18);
        assert_eq!(cfg.clock.timezone, "UTC");
    }

    #[test]
    fn test_empty_config_is_default() {
        assert_eq!(parse_config("").unwrap(), Config::default());
    }

    #[test]
    fn test_default_config_round_trips() {
        let s = toml::to_string_pretty(&Config::default()).unwrap();
        assert_eq!(parse_config(&s).unwrap(), Config::default());
    }

    #[test]
    fn test_work_window_overrides_and_validation() {
        let cfg = Config::default();
        assert_eq!(cfg.work_window(None, None).unwrap(), WorkWindow::new(9, 18));
        assert_eq!(cfg.work_window(Some(7), None).unwrap(), WorkWindow::new(7, 18));
        assert!(cfg.work_window(Some(18), Some(9)).is_err());
        assert!(cfg.work_window(None, Some(25)).is_err());
    }

    #[test]
    fn test_bad_timezone_is_an_error() {
        let cfg = parse_config("[clock]\ntimezone = \"Nowhere/Special\"\n").unwrap();
        let err = cfg.date_provider().unwrap_err();
        assert!(format!("{err:#}").contains("[clock] timezone"));
    }
}
