use anyhow::{Context, Result};
use chrono::{Days, NaiveDate};
use log::info;
use std::{io::Write, path::PathBuf};

use crate::{
    api::WxmApi,
    config::Config,
    export::Exporter,
    model::{DayHistory, HourlyReading},
};

/// Outcome of a completed export run.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub devices_processed: usize,
    pub files_written: Vec<PathBuf>,
}

/// Inclusive `[yesterday, today]` fetch window.
pub fn lookback_window(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let yesterday = today.checked_sub_days(Days::new(1)).unwrap_or(today);
    (yesterday, today)
}

/// Run the full export: authenticate once, list devices, then fetch, export
/// and print yesterday's history for each device in listed order.
///
/// The first failing step aborts the remaining devices and surfaces as an
/// `Err`; an empty device list is a successful no-op. All human-readable
/// progress goes through `out`.
pub async fn run_export(
    api: &dyn WxmApi,
    config: &Config,
    exporter: &Exporter,
    today: NaiveDate,
    out: &mut impl Write,
) -> Result<RunSummary> {
    let credentials = config.credentials()?;

    let token = api.login(credentials).await.context("Authentication failed")?;
    writeln!(out, "Authentication successful.")?;

    let devices = api.devices(&token).await.context("Failed to list devices")?;
    if devices.is_empty() {
        writeln!(out, "No devices found.")?;
        return Ok(RunSummary::default());
    }

    let (from_date, to_date) = lookback_window(today);
    let mut summary = RunSummary::default();

    for device in &devices {
        writeln!(out)?;
        writeln!(out, "Fetching weather history for device ID: {}", device.id)?;

        let history = api
            .device_history(&token, &device.id, from_date, to_date)
            .await
            .with_context(|| format!("Failed to fetch history for device {}", device.id))?;

        let path = exporter.write_history(&history, to_date)?;
        writeln!(out, "Weather data saved to {}", path.display())?;
        info!("exported {} day(s) for device {}", history.len(), device.id);

        render_history(&history, out)?;

        summary.devices_processed += 1;
        summary.files_written.push(path);
    }

    Ok(summary)
}

fn render_history(history: &[DayHistory], out: &mut impl Write) -> Result<()> {
    for day in history {
        writeln!(out)?;
        writeln!(out, "Date: {}, Time Zone: {}", day.date, day.tz)?;
        for reading in &day.hourly {
            render_reading(reading, out)?;
        }
    }
    Ok(())
}

fn render_reading(reading: &HourlyReading, out: &mut impl Write) -> Result<()> {
    writeln!(out, "Timestamp: {}", reading.timestamp.to_rfc3339())?;
    writeln!(out, "  Temperature: {} °C", fmt_value(reading.temperature))?;
    writeln!(out, "  Humidity: {} %", fmt_value(reading.humidity))?;
    writeln!(out, "  Feels Like: {} °C", fmt_value(reading.feels_like))?;
    writeln!(out, "  Wind Speed: {} km/h", fmt_value(reading.wind_speed))?;
    writeln!(out, "  Wind Direction: {} °", fmt_value(reading.wind_direction))?;
    writeln!(out, "  Wind Gust: {} km/h", fmt_value(reading.wind_gust))?;
    writeln!(out, "  Precipitation: {} mm", fmt_value(reading.precipitation))?;
    writeln!(
        out,
        "  Precipitation Accumulated: {} mm",
        fmt_value(reading.precipitation_accumulated)
    )?;
    writeln!(out, "  Pressure: {} hPa", fmt_value(reading.pressure))?;
    writeln!(out, "  Dew Point: {} °C", fmt_value(reading.dew_point))?;
    writeln!(out, "  UV Index: {}", fmt_value(reading.uv_index))?;
    writeln!(out, "  Illuminance: {} lux", fmt_value(reading.illuminance))?;
    writeln!(out, "  Solar Irradiance: {} W/m²", fmt_value(reading.solar_irradiance))?;
    writeln!(out, "  ---")?;
    Ok(())
}

/// A reading the station never reported prints as "n/a" rather than zero.
fn fmt_value(value: Option<f64>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "n/a".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        api::ApiError,
        config::Credentials,
        model::{AuthToken, Device},
    };
    use async_trait::async_trait;
    use chrono::DateTime;
    use serde_json::Map;
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct FakeApi {
        devices: Vec<Device>,
        history: Vec<DayHistory>,
        fail_login: bool,
        fail_history: bool,
        history_calls: Mutex<Vec<String>>,
    }

    fn unauthorized(endpoint: &'static str) -> ApiError {
        ApiError::Status {
            endpoint,
            status: reqwest::StatusCode::UNAUTHORIZED,
            body: "invalid credentials".to_string(),
        }
    }

    #[async_trait]
    impl WxmApi for FakeApi {
        async fn login(&self, _credentials: &Credentials) -> Result<AuthToken, ApiError> {
            if self.fail_login {
                return Err(unauthorized("login"));
            }
            Ok(AuthToken::new("test-token"))
        }

        async fn devices(&self, _token: &AuthToken) -> Result<Vec<Device>, ApiError> {
            Ok(self.devices.clone())
        }

        async fn device_history(
            &self,
            _token: &AuthToken,
            device_id: &str,
            _from_date: NaiveDate,
            _to_date: NaiveDate,
        ) -> Result<Vec<DayHistory>, ApiError> {
            self.history_calls.lock().unwrap().push(device_id.to_string());
            if self.fail_history {
                return Err(unauthorized("history"));
            }
            Ok(self.history.clone())
        }
    }

    fn config_with_credentials() -> Config {
        let mut config = Config::default();
        config.set_credentials("user@example.com".into(), "secret".into());
        config
    }

    fn full_reading() -> HourlyReading {
        HourlyReading {
            timestamp: DateTime::parse_from_rfc3339("2024-03-14T13:00:00+02:00").unwrap(),
            temperature: Some(21.3),
            humidity: Some(45.0),
            feels_like: Some(20.8),
            wind_speed: Some(12.4),
            wind_direction: Some(270.0),
            wind_gust: Some(18.0),
            precipitation: Some(0.2),
            precipitation_accumulated: Some(2.4),
            pressure: Some(1013.2),
            dew_point: Some(8.9),
            uv_index: Some(5.0),
            illuminance: Some(54000.0),
            solar_irradiance: Some(612.5),
            extra: Map::new(),
        }
    }

    fn one_day_history() -> Vec<DayHistory> {
        vec![DayHistory {
            date: NaiveDate::from_ymd_opt(2024, 3, 14).unwrap(),
            tz: "Europe/Athens".to_string(),
            hourly: vec![full_reading()],
        }]
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    #[test]
    fn lookback_window_is_yesterday_to_today() {
        let (from_date, to_date) = lookback_window(today());

        assert_eq!(from_date, NaiveDate::from_ymd_opt(2024, 3, 14).unwrap());
        assert_eq!(to_date, today());
    }

    #[test]
    fn lookback_window_crosses_month_boundaries() {
        let (from_date, _) = lookback_window(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(from_date, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    }

    #[tokio::test]
    async fn empty_device_list_short_circuits() {
        let api = FakeApi::default();
        let dir = tempfile::tempdir().expect("tempdir");
        let exporter = Exporter::new(dir.path().join("output"));
        let mut out = Vec::new();

        let summary =
            run_export(&api, &config_with_credentials(), &exporter, today(), &mut out)
                .await
                .expect("empty device list is not an error");

        assert_eq!(summary.devices_processed, 0);
        assert!(summary.files_written.is_empty());
        assert!(api.history_calls.lock().unwrap().is_empty());
        assert!(!dir.path().join("output").exists());

        let output = String::from_utf8(out).expect("utf8");
        assert!(output.contains("Authentication successful."));
        assert!(output.contains("No devices found."));
    }

    #[tokio::test]
    async fn each_device_is_fetched_and_exported_in_order() {
        let api = FakeApi {
            devices: vec![Device::new("dev1"), Device::new("dev2"), Device::new("dev3")],
            history: one_day_history(),
            ..FakeApi::default()
        };
        let dir = tempfile::tempdir().expect("tempdir");
        let exporter = Exporter::new(dir.path());
        let mut out = Vec::new();

        let summary =
            run_export(&api, &config_with_credentials(), &exporter, today(), &mut out)
                .await
                .expect("run must succeed");

        assert_eq!(summary.devices_processed, 3);
        assert_eq!(summary.files_written.len(), 3);
        assert_eq!(*api.history_calls.lock().unwrap(), vec!["dev1", "dev2", "dev3"]);
    }

    #[tokio::test]
    async fn exported_file_matches_the_fetched_payload() {
        let api = FakeApi {
            devices: vec![Device::new("dev1")],
            history: one_day_history(),
            ..FakeApi::default()
        };
        let dir = tempfile::tempdir().expect("tempdir");
        let exporter = Exporter::new(dir.path());
        let mut out = Vec::new();

        let summary =
            run_export(&api, &config_with_credentials(), &exporter, today(), &mut out)
                .await
                .expect("run must succeed");

        let path = dir.path().join("2024-03-15.json");
        assert_eq!(summary.files_written, vec![path.clone()]);

        let contents = std::fs::read_to_string(path).expect("read exported file");
        let parsed: Vec<DayHistory> = serde_json::from_str(&contents).expect("parse back");
        assert_eq!(parsed, one_day_history());
    }

    #[tokio::test]
    async fn every_field_is_rendered_with_label_and_unit_once() {
        let api = FakeApi {
            devices: vec![Device::new("dev1")],
            history: one_day_history(),
            ..FakeApi::default()
        };
        let dir = tempfile::tempdir().expect("tempdir");
        let exporter = Exporter::new(dir.path());
        let mut out = Vec::new();

        run_export(&api, &config_with_credentials(), &exporter, today(), &mut out)
            .await
            .expect("run must succeed");

        let output = String::from_utf8(out).expect("utf8");
        assert!(output.contains("Date: 2024-03-14, Time Zone: Europe/Athens"));

        for line in [
            "Temperature: 21.3 °C",
            "Humidity: 45 %",
            "Feels Like: 20.8 °C",
            "Wind Speed: 12.4 km/h",
            "Wind Direction: 270 °",
            "Wind Gust: 18 km/h",
            "Precipitation: 0.2 mm",
            "Precipitation Accumulated: 2.4 mm",
            "Pressure: 1013.2 hPa",
            "Dew Point: 8.9 °C",
            "UV Index: 5",
            "Illuminance: 54000 lux",
            "Solar Irradiance: 612.5 W/m²",
        ] {
            assert_eq!(output.matches(line).count(), 1, "expected exactly one `{line}`");
        }
    }

    #[tokio::test]
    async fn absent_reading_renders_as_not_available() {
        let mut history = one_day_history();
        history[0].hourly[0].wind_gust = None;
        let api = FakeApi {
            devices: vec![Device::new("dev1")],
            history,
            ..FakeApi::default()
        };
        let dir = tempfile::tempdir().expect("tempdir");
        let exporter = Exporter::new(dir.path());
        let mut out = Vec::new();

        run_export(&api, &config_with_credentials(), &exporter, today(), &mut out)
            .await
            .expect("run must succeed");

        let output = String::from_utf8(out).expect("utf8");
        assert!(output.contains("Wind Gust: n/a km/h"));
    }

    #[tokio::test]
    async fn login_failure_aborts_before_any_fetch() {
        let api = FakeApi {
            devices: vec![Device::new("dev1")],
            fail_login: true,
            ..FakeApi::default()
        };
        let dir = tempfile::tempdir().expect("tempdir");
        let exporter = Exporter::new(dir.path().join("output"));
        let mut out = Vec::new();

        let err = run_export(&api, &config_with_credentials(), &exporter, today(), &mut out)
            .await
            .expect_err("login failure must fail the run");

        assert!(format!("{err:#}").contains("Authentication failed"));
        assert!(api.history_calls.lock().unwrap().is_empty());
        assert!(!dir.path().join("output").exists());
    }

    #[tokio::test]
    async fn history_failure_stops_remaining_devices() {
        let api = FakeApi {
            devices: vec![Device::new("dev1"), Device::new("dev2")],
            fail_history: true,
            ..FakeApi::default()
        };
        let dir = tempfile::tempdir().expect("tempdir");
        let exporter = Exporter::new(dir.path().join("output"));
        let mut out = Vec::new();

        let err = run_export(&api, &config_with_credentials(), &exporter, today(), &mut out)
            .await
            .expect_err("history failure must fail the run");

        assert!(format!("{err:#}").contains("Failed to fetch history for device dev1"));
        // dev2 was never attempted, and nothing was written.
        assert_eq!(*api.history_calls.lock().unwrap(), vec!["dev1"]);
        assert!(!dir.path().join("output").exists());
    }

    #[tokio::test]
    async fn missing_credentials_fail_before_any_call() {
        let api = FakeApi::default();
        let dir = tempfile::tempdir().expect("tempdir");
        let exporter = Exporter::new(dir.path());
        let mut out = Vec::new();

        let err = run_export(&api, &Config::default(), &exporter, today(), &mut out)
            .await
            .expect_err("missing credentials must fail the run");

        assert!(err.to_string().contains("No WeatherXM credentials configured"));
        assert!(out.is_empty());
    }
}
