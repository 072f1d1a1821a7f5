//! Twelve Data REST client for spot price and OHLC time series.

use super::MarketDataSource;
use crate::config::MarketDataConfig;
use crate::error::{AppError, Result};
use crate::types::{Candle, Timeframe};
use chrono::{NaiveDate, NaiveDateTime};
use reqwest::Client;
use serde::Deserialize;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tracing::debug;

/// Twelve Data encodes numbers as strings; accept both.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Numeric {
    Number(f64),
    Text(String),
}

impl Numeric {
    fn value(&self) -> Option<f64> {
        let value = match self {
            Numeric::Number(v) => Some(*v),
            Numeric::Text(s) => s.trim().parse::<f64>().ok(),
        };
        value.filter(|v| v.is_finite())
    }
}

#[derive(Debug, Deserialize)]
struct PriceResponse {
    price: Option<Numeric>,
    status: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TimeSeriesResponse {
    values: Option<Vec<TimeSeriesValue>>,
    status: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TimeSeriesValue {
    datetime: String,
    open: Numeric,
    high: Numeric,
    low: Numeric,
    close: Numeric,
}

fn api_error(status: Option<&str>, message: Option<&str>) -> Option<AppError> {
    match status {
        Some("error") => Some(AppError::ExternalApi(
            message.unwrap_or("unknown Twelve Data error").to_string(),
        )),
        _ => None,
    }
}

fn parse_price(response: PriceResponse) -> Result<f64> {
    if let Some(err) = api_error(response.status.as_deref(), response.message.as_deref()) {
        return Err(err);
    }
    response
        .price
        .as_ref()
        .and_then(Numeric::value)
        .ok_or_else(|| AppError::DataUnavailable("price missing from response".to_string()))
}

/// Parse "YYYY-MM-DD HH:MM:SS" (intraday) or "YYYY-MM-DD" (daily) as UTC millis.
fn parse_datetime(s: &str) -> Option<i64> {
    let s = s.trim();
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .map(|dt| dt.and_utc().timestamp_millis())
}

/// Convert a time series response into ascending candles.
fn parse_time_series(response: TimeSeriesResponse) -> Result<Vec<Candle>> {
    if let Some(err) = api_error(response.status.as_deref(), response.message.as_deref()) {
        return Err(err);
    }
    let values = response
        .values
        .ok_or_else(|| AppError::DataUnavailable("no values in time series".to_string()))?;

    let mut candles = values
        .iter()
        .map(|v| -> Result<Candle> {
            let malformed =
                || AppError::DataUnavailable(format!("malformed candle at {}", v.datetime));
            Ok(Candle {
                time: parse_datetime(&v.datetime).ok_or_else(malformed)?,
                open: v.open.value().ok_or_else(malformed)?,
                high: v.high.value().ok_or_else(malformed)?,
                low: v.low.value().ok_or_else(malformed)?,
                close: v.close.value().ok_or_else(malformed)?,
            })
        })
        .collect::<Result<Vec<Candle>>>()?;

    // API returns newest first
    candles.sort_by_key(|c| c.time);
    Ok(candles)
}

/// Twelve Data REST client.
#[derive(Clone)]
pub struct TwelveDataClient {
    client: Client,
    base_url: String,
    api_key: String,
    symbol: String,
}

impl TwelveDataClient {
    /// Create a new Twelve Data client.
    pub fn new(config: &MarketDataConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            symbol: config.symbol.clone(),
        })
    }

    async fn fetch_price(&self) -> Result<f64> {
        let url = format!("{}/price", self.base_url);
        debug!("Fetching Twelve Data price for {}", self.symbol);

        let response: PriceResponse = self
            .client
            .get(&url)
            .query(&[("symbol", self.symbol.as_str()), ("apikey", self.api_key.as_str())])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        parse_price(response)
    }

    async fn fetch_time_series(&self, timeframe: Timeframe, size: usize) -> Result<Vec<Candle>> {
        let url = format!("{}/time_series", self.base_url);
        let outputsize = size.to_string();
        debug!(
            "Fetching Twelve Data {} candles for {} ({})",
            outputsize, self.symbol, timeframe
        );

        let response: TimeSeriesResponse = self
            .client
            .get(&url)
            .query(&[
                ("symbol", self.symbol.as_str()),
                ("interval", timeframe.twelve_data_interval()),
                ("outputsize", outputsize.as_str()),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        parse_time_series(response)
    }
}

impl MarketDataSource for TwelveDataClient {
    fn spot_price(&self) -> Pin<Box<dyn Future<Output = Result<f64>> + Send + '_>> {
        Box::pin(self.fetch_price())
    }

    fn candles(
        &self,
        timeframe: Timeframe,
        size: usize,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Candle>>> + Send + '_>> {
        Box::pin(self.fetch_time_series(timeframe, size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_price_string() {
        let response: PriceResponse = serde_json::from_str(r#"{"price":"2345.67000"}"#).unwrap();
        assert_eq!(parse_price(response).unwrap(), 2345.67);
    }

    #[test]
    fn test_parse_price_number() {
        let response: PriceResponse = serde_json::from_str(r#"{"price":2001.5}"#).unwrap();
        assert_eq!(parse_price(response).unwrap(), 2001.5);
    }

    #[test]
    fn test_parse_price_error_status() {
        let response: PriceResponse = serde_json::from_str(
            r#"{"code":401,"message":"Invalid API key","status":"error"}"#,
        )
        .unwrap();
        match parse_price(response) {
            Err(AppError::ExternalApi(msg)) => assert_eq!(msg, "Invalid API key"),
            other => panic!("expected ExternalApi, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_price_missing() {
        let response: PriceResponse = serde_json::from_str("{}").unwrap();
        assert!(matches!(
            parse_price(response),
            Err(AppError::DataUnavailable(_))
        ));
    }

    #[test]
    fn test_parse_time_series_reverses_order() {
        let body = r#"{
            "meta": {"symbol": "XAU/USD", "interval": "5min"},
            "values": [
                {"datetime": "2024-03-01 12:10:00", "open": "2050.1", "high": "2052.0", "low": "2049.5", "close": "2051.2"},
                {"datetime": "2024-03-01 12:05:00", "open": "2048.0", "high": "2050.5", "low": "2047.9", "close": "2050.1"},
                {"datetime": "2024-03-01 12:00:00", "open": "2047.0", "high": "2048.4", "low": "2046.1", "close": "2048.0"}
            ],
            "status": "ok"
        }"#;
        let response: TimeSeriesResponse = serde_json::from_str(body).unwrap();
        let candles = parse_time_series(response).unwrap();
        assert_eq!(candles.len(), 3);
        assert!(candles.windows(2).all(|w| w[0].time < w[1].time));
        assert_eq!(candles[0].close, 2048.0);
        assert_eq!(candles[2].close, 2051.2);
        assert_eq!(candles[2].time - candles[1].time, 300_000);
    }

    #[test]
    fn test_parse_time_series_daily_dates() {
        let body = r#"{"values": [
            {"datetime": "2024-03-02", "open": "1", "high": "2", "low": "0.5", "close": "1.5"},
            {"datetime": "2024-03-01", "open": "1", "high": "2", "low": "0.5", "close": "1.5"}
        ]}"#;
        let response: TimeSeriesResponse = serde_json::from_str(body).unwrap();
        let candles = parse_time_series(response).unwrap();
        assert_eq!(candles[1].time - candles[0].time, 86_400_000);
    }

    #[test]
    fn test_parse_time_series_malformed_value() {
        let body = r#"{"values": [
            {"datetime": "2024-03-01 12:00:00", "open": "x", "high": "2", "low": "0.5", "close": "1.5"}
        ]}"#;
        let response: TimeSeriesResponse = serde_json::from_str(body).unwrap();
        assert!(matches!(
            parse_time_series(response),
            Err(AppError::DataUnavailable(_))
        ));
    }

    #[test]
    fn test_parse_time_series_no_data() {
        let body = r#"{"code":400,"message":"No data is available on the specified dates","status":"error"}"#;
        let response: TimeSeriesResponse = serde_json::from_str(body).unwrap();
        assert!(matches!(
            parse_time_series(response),
            Err(AppError::ExternalApi(_))
        ));
    }

    #[test]
    fn test_parse_datetime() {
        assert_eq!(parse_datetime("1970-01-01 00:01:00"), Some(60_000));
        assert_eq!(parse_datetime("1970-01-02"), Some(86_400_000));
        assert_eq!(parse_datetime("yesterday"), None);
    }

    #[tokio::test]
    async fn test_request_errors_hide_api_key() {
        let config = MarketDataConfig {
            api_url: "http://127.0.0.1:1".to_string(),
            api_key: "SECRETKEY".to_string(),
            ..MarketDataConfig::default()
        };
        let client = TwelveDataClient::new(&config).unwrap();

        let err = client.fetch_price().await.unwrap_err();
        assert!(matches!(err, AppError::Reqwest(_)));
        assert!(!err.to_string().contains("SECRETKEY"));

        let err = client
            .fetch_time_series(Timeframe::M5, 10)
            .await
            .unwrap_err();
        assert!(!err.to_string().contains("SECRETKEY"));
    }
}
