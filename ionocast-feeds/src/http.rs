//! Blocking HTTP client and the production `FeedSet` implementation.
//!
//! One shared client, one timeout per request. A timeout or a non-2xx
//! response is fatal for that adapter and propagates; there are no retries
//! here — retry policy is a serving-layer concern.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::blocking::Client;

use ionocast_core::domain::{FetchWindow, RawSeries};

use crate::feed::{FeedError, FeedSet, FeedSource};
use crate::{fmi, gfz, noaa, techtide};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const TECHTIDE_DATA_URL: &str = "https://techtide-srv-pub.space.noa.gr:8443/api/products/hfi/data/";
const GFZ_HP30_URL: &str = "https://www-app3.gfz-potsdam.de/kp_index/Hp30_ap30_nowcast.txt";
const GFZ_F107_URL: &str = "https://www-app3.gfz-potsdam.de/kp_index/Kp_ap_Ap_SN_F107_nowcast.txt";
const NOAA_SOLAR_WIND_URL: &str =
    "https://services.swpc.noaa.gov/products/geospace/propagated-solar-wind-1-hour.json";
const NOAA_DST_URL: &str = "https://services.swpc.noaa.gov/products/kyoto-dst.json";
const FMI_ELECTROJET_URL: &str = "https://space.fmi.fi/image/realtime/eurisgic/realtime_iu_il.txt";

/// Production feeds over the public provider endpoints.
pub struct HttpFeeds {
    client: Client,
}

impl HttpFeeds {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("ionocast/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("failed to build HTTP client");
        Self { client }
    }

    fn techtide_url(product: &str, window: &FetchWindow) -> String {
        let fmt = "%Y-%m-%d %H:%M:%S";
        format!(
            "{TECHTIDE_DATA_URL}?date_from={}&date_to={}&product={product}&withmanifest=false",
            encode_datetime(&window.start.format(fmt).to_string()),
            encode_datetime(&window.stop.format(fmt).to_string()),
        )
    }

    fn get_bytes(
        &self,
        feed: FeedSource,
        url: &str,
        accept: Option<&str>,
    ) -> Result<Vec<u8>, FeedError> {
        let mut request = self.client.get(url);
        if let Some(accept) = accept {
            request = request.header(reqwest::header::ACCEPT, accept);
        }
        let response = request.send().map_err(|e| net_error(feed, e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status {
                feed,
                status: status.as_u16(),
            });
        }
        response
            .bytes()
            .map(|b| b.to_vec())
            .map_err(|e| net_error(feed, e))
    }

    fn get_text(&self, feed: FeedSource, url: &str) -> Result<String, FeedError> {
        let bytes = self.get_bytes(feed, url, None)?;
        String::from_utf8(bytes).map_err(|e| FeedError::Payload {
            feed,
            detail: format!("response is not UTF-8: {e}"),
        })
    }
}

impl Default for HttpFeeds {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedSet for HttpFeeds {
    fn activity_index(&self, window: &FetchWindow) -> Result<RawSeries, FeedError> {
        let url = Self::techtide_url("hficond", window);
        let bytes = self.get_bytes(
            FeedSource::TechTideActivity,
            &url,
            Some("application/zip"),
        )?;
        techtide::parse_activity_archive(&bytes)
    }

    fn ionosonde_metrics(
        &self,
        window: &FetchWindow,
        stations: &[String],
    ) -> Result<Vec<RawSeries>, FeedError> {
        let url = Self::techtide_url("hfi", window);
        let bytes = self.get_bytes(
            FeedSource::TechTideIonosondes,
            &url,
            Some("application/zip"),
        )?;
        techtide::parse_ionosonde_archive(&bytes, stations)
    }

    fn hp30(&self, window: &FetchWindow) -> Result<RawSeries, FeedError> {
        let text = self.get_text(FeedSource::GfzHp30, GFZ_HP30_URL)?;
        gfz::parse_hp30(&text, window)
    }

    fn f107(&self, window: &FetchWindow) -> Result<RawSeries, FeedError> {
        let text = self.get_text(FeedSource::GfzF107, GFZ_F107_URL)?;
        gfz::parse_f107(&text, window)
    }

    fn solar_wind(&self, cutoff: DateTime<Utc>) -> Result<Vec<RawSeries>, FeedError> {
        let text = self.get_text(FeedSource::NoaaSolarWind, NOAA_SOLAR_WIND_URL)?;
        noaa::parse_solar_wind(&text, cutoff)
    }

    fn dst(&self, cutoff: DateTime<Utc>) -> Result<RawSeries, FeedError> {
        let text = self.get_text(FeedSource::NoaaDst, NOAA_DST_URL)?;
        noaa::parse_dst(&text, cutoff)
    }

    fn electrojet(&self, window: &FetchWindow) -> Result<Vec<RawSeries>, FeedError> {
        let text = self.get_text(FeedSource::FmiElectrojet, FMI_ELECTROJET_URL)?;
        fmi::parse_electrojet(&text, window)
    }
}

fn net_error(feed: FeedSource, e: reqwest::Error) -> FeedError {
    if e.is_timeout() {
        FeedError::Timeout { feed }
    } else {
        FeedError::Unreachable {
            feed,
            detail: e.to_string(),
        }
    }
}

/// Percent-encode the only reserved character the provider query strings
/// contain (the datetime separator space).
fn encode_datetime(s: &str) -> String {
    s.replace(' ', "%20")
}
