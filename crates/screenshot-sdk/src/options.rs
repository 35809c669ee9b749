//! Screenshot request options.
//!
//! [`ScreenshotOptions`] is a fluent builder over the service's option
//! vocabulary. It produces a flat map of wire names to [`ParamValue`]s which
//! feeds both the query string of a screenshot request and the canonical
//! message of a signed URL.
//!
//! # Examples
//!
//! ```rust
//! use screenshot_sdk::options::{ImageFormat, ScreenshotOptions};
//!
//! let options = ScreenshotOptions::new("https://example.com")
//!     .with_width(1280)
//!     .with_height(720)
//!     .with_format(ImageFormat::Webp)
//!     .with_full_page(true);
//!
//! let params = options.to_params();
//! assert_eq!(params["width"].canonical(), "1280");
//! assert_eq!(params["full_page"].canonical(), "true");
//! assert!(!params.contains_key("quality"));
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// A scalar option value with a single canonical string form.
///
/// The canonical form is what gets signed, so it must never change between
/// SDK versions: booleans render as `true`/`false`, integers in decimal,
/// floats in plain decimal notation and strings verbatim.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl ParamValue {
    /// Canonical string representation used for signing and transport.
    ///
    /// Floats go through `Display`, which never uses exponent notation and
    /// drops the fractional part of integral values (`2.0` renders as `2`).
    pub fn canonical(&self) -> String {
        match self {
            Self::Str(s) => s.clone(),
            Self::Int(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Bool(b) => b.to_string(),
        }
    }

    /// Parse a loosely-typed command-line value.
    ///
    /// `true`/`false` become booleans, integers become [`ParamValue::Int`],
    /// other finite decimals become [`ParamValue::Float`], and everything
    /// else is kept as a string. A number is only typed when it renders back
    /// to exactly `raw`, so `007`, `+5`, `1.50` and `-0` stay strings and
    /// reach the service unchanged.
    pub fn infer(raw: &str) -> Self {
        match raw {
            "true" => return Self::Bool(true),
            "false" => return Self::Bool(false),
            _ => {}
        }
        let typed = if let Ok(i) = raw.parse::<i64>() {
            Some(Self::Int(i))
        } else {
            match raw.parse::<f64>() {
                Ok(f) if f.is_finite() && raw.contains('.') => Some(Self::Float(f)),
                _ => None,
            }
        };
        match typed {
            Some(value) if value.canonical() == raw => value,
            _ => Self::Str(raw.to_string()),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

/// Output image format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Jpeg,
    Webp,
    Pdf,
}

impl ImageFormat {
    /// Wire name of the format.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::Webp => "webp",
            Self::Pdf => "pdf",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Page lifecycle event the renderer waits for before capturing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WaitUntil {
    #[serde(rename = "load")]
    Load,
    #[serde(rename = "domcontentloaded")]
    DomContentLoaded,
    #[serde(rename = "networkidle0")]
    NetworkIdle0,
    #[serde(rename = "networkidle2")]
    NetworkIdle2,
}

impl WaitUntil {
    /// Wire name of the lifecycle event.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::DomContentLoaded => "domcontentloaded",
            Self::NetworkIdle0 => "networkidle0",
            Self::NetworkIdle2 => "networkidle2",
        }
    }
}

impl fmt::Display for WaitUntil {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options for a single screenshot request.
///
/// Only `url` is required. Unset options are omitted from the request
/// entirely; the service applies its own defaults for them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScreenshotOptions {
    url: String,
    width: Option<u32>,
    height: Option<u32>,
    full_page: Option<bool>,
    format: Option<ImageFormat>,
    quality: Option<u32>,
    delay: Option<u32>,
    timeout: Option<u32>,
    device_scale_factor: Option<f64>,
    dark_mode: Option<bool>,
    block_ads: Option<bool>,
    block_cookie_banners: Option<bool>,
    selector: Option<String>,
    wait_until: Option<WaitUntil>,
    user_agent: Option<String>,
    cache: Option<bool>,
    cache_ttl: Option<u32>,
    cache_key: Option<String>,
    extra: BTreeMap<String, ParamValue>,
}

impl ScreenshotOptions {
    /// Create options for capturing `url`.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// The page to capture.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Viewport width in pixels.
    pub fn with_width(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }

    /// Viewport height in pixels.
    pub fn with_height(mut self, height: u32) -> Self {
        self.height = Some(height);
        self
    }

    /// Capture the full scrollable page instead of the viewport.
    pub fn with_full_page(mut self, full_page: bool) -> Self {
        self.full_page = Some(full_page);
        self
    }

    /// Output format.
    pub fn with_format(mut self, format: ImageFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Compression quality for lossy formats (0-100).
    pub fn with_quality(mut self, quality: u32) -> Self {
        self.quality = Some(quality);
        self
    }

    /// Delay in milliseconds after load before capturing.
    pub fn with_delay(mut self, delay_ms: u32) -> Self {
        self.delay = Some(delay_ms);
        self
    }

    /// Render timeout in milliseconds.
    pub fn with_timeout(mut self, timeout_ms: u32) -> Self {
        self.timeout = Some(timeout_ms);
        self
    }

    /// Device pixel ratio.
    pub fn with_device_scale_factor(mut self, factor: f64) -> Self {
        self.device_scale_factor = Some(factor);
        self
    }

    /// Emulate `prefers-color-scheme: dark`.
    pub fn with_dark_mode(mut self, dark_mode: bool) -> Self {
        self.dark_mode = Some(dark_mode);
        self
    }

    /// Block known ad networks.
    pub fn with_block_ads(mut self, block_ads: bool) -> Self {
        self.block_ads = Some(block_ads);
        self
    }

    /// Hide cookie consent banners.
    pub fn with_block_cookie_banners(mut self, block: bool) -> Self {
        self.block_cookie_banners = Some(block);
        self
    }

    /// Capture only the element matching this CSS selector.
    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = Some(selector.into());
        self
    }

    /// Lifecycle event to wait for.
    pub fn with_wait_until(mut self, wait_until: WaitUntil) -> Self {
        self.wait_until = Some(wait_until);
        self
    }

    /// Override the renderer's user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Allow or bypass the server-side cache.
    pub fn with_cache(mut self, cache: bool) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Cache lifetime in seconds.
    pub fn with_cache_ttl(mut self, ttl_seconds: u32) -> Self {
        self.cache_ttl = Some(ttl_seconds);
        self
    }

    /// Explicit cache key for later lookup or invalidation.
    pub fn with_cache_key(mut self, key: impl Into<String>) -> Self {
        self.cache_key = Some(key.into());
        self
    }

    /// Set an option outside the typed vocabulary.
    ///
    /// The value is forwarded under `key` unchanged, which is how storage
    /// destinations and newer service options are passed through. A typed
    /// option of the same name takes precedence.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Flatten into wire names and values, omitting unset options.
    pub fn to_params(&self) -> BTreeMap<String, ParamValue> {
        let mut params = self.extra.clone();

        let mut put = |key: &str, value: Option<ParamValue>| {
            if let Some(value) = value {
                params.insert(key.to_string(), value);
            }
        };

        put("url", Some(ParamValue::from(self.url.as_str())));
        put("width", self.width.map(ParamValue::from));
        put("height", self.height.map(ParamValue::from));
        put("full_page", self.full_page.map(ParamValue::from));
        put("format", self.format.map(|f| ParamValue::from(f.as_str())));
        put("quality", self.quality.map(ParamValue::from));
        put("delay", self.delay.map(ParamValue::from));
        put("timeout", self.timeout.map(ParamValue::from));
        put(
            "device_scale_factor",
            self.device_scale_factor.map(ParamValue::from),
        );
        put("dark_mode", self.dark_mode.map(ParamValue::from));
        put("block_ads", self.block_ads.map(ParamValue::from));
        put(
            "block_cookie_banners",
            self.block_cookie_banners.map(ParamValue::from),
        );
        put("selector", self.selector.clone().map(ParamValue::from));
        put(
            "wait_until",
            self.wait_until.map(|w| ParamValue::from(w.as_str())),
        );
        put("user_agent", self.user_agent.clone().map(ParamValue::from));
        put("cache", self.cache.map(ParamValue::from));
        put("cache_ttl", self.cache_ttl.map(ParamValue::from));
        put("cache_key", self.cache_key.clone().map(ParamValue::from));

        params
    }

    /// Query pairs in canonical string form, sorted by key.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        self.to_params()
            .into_iter()
            .map(|(key, value)| (key, value.canonical()))
            .collect()
    }
}

impl Serialize for ScreenshotOptions {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.to_params().serialize(serializer)
    }
}

#[cfg(test)]
#[path = "options_tests.rs"]
mod tests;
