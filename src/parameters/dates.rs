use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone};

use crate::error::{RadarlyError, Result};

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Values accepted where the API expects a date.
///
/// Dates, datetimes (naive or zoned) and strings are sent as ISO-8601.
/// Strings may be RFC 3339, `YYYY-MM-DDTHH:MM:SS[.f]`, `YYYY-MM-DD HH:MM:SS`
/// or `YYYY-MM-DD` (read as midnight). `None` leaves the bound unset.
pub trait DateInput {
    fn to_iso(&self) -> Result<Option<String>>;
}

impl DateInput for NaiveDate {
    fn to_iso(&self) -> Result<Option<String>> {
        Ok(Some(self.format("%Y-%m-%d").to_string()))
    }
}

impl DateInput for NaiveDateTime {
    fn to_iso(&self) -> Result<Option<String>> {
        Ok(Some(self.format("%Y-%m-%dT%H:%M:%S%.f").to_string()))
    }
}

impl<Tz: TimeZone> DateInput for DateTime<Tz>
where
    Tz::Offset: std::fmt::Display,
{
    fn to_iso(&self) -> Result<Option<String>> {
        Ok(Some(self.to_rfc3339()))
    }
}

impl DateInput for str {
    fn to_iso(&self) -> Result<Option<String>> {
        let text = self.trim();
        if let Ok(datetime) = DateTime::parse_from_rfc3339(text) {
            return datetime.to_iso();
        }
        for format in DATETIME_FORMATS {
            if let Ok(datetime) = NaiveDateTime::parse_from_str(text, format) {
                return datetime.to_iso();
            }
        }
        if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
            return date.and_hms_opt(0, 0, 0).map_or(Ok(None), |dt| dt.to_iso());
        }
        Err(RadarlyError::validation(
            "date",
            format!("'{self}' is not a recognised date"),
        ))
    }
}

impl DateInput for String {
    fn to_iso(&self) -> Result<Option<String>> {
        self.as_str().to_iso()
    }
}

impl<T: DateInput + ?Sized> DateInput for &T {
    fn to_iso(&self) -> Result<Option<String>> {
        (**self).to_iso()
    }
}

impl<T: DateInput> DateInput for Option<T> {
    fn to_iso(&self) -> Result<Option<String>> {
        match self {
            Some(value) => value.to_iso(),
            None => Ok(None),
        }
    }
}
