//! Calendar Endpoints
//! Mission: The minimal protected API surface behind the gate

use crate::models::{DateStruct, DateTimeStruct};
use axum::Json;
use chrono::{Datelike, SecondsFormat, Timelike, Utc};

/// v1 date - GET /v1/calendar/date
///
/// Month stays zero-based here; v1 clients already compensate.
pub async fn v1_date() -> Json<DateStruct> {
    let now = Utc::now();
    Json(DateStruct {
        year: now.year(),
        month: now.month0(),
        day: now.day(),
    })
}

/// v2 datetime - GET /v2/calendar/date
pub async fn v2_date() -> Json<DateTimeStruct> {
    let now = Utc::now();
    Json(DateTimeStruct {
        year: now.year(),
        month: now.month(),
        day: now.day(),
        hour: now.hour(),
        minute: now.minute(),
        second: now.second(),
        iso: now.to_rfc3339_opts(SecondsFormat::Secs, true),
    })
}
