use crate::{
    models::{
        request_params::BarsRequestParams,
        timeframe::{TimeFrame, TimeFrameUnit},
    },
    providers::{ProviderError, ValidationSnafu},
};

/// Yahoo serves intraday (sub-daily) history for at most this many days.
pub const MAX_INTRADAY_LOOKBACK_DAYS: u32 = 730;

/// Map a [`TimeFrame`] to Yahoo's `interval` query value.
pub fn validate_timeframe(tf: &TimeFrame) -> Result<&'static str, ProviderError> {
    let interval = match (tf.unit, tf.amount) {
        (TimeFrameUnit::Minute, 1) => "1m",
        (TimeFrameUnit::Minute, 2) => "2m",
        (TimeFrameUnit::Minute, 5) => "5m",
        (TimeFrameUnit::Minute, 15) => "15m",
        (TimeFrameUnit::Minute, 30) => "30m",
        (TimeFrameUnit::Hour, 1) => "1h",
        (TimeFrameUnit::Day, 1) => "1d",
        (TimeFrameUnit::Week, 1) => "1wk",
        _ => {
            return ValidationSnafu {
                message: format!("timeframe {tf} is not offered by the chart API"),
            }
            .fail();
        }
    };
    Ok(interval)
}

/// Query pairs for one symbol's chart request.
pub fn construct_params(params: &BarsRequestParams) -> Result<Vec<(String, String)>, ProviderError> {
    let interval = validate_timeframe(&params.timeframe)?;
    if params.lookback_days == 0 {
        return ValidationSnafu {
            message: "lookback_days must be at least 1",
        }
        .fail();
    }
    let intraday = matches!(
        params.timeframe.unit,
        TimeFrameUnit::Minute | TimeFrameUnit::Hour
    );
    if intraday && params.lookback_days > MAX_INTRADAY_LOOKBACK_DAYS {
        return ValidationSnafu {
            message: format!(
                "intraday history is limited to {MAX_INTRADAY_LOOKBACK_DAYS} days, got {}",
                params.lookback_days
            ),
        }
        .fail();
    }

    Ok(vec![
        ("range".to_string(), format!("{}d", params.lookback_days)),
        ("interval".to_string(), interval.to_string()),
        ("includePrePost".to_string(), "false".to_string()),
        ("events".to_string(), "history".to_string()),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hourly_two_years_is_accepted() {
        let q = construct_params(&BarsRequestParams::hourly("SPY")).unwrap();
        assert!(q.contains(&("range".into(), "730d".into())));
        assert!(q.contains(&("interval".into(), "1h".into())));
    }

    #[test]
    fn intraday_lookback_cap() {
        let mut p = BarsRequestParams::hourly("SPY");
        p.lookback_days = 731;
        let err = construct_params(&p).unwrap_err();
        assert!(err.to_string().contains("730"));

        p.timeframe = TimeFrame::new(1, TimeFrameUnit::Day).unwrap();
        assert!(construct_params(&p).is_ok());
    }

    #[test]
    fn unsupported_timeframe() {
        let tf = TimeFrame::new(4, TimeFrameUnit::Hour).unwrap();
        assert!(validate_timeframe(&tf).is_err());
    }
}
