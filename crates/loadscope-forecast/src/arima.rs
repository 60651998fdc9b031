// ── ARIMA evaluation sequence ──
//
// Four commands per forecast, executed on one leased session: build the
// time series, fit the model, forecast to the horizon, extract the mean
// vector. The reply to the final command is decoded as IEEE-754 doubles.

use std::fmt::Write as _;

use crate::error::ForecastError;
use crate::pool::SessionLease;

const AUTO_ARIMA_COMMAND: &str = "model = auto.arima(tsData, seasonal=FALSE, stepwise=TRUE)";
const PARSE_MEAN_COMMAND: &str = "as.numeric(data$mean)";

/// Run the ARIMA sequence for `values` and return `horizon` predicted
/// points. The caller is expected to skip the pool entirely for empty
/// input; this function assumes a non-empty vector.
pub async fn forecast_load(
    lease: &SessionLease,
    values: &[f64],
    horizon: usize,
) -> Result<Vec<f64>, ForecastError> {
    lease.eval(&ts_command(values)).await?;
    lease.eval(AUTO_ARIMA_COMMAND).await?;
    lease.eval(&forecast_command(horizon)).await?;
    let reply = lease.eval(PARSE_MEAN_COMMAND).await?;
    parse_numeric_vector(&reply)
}

/// `tsData = ts(c(v1,v2,...))`
fn ts_command(values: &[f64]) -> String {
    let mut command = String::from("tsData = ts(c(");
    for (index, value) in values.iter().enumerate() {
        if index > 0 {
            command.push(',');
        }
        let _ = write!(command, "{value}");
    }
    command.push_str("))");
    command
}

/// `data = forecast(model, h=N)`
fn forecast_command(horizon: usize) -> String {
    format!("data = forecast(model, h={horizon})")
}

/// Decode an R numeric-vector print into doubles.
///
/// R prefixes output rows with `[n]` index markers; those are skipped.
/// Any other token that is not a double fails the whole decode.
pub fn parse_numeric_vector(reply: &str) -> Result<Vec<f64>, ForecastError> {
    let mut values = Vec::new();
    for token in reply.split_whitespace() {
        if token.starts_with('[') && token.ends_with(']') {
            continue;
        }
        match token.parse::<f64>() {
            Ok(value) => values.push(value),
            Err(_) => {
                return Err(ForecastError::NumericReply {
                    token: token.to_string(),
                })
            }
        }
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ts_command_formats_vector() {
        assert_eq!(ts_command(&[1.0, 2.5, 3.0]), "tsData = ts(c(1,2.5,3))");
        assert_eq!(ts_command(&[45.0]), "tsData = ts(c(45))");
    }

    #[test]
    fn forecast_command_embeds_horizon() {
        assert_eq!(forecast_command(30), "data = forecast(model, h=30)");
    }

    #[test]
    fn parse_skips_index_markers() {
        let reply = "[1] 104.5 99.25 -3.5 [4] 0";
        assert_eq!(
            parse_numeric_vector(reply).unwrap(),
            vec![104.5, 99.25, -3.5, 0.0]
        );
    }

    #[test]
    fn parse_accepts_plain_doubles() {
        assert_eq!(parse_numeric_vector("1 2 3").unwrap(), vec![1.0, 2.0, 3.0]);
        assert!(parse_numeric_vector("").unwrap().is_empty());
    }

    #[test]
    fn parse_rejects_garbage_tokens() {
        let err = parse_numeric_vector("[1] 1.5 NULL").unwrap_err();
        assert!(matches!(
            err,
            ForecastError::NumericReply { token } if token == "NULL"
        ));
    }
}
