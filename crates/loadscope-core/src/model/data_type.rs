use serde::{Deserialize, Serialize};

use crate::error::{CoreError, ValidationErrors};

/// A user-declared traffic class.
///
/// Zero in any protocol/port field is a wildcard; the match rule is
/// evaluated network protocol first, then transport, then port. `name`
/// and the `(network_protocol, transport_protocol, port)` triple are
/// unique in the store. JSON field names follow the REST shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataType {
    /// Store-assigned identifier; 0 until created.
    #[serde(default)]
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub forecasting: bool,
    /// EtherType of the inner frame; 0 matches any.
    pub network_protocol: u32,
    /// IPv4 protocol / IPv6 next header; 0 matches any.
    pub transport_protocol: u32,
    /// TCP/UDP port, matched against source or destination; 0 matches any.
    pub port: u32,
}

impl DataType {
    /// Check field ranges, accumulating every problem.
    pub fn validate(&self) -> Result<(), CoreError> {
        let mut errors = ValidationErrors::new();
        if self.name.is_empty() || self.name.len() > 255 {
            errors.push(format!(
                "name '{}': length must be between 1 and 255 characters",
                self.name
            ));
        }
        if self.port > 65_535 {
            errors.push(format!("port {}: maximum value is 65535", self.port));
        }
        if self.transport_protocol > 255 {
            errors.push(format!(
                "transport protocol {}: maximum value is 255",
                self.transport_protocol
            ));
        }
        if self.network_protocol > 65_535 {
            errors.push(format!(
                "network protocol {}: maximum value is 65535",
                self.network_protocol
            ));
        }
        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DataType {
        DataType {
            id: 0,
            name: "dns".into(),
            forecasting: false,
            network_protocol: 0x0800,
            transport_protocol: 17,
            port: 53,
        }
    }

    #[test]
    fn valid_data_type_passes() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn all_range_problems_reported_at_once() {
        let bad = DataType {
            name: String::new(),
            network_protocol: 70_000,
            transport_protocol: 300,
            port: 70_000,
            ..sample()
        };
        let message = bad.validate().unwrap_err().to_string();
        assert!(message.contains("name"));
        assert!(message.contains("port"));
        assert!(message.contains("transport protocol"));
        assert!(message.contains("network protocol"));
    }

    #[test]
    fn name_length_boundary() {
        let mut dt = sample();
        dt.name = "x".repeat(255);
        assert!(dt.validate().is_ok());
        dt.name = "x".repeat(256);
        assert!(dt.validate().is_err());
    }

    #[test]
    fn json_shape_is_camel_case() {
        let json = serde_json::to_value(sample()).unwrap();
        assert!(json.get("networkProtocol").is_some());
        assert!(json.get("transportProtocol").is_some());
        assert_eq!(json["port"], 53);
    }

    #[test]
    fn json_without_id_or_forecasting_deserializes() {
        let dt: DataType = serde_json::from_str(
            r#"{"name":"web","networkProtocol":2048,"transportProtocol":6,"port":443}"#,
        )
        .unwrap();
        assert_eq!(dt.id, 0);
        assert!(!dt.forecasting);
    }
}
