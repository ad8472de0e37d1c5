//! Teams device type tokens, their display labels and the filter categories
//! used to query them.

use serde::{Deserialize, Serialize};

use super::batch::BatchRequest;

/// Converts a raw Graph `deviceType` token into a human-readable label.
///
/// Unknown tokens are passed through unchanged.
pub fn device_type_label(token: &str) -> &str {
    match token {
        "ipPhone" | "lowCostPhone" => "Phone",
        "teamsRoom" => "MTR Windows",
        "collaborationBar" => "MTR Android",
        "touchConsole" => "Touch Console (MTRA)",
        "surfaceHub" => "Surface Hub",
        "teamsDisplay" => "Display",
        "teamsPanel" => "Panel",
        "sip" => "SIP Phone",
        other => other,
    }
}

/// Device category a caller can restrict an inventory query to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceFilter {
    Phone,
    #[serde(rename = "MTR")]
    Mtr,
    Display,
    SurfaceHub,
    Panel,
    #[serde(rename = "SIPPhone")]
    SipPhone,
}

impl DeviceFilter {
    pub const ALL: [DeviceFilter; 6] = [
        DeviceFilter::Phone,
        DeviceFilter::Mtr,
        DeviceFilter::Display,
        DeviceFilter::SurfaceHub,
        DeviceFilter::Panel,
        DeviceFilter::SipPhone,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Phone => "Phone",
            Self::Mtr => "MTR",
            Self::Display => "Display",
            Self::SurfaceHub => "SurfaceHub",
            Self::Panel => "Panel",
            Self::SipPhone => "SIPPhone",
        }
    }

    /// Graph `deviceType` tokens covered by this category.
    pub fn device_types(&self) -> &'static [&'static str] {
        match self {
            Self::Phone => &["ipPhone", "lowCostPhone"],
            Self::Mtr => &["teamsRoom", "collaborationBar", "touchConsole"],
            Self::Display => &["teamsDisplay"],
            Self::SurfaceHub => &["surfaceHub"],
            Self::Panel => &["teamsPanel"],
            Self::SipPhone => &["sip"],
        }
    }
}

impl std::fmt::Display for DeviceFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for DeviceFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DeviceFilter::ALL
            .iter()
            .copied()
            .find(|filter| filter.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                format!(
                    "Invalid device filter: {} (expected one of Phone, MTR, Display, SurfaceHub, Panel, SIPPhone)",
                    s
                )
            })
    }
}

/// Builds the device list sub-requests for an optional filter.
///
/// Each device type becomes its own equality query, identified by the type
/// token; no filter yields a single unfiltered query with id `"all"`.
pub fn device_list_requests(filter: Option<DeviceFilter>) -> Vec<BatchRequest> {
    match filter {
        Some(filter) => filter
            .device_types()
            .iter()
            .map(|device_type| {
                BatchRequest::get(
                    *device_type,
                    format!(
                        "/teamwork/devices/?$filter=deviceType eq '{}'",
                        device_type
                    ),
                )
            })
            .collect(),
        None => vec![BatchRequest::get("all", "/teamwork/devices/")],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_device_type_labels() {
        assert_eq!(device_type_label("ipPhone"), "Phone");
        assert_eq!(device_type_label("lowCostPhone"), "Phone");
        assert_eq!(device_type_label("teamsRoom"), "MTR Windows");
        assert_eq!(device_type_label("collaborationBar"), "MTR Android");
        assert_eq!(device_type_label("touchConsole"), "Touch Console (MTRA)");
        assert_eq!(device_type_label("surfaceHub"), "Surface Hub");
        assert_eq!(device_type_label("teamsDisplay"), "Display");
        assert_eq!(device_type_label("teamsPanel"), "Panel");
        assert_eq!(device_type_label("sip"), "SIP Phone");
    }

    #[test]
    fn test_unknown_device_type_passes_through() {
        assert_eq!(device_type_label("unknownFutureValue"), "unknownFutureValue");
        assert_eq!(device_type_label(""), "");
    }

    #[test]
    fn test_filter_from_str_is_case_insensitive() {
        assert_eq!("MTR".parse::<DeviceFilter>().unwrap(), DeviceFilter::Mtr);
        assert_eq!("mtr".parse::<DeviceFilter>().unwrap(), DeviceFilter::Mtr);
        assert_eq!(
            "sipphone".parse::<DeviceFilter>().unwrap(),
            DeviceFilter::SipPhone
        );
        assert!("Laptop".parse::<DeviceFilter>().is_err());
    }

    #[test]
    fn test_filter_display_roundtrips_through_from_str() {
        for filter in DeviceFilter::ALL {
            assert_eq!(filter.to_string().parse::<DeviceFilter>().unwrap(), filter);
        }
    }

    #[test]
    fn test_filter_mapping_is_exact() {
        let types = |f: DeviceFilter| -> HashSet<&str> {
            device_list_requests(Some(f))
                .into_iter()
                .map(|r| device_type_from_id(&r.id))
                .collect()
        };

        assert_eq!(
            types(DeviceFilter::Mtr),
            HashSet::from(["teamsRoom", "collaborationBar", "touchConsole"])
        );
        assert_eq!(
            types(DeviceFilter::Phone),
            HashSet::from(["ipPhone", "lowCostPhone"])
        );
        assert_eq!(types(DeviceFilter::SurfaceHub), HashSet::from(["surfaceHub"]));
        assert_eq!(types(DeviceFilter::Display), HashSet::from(["teamsDisplay"]));
        assert_eq!(types(DeviceFilter::Panel), HashSet::from(["teamsPanel"]));
        assert_eq!(types(DeviceFilter::SipPhone), HashSet::from(["sip"]));
    }

    fn device_type_from_id(id: &str) -> &'static str {
        DeviceFilter::ALL
            .iter()
            .flat_map(|f| f.device_types().iter().copied())
            .find(|t| *t == id)
            .unwrap()
    }

    #[test]
    fn test_filtered_request_urls() {
        let requests = device_list_requests(Some(DeviceFilter::Phone));
        assert_eq!(requests.len(), 2);
        assert_eq!(
            requests[0].url,
            "/teamwork/devices/?$filter=deviceType eq 'ipPhone'"
        );
        assert_eq!(
            requests[1].url,
            "/teamwork/devices/?$filter=deviceType eq 'lowCostPhone'"
        );
    }

    #[test]
    fn test_unfiltered_request() {
        let requests = device_list_requests(None);
        assert_eq!(requests, vec![BatchRequest::get("all", "/teamwork/devices/")]);
    }

    #[test]
    fn test_filter_request_ids_unique() {
        for filter in DeviceFilter::ALL {
            let requests = device_list_requests(Some(filter));
            let ids: HashSet<&str> = requests.iter().map(|r| r.id.as_str()).collect();
            assert_eq!(ids.len(), requests.len());
        }
    }
}
