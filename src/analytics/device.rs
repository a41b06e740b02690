//! Device classification from user-agent strings.

use woothee::parser::Parser;

/// Closed device category set used throughout the visit log and the
/// analytics aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceClass {
    Mobile,
    Desktop,
    Tablet,
    Other,
}

impl DeviceClass {
    pub const ALL: [DeviceClass; 4] = [
        DeviceClass::Mobile,
        DeviceClass::Desktop,
        DeviceClass::Tablet,
        DeviceClass::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceClass::Mobile => "Mobile",
            DeviceClass::Desktop => "Desktop",
            DeviceClass::Tablet => "Tablet",
            DeviceClass::Other => "Other",
        }
    }

    /// Classify a raw user-agent string.
    ///
    /// Defaults to `Desktop` when the string is missing, unparseable, or
    /// carries no recognizable mobile/tablet markers.
    pub fn classify(user_agent: Option<&str>) -> DeviceClass {
        let Some(ua) = user_agent else {
            return DeviceClass::Desktop;
        };

        let lowered = ua.to_lowercase();
        // woothee files iPads and Android tablets under "smartphone", so
        // check the tablet markers first.
        if lowered.contains("tablet") || lowered.contains("ipad") {
            return DeviceClass::Tablet;
        }

        match Parser::new().parse(ua) {
            Some(result) => match result.category {
                "smartphone" | "mobilephone" => DeviceClass::Mobile,
                "crawler" | "appliance" | "misc" => DeviceClass::Other,
                _ => DeviceClass::Desktop,
            },
            None => DeviceClass::Desktop,
        }
    }

    /// Re-derive a category from a stored device label, for grouping at
    /// aggregation time. Matching is a case-insensitive substring check
    /// so historical rows written by other classifiers still bucket
    /// sensibly; anything unrecognized lands in `Other`.
    pub fn from_label(label: &str) -> DeviceClass {
        let lowered = label.to_lowercase();
        if lowered.contains("mobile") {
            DeviceClass::Mobile
        } else if lowered.contains("desktop") {
            DeviceClass::Desktop
        } else if lowered.contains("tablet") {
            DeviceClass::Tablet
        } else {
            DeviceClass::Other
        }
    }
}

impl std::fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
