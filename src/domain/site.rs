//! Site entity: one node of the rollout tree.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Transport domain a site belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SiteDomain {
    IpMpls,
    Dwdm,
    Other(String),
}

impl SiteDomain {
    pub fn as_str(&self) -> &str {
        match self {
            SiteDomain::IpMpls => "IPMPLS",
            SiteDomain::Dwdm => "DWDM",
            SiteDomain::Other(s) => s,
        }
    }
}

impl From<String> for SiteDomain {
    fn from(s: String) -> Self {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("IPMPLS") {
            SiteDomain::IpMpls
        } else if trimmed.eq_ignore_ascii_case("DWDM") {
            SiteDomain::Dwdm
        } else {
            SiteDomain::Other(trimmed.to_string())
        }
    }
}

impl From<&str> for SiteDomain {
    fn from(s: &str) -> Self {
        SiteDomain::from(s.to_string())
    }
}

impl From<SiteDomain> for String {
    fn from(d: SiteDomain) -> Self {
        d.as_str().to_string()
    }
}

impl fmt::Display for SiteDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a site receives timing from its parent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SyncSolution {
    LocalToGm,
    DedicatedDf,
    InBand,
    LocalToDwdm,
    Other(String),
}

impl SyncSolution {
    pub fn as_str(&self) -> &str {
        match self {
            SyncSolution::LocalToGm => "Local to GM",
            SyncSolution::DedicatedDf => "Dedicated DF",
            SyncSolution::InBand => "In-Band",
            SyncSolution::LocalToDwdm => "Local to DWDM",
            SyncSolution::Other(s) => s,
        }
    }

    /// Trunk-type links carry timing over the IP/MPLS layer of the parent.
    pub fn is_trunk(&self) -> bool {
        matches!(self, SyncSolution::DedicatedDf | SyncSolution::InBand)
    }

    /// Site takes timing straight from a local grand master or DWDM node.
    pub fn is_local(&self) -> bool {
        matches!(self, SyncSolution::LocalToGm | SyncSolution::LocalToDwdm)
    }
}

impl From<String> for SyncSolution {
    fn from(s: String) -> Self {
        match s.trim() {
            "Local to GM" => SyncSolution::LocalToGm,
            "Dedicated DF" => SyncSolution::DedicatedDf,
            "In-Band" => SyncSolution::InBand,
            "Local to DWDM" => SyncSolution::LocalToDwdm,
            other => SyncSolution::Other(other.to_string()),
        }
    }
}

impl From<&str> for SyncSolution {
    fn from(s: &str) -> Self {
        SyncSolution::from(s.to_string())
    }
}

impl From<SyncSolution> for String {
    fn from(s: SyncSolution) -> Self {
        s.as_str().to_string()
    }
}

impl fmt::Display for SyncSolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Site attributes as delivered by the data source.
///
/// Boolean attributes accept boolean-like input (`"yes"`, `1`, `null`, ...)
/// and default to `false` when absent. Other attributes of an unexpected
/// shape decode as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Site {
    pub name: String,
    #[serde(deserialize_with = "lenient::text")]
    pub local_site_domain: Option<SiteDomain>,
    #[serde(deserialize_with = "lenient::text")]
    pub sync_solution: Option<SyncSolution>,
    #[serde(deserialize_with = "lenient::flag")]
    pub local_site_doability: bool,
    #[serde(
        alias = "IPMPLSsyncDone",
        alias = "local_ip_transport_in_sync",
        deserialize_with = "lenient::flag"
    )]
    pub ipmpls_sync_done: bool,
    #[serde(alias = "DWDMSyncDone", deserialize_with = "lenient::flag")]
    pub dwdm_sync_done: bool,
    #[serde(
        alias = "ScopeOfWork",
        alias = "scope_of_work_issued",
        deserialize_with = "lenient::flag"
    )]
    pub scope_of_work: bool,
    #[serde(deserialize_with = "lenient::flag")]
    pub tech_data_provided: bool,
    #[serde(deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(deserialize_with = "lenient::count", skip_serializing_if = "Option::is_none")]
    pub site_devices_count: Option<u32>,
    #[serde(
        alias = "localSiteRouterPlatform",
        deserialize_with = "lenient::text",
        skip_serializing_if = "Option::is_none"
    )]
    pub router_platform: Option<String>,
}

impl Site {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_domain(mut self, domain: impl Into<SiteDomain>) -> Self {
        self.local_site_domain = Some(domain.into());
        self
    }

    pub fn with_solution(mut self, solution: impl Into<SyncSolution>) -> Self {
        self.sync_solution = Some(solution.into());
        self
    }

    pub fn doable(mut self, doable: bool) -> Self {
        self.local_site_doability = doable;
        self
    }

    pub fn ipmpls_synced(mut self, done: bool) -> Self {
        self.ipmpls_sync_done = done;
        self
    }

    pub fn with_sow(mut self, issued: bool, tech_data: bool) -> Self {
        self.scope_of_work = issued;
        self.tech_data_provided = tech_data;
        self
    }

    pub fn is_ipmpls(&self) -> bool {
        self.local_site_domain == Some(SiteDomain::IpMpls)
    }

    pub fn has_trunk_link(&self) -> bool {
        self.sync_solution.as_ref().is_some_and(SyncSolution::is_trunk)
    }

    pub fn has_local_link(&self) -> bool {
        self.sync_solution.as_ref().is_some_and(SyncSolution::is_local)
    }

    pub fn solution_is(&self, solution: &SyncSolution) -> bool {
        self.sync_solution.as_ref() == Some(solution)
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// In-place attribute update for a located site. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SitePatch {
    pub name: Option<String>,
    pub local_site_doability: Option<bool>,
    pub ipmpls_sync_done: Option<bool>,
    pub dwdm_sync_done: Option<bool>,
    pub scope_of_work: Option<bool>,
    pub tech_data_provided: Option<bool>,
}

impl SitePatch {
    pub fn is_empty(&self) -> bool {
        *self == SitePatch::default()
    }

    pub fn apply(&self, site: &mut Site) {
        if let Some(name) = &self.name {
            site.name = name.clone();
        }
        if let Some(v) = self.local_site_doability {
            site.local_site_doability = v;
        }
        if let Some(v) = self.ipmpls_sync_done {
            site.ipmpls_sync_done = v;
        }
        if let Some(v) = self.dwdm_sync_done {
            site.dwdm_sync_done = v;
        }
        if let Some(v) = self.scope_of_work {
            site.scope_of_work = v;
        }
        if let Some(v) = self.tech_data_provided {
            site.tech_data_provided = v;
        }
    }
}

/// Tolerant field decoding for spreadsheet-derived data.
///
/// Values of an unexpected shape decode to the field's empty value instead of
/// failing the whole document.
pub(crate) mod lenient {
    use serde::de::IgnoredAny;
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Bool(bool),
        Int(i64),
        Float(f64),
        Text(String),
        Other(IgnoredAny),
    }

    fn raw<'de, D>(deserializer: D) -> Result<Option<Raw>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<Raw>::deserialize(deserializer)
    }

    /// Boolean-like input: `true`, non-zero numbers, `"yes"`, `"x"`, ...
    pub fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match raw(deserializer)? {
            Some(Raw::Bool(b)) => b,
            Some(Raw::Int(n)) => n != 0,
            Some(Raw::Float(f)) => f != 0.0,
            Some(Raw::Text(s)) => is_truthy(&s),
            Some(Raw::Other(_)) | None => false,
        })
    }

    /// Non-negative whole number given as integer, float (`12.0`) or text (`"12"`).
    pub fn count<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match raw(deserializer)? {
            Some(Raw::Int(n)) => u32::try_from(n).ok(),
            Some(Raw::Float(f)) => whole(f),
            Some(Raw::Text(s)) => {
                let s = s.trim();
                s.parse::<u32>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().and_then(whole))
            }
            Some(Raw::Bool(_)) | Some(Raw::Other(_)) | None => None,
        })
    }

    fn whole(f: f64) -> Option<u32> {
        (f.fract() == 0.0 && (0.0..=f64::from(u32::MAX)).contains(&f)).then_some(f as u32)
    }

    /// Text field; numbers are kept as their decimal text, blanks become `None`.
    pub fn text<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: From<String>,
    {
        let text = match raw(deserializer)? {
            Some(Raw::Text(s)) => Some(s),
            Some(Raw::Int(n)) => Some(n.to_string()),
            Some(Raw::Float(f)) => Some(f.to_string()),
            Some(Raw::Bool(_)) | Some(Raw::Other(_)) | None => None,
        };
        Ok(text.filter(|s| !s.trim().is_empty()).map(T::from))
    }

    pub fn is_truthy(s: &str) -> bool {
        matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "true" | "yes" | "y" | "1" | "x"
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn given_camel_case_json_when_deserializing_then_reads_all_flags() {
        let json = r#"{
            "name": "SiteA",
            "localSiteDomain": "IPMPLS",
            "syncSolution": "Dedicated DF",
            "localSiteDoability": true,
            "IPMPLSsyncDone": "yes",
            "DWDMSyncDone": 1,
            "ScopeOfWork": "x",
            "techDataProvided": null
        }"#;
        let site: Site = serde_json::from_str(json).unwrap();

        assert_eq!(site.name, "SiteA");
        assert!(site.is_ipmpls());
        assert_eq!(site.sync_solution, Some(SyncSolution::DedicatedDf));
        assert!(site.local_site_doability);
        assert!(site.ipmpls_sync_done);
        assert!(site.dwdm_sync_done);
        assert!(site.scope_of_work);
        assert!(!site.tech_data_provided);
    }

    #[test]
    fn given_missing_attributes_when_deserializing_then_defaults_to_falsy() {
        let site: Site = serde_json::from_str(r#"{"name": "bare"}"#).unwrap();
        assert_eq!(site, Site::new("bare"));
        assert!(!site.has_trunk_link());
    }

    #[test]
    fn given_unknown_domain_when_parsing_then_keeps_raw_value() {
        assert_eq!(SiteDomain::from("REGION"), SiteDomain::Other("REGION".into()));
        assert_eq!(SiteDomain::from("ipmpls"), SiteDomain::IpMpls);
        assert_eq!(
            SyncSolution::from("Imaginary Link"),
            SyncSolution::Other("Imaginary Link".into())
        );
    }

    #[test]
    fn given_trunk_solutions_when_checking_then_only_df_and_in_band_are_trunk() {
        assert!(SyncSolution::DedicatedDf.is_trunk());
        assert!(SyncSolution::InBand.is_trunk());
        assert!(!SyncSolution::LocalToGm.is_trunk());
        assert!(!SyncSolution::LocalToDwdm.is_trunk());
        assert!(SyncSolution::LocalToDwdm.is_local());
    }

    #[test]
    fn given_site_when_serializing_then_uses_display_strings() {
        let site = Site::new("A").with_domain("IPMPLS").with_solution("In-Band");
        let value = serde_json::to_value(&site).unwrap();
        assert_eq!(value["localSiteDomain"], "IPMPLS");
        assert_eq!(value["syncSolution"], "In-Band");
        assert!(value.get("region").is_none());
    }

    #[test]
    fn given_patch_when_applied_then_only_set_fields_change() {
        let mut site = Site::new("A").doable(true).with_sow(true, false);
        let patch = SitePatch {
            local_site_doability: Some(false),
            tech_data_provided: Some(true),
            ..Default::default()
        };
        patch.apply(&mut site);

        assert!(!site.local_site_doability);
        assert!(site.scope_of_work);
        assert!(site.tech_data_provided);
        assert_eq!(site.name, "A");
        assert!(SitePatch::default().is_empty());
    }

    #[test]
    fn given_truthy_strings_when_checking_then_recognized() {
        assert!(lenient::is_truthy(" Yes "));
        assert!(lenient::is_truthy("TRUE"));
        assert!(!lenient::is_truthy("no"));
        assert!(!lenient::is_truthy(""));
    }

    #[rstest]
    #[case(r#"12"#, Some(12))]
    #[case(r#"12.0"#, Some(12))]
    #[case(r#""12""#, Some(12))]
    #[case(r#"" 7.0 ""#, Some(7))]
    #[case(r#"12.5"#, None)]
    #[case(r#"-3"#, None)]
    #[case(r#""many""#, None)]
    #[case(r#"true"#, None)]
    #[case(r#"[1, 2]"#, None)]
    #[case(r#"null"#, None)]
    fn given_spreadsheet_device_count_when_deserializing_then_lenient(
        #[case] value: &str,
        #[case] expected: Option<u32>,
    ) {
        let json = format!(r#"{{"name": "A", "siteDevicesCount": {value}}}"#);
        let site: Site = serde_json::from_str(&json).unwrap();
        assert_eq!(site.site_devices_count, expected);
    }

    #[test]
    fn given_odd_shaped_attributes_when_deserializing_then_fall_back_to_absent() {
        let json = r#"{
            "name": "A",
            "localSiteDomain": 7,
            "syncSolution": "",
            "region": {"code": "N"},
            "localSiteRouterPlatform": 8201,
            "localSiteDoability": ["yes"]
        }"#;
        let site: Site = serde_json::from_str(json).unwrap();

        assert_eq!(site.local_site_domain, Some(SiteDomain::Other("7".into())));
        assert_eq!(site.sync_solution, None);
        assert_eq!(site.region, None);
        assert_eq!(site.router_platform.as_deref(), Some("8201"));
        assert!(!site.local_site_doability);
    }
}
