//! Wire types for the competitor-intelligence backend.
//!
//! Everything here is a transport-level shape: the backend owns the data and
//! its lifecycle, the client deserializes, renders, and caches. Field names
//! match the backend's JSON exactly; helper constructors only exist where the
//! client has to build a request body.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Company** | A watched competitor (the watchlist is the set of these) |
//! | **Signal** | A detected change on a company's monitored pages |
//! | **TearSheet** | A generated one-page company brief |
//! | **Report** | A generated weekly markdown digest |
//! | **Run** | One detection pass over the watchlist |

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Paths checked by default when detecting signals for a company.
pub const DEFAULT_INCLUDE_PATHS: &[&str] =
    &["/pricing", "/release-notes", "/changelog", "/security"];

/// Signal types requested when the user has not narrowed the filter.
pub const DEFAULT_SIGNAL_TYPES: &[SignalType] = &[
    SignalType::PricingChange,
    SignalType::ProductUpdate,
    SignalType::SecurityUpdate,
];

// ============================================
// Companies
// ============================================

/// A watched competitor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    /// Backend-assigned identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Domains the crawler watches
    #[serde(default)]
    pub domains: Vec<String>,
    /// Site paths checked on each detection pass
    #[serde(default)]
    pub include_paths: Vec<String>,
    /// Company LinkedIn page
    #[serde(default)]
    pub linkedin_url: Option<String>,
    /// Source-control org (GitHub)
    #[serde(default)]
    pub github_org: Option<String>,
    /// Free-form tags
    #[serde(default)]
    pub tags: Vec<String>,
    /// When the company was added to the watchlist
    pub created_at: DateTime<Utc>,
    /// Most recent detection pass over this company, if any
    #[serde(default)]
    pub last_run_at: Option<DateTime<Utc>>,
}

/// Body for `POST /vendors/watch`.
#[derive(Debug, Clone, Serialize)]
pub struct WatchCompanyRequest {
    pub name: String,
    pub domains: Vec<String>,
    pub include_paths: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linkedin_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github_org: Option<String>,
    pub tags: Vec<String>,
}

/// Body for `PUT /vendors/{id}`.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateCompanyRequest {
    pub name: String,
    pub domains: Vec<String>,
    pub include_paths: Vec<String>,
    pub tags: Vec<String>,
}

/// One hit from `POST /companies/search`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub name: String,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

// ============================================
// Signals
// ============================================

/// Kind of change a signal records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalType {
    PricingChange,
    ProductUpdate,
    SecurityUpdate,
    Funding,
    Hiring,
}

impl SignalType {
    /// Identifier used on the wire and in cache keys
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalType::PricingChange => "pricing_change",
            SignalType::ProductUpdate => "product_update",
            SignalType::SecurityUpdate => "security_update",
            SignalType::Funding => "funding",
            SignalType::Hiring => "hiring",
        }
    }

    /// Human-friendly label for list views
    pub fn label(&self) -> &'static str {
        match self {
            SignalType::PricingChange => "Pricing",
            SignalType::ProductUpdate => "Product",
            SignalType::SecurityUpdate => "Security",
            SignalType::Funding => "Funding",
            SignalType::Hiring => "Hiring",
        }
    }

    /// All variants, in filter-cycling order
    pub fn all() -> &'static [SignalType] {
        &[
            SignalType::PricingChange,
            SignalType::ProductUpdate,
            SignalType::SecurityUpdate,
            SignalType::Funding,
            SignalType::Hiring,
        ]
    }
}

impl std::fmt::Display for SignalType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SignalType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pricing_change" => Ok(SignalType::PricingChange),
            "product_update" => Ok(SignalType::ProductUpdate),
            "security_update" => Ok(SignalType::SecurityUpdate),
            "funding" => Ok(SignalType::Funding),
            "hiring" => Ok(SignalType::Hiring),
            _ => Err(format!("unknown signal type: {}", s)),
        }
    }
}

/// How urgent a signal is. Ordering is by urgency: `High > Medium > Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }

    /// Priority badge shown in list views
    pub fn badge(&self) -> &'static str {
        match self {
            Severity::High => "P0",
            Severity::Medium => "P1",
            Severity::Low => "P2",
        }
    }

    /// All variants, in filter-cycling order
    pub fn all() -> &'static [Severity] {
        &[Severity::High, Severity::Medium, Severity::Low]
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            _ => Err(format!("unknown severity: {}", s)),
        }
    }
}

/// Supporting excerpt attached to a signal by the detector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceItem {
    /// Text before the change, when the detector has a prior snapshot
    #[serde(default)]
    pub before: Option<String>,
    /// Text after the change
    #[serde(default)]
    pub after: Option<String>,
    /// The excerpt the detector matched on
    pub snippet: String,
    /// Detector confidence for this excerpt (0-1)
    #[serde(default)]
    pub confidence: f64,
}

/// A detected change on a watched company.
///
/// Produced server-side by crawling; the client only reads, mutes, or
/// attaches follow-ups.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    pub id: String,
    /// Owning company
    pub company_id: String,
    #[serde(rename = "type")]
    pub signal_type: SignalType,
    pub severity: Severity,
    pub title: String,
    #[serde(default)]
    pub summary: Option<String>,
    /// Page the change was detected on
    #[serde(default)]
    pub url: Option<String>,
    /// All pages that contributed to the detection
    #[serde(default)]
    pub urls: Vec<String>,
    /// Detector confidence (0-1)
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub evidence: Vec<EvidenceItem>,
    #[serde(default)]
    pub rationale: Option<String>,
    #[serde(default)]
    pub impacted_areas: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Composite relevance score assigned by the backend
    #[serde(default)]
    pub score: Option<f64>,
    /// Source URLs backing the signal
    #[serde(default)]
    pub citations: Vec<String>,
    /// Older backend rows carry `created_at` instead
    #[serde(alias = "created_at")]
    pub detected_at: DateTime<Utc>,
}

/// Body for `POST /signals/detect`.
#[derive(Debug, Clone, Serialize)]
pub struct SignalDetectRequest {
    pub company_id: String,
    pub signal_types: Vec<SignalType>,
    pub include_paths: Vec<String>,
    pub start_date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    pub use_livecrawl: bool,
}

impl SignalDetectRequest {
    /// Standard request for one company: default paths, trailing 7-day
    /// window, no livecrawl. `signal_types` falls back to the default trio
    /// when empty.
    pub fn for_company(company_id: &str, signal_types: &[SignalType]) -> Self {
        let signal_types = if signal_types.is_empty() {
            DEFAULT_SIGNAL_TYPES.to_vec()
        } else {
            signal_types.to_vec()
        };
        Self {
            company_id: company_id.to_string(),
            signal_types,
            include_paths: DEFAULT_INCLUDE_PATHS.iter().map(|p| p.to_string()).collect(),
            start_date: Utc::now() - Duration::days(7),
            end_date: None,
            use_livecrawl: false,
        }
    }

    /// Same request but with a live crawl, for an explicit "check now" on a
    /// single company.
    pub fn live(company_id: &str, signal_types: &[SignalType]) -> Self {
        Self {
            use_livecrawl: true,
            ..Self::for_company(company_id, signal_types)
        }
    }
}

// ============================================
// Detection runs
// ============================================

/// Per-company row from a watchlist detection run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchlistRunResult {
    pub company: String,
    #[serde(default)]
    pub paths_checked: u64,
    #[serde(default)]
    pub urls_found: u64,
    #[serde(default)]
    pub signals_created: u64,
    #[serde(default)]
    pub answer_content: Option<String>,
    #[serde(default)]
    pub citations: Vec<String>,
}

// ============================================
// Tear-sheets
// ============================================

/// A generated one-page company brief.
///
/// The sub-objects are backend-owned free-form JSON; the client renders
/// whatever shape arrives rather than constraining it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TearSheet {
    pub company: String,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub funding: serde_json::Value,
    #[serde(default)]
    pub hiring_signals: serde_json::Value,
    #[serde(default)]
    pub product_updates: serde_json::Value,
    #[serde(default)]
    pub key_customers: serde_json::Value,
    #[serde(default)]
    pub citations: Vec<String>,
}

// ============================================
// Reports
// ============================================

/// A generated weekly digest. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub id: String,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    /// Markdown body
    pub contents_md: String,
    /// Source URLs cited by the report
    #[serde(default)]
    pub url_list: Vec<String>,
    pub created_at: DateTime<Utc>,
}

// ============================================
// Dashboard activity
// ============================================

/// Aggregated activity metrics for one company, from `GET /companies/activity`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityRow {
    pub company_id: String,
    pub company_name: String,
    #[serde(default)]
    pub product_updates: i64,
    #[serde(default)]
    pub pricing_changes: i64,
    #[serde(default)]
    pub news_articles: i64,
    #[serde(default)]
    pub funding_news: i64,
    /// 0-5 intensity score used for cell coloring
    #[serde(default)]
    pub total_score: f64,
    #[serde(default)]
    pub domains: Vec<String>,
}

// ============================================
// Server settings
// ============================================

/// The `/settings/configuration` blob.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub api_keys: ApiKeys,
    #[serde(default)]
    pub retention: RetentionConfig,
    /// TTL applied to the client's signals cache
    #[serde(default = "default_signals_cache_secs")]
    pub signals_cache_duration_seconds: u64,
}

fn default_signals_cache_secs() -> u64 {
    3600
}

/// When scheduled detection runs happen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub frequency: ScheduleFrequency,
    /// Day of week (weekly) or day of month (monthly)
    #[serde(default = "default_schedule_day")]
    pub day: String,
    /// Local time of day, "HH:MM"
    #[serde(default = "default_schedule_time")]
    pub time: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            frequency: ScheduleFrequency::default(),
            day: default_schedule_day(),
            time: default_schedule_time(),
        }
    }
}

fn default_schedule_day() -> String {
    "monday".to_string()
}

fn default_schedule_time() -> String {
    "09:00".to_string()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleFrequency {
    Daily,
    #[default]
    Weekly,
    Monthly,
}

impl ScheduleFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleFrequency::Daily => "daily",
            ScheduleFrequency::Weekly => "weekly",
            ScheduleFrequency::Monthly => "monthly",
        }
    }

    /// Next frequency in the settings editor's cycling order
    pub fn next(&self) -> Self {
        match self {
            ScheduleFrequency::Daily => ScheduleFrequency::Weekly,
            ScheduleFrequency::Weekly => ScheduleFrequency::Monthly,
            ScheduleFrequency::Monthly => ScheduleFrequency::Daily,
        }
    }
}

/// Credentials held server-side. The client only shows presence, never values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiKeys {
    #[serde(default)]
    pub exa_api_key: Option<String>,
    #[serde(default)]
    pub slack_webhook: Option<String>,
    #[serde(default)]
    pub email_smtp: Option<String>,
}

/// How long the backend keeps derived data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionConfig {
    #[serde(default = "default_signals_days")]
    pub signals_days: u32,
    #[serde(default = "default_reports_days")]
    pub reports_days: u32,
    #[serde(default = "default_snapshots_days")]
    pub snapshots_days: u32,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            signals_days: default_signals_days(),
            reports_days: default_reports_days(),
            snapshots_days: default_snapshots_days(),
        }
    }
}

fn default_signals_days() -> u32 {
    90
}

fn default_reports_days() -> u32 {
    365
}

fn default_snapshots_days() -> u32 {
    30
}

// ============================================
// Sources configuration
// ============================================

/// The `/sources/configuration` blob: what the crawler is allowed to touch
/// and how greedy it is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    #[serde(default = "default_allowed_domains")]
    pub allowed_domains: Vec<String>,
    #[serde(default)]
    pub categories: SourceCategories,
    #[serde(default)]
    pub text_filters: TextFilters,
    #[serde(default)]
    pub quality: QualityControls,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            allowed_domains: default_allowed_domains(),
            categories: SourceCategories::default(),
            text_filters: TextFilters::default(),
            quality: QualityControls::default(),
        }
    }
}

fn default_allowed_domains() -> Vec<String> {
    [
        "linkedin.com/company/*",
        "*.com/pricing",
        "*.com/release-notes",
        "*.com/security",
        "*.com/blog",
    ]
    .iter()
    .map(|d| d.to_string())
    .collect()
}

/// Which source categories the crawler consults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceCategories {
    #[serde(default)]
    pub company: bool,
    #[serde(default)]
    pub news: bool,
    #[serde(default)]
    pub pdf: bool,
    #[serde(default)]
    pub linkedin: bool,
    #[serde(default)]
    pub github: bool,
    #[serde(default)]
    pub financial_report: bool,
}

impl Default for SourceCategories {
    fn default() -> Self {
        Self {
            company: true,
            news: true,
            pdf: false,
            linkedin: true,
            github: true,
            financial_report: false,
        }
    }
}

/// Free-text include/exclude terms applied to crawled content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextFilters {
    #[serde(default)]
    pub include: String,
    #[serde(default = "default_exclude_terms")]
    pub exclude: String,
}

impl Default for TextFilters {
    fn default() -> Self {
        Self {
            include: String::new(),
            exclude: default_exclude_terms(),
        }
    }
}

fn default_exclude_terms() -> String {
    "spam, advertisement, unrelated".to_string()
}

/// Crawl volume and content-shape controls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityControls {
    #[serde(default = "default_results_limit")]
    pub results_limit: u32,
    #[serde(default)]
    pub content_preference: ContentPreference,
    #[serde(default)]
    pub livecrawl: LivecrawlPolicy,
}

impl Default for QualityControls {
    fn default() -> Self {
        Self {
            results_limit: default_results_limit(),
            content_preference: ContentPreference::default(),
            livecrawl: LivecrawlPolicy::default(),
        }
    }
}

fn default_results_limit() -> u32 {
    25
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentPreference {
    #[default]
    Highlights,
    FullText,
    Summary,
}

impl ContentPreference {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentPreference::Highlights => "highlights",
            ContentPreference::FullText => "full_text",
            ContentPreference::Summary => "summary",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            ContentPreference::Highlights => ContentPreference::FullText,
            ContentPreference::FullText => ContentPreference::Summary,
            ContentPreference::Summary => ContentPreference::Highlights,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LivecrawlPolicy {
    #[default]
    Preferred,
    Fallback,
    Never,
}

impl LivecrawlPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            LivecrawlPolicy::Preferred => "preferred",
            LivecrawlPolicy::Fallback => "fallback",
            LivecrawlPolicy::Never => "never",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            LivecrawlPolicy::Preferred => LivecrawlPolicy::Fallback,
            LivecrawlPolicy::Fallback => LivecrawlPolicy::Never,
            LivecrawlPolicy::Never => LivecrawlPolicy::Preferred,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn signal_type_wire_names_round_trip() {
        for ty in SignalType::all() {
            let json = serde_json::to_string(ty).unwrap();
            assert_eq!(json, format!("\"{}\"", ty.as_str()));
            let back: SignalType = serde_json::from_str(&json).unwrap();
            assert_eq!(back, *ty);
            assert_eq!(SignalType::from_str(ty.as_str()).unwrap(), *ty);
        }
    }

    #[test]
    fn severity_orders_by_urgency() {
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::Low);
        assert_eq!(Severity::High.badge(), "P0");
        assert_eq!(Severity::Low.badge(), "P2");
    }

    #[test]
    fn signal_deserializes_backend_shape() {
        let json = r#"{
            "id": "sig-1",
            "company_id": "co-1",
            "type": "pricing_change",
            "severity": "high",
            "title": "Pro plan went from $49 to $59",
            "confidence": 0.92,
            "url": "https://example.com/pricing",
            "detected_at": "2025-06-01T12:00:00Z"
        }"#;
        let signal: Signal = serde_json::from_str(json).unwrap();
        assert_eq!(signal.signal_type, SignalType::PricingChange);
        assert_eq!(signal.severity, Severity::High);
        assert!(signal.evidence.is_empty());
        assert!(signal.citations.is_empty());
        assert!(signal.summary.is_none());
    }

    #[test]
    fn detect_request_defaults() {
        let req = SignalDetectRequest::for_company("co-1", &[]);
        assert_eq!(req.signal_types, DEFAULT_SIGNAL_TYPES.to_vec());
        assert_eq!(req.include_paths.len(), DEFAULT_INCLUDE_PATHS.len());
        assert!(!req.use_livecrawl);
        let window = Utc::now() - req.start_date;
        assert!(window >= Duration::days(6) && window <= Duration::days(8));

        let live = SignalDetectRequest::live("co-1", &[SignalType::Funding]);
        assert!(live.use_livecrawl);
        assert_eq!(live.signal_types, vec![SignalType::Funding]);
    }

    #[test]
    fn server_settings_defaults_apply() {
        let settings: ServerSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings.signals_cache_duration_seconds, 3600);
        assert_eq!(settings.retention.signals_days, 90);
        assert_eq!(settings.retention.reports_days, 365);
        assert_eq!(settings.schedule.frequency, ScheduleFrequency::Weekly);
        assert!(!settings.schedule.enabled);
        assert!(settings.api_keys.exa_api_key.is_none());
    }

    #[test]
    fn sources_config_defaults_apply() {
        let sources: SourcesConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(sources.allowed_domains.len(), 5);
        assert!(sources.categories.company);
        assert!(!sources.categories.pdf);
        assert_eq!(sources.quality.results_limit, 25);
        assert_eq!(sources.quality.content_preference, ContentPreference::Highlights);
        assert_eq!(sources.quality.livecrawl, LivecrawlPolicy::Preferred);
        assert_eq!(sources.text_filters.exclude, "spam, advertisement, unrelated");
    }

    #[test]
    fn schedule_frequency_cycles() {
        let f = ScheduleFrequency::Daily;
        assert_eq!(f.next(), ScheduleFrequency::Weekly);
        assert_eq!(f.next().next(), ScheduleFrequency::Monthly);
        assert_eq!(f.next().next().next(), ScheduleFrequency::Daily);
    }
}
