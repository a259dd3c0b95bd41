//! Application state for the TUI.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::widgets::TableState;
use rivalscope_core::{
    run_key, ActivityRow, ApiClient, Company, Namespace, Report, ResultCache, SearchHit,
    ServerSettings, SettingsService, Severity, Signal, SignalDetectRequest, SignalFilter,
    SignalType, SourcesConfig, TearSheet, UpdateCompanyRequest, WatchCompanyRequest,
    WatchlistRunResult, DEFAULT_INCLUDE_PATHS,
};

use crate::fetch::{FetchOutcome, FetchScope, Fetcher, Generations};

/// Ticks a status-line message stays visible (ticks are ~100ms).
const STATUS_TICKS: u64 = 80;
/// Ticks of search-box quiet before the query is sent.
const SEARCH_DEBOUNCE_TICKS: u64 = 3;
/// Ticks between backend liveness probes.
const HEALTH_PROBE_TICKS: u64 = 300;

/// Top-level tab. One canonical view each.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum Tab {
    #[default]
    Dashboard,
    Watchlist,
    TearSheets,
    Signals,
    Sources,
    Settings,
    Reports,
}

impl Tab {
    pub fn title(&self) -> &'static str {
        match self {
            Tab::Dashboard => "Dashboard",
            Tab::Watchlist => "Watchlist",
            Tab::TearSheets => "Tear-Sheets",
            Tab::Signals => "Signals & Alerts",
            Tab::Sources => "Sources",
            Tab::Settings => "Settings",
            Tab::Reports => "Reports",
        }
    }

    pub fn all() -> [Tab; 7] {
        [
            Tab::Dashboard,
            Tab::Watchlist,
            Tab::TearSheets,
            Tab::Signals,
            Tab::Sources,
            Tab::Settings,
            Tab::Reports,
        ]
    }

    fn next(&self) -> Tab {
        match self {
            Tab::Dashboard => Tab::Watchlist,
            Tab::Watchlist => Tab::TearSheets,
            Tab::TearSheets => Tab::Signals,
            Tab::Signals => Tab::Sources,
            Tab::Sources => Tab::Settings,
            Tab::Settings => Tab::Reports,
            Tab::Reports => Tab::Dashboard,
        }
    }

    fn previous(&self) -> Tab {
        match self {
            Tab::Dashboard => Tab::Reports,
            Tab::Watchlist => Tab::Dashboard,
            Tab::TearSheets => Tab::Watchlist,
            Tab::Signals => Tab::TearSheets,
            Tab::Sources => Tab::Signals,
            Tab::Settings => Tab::Sources,
            Tab::Reports => Tab::Settings,
        }
    }
}

/// Where a view's data stands. `Ready` with an empty collection means
/// "no data yet"; `Failed` means the fetch itself broke. The two render
/// differently and are never conflated.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed(String),
}

/// Which surface currently owns keystrokes.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum InputMode {
    #[default]
    Normal,
    /// Add/edit company modal form
    CompanyForm,
    /// One-line follow-up task prompt
    FollowUp,
    /// Company search overlay
    Search,
}

/// Buffer state for the add/edit company form.
#[derive(Debug, Clone, Default)]
pub struct CompanyForm {
    pub name: String,
    pub domains: String,
    pub include_paths: String,
    pub linkedin_url: String,
    pub github_org: String,
    pub tags: String,
    /// Focused field index (0..FIELDS)
    pub field: usize,
    /// Set when editing an existing company instead of adding one
    pub editing_id: Option<String>,
}

impl CompanyForm {
    pub const FIELDS: usize = 6;

    fn new() -> Self {
        Self {
            include_paths: "/pricing,/release-notes,/security".to_string(),
            ..Self::default()
        }
    }

    fn for_company(company: &Company) -> Self {
        Self {
            name: company.name.clone(),
            domains: company.domains.join(","),
            include_paths: company.include_paths.join(","),
            linkedin_url: company.linkedin_url.clone().unwrap_or_default(),
            github_org: company.github_org.clone().unwrap_or_default(),
            tags: company.tags.join(","),
            field: 0,
            editing_id: Some(company.id.clone()),
        }
    }

    fn from_hit(hit: &SearchHit) -> Self {
        Self {
            name: hit.name.clone(),
            domains: hit.domain.clone().unwrap_or_default(),
            ..Self::new()
        }
    }

    pub fn field_label(idx: usize) -> &'static str {
        match idx {
            0 => "Name",
            1 => "Domains",
            2 => "Monitored paths",
            3 => "LinkedIn URL",
            4 => "GitHub org",
            _ => "Tags",
        }
    }

    pub fn field_value(&self, idx: usize) -> &str {
        match idx {
            0 => &self.name,
            1 => &self.domains,
            2 => &self.include_paths,
            3 => &self.linkedin_url,
            4 => &self.github_org,
            _ => &self.tags,
        }
    }

    fn active_buffer(&mut self) -> &mut String {
        match self.field {
            0 => &mut self.name,
            1 => &mut self.domains,
            2 => &mut self.include_paths,
            3 => &mut self.linkedin_url,
            4 => &mut self.github_org,
            _ => &mut self.tags,
        }
    }
}

/// Main application state.
pub struct App {
    api: ApiClient,
    /// Client-side result cache (signals and runs namespaces)
    pub cache: ResultCache,
    settings_service: SettingsService,
    fetcher: Fetcher,
    generations: Generations,

    /// Active tab
    pub tab: Tab,
    /// Which surface owns keystrokes
    pub input_mode: InputMode,
    /// Whether the app should exit
    pub should_quit: bool,
    /// Poll-cycle counter
    pub tick_count: u64,
    /// Transient status-line message and the tick it expires at
    status: Option<(String, u64)>,
    /// Last liveness probe result (None until the first probe lands)
    pub backend_healthy: Option<bool>,

    // ========== Watchlist State ==========
    /// Watched companies
    pub companies: Vec<Company>,
    pub companies_state: LoadState,
    pub company_table_state: TableState,
    /// Add/edit form buffers
    pub company_form: CompanyForm,
    /// Per-company rows from the last detection run
    pub run_results: Vec<WatchlistRunResult>,
    pub runs_state: LoadState,

    // ========== Signals State ==========
    pub signals: Vec<Signal>,
    pub signals_state: LoadState,
    pub signal_table_state: TableState,
    /// Active filter dimensions; also the cache key
    pub filter: SignalFilter,
    /// Follow-up prompt buffer
    pub follow_up_input: String,
    /// Set when a detection pass is waiting on the watchlist to load
    pending_signal_detect: bool,

    // ========== Dashboard State ==========
    pub activity: Vec<ActivityRow>,
    pub activity_state: LoadState,
    pub activity_table_state: TableState,
    /// Stored signals backing the stat cards (cheap read, not cached)
    pub dashboard_signals: Vec<Signal>,
    pub dashboard_signals_state: LoadState,

    // ========== Tear-Sheet State ==========
    pub tearsheet: Option<TearSheet>,
    pub tearsheet_state: LoadState,
    /// Company picker selection (indexes into `companies`)
    pub tearsheet_company_state: TableState,
    pub tearsheet_scroll: usize,

    // ========== Reports State ==========
    pub reports: Vec<Report>,
    pub reports_state: LoadState,
    pub report_table_state: TableState,
    pub report_scroll: usize,
    /// Guard against double-submitting generation
    pub report_generating: bool,

    // ========== Sources State ==========
    pub sources: Option<SourcesConfig>,
    pub sources_state: LoadState,
    /// Cursor over the editable rows
    pub sources_cursor: usize,

    // ========== Settings State ==========
    /// Editable copy; the settings service keeps the authoritative one
    pub settings_draft: Option<ServerSettings>,
    pub settings_state: LoadState,
    pub settings_cursor: usize,

    // ========== Search State ==========
    pub search_query: String,
    pub search_results: Vec<SearchHit>,
    pub search_state: LoadState,
    pub search_table_state: TableState,
    /// Tick of the last keystroke in the search box (debounce anchor)
    last_search_edit: Option<u64>,
    /// Query the last request was actually sent for
    last_sent_query: String,
}

impl App {
    /// Number of editable rows in the sources view.
    pub const SOURCES_ROWS: usize = 9;
    /// Number of editable rows in the settings view.
    pub const SETTINGS_ROWS: usize = 6;

    pub fn new(api: ApiClient, cache: ResultCache, fetcher: Fetcher) -> Self {
        Self {
            api,
            cache,
            settings_service: SettingsService::new(),
            fetcher,
            generations: Generations::default(),
            tab: Tab::default(),
            input_mode: InputMode::default(),
            should_quit: false,
            tick_count: 0,
            status: None,
            backend_healthy: None,
            // Watchlist state
            companies: Vec::new(),
            companies_state: LoadState::default(),
            company_table_state: TableState::default(),
            company_form: CompanyForm::default(),
            run_results: Vec::new(),
            runs_state: LoadState::default(),
            // Signals state
            signals: Vec::new(),
            signals_state: LoadState::default(),
            signal_table_state: TableState::default(),
            filter: SignalFilter::default(),
            follow_up_input: String::new(),
            pending_signal_detect: false,
            // Dashboard state
            activity: Vec::new(),
            activity_state: LoadState::default(),
            activity_table_state: TableState::default(),
            dashboard_signals: Vec::new(),
            dashboard_signals_state: LoadState::default(),
            // Tear-sheet state
            tearsheet: None,
            tearsheet_state: LoadState::default(),
            tearsheet_company_state: TableState::default(),
            tearsheet_scroll: 0,
            // Reports state
            reports: Vec::new(),
            reports_state: LoadState::default(),
            report_table_state: TableState::default(),
            report_scroll: 0,
            report_generating: false,
            // Sources state
            sources: None,
            sources_state: LoadState::default(),
            sources_cursor: 0,
            // Settings state
            settings_draft: None,
            settings_state: LoadState::default(),
            settings_cursor: 0,
            // Search state
            search_query: String::new(),
            search_results: Vec::new(),
            search_state: LoadState::default(),
            search_table_state: TableState::default(),
            last_search_edit: None,
            last_sent_query: String::new(),
        }
    }

    /// Kick off the fetches every view depends on.
    pub fn start(&mut self) {
        self.probe_health();
        self.fetch_settings();
        self.fetch_companies();
        self.fetch_activity();
        self.fetch_dashboard_signals();
    }

    /// Per-poll housekeeping: expire the status line, fire the search
    /// debounce, probe backend health on a slow cadence.
    pub fn tick(&mut self) {
        self.tick_count = self.tick_count.wrapping_add(1);

        if let Some((_, expires)) = &self.status {
            if self.tick_count >= *expires {
                self.status = None;
            }
        }

        if self.input_mode == InputMode::Search {
            if let Some(last_edit) = self.last_search_edit {
                let quiet = self.tick_count.saturating_sub(last_edit) >= SEARCH_DEBOUNCE_TICKS;
                let query = self.search_query.trim();
                if quiet && !query.is_empty() && self.search_query != self.last_sent_query {
                    self.fire_search();
                }
            }
        }

        if self.tick_count % HEALTH_PROBE_TICKS == 0 {
            self.probe_health();
        }
    }

    /// Active status-line text, if any.
    pub fn status_line(&self) -> Option<&str> {
        self.status.as_ref().map(|(msg, _)| msg.as_str())
    }

    fn set_status(&mut self, message: impl Into<String>) {
        self.status = Some((message.into(), self.tick_count + STATUS_TICKS));
    }

    // ============================================
    // Selection accessors
    // ============================================

    /// Company under the watchlist cursor.
    pub fn selected_company(&self) -> Option<&Company> {
        self.company_table_state
            .selected()
            .and_then(|i| self.companies.get(i))
    }

    /// Signal under the signals cursor.
    pub fn selected_signal(&self) -> Option<&Signal> {
        self.signal_table_state
            .selected()
            .and_then(|i| self.signals.get(i))
    }

    /// Company selected in the tear-sheet picker.
    pub fn tearsheet_company(&self) -> Option<&Company> {
        self.tearsheet_company_state
            .selected()
            .and_then(|i| self.companies.get(i))
    }

    /// Report under the reports cursor.
    pub fn selected_report(&self) -> Option<&Report> {
        self.report_table_state
            .selected()
            .and_then(|i| self.reports.get(i))
    }

    /// Signals detected in the trailing seven days, for the stat cards.
    pub fn recent_signal_count(&self) -> usize {
        let cutoff = Utc::now() - chrono::Duration::days(7);
        self.dashboard_signals
            .iter()
            .filter(|s| s.detected_at > cutoff)
            .count()
    }

    /// Most recent detection time across stored signals.
    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.dashboard_signals.iter().map(|s| s.detected_at).max()
    }

    // ============================================
    // Fetches
    // ============================================

    fn fetch_companies(&mut self) {
        self.companies_state = LoadState::Loading;
        let api = self.api.clone();
        let generation = self.generations.next(FetchScope::Companies);
        self.fetcher.spawn(FetchScope::Companies, generation, async move {
            FetchOutcome::Companies(api.list_companies().await)
        });
    }

    fn fetch_activity(&mut self) {
        self.activity_state = LoadState::Loading;
        let api = self.api.clone();
        let generation = self.generations.next(FetchScope::Activity);
        self.fetcher.spawn(FetchScope::Activity, generation, async move {
            FetchOutcome::Activity(api.company_activity().await)
        });
    }

    /// Stored signals for the dashboard cards. This is a plain backend read,
    /// not a detection pass, so it skips the cache entirely.
    fn fetch_dashboard_signals(&mut self) {
        self.dashboard_signals_state = LoadState::Loading;
        let api = self.api.clone();
        let generation = self.generations.next(FetchScope::StoredSignals);
        self.fetcher
            .spawn(FetchScope::StoredSignals, generation, async move {
                FetchOutcome::StoredSignals(api.list_signals(None).await)
            });
    }

    fn fetch_settings(&mut self) {
        self.settings_state = LoadState::Loading;
        let api = self.api.clone();
        let generation = self.generations.next(FetchScope::Settings);
        self.fetcher.spawn(FetchScope::Settings, generation, async move {
            FetchOutcome::Settings(api.get_settings().await)
        });
    }

    fn fetch_sources(&mut self) {
        self.sources_state = LoadState::Loading;
        let api = self.api.clone();
        let generation = self.generations.next(FetchScope::Sources);
        self.fetcher.spawn(FetchScope::Sources, generation, async move {
            FetchOutcome::Sources(api.get_sources().await)
        });
    }

    fn fetch_reports(&mut self) {
        self.reports_state = LoadState::Loading;
        let api = self.api.clone();
        let generation = self.generations.next(FetchScope::Reports);
        self.fetcher.spawn(FetchScope::Reports, generation, async move {
            FetchOutcome::Reports(api.list_reports().await)
        });
    }

    /// Probe backend liveness for the footer dot.
    fn probe_health(&mut self) {
        let api = self.api.clone();
        let generation = self.generations.next(FetchScope::Health);
        self.fetcher.spawn(FetchScope::Health, generation, async move {
            FetchOutcome::Health(api.health_check().await.unwrap_or(false))
        });
    }

    /// Fetch the tear-sheet for the company selected in the picker.
    fn fetch_selected_tearsheet(&mut self) {
        let Some(company) = self.tearsheet_company() else {
            return;
        };
        let company_id = company.id.clone();
        self.tearsheet_state = LoadState::Loading;
        let api = self.api.clone();
        let generation = self.generations.next(FetchScope::Tearsheet);
        self.fetcher.spawn(FetchScope::Tearsheet, generation, async move {
            let result = api.get_tearsheet(&company_id).await;
            FetchOutcome::Tearsheet { company_id, result }
        });
    }

    // ============================================
    // Signal detection (cache-aside)
    // ============================================

    /// Load the signals view for the current filter. Cache hit renders
    /// as-is; on a miss this runs a detection pass: one detect call per
    /// target company, sequentially, continuing past per-company failures.
    pub fn load_signals(&mut self, bypass_cache: bool) {
        // Supersede anything in flight; the filter may have changed.
        let generation = self.generations.next(FetchScope::Signals);
        let key = self.filter.cache_key();

        if !bypass_cache {
            if let Some(cached) = self.cache.read_json::<Vec<Signal>>(Namespace::Signals, &key) {
                self.signals = cached;
                self.signals_state = LoadState::Ready;
                self.signal_table_state = TableState::default();
                if !self.signals.is_empty() {
                    self.signal_table_state.select(Some(0));
                }
                return;
            }
        }

        // A detection pass targets watched companies, so the watchlist has
        // to land first.
        if self.companies_state != LoadState::Ready {
            self.pending_signal_detect = true;
            self.signals_state = LoadState::Loading;
            if matches!(self.companies_state, LoadState::Idle | LoadState::Failed(_)) {
                self.fetch_companies();
            }
            return;
        }

        let targets: Vec<String> = match &self.filter.company_id {
            Some(id) => vec![id.clone()],
            None => self.companies.iter().map(|c| c.id.clone()).collect(),
        };
        if targets.is_empty() {
            self.signals = Vec::new();
            self.signals_state = LoadState::Ready;
            self.signal_table_state = TableState::default();
            return;
        }

        self.signals_state = LoadState::Loading;
        let types: Vec<SignalType> = self.filter.signal_type.into_iter().collect();
        let api = self.api.clone();
        self.fetcher.spawn(FetchScope::Signals, generation, async move {
            let mut collected = Vec::new();
            let mut failed = 0usize;
            let mut first_error = None;
            for company_id in &targets {
                let request = SignalDetectRequest::for_company(company_id, &types);
                match api.detect_signals(&request).await {
                    Ok(mut signals) => collected.append(&mut signals),
                    Err(err) => {
                        tracing::warn!(company_id = %company_id, error = %err, "Detection failed for company");
                        failed += 1;
                        if first_error.is_none() {
                            first_error = Some(err);
                        }
                    }
                }
            }
            let result = match first_error {
                Some(err) if failed == targets.len() => Err(err),
                _ => Ok(collected),
            };
            FetchOutcome::Signals {
                key,
                merge: false,
                failed,
                result,
            }
        });
    }

    /// Re-run detection for the selected signal's company with a live
    /// crawl, merging anything new into the current list.
    fn detect_selected_live(&mut self) {
        let Some(signal) = self.selected_signal() else {
            return;
        };
        let company_id = signal.company_id.clone();
        let key = self.filter.cache_key();
        let types: Vec<SignalType> = self.filter.signal_type.into_iter().collect();
        self.set_status(format!("live detection running for {company_id}"));
        let api = self.api.clone();
        let generation = self.generations.next(FetchScope::Signals);
        self.fetcher.spawn(FetchScope::Signals, generation, async move {
            let request = SignalDetectRequest::live(&company_id, &types);
            let result = api.detect_signals(&request).await;
            FetchOutcome::Signals {
                key,
                merge: true,
                failed: 0,
                result,
            }
        });
    }

    // ============================================
    // Watchlist runs
    // ============================================

    /// Run detection across the watchlist, or one company. Results are
    /// cached under the runs namespace.
    fn run_watchlist(&mut self, company_id: Option<String>) {
        let key = run_key(company_id.as_deref());
        if let Some(results) = self
            .cache
            .read_json::<Vec<WatchlistRunResult>>(Namespace::Runs, &key)
        {
            self.run_results = results;
            self.runs_state = LoadState::Ready;
            self.set_status("showing cached run results");
            return;
        }

        self.runs_state = LoadState::Loading;
        let ids = company_id.map(|id| vec![id]);
        let api = self.api.clone();
        let generation = self.generations.next(FetchScope::Runs);
        self.fetcher.spawn(FetchScope::Runs, generation, async move {
            let result = api.run_watchlist(ids.as_deref()).await;
            FetchOutcome::Runs { key, result }
        });
    }

    /// Show the last cached whole-watchlist run, if any.
    fn load_cached_runs(&mut self) {
        let key = run_key(None);
        if let Some(results) = self
            .cache
            .read_json::<Vec<WatchlistRunResult>>(Namespace::Runs, &key)
        {
            self.run_results = results;
            self.runs_state = LoadState::Ready;
        }
    }

    // ============================================
    // Signal actions
    // ============================================

    /// Mute the selected signal. On success it is removed from the visible
    /// list; the cached copy ages out on its own.
    fn mute_selected(&mut self) {
        let Some(signal) = self.selected_signal() else {
            return;
        };
        let signal_id = signal.id.clone();
        let api = self.api.clone();
        let generation = self.generations.next(FetchScope::Action);
        self.fetcher.spawn(FetchScope::Action, generation, async move {
            let result = api.mute_signal(&signal_id).await;
            FetchOutcome::SignalMuted { signal_id, result }
        });
    }

    fn submit_follow_up(&mut self) {
        let description = self.follow_up_input.trim().to_string();
        if description.is_empty() {
            return;
        }
        let Some(signal) = self.selected_signal() else {
            self.input_mode = InputMode::Normal;
            return;
        };
        let signal_id = signal.id.clone();
        self.input_mode = InputMode::Normal;
        let api = self.api.clone();
        let generation = self.generations.next(FetchScope::Action);
        self.fetcher.spawn(FetchScope::Action, generation, async move {
            let result = api.create_follow_up(&signal_id, &description).await;
            FetchOutcome::FollowUpCreated { signal_id, result }
        });
    }

    // ============================================
    // Company search
    // ============================================

    fn open_search(&mut self) {
        self.search_query.clear();
        self.search_results.clear();
        self.search_state = LoadState::Idle;
        self.search_table_state = TableState::default();
        self.last_search_edit = None;
        self.last_sent_query.clear();
        self.input_mode = InputMode::Search;
    }

    fn fire_search(&mut self) {
        let query = self.search_query.clone();
        self.last_sent_query = query.clone();
        self.search_state = LoadState::Loading;
        let api = self.api.clone();
        let generation = self.generations.next(FetchScope::Search);
        self.fetcher.spawn(FetchScope::Search, generation, async move {
            let result = api.search_companies(&query).await;
            FetchOutcome::Search { query, result }
        });
    }

    // ============================================
    // Company form
    // ============================================

    /// Validate and submit the company form, as a watch or an update.
    fn submit_company_form(&mut self) {
        if self.company_form.name.trim().is_empty() {
            self.set_status("company name is required");
            return;
        }

        let form = &self.company_form;
        let name = form.name.trim().to_string();
        let domains = split_csv(&form.domains);
        let mut include_paths = split_csv(&form.include_paths);
        if include_paths.is_empty() {
            include_paths = DEFAULT_INCLUDE_PATHS.iter().map(|p| p.to_string()).collect();
        }
        let linkedin_url = form.linkedin_url.trim();
        let linkedin_url = (!linkedin_url.is_empty()).then(|| linkedin_url.to_string());
        let github_org = form.github_org.trim();
        let github_org = (!github_org.is_empty()).then(|| github_org.to_string());
        let tags = split_csv(&form.tags);
        let editing_id = form.editing_id.clone();

        self.input_mode = InputMode::Normal;
        let api = self.api.clone();
        let generation = self.generations.next(FetchScope::Action);
        match editing_id {
            Some(id) => {
                let request = UpdateCompanyRequest {
                    name,
                    domains,
                    include_paths,
                    tags,
                };
                self.fetcher.spawn(FetchScope::Action, generation, async move {
                    FetchOutcome::CompanyUpdated(api.update_company(&id, &request).await)
                });
            }
            None => {
                let request = WatchCompanyRequest {
                    name,
                    domains,
                    include_paths,
                    linkedin_url,
                    github_org,
                    tags,
                };
                self.fetcher.spawn(FetchScope::Action, generation, async move {
                    FetchOutcome::CompanyWatched(api.watch_company(&request).await)
                });
            }
        }
    }

    // ============================================
    // Sources editing
    // ============================================

    fn toggle_sources_row(&mut self) {
        let Some(sources) = self.sources.as_mut() else {
            return;
        };
        match self.sources_cursor {
            0 => sources.categories.company = !sources.categories.company,
            1 => sources.categories.news = !sources.categories.news,
            2 => sources.categories.pdf = !sources.categories.pdf,
            3 => sources.categories.linkedin = !sources.categories.linkedin,
            4 => sources.categories.github = !sources.categories.github,
            5 => sources.categories.financial_report = !sources.categories.financial_report,
            7 => sources.quality.content_preference = sources.quality.content_preference.next(),
            8 => sources.quality.livecrawl = sources.quality.livecrawl.next(),
            _ => {}
        }
    }

    fn adjust_sources_row(&mut self, delta: i64) {
        let Some(sources) = self.sources.as_mut() else {
            return;
        };
        if self.sources_cursor == 6 {
            let limit = sources.quality.results_limit as i64 + delta;
            sources.quality.results_limit = limit.clamp(5, 100) as u32;
        }
    }

    fn save_sources(&mut self) {
        let Some(sources) = self.sources.clone() else {
            return;
        };
        self.set_status("saving sources...");
        let api = self.api.clone();
        let generation = self.generations.next(FetchScope::Sources);
        self.fetcher.spawn(FetchScope::Sources, generation, async move {
            FetchOutcome::SourcesSaved(api.save_sources(&sources).await)
        });
    }

    // ============================================
    // Settings editing
    // ============================================

    fn toggle_settings_row(&mut self) {
        let Some(draft) = self.settings_draft.as_mut() else {
            return;
        };
        match self.settings_cursor {
            0 => draft.schedule.enabled = !draft.schedule.enabled,
            1 => draft.schedule.frequency = draft.schedule.frequency.next(),
            _ => {}
        }
    }

    fn adjust_settings_row(&mut self, direction: i64) {
        let Some(draft) = self.settings_draft.as_mut() else {
            return;
        };
        match self.settings_cursor {
            2 => draft.retention.signals_days = step_days(draft.retention.signals_days, direction),
            3 => draft.retention.reports_days = step_days(draft.retention.reports_days, direction),
            4 => {
                draft.retention.snapshots_days =
                    step_days(draft.retention.snapshots_days, direction)
            }
            5 => {
                let ttl = draft.signals_cache_duration_seconds as i64 + direction * 300;
                draft.signals_cache_duration_seconds = ttl.max(60) as u64;
            }
            _ => {}
        }
    }

    fn save_settings(&mut self) {
        let Some(draft) = self.settings_draft.clone() else {
            return;
        };
        self.set_status("saving settings...");
        let api = self.api.clone();
        let generation = self.generations.next(FetchScope::Settings);
        self.fetcher.spawn(FetchScope::Settings, generation, async move {
            FetchOutcome::SettingsSaved(api.save_settings(&draft).await)
        });
    }

    /// Drop every cached result in both namespaces.
    fn clear_cache(&mut self) {
        let signals = self.cache.invalidate_all(Namespace::Signals);
        let runs = self.cache.invalidate_all(Namespace::Runs);
        self.signals_state = LoadState::Idle;
        self.runs_state = LoadState::Idle;
        self.run_results.clear();
        self.set_status(format!(
            "cache cleared ({signals} signal entries, {runs} run entries)"
        ));
    }

    // ============================================
    // Tab switching and key handling
    // ============================================

    /// Activate a tab, issuing its fetches if it has no data yet.
    fn switch_tab(&mut self, tab: Tab) {
        self.tab = tab;
        match tab {
            Tab::Dashboard => {
                if self.activity_state == LoadState::Idle {
                    self.fetch_activity();
                }
                if self.dashboard_signals_state == LoadState::Idle {
                    self.fetch_dashboard_signals();
                }
            }
            Tab::Watchlist => {
                if self.companies_state == LoadState::Idle {
                    self.fetch_companies();
                }
                if self.runs_state == LoadState::Idle {
                    self.load_cached_runs();
                }
            }
            Tab::TearSheets => {
                if self.companies_state == LoadState::Idle {
                    self.fetch_companies();
                }
                if self.tearsheet_company_state.selected().is_none() && !self.companies.is_empty()
                {
                    self.tearsheet_company_state.select(Some(0));
                }
                if self.tearsheet_state == LoadState::Idle {
                    self.fetch_selected_tearsheet();
                }
            }
            Tab::Signals => {
                if self.signals_state == LoadState::Idle {
                    self.load_signals(false);
                }
            }
            Tab::Sources => {
                if self.sources_state == LoadState::Idle {
                    self.fetch_sources();
                }
            }
            Tab::Settings => {
                if self.settings_state == LoadState::Idle {
                    self.fetch_settings();
                }
            }
            Tab::Reports => {
                if self.reports_state == LoadState::Idle {
                    self.fetch_reports();
                }
            }
        }
    }

    /// Route a key event. Text-entry modes grab everything; normal mode
    /// handles globals first, then the active tab.
    pub fn handle_key(&mut self, key: KeyEvent) {
        match self.input_mode {
            InputMode::CompanyForm => return self.handle_form_key(key),
            InputMode::FollowUp => return self.handle_follow_up_key(key),
            InputMode::Search => return self.handle_search_key(key),
            InputMode::Normal => {}
        }

        match key.code {
            KeyCode::Char('q') => {
                self.should_quit = true;
                return;
            }
            KeyCode::Tab => {
                self.switch_tab(self.tab.next());
                return;
            }
            KeyCode::BackTab => {
                self.switch_tab(self.tab.previous());
                return;
            }
            KeyCode::Char(c @ '1'..='7') => {
                let idx = (c as usize) - ('1' as usize);
                self.switch_tab(Tab::all()[idx]);
                return;
            }
            _ => {}
        }

        match self.tab {
            Tab::Dashboard => self.handle_dashboard_key(key),
            Tab::Watchlist => self.handle_watchlist_key(key),
            Tab::TearSheets => self.handle_tearsheet_key(key),
            Tab::Signals => self.handle_signals_key(key),
            Tab::Sources => self.handle_sources_key(key),
            Tab::Settings => self.handle_settings_key(key),
            Tab::Reports => self.handle_reports_key(key),
        }
    }

    fn handle_dashboard_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => {
                select_next(&mut self.activity_table_state, self.activity.len());
            }
            KeyCode::Up | KeyCode::Char('k') => {
                select_previous(&mut self.activity_table_state, self.activity.len());
            }
            KeyCode::Char('r') => {
                self.fetch_activity();
                self.fetch_dashboard_signals();
                self.fetch_companies();
            }
            _ => {}
        }
    }

    fn handle_watchlist_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => {
                select_next(&mut self.company_table_state, self.companies.len());
            }
            KeyCode::Up | KeyCode::Char('k') => {
                select_previous(&mut self.company_table_state, self.companies.len());
            }
            KeyCode::Home | KeyCode::Char('g') => {
                if !self.companies.is_empty() {
                    self.company_table_state.select(Some(0));
                }
            }
            KeyCode::End | KeyCode::Char('G') => {
                if !self.companies.is_empty() {
                    self.company_table_state.select(Some(self.companies.len() - 1));
                }
            }
            KeyCode::Char('a') => {
                self.company_form = CompanyForm::new();
                self.input_mode = InputMode::CompanyForm;
            }
            KeyCode::Char('e') => {
                if let Some(company) = self.selected_company().cloned() {
                    self.company_form = CompanyForm::for_company(&company);
                    self.input_mode = InputMode::CompanyForm;
                }
            }
            KeyCode::Char('/') => {
                self.open_search();
            }
            KeyCode::Char('r') => {
                self.run_watchlist(None);
            }
            KeyCode::Char('d') => {
                if let Some(company) = self.selected_company() {
                    let id = company.id.clone();
                    self.run_watchlist(Some(id));
                }
            }
            KeyCode::Char('R') => {
                self.fetch_companies();
            }
            KeyCode::Enter => {
                // Jump to the tear-sheet for the selected company
                if let Some(idx) = self.company_table_state.selected() {
                    self.tearsheet_company_state.select(Some(idx));
                    self.switch_tab(Tab::TearSheets);
                    self.fetch_selected_tearsheet();
                }
            }
            _ => {}
        }
    }

    fn handle_tearsheet_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => {
                select_next(&mut self.tearsheet_company_state, self.companies.len());
                self.fetch_selected_tearsheet();
            }
            KeyCode::Up | KeyCode::Char('k') => {
                select_previous(&mut self.tearsheet_company_state, self.companies.len());
                self.fetch_selected_tearsheet();
            }
            KeyCode::PageDown | KeyCode::Char('d') | KeyCode::Char(' ') => {
                self.tearsheet_scroll = self.tearsheet_scroll.saturating_add(10);
            }
            KeyCode::PageUp | KeyCode::Char('u') => {
                self.tearsheet_scroll = self.tearsheet_scroll.saturating_sub(10);
            }
            KeyCode::Char('r') => {
                self.fetch_selected_tearsheet();
            }
            _ => {}
        }
    }

    fn handle_signals_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => {
                select_next(&mut self.signal_table_state, self.signals.len());
            }
            KeyCode::Up | KeyCode::Char('k') => {
                select_previous(&mut self.signal_table_state, self.signals.len());
            }
            KeyCode::Home | KeyCode::Char('g') => {
                if !self.signals.is_empty() {
                    self.signal_table_state.select(Some(0));
                }
            }
            KeyCode::End | KeyCode::Char('G') => {
                if !self.signals.is_empty() {
                    self.signal_table_state.select(Some(self.signals.len() - 1));
                }
            }
            KeyCode::Char('c') => {
                self.cycle_company_filter();
            }
            KeyCode::Char('t') => {
                self.cycle_type_filter();
            }
            KeyCode::Char('s') => {
                self.cycle_severity_filter();
            }
            KeyCode::Char('r') => {
                self.load_signals(true);
            }
            KeyCode::Char('D') => {
                self.detect_selected_live();
            }
            KeyCode::Char('m') => {
                self.mute_selected();
            }
            KeyCode::Char('f') => {
                if self.selected_signal().is_some() {
                    self.follow_up_input.clear();
                    self.input_mode = InputMode::FollowUp;
                }
            }
            _ => {}
        }
    }

    fn handle_sources_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => {
                self.sources_cursor = (self.sources_cursor + 1) % Self::SOURCES_ROWS;
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.sources_cursor =
                    (self.sources_cursor + Self::SOURCES_ROWS - 1) % Self::SOURCES_ROWS;
            }
            KeyCode::Enter | KeyCode::Char(' ') => {
                self.toggle_sources_row();
            }
            KeyCode::Left | KeyCode::Char('h') => {
                self.adjust_sources_row(-5);
            }
            KeyCode::Right | KeyCode::Char('l') => {
                self.adjust_sources_row(5);
            }
            KeyCode::Char('s') => {
                self.save_sources();
            }
            KeyCode::Char('r') => {
                self.fetch_sources();
            }
            _ => {}
        }
    }

    fn handle_settings_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => {
                self.settings_cursor = (self.settings_cursor + 1) % Self::SETTINGS_ROWS;
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.settings_cursor =
                    (self.settings_cursor + Self::SETTINGS_ROWS - 1) % Self::SETTINGS_ROWS;
            }
            KeyCode::Enter | KeyCode::Char(' ') => {
                self.toggle_settings_row();
            }
            KeyCode::Left | KeyCode::Char('h') => {
                self.adjust_settings_row(-1);
            }
            KeyCode::Right | KeyCode::Char('l') => {
                self.adjust_settings_row(1);
            }
            KeyCode::Char('s') => {
                self.save_settings();
            }
            KeyCode::Char('x') => {
                self.clear_cache();
            }
            KeyCode::Char('r') => {
                self.fetch_settings();
            }
            _ => {}
        }
    }

    fn handle_reports_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => {
                select_next(&mut self.report_table_state, self.reports.len());
                self.report_scroll = 0;
            }
            KeyCode::Up | KeyCode::Char('k') => {
                select_previous(&mut self.report_table_state, self.reports.len());
                self.report_scroll = 0;
            }
            KeyCode::PageDown | KeyCode::Char('d') | KeyCode::Char(' ') => {
                self.report_scroll = self.report_scroll.saturating_add(10);
            }
            KeyCode::PageUp | KeyCode::Char('u') => {
                self.report_scroll = self.report_scroll.saturating_sub(10);
            }
            KeyCode::Char('g') => {
                self.generate_report();
            }
            KeyCode::Char('r') => {
                self.fetch_reports();
            }
            _ => {}
        }
    }

    fn handle_form_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.input_mode = InputMode::Normal;
            }
            KeyCode::Tab | KeyCode::Down => {
                self.company_form.field = (self.company_form.field + 1) % CompanyForm::FIELDS;
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.company_form.field =
                    (self.company_form.field + CompanyForm::FIELDS - 1) % CompanyForm::FIELDS;
            }
            KeyCode::Enter => {
                self.submit_company_form();
            }
            KeyCode::Backspace => {
                self.company_form.active_buffer().pop();
            }
            KeyCode::Char(c) => {
                self.company_form.active_buffer().push(c);
            }
            _ => {}
        }
    }

    fn handle_follow_up_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.input_mode = InputMode::Normal;
            }
            KeyCode::Enter => {
                self.submit_follow_up();
            }
            KeyCode::Backspace => {
                self.follow_up_input.pop();
            }
            KeyCode::Char(c) => {
                self.follow_up_input.push(c);
            }
            _ => {}
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.input_mode = InputMode::Normal;
            }
            KeyCode::Down => {
                select_next(&mut self.search_table_state, self.search_results.len());
            }
            KeyCode::Up => {
                select_previous(&mut self.search_table_state, self.search_results.len());
            }
            KeyCode::Enter => {
                // Prefill the add form from the selected hit
                if let Some(idx) = self.search_table_state.selected() {
                    if let Some(hit) = self.search_results.get(idx) {
                        self.company_form = CompanyForm::from_hit(hit);
                        self.input_mode = InputMode::CompanyForm;
                    }
                }
            }
            KeyCode::Backspace => {
                self.search_query.pop();
                self.last_search_edit = Some(self.tick_count);
            }
            KeyCode::Char(c) => {
                self.search_query.push(c);
                self.last_search_edit = Some(self.tick_count);
            }
            _ => {}
        }
    }

    fn generate_report(&mut self) {
        if self.report_generating {
            return;
        }
        self.report_generating = true;
        self.set_status("generating weekly report...");
        let api = self.api.clone();
        let generation = self.generations.next(FetchScope::Action);
        self.fetcher.spawn(FetchScope::Action, generation, async move {
            FetchOutcome::ReportGenerated(api.generate_weekly_report().await)
        });
    }

    // ============================================
    // Filter cycling
    // ============================================

    /// Cycle the company filter: all, then each watched company.
    fn cycle_company_filter(&mut self) {
        let next = match &self.filter.company_id {
            None => self.companies.first().map(|c| c.id.clone()),
            Some(current) => match self.companies.iter().position(|c| &c.id == current) {
                Some(i) if i + 1 < self.companies.len() => Some(self.companies[i + 1].id.clone()),
                _ => None,
            },
        };
        self.filter.company_id = next;
        self.load_signals(false);
    }

    /// Cycle the type filter: all, then each signal type.
    fn cycle_type_filter(&mut self) {
        let all = SignalType::all();
        self.filter.signal_type = match self.filter.signal_type {
            None => Some(all[0]),
            Some(current) => {
                let i = all.iter().position(|t| *t == current).unwrap_or(0);
                if i + 1 < all.len() {
                    Some(all[i + 1])
                } else {
                    None
                }
            }
        };
        self.load_signals(false);
    }

    /// Cycle the severity filter: all, then high to low.
    fn cycle_severity_filter(&mut self) {
        let all = Severity::all();
        self.filter.severity = match self.filter.severity {
            None => Some(all[0]),
            Some(current) => {
                let i = all.iter().position(|s| *s == current).unwrap_or(0);
                if i + 1 < all.len() {
                    Some(all[i + 1])
                } else {
                    None
                }
            }
        };
        self.load_signals(false);
    }

    // ============================================
    // Fetch results
    // ============================================

    /// Drain completed fetches. Responses carrying a superseded generation
    /// are dropped so older data never overwrites newer state.
    pub fn drain_fetches(&mut self) {
        while let Some(envelope) = self.fetcher.try_recv() {
            if !self.generations.is_current(&envelope) {
                tracing::debug!(
                    scope = ?envelope.scope,
                    generation = envelope.generation,
                    "Dropping stale fetch response"
                );
                continue;
            }
            self.apply(envelope.outcome);
        }
    }

    fn apply(&mut self, outcome: FetchOutcome) {
        match outcome {
            FetchOutcome::Companies(result) => match result {
                Ok(companies) => {
                    self.companies = companies;
                    self.companies_state = LoadState::Ready;
                    fix_selection(&mut self.company_table_state, self.companies.len());
                    fix_selection(&mut self.tearsheet_company_state, self.companies.len());
                    if self.pending_signal_detect {
                        self.pending_signal_detect = false;
                        self.load_signals(true);
                    }
                    if self.tab == Tab::TearSheets && self.tearsheet_state == LoadState::Idle {
                        self.fetch_selected_tearsheet();
                    }
                }
                Err(err) => {
                    self.companies_state = LoadState::Failed(err.to_string());
                    if self.pending_signal_detect {
                        self.pending_signal_detect = false;
                        self.signals_state =
                            LoadState::Failed(format!("watchlist unavailable: {err}"));
                    }
                }
            },
            FetchOutcome::Signals {
                key,
                merge,
                failed,
                result,
            } => match result {
                Ok(new_signals) => {
                    let mut list: Vec<Signal> = if merge {
                        let fresh: HashSet<String> =
                            new_signals.iter().map(|s| s.id.clone()).collect();
                        let mut merged = new_signals;
                        merged.extend(
                            self.signals
                                .iter()
                                .filter(|s| !fresh.contains(&s.id))
                                .cloned(),
                        );
                        merged
                    } else {
                        new_signals
                    };
                    list.retain(|s| self.filter.matches(s));
                    list.sort_by(|a, b| b.detected_at.cmp(&a.detected_at));
                    self.cache.write_json(Namespace::Signals, &key, &list);
                    self.signals = list;
                    self.signals_state = LoadState::Ready;
                    if merge {
                        fix_selection(&mut self.signal_table_state, self.signals.len());
                    } else {
                        self.signal_table_state = TableState::default();
                        if !self.signals.is_empty() {
                            self.signal_table_state.select(Some(0));
                        }
                    }
                    if failed > 0 {
                        self.set_status(format!("detection finished, {failed} companies failed"));
                    }
                }
                Err(err) => {
                    if merge {
                        // Keep the list we already have
                        self.set_status(format!("live detection failed: {err}"));
                    } else {
                        self.signals_state = LoadState::Failed(err.to_string());
                    }
                }
            },
            FetchOutcome::StoredSignals(result) => match result {
                Ok(signals) => {
                    self.dashboard_signals = signals;
                    self.dashboard_signals_state = LoadState::Ready;
                }
                Err(err) => {
                    self.dashboard_signals_state = LoadState::Failed(err.to_string());
                }
            },
            FetchOutcome::Tearsheet { company_id, result } => match result {
                Ok(sheet) => {
                    tracing::debug!(company_id = %company_id, found = sheet.is_some(), "Tear-sheet loaded");
                    self.tearsheet = sheet;
                    self.tearsheet_state = LoadState::Ready;
                    self.tearsheet_scroll = 0;
                }
                Err(err) => {
                    self.tearsheet_state = LoadState::Failed(err.to_string());
                }
            },
            FetchOutcome::Reports(result) => match result {
                Ok(reports) => {
                    self.reports = reports;
                    self.reports_state = LoadState::Ready;
                    fix_selection(&mut self.report_table_state, self.reports.len());
                    self.report_scroll = 0;
                }
                Err(err) => {
                    self.reports_state = LoadState::Failed(err.to_string());
                }
            },
            FetchOutcome::ReportGenerated(result) => {
                self.report_generating = false;
                match result {
                    Ok(report) => {
                        self.set_status(format!(
                            "weekly report generated ({} to {})",
                            report.period_start.format("%b %d"),
                            report.period_end.format("%b %d")
                        ));
                        self.fetch_reports();
                    }
                    Err(err) => {
                        self.set_status(format!("report generation failed: {err}"));
                    }
                }
            }
            FetchOutcome::Activity(result) => match result {
                Ok(rows) => {
                    self.activity = rows;
                    self.activity_state = LoadState::Ready;
                    fix_selection(&mut self.activity_table_state, self.activity.len());
                }
                Err(err) => {
                    self.activity_state = LoadState::Failed(err.to_string());
                }
            },
            FetchOutcome::Settings(result) => match result {
                Ok(settings) => {
                    self.apply_settings(settings);
                }
                Err(err) => {
                    self.settings_state = LoadState::Failed(err.to_string());
                }
            },
            FetchOutcome::SettingsSaved(result) => match result {
                Ok(settings) => {
                    self.apply_settings(settings);
                    self.set_status("settings saved");
                }
                Err(err) => {
                    self.set_status(format!("settings save failed: {err}"));
                }
            },
            FetchOutcome::Sources(result) => match result {
                Ok(sources) => {
                    self.sources = Some(sources);
                    self.sources_state = LoadState::Ready;
                }
                Err(err) => {
                    self.sources_state = LoadState::Failed(err.to_string());
                }
            },
            FetchOutcome::SourcesSaved(result) => match result {
                Ok(sources) => {
                    self.sources = Some(sources);
                    self.sources_state = LoadState::Ready;
                    self.set_status("sources saved");
                }
                Err(err) => {
                    self.set_status(format!("sources save failed: {err}"));
                }
            },
            FetchOutcome::Runs { key, result } => match result {
                Ok(results) => {
                    self.cache.write_json(Namespace::Runs, &key, &results);
                    let created: u64 = results.iter().map(|r| r.signals_created).sum();
                    self.set_status(format!(
                        "run finished: {} companies, {} new signals",
                        results.len(),
                        created
                    ));
                    self.run_results = results;
                    self.runs_state = LoadState::Ready;
                    // last_run_at moved; refresh the table
                    self.fetch_companies();
                }
                Err(err) => {
                    self.runs_state = LoadState::Failed(err.to_string());
                }
            },
            FetchOutcome::Search { query, result } => match result {
                Ok(hits) => {
                    tracing::debug!(query = %query, hits = hits.len(), "Search results loaded");
                    self.search_results = hits;
                    self.search_state = LoadState::Ready;
                    self.search_table_state = TableState::default();
                    if !self.search_results.is_empty() {
                        self.search_table_state.select(Some(0));
                    }
                }
                Err(err) => {
                    self.search_state = LoadState::Failed(err.to_string());
                }
            },
            FetchOutcome::Health(healthy) => {
                self.backend_healthy = Some(healthy);
            }
            FetchOutcome::CompanyWatched(result) => match result {
                Ok(company) => {
                    self.set_status(format!("watching {}", company.name));
                    self.fetch_companies();
                }
                Err(err) => {
                    self.set_status(format!("add company failed: {err}"));
                }
            },
            FetchOutcome::CompanyUpdated(result) => match result {
                Ok(company) => {
                    self.set_status(format!("updated {}", company.name));
                    self.fetch_companies();
                }
                Err(err) => {
                    self.set_status(format!("update failed: {err}"));
                }
            },
            FetchOutcome::SignalMuted { signal_id, result } => match result {
                Ok(()) => {
                    // Local removal only; the cached copy ages out on its own
                    self.signals.retain(|s| s.id != signal_id);
                    self.dashboard_signals.retain(|s| s.id != signal_id);
                    fix_selection(&mut self.signal_table_state, self.signals.len());
                    self.set_status("signal muted");
                }
                Err(err) => {
                    self.set_status(format!("mute failed: {err}"));
                }
            },
            FetchOutcome::FollowUpCreated { signal_id, result } => match result {
                Ok(()) => {
                    tracing::info!(signal_id = %signal_id, "Follow-up created");
                    self.set_status("follow-up created");
                }
                Err(err) => {
                    self.set_status(format!("follow-up failed: {err}"));
                }
            },
        }
    }

    /// Install a settings blob: the service owns the authoritative copy and
    /// the signals cache TTL follows it.
    fn apply_settings(&mut self, settings: ServerSettings) {
        self.settings_service.update(settings.clone());
        self.cache
            .set_ttl(Namespace::Signals, self.settings_service.signals_ttl_secs());
        self.settings_draft = Some(settings);
        self.settings_state = LoadState::Ready;
    }
}

/// Split a comma-separated buffer into trimmed, non-empty items.
fn split_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Step a retention value by whole weeks, with a one-week floor.
fn step_days(days: u32, direction: i64) -> u32 {
    let next = days as i64 + direction * 7;
    next.clamp(7, 3650) as u32
}

/// Keep a table selection valid after its backing rows changed.
fn fix_selection(state: &mut TableState, len: usize) {
    match state.selected() {
        Some(_) if len == 0 => state.select(None),
        Some(i) if i >= len => state.select(Some(len - 1)),
        None if len > 0 => state.select(Some(0)),
        _ => {}
    }
}

fn select_next(state: &mut TableState, len: usize) {
    if len == 0 {
        return;
    }
    let i = match state.selected() {
        Some(i) => {
            if i >= len - 1 {
                0
            } else {
                i + 1
            }
        }
        None => 0,
    };
    state.select(Some(i));
}

fn select_previous(state: &mut TableState, len: usize) {
    if len == 0 {
        return;
    }
    let i = match state.selected() {
        Some(0) => len - 1,
        Some(i) => i - 1,
        None => 0,
    };
    state.select(Some(i));
}
