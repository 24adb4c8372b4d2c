//! Attribute service
//!
//! Entry points of the engine: `process_event` runs the multi-pass
//! rewrite loop, `get_attribute_for_event` previews the profile that would
//! apply.

use crate::compute::{ComputeRequest, ValueComputer};
use crate::dynamics::blocker_from_dynamics;
use crate::mutator;
use crate::opts::{bool_opt, int_opt, string_slice_opt};
use crate::selector::{ProfileSelector, SelectRequest};
use crate::timeutil::parse_timezone;
use apolo_cache::DataManager;
use apolo_core::config::{AppConfig, AttributesConfig};
use apolo_core::consts::*;
use apolo_core::models::{
    tenant_id, AttributeProfile, CgrEvent, DataPoint, ExternalAttributeProfile, FieldsAltered,
    ProcessEventReply, ValueExpr,
};
use apolo_core::traits::{AttributeIndexer, FilterPass};
use apolo_core::{AppError, AppResult};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Outcome of one pass
struct PassResult {
    profile_id: String,
    fields: Vec<String>,
    blocker: bool,
}

/// Per-call state of `process_event`
struct CallState {
    dp: DataPoint,
    processed: HashMap<String, usize>,
    last_id: Option<String>,
    profile_runs: i64,
}

pub struct AttributeService {
    dm: Arc<DataManager>,
    filters: Arc<dyn FilterPass>,
    selector: ProfileSelector,
    computer: ValueComputer,
    cfg: AttributesConfig,
    default_tenant: String,
}

impl AttributeService {
    pub fn new(
        dm: Arc<DataManager>,
        filters: Arc<dyn FilterPass>,
        indexer: Arc<dyn AttributeIndexer>,
        cfg: &AppConfig,
    ) -> AppResult<Self> {
        let timezone = parse_timezone(&cfg.general.default_timezone)?;
        Ok(Self {
            selector: ProfileSelector::new(dm.clone(), filters.clone(), indexer),
            dm,
            filters,
            computer: ValueComputer::new(cfg.general.rounding_decimals, timezone),
            cfg: cfg.attributes.clone(),
            default_tenant: cfg.general.default_tenant.clone(),
        })
    }

    /// Replace the value computer, e.g. to plug in a `*ccUsage` strategy
    pub fn with_computer(mut self, computer: ValueComputer) -> Self {
        self.computer = computer;
        self
    }

    fn tenant_or_default(&self, tenant: &str) -> String {
        if tenant.is_empty() {
            self.default_tenant.clone()
        } else {
            tenant.to_string()
        }
    }

    /// Process an event through up to `*processRuns` passes
    ///
    /// The caller's event is never modified; the reply carries a rewritten
    /// copy. Applying a `*password` directive whose value is a literal also
    /// rewrites the stored directive to `*constant` with the hash, provided
    /// the stored directive is still the same `*password` rule. Only the
    /// call that performed that rewrite writes the plaintext into the event;
    /// every other `*password` directive writes the hash.
    ///
    /// # Errors
    ///
    /// `NOT_FOUND` when no pass matched; `MANDATORY_IE_MISSING` when a field
    /// still holds `*attributes`; option conversion errors as is; anything
    /// else wrapped as `SERVER_ERROR`.
    #[instrument(skip(self, event), fields(tenant = %event.tenant, id = %event.id))]
    pub async fn process_event(&self, event: &CgrEvent) -> AppResult<ProcessEventReply> {
        self.run_passes(event)
            .await
            .map_err(AppError::into_server_error)
    }

    async fn run_passes(&self, event: &CgrEvent) -> AppResult<ProcessEventReply> {
        let process_runs = int_opt(&event.api_opts, OPT_PROCESS_RUNS, self.cfg.process_runs)?;
        let profile_runs = int_opt(&event.api_opts, OPT_PROFILE_RUNS, self.cfg.profile_runs)?;

        let mut cgr_event = event.clone();
        cgr_event.tenant = self.tenant_or_default(&event.tenant);

        let mut dp = cgr_event.as_data_point();
        dp.set_namespace(
            META_VARS,
            json!({
                VAR_PROCESS_RUNS: 0,
                VAR_PROCESSED_PROFILE_IDS: {},
            }),
        );
        let mut state = CallState {
            dp,
            processed: HashMap::new(),
            last_id: None,
            profile_runs,
        };

        let mut altered_fields = Vec::new();
        let mut not_found = false;
        for run in 1..=process_runs.max(0) as usize {
            state
                .dp
                .set(&var_path(VAR_PROCESS_RUNS), json!(run))?;

            let pass = match self.run_pass(&mut state, run).await {
                Ok(pass) => pass,
                Err(AppError::NotFound) => {
                    // only the first pass has to match
                    not_found = run == 1;
                    break;
                }
                Err(e) => return Err(e),
            };

            let count = state.processed.entry(pass.profile_id.clone()).or_insert(0);
            *count += 1;
            state.dp.set(
                &format!("{}[{}]", var_path(VAR_PROCESSED_PROFILE_IDS), pass.profile_id),
                json!(*count),
            )?;
            state.last_id = Some(pass.profile_id.clone());

            debug!(run, profile = %pass.profile_id, fields = ?pass.fields, "Pass applied");
            altered_fields.push(FieldsAltered {
                matched_profile_id: pass.profile_id,
                fields: pass.fields,
            });
            if pass.blocker {
                debug!(run, "Profile blocker set, stopping");
                break;
            }
        }

        cgr_event.update_from(&state.dp);
        if let Ok(tenant) = state.dp.field_as_string(META_TENANT) {
            cgr_event.tenant = tenant;
        }

        let mut missing: Vec<String> = cgr_event
            .event
            .iter()
            .filter(|(_, v)| v.as_str() == Some(META_ATTRIBUTES))
            .map(|(k, _)| k.clone())
            .collect();
        if !missing.is_empty() {
            missing.sort();
            return Err(AppError::MandatoryIeMissing(missing));
        }
        if not_found {
            return Err(AppError::NotFound);
        }

        info!(passes = altered_fields.len(), "Event processed");
        Ok(ProcessEventReply {
            altered_fields,
            cgr_event,
        })
    }

    async fn run_pass(&self, state: &mut CallState, run: usize) -> AppResult<PassResult> {
        let tenant = state
            .dp
            .field_as_string(META_TENANT)
            .unwrap_or_else(|_| self.default_tenant.clone());
        let opts = state.dp.namespace(META_OPTS).cloned().unwrap_or_default();
        let profile_ids = string_slice_opt(&opts, OPT_PROFILE_IDS, &self.cfg.profile_ids)?;
        let ignore_filters = bool_opt(
            &opts,
            OPT_PROFILE_IGNORE_FILTERS,
            self.cfg.profile_ignore_filters,
        )?;

        let req = SelectRequest {
            tenant: &tenant,
            profile_ids: &profile_ids,
            ignore_filters,
            last_id: state.last_id.as_deref(),
            processed: &state.processed,
            profile_runs: state.profile_runs,
        };
        let prf = self.selector.select(&req, &mut state.dp).await?;

        let fields = self.apply_profile(&prf, &tenant, &mut state.dp, run).await?;
        let blocker =
            blocker_from_dynamics(self.filters.as_ref(), &tenant, &prf.blockers, &state.dp).await?;

        Ok(PassResult {
            profile_id: prf.tenant_id(),
            fields,
            blocker,
        })
    }

    /// Apply the directives of one profile in order
    async fn apply_profile(
        &self,
        prf: &AttributeProfile,
        tenant: &str,
        dp: &mut DataPoint,
        run: usize,
    ) -> AppResult<Vec<String>> {
        let mut fields: Vec<String> = Vec::new();
        for (idx, attr) in prf.attributes.iter().enumerate() {
            if !attr.filter_ids.is_empty() && !self.filters.pass(tenant, &attr.filter_ids, dp).await? {
                continue;
            }

            // an empty path only carries blockers
            if !attr.path.is_empty() {
                let mut out = self.computer.compute(&ComputeRequest {
                    dp: &*dp,
                    attr_type: &attr.attr_type,
                    path: &attr.path,
                    value: &attr.value,
                    pass_index: run,
                })?;
                if attr.attr_type == META_PASSWORD {
                    let migrated = match out.as_deref() {
                        Some(hash) => self.migrate_password(prf, idx, &attr.value, hash).await,
                        None => false,
                    };
                    if migrated {
                        out = Some(attr.value.parse_data_point(dp)?);
                    }
                }

                if let Some(path) = mutator::apply(dp, &attr.attr_type, &attr.path, out)? {
                    if !fields.contains(&path) {
                        fields.push(path);
                    }
                }
            }

            if blocker_from_dynamics(self.filters.as_ref(), tenant, &attr.blockers, dp).await? {
                debug!(profile = %prf.id, path = %attr.path, "Attribute blocker set");
                break;
            }
        }
        Ok(fields)
    }

    /// Persist the hash of a literal `*password` directive
    ///
    /// Returns whether the stored directive was rewritten. Failures are
    /// logged; the event is processed either way.
    async fn migrate_password(
        &self,
        prf: &AttributeProfile,
        idx: usize,
        rule: &ValueExpr,
        hash: &str,
    ) -> bool {
        if !rule.tokens().iter().all(|t| t.is_constant()) {
            return false;
        }
        match self.rewrite_stored_password(prf, idx, rule, hash).await {
            Ok(rewritten) => rewritten,
            Err(e) => {
                warn!(profile = %prf.tenant_id(), error = %e, "Password migration failed");
                false
            }
        }
    }

    async fn rewrite_stored_password(
        &self,
        prf: &AttributeProfile,
        idx: usize,
        rule: &ValueExpr,
        hash: &str,
    ) -> AppResult<bool> {
        let Some(stored) = self
            .dm
            .get_attribute_profile(&prf.tenant, &prf.id, false)
            .await?
        else {
            return Ok(false);
        };
        let mut stored = (*stored).clone();
        match stored.attributes.get_mut(idx) {
            Some(attr) if attr.attr_type == META_PASSWORD && attr.value == *rule => {
                attr.attr_type = META_CONSTANT.to_string();
                attr.value = ValueExpr::constant(hash);
            }
            _ => return Ok(false),
        }
        self.dm.replace_attribute_profile(&stored).await?;
        info!(profile = %stored.tenant_id(), "Password directive migrated to hash");
        Ok(true)
    }

    /// Profile that would be applied to the event, without applying it
    #[instrument(skip(self, event), fields(tenant = %event.tenant, id = %event.id))]
    pub async fn get_attribute_for_event(
        &self,
        event: &CgrEvent,
    ) -> AppResult<ExternalAttributeProfile> {
        self.preview(event)
            .await
            .map_err(AppError::into_server_error)
    }

    async fn preview(&self, event: &CgrEvent) -> AppResult<ExternalAttributeProfile> {
        let tenant = self.tenant_or_default(&event.tenant);
        let profile_ids = string_slice_opt(&event.api_opts, OPT_PROFILE_IDS, &self.cfg.profile_ids)?;
        let ignore_filters = bool_opt(
            &event.api_opts,
            OPT_PROFILE_IGNORE_FILTERS,
            self.cfg.profile_ignore_filters,
        )?;

        let mut dp = event.as_data_point();
        let mut vars = Map::new();
        vars.insert(VAR_PROCESS_RUNS.to_string(), json!(0));
        dp.set_namespace(META_VARS, Value::Object(vars));

        let processed = HashMap::new();
        let req = SelectRequest {
            tenant: &tenant,
            profile_ids: &profile_ids,
            ignore_filters,
            last_id: None,
            processed: &processed,
            profile_runs: 0,
        };
        let prf = self.selector.select(&req, &mut dp).await?;
        debug!(profile = %tenant_id(&prf.tenant, &prf.id), "Profile previewed");
        Ok(ExternalAttributeProfile::from(prf.as_ref()))
    }
}

fn var_path(name: &str) -> String {
    format!("{}{}{}", META_VARS, NESTING_SEP, name)
}
