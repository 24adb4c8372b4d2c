//! Meta tokens shared by the attribute engine and its collaborators

// ===== Attribute types =====
pub const META_NONE: &str = "*none";
pub const META_CONSTANT: &str = "*constant";
pub const META_VARIABLE: &str = "*variable";
pub const META_COMPOSED: &str = "*composed";
pub const META_GENERIC: &str = "*generic";
pub const META_USAGE_DIFFERENCE: &str = "*usageDifference";
pub const META_SUM: &str = "*sum";
pub const META_DIFFERENCE: &str = "*difference";
pub const META_MULTIPLY: &str = "*multiply";
pub const META_DIVIDE: &str = "*divide";
pub const META_VALUE_EXPONENT: &str = "*valueExponent";
pub const META_UNIX_TIMESTAMP: &str = "*unixTimestamp";
pub const META_DATE_TIME: &str = "*dateTime";
pub const META_PREFIX: &str = "*prefix";
pub const META_SUFFIX: &str = "*suffix";
pub const META_CC_USAGE: &str = "*ccUsage";
pub const META_SIP_CID: &str = "*sipcid";
pub const META_PASSWORD: &str = "*password";

// ===== Event namespaces =====
pub const META_REQ: &str = "*req";
pub const META_OPTS: &str = "*opts";
pub const META_VARS: &str = "*vars";
pub const META_TENANT: &str = "*tenant";

// ===== Special values =====
pub const META_REMOVE: &str = "*remove";
pub const META_ATTRIBUTES: &str = "*attributes";
pub const META_NOW: &str = "*now";

// ===== API options =====
pub const OPT_CONTEXT: &str = "*context";
pub const OPT_PROCESS_RUNS: &str = "*processRuns";
pub const OPT_PROFILE_RUNS: &str = "*profileRuns";
pub const OPT_PROFILE_IDS: &str = "*profileIDs";
pub const OPT_PROFILE_IGNORE_FILTERS: &str = "*profileIgnoreFilters";

// ===== Per-call variables exposed under *vars =====
pub const VAR_PROCESS_RUNS: &str = "*processRuns";
pub const VAR_PROCESSED_PROFILE_IDS: &str = "*processedProfileIDs";
pub const VAR_AP_TENANT_ID: &str = "*apTenantID";

// ===== Separators =====
/// Separates tokens of a value expression
pub const INFIELD_SEP: char = ';';
/// Separates path segments
pub const NESTING_SEP: char = '.';
/// Marks a value token as a data reference
pub const DYNAMIC_DATA_PREFIX: char = '~';
/// Quotes a literal that may contain separators
pub const UNSPLIT_QUOTE: char = '`';
/// Joins tenant and ID in the inline profile identifier
pub const CONCATENATED_KEY_SEP: char = ':';
