pub const USERS: &str = "users";
pub const RECORDS: &str = "records";
pub const CONFIG_VERSIONS: &str = "config_versions";

// Secondary index trees
pub const RECORD_SUBMISSIONS: &str = "record_submissions";
