/// Constants used throughout the cachectl codebase
// External tool
pub const DEFAULT_EXECUTABLE_NAME: &str = "cachetool";
pub const BUNDLED_BIN_DIR: &str = "bin";

// Environment variable names
pub const CACHETOOL_PATH_VAR: &str = "CACHETOOL_PATH";
pub const CACHECTL_BACKEND_VAR: &str = "CACHECTL_BACKEND";
pub const CACHECTL_QUIET_VAR: &str = "CACHECTL_QUIET";
pub const CACHECTL_TIMEOUT_VAR: &str = "CACHECTL_TIMEOUT_SECS";
pub const CACHECTL_LOG_VAR: &str = "CACHECTL_LOG";

// Output protocol
pub const STREAM_TEXT_SEPARATOR: &str = ",";
pub const DEFAULT_STREAM_INDEX: u32 = 0;
