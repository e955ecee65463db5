pub fn generate_starter_config() -> String {
    r#"# =============================================================================
# LOGSOCKET CONFIGURATION
# =============================================================================
# Ships newline-delimited JSON log events to a remote websocket endpoint.
#
# Config file locations (in order of precedence):
#   1. Path specified via --config argument
#   2. ~/.config/logsocket/config.yml
#   3. /etc/logsocket/config.yml
#
# Any value may reference an environment variable with $env{NAME}.

output:
  websocket:
    # Number of independent connections, each publishing its own batches
    workers: 1
    # Max events handed to a worker at once
    batch_size: 2048
    # How many times the unsent tail of a batch is resubmitted (-1 = forever)
    retry_limit: 3
    # Connection target: schema://addr/path
    schema: ws
    addr: "127.0.0.1:8080"
    path: /
    # Seconds between keepalive pings (0 disables keepalive, at most 86400)
    ping_interval: 30
    # Messages of this many bytes or more are dropped instead of sent
    max_len: 1048576

input:
  # NDJSON event file; events are read from stdin when omitted
  # path: /var/log/harvested.ndjson
  # How long a partially filled batch waits before being sent
  flush_interval: 1s
"#
    .to_string()
}
