/// DuckDB initialization SQL.
///
/// Executed once at database open time via `Connection::execute_batch`.
/// All statements use `IF NOT EXISTS` so they are safe to re-run on every
/// startup. There are no migrations: the `visits` table is the whole schema.
///
/// `memory_limit` comes from `Config.duckdb_memory_limit`
/// (env `TALLY_DUCKDB_MEMORY`, default `"1GB"`). Always set an explicit
/// limit: the DuckDB default (80% of system RAM) is too greedy for a
/// server process.
///
/// `id` is drawn from a sequence, so ids are unique and strictly increasing
/// in insert order. `"timestamp"` is the client-supplied time and is quoted
/// because it doubles as a type name.
pub fn init_sql(memory_limit: &str) -> String {
    format!(
        r#"SET memory_limit = '{memory_limit}';
SET threads = 2;

CREATE SEQUENCE IF NOT EXISTS visits_id_seq START 1;

CREATE TABLE IF NOT EXISTS visits (
    id              BIGINT PRIMARY KEY DEFAULT nextval('visits_id_seq'),
    visitor_id      VARCHAR NOT NULL,
    "timestamp"     VARCHAR NOT NULL,
    url             VARCHAR NOT NULL DEFAULT '',
    path            VARCHAR NOT NULL DEFAULT '',
    referrer        VARCHAR NOT NULL DEFAULT '',
    user_agent      VARCHAR NOT NULL DEFAULT '',
    screen_width    BIGINT NOT NULL DEFAULT 0,
    screen_height   BIGINT NOT NULL DEFAULT 0,
    ip_address      VARCHAR NOT NULL DEFAULT '',
    country         VARCHAR NOT NULL DEFAULT 'Unknown',
    city            VARCHAR NOT NULL DEFAULT 'Unknown',
    device_type     VARCHAR NOT NULL DEFAULT 'Unknown',
    language        VARCHAR NOT NULL DEFAULT 'Unknown',
    event_type      VARCHAR NOT NULL DEFAULT 'page_view',
    duration        BIGINT NOT NULL DEFAULT 0,
    created_at      TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    processed       BIGINT NOT NULL DEFAULT 0      -- reserved, never set
);
CREATE INDEX IF NOT EXISTS idx_visits_visitor ON visits(visitor_id);
"#
    )
}
