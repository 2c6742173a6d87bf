/// Idempotent DDL run once at startup, mirroring `.crawler/src/storage.rs::initialize_storage`'s
/// `CREATE TABLE IF NOT EXISTS` pattern. Table/column names follow spec.md §3/§6.
pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS miners (
    id                  SERIAL PRIMARY KEY,
    miner               TEXT NOT NULL UNIQUE,
    hashrate            DOUBLE PRECISION NOT NULL DEFAULT 0,
    online_workers      INTEGER NOT NULL DEFAULT 0,
    offline_workers     INTEGER NOT NULL DEFAULT 0,
    valid_shares        BIGINT NOT NULL DEFAULT 0,
    stale_shares        BIGINT NOT NULL DEFAULT 0,
    invalid_shares      BIGINT NOT NULL DEFAULT 0,
    last_valid_share_at TIMESTAMPTZ,
    created_at          TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS workers (
    id                  SERIAL PRIMARY KEY,
    miner               TEXT NOT NULL,
    worker              TEXT NOT NULL,
    hashrate            DOUBLE PRECISION NOT NULL DEFAULT 0,
    online              BOOLEAN NOT NULL DEFAULT false,
    valid_shares        BIGINT NOT NULL DEFAULT 0,
    stale_shares        BIGINT NOT NULL DEFAULT 0,
    invalid_shares      BIGINT NOT NULL DEFAULT 0,
    last_valid_share_at TIMESTAMPTZ,
    created_at          TIMESTAMPTZ NOT NULL DEFAULT now(),
    UNIQUE (miner, worker)
);

CREATE TABLE IF NOT EXISTS shares (
    id                  BIGSERIAL PRIMARY KEY,
    block               BIGINT NOT NULL,
    difficulty          DOUBLE PRECISION NOT NULL,
    network_difficulty  DOUBLE PRECISION NOT NULL,
    miner               TEXT NOT NULL,
    worker              TEXT NOT NULL,
    pow                 TEXT NOT NULL,
    type                TEXT NOT NULL,
    created_at          TIMESTAMPTZ NOT NULL DEFAULT now()
);
CREATE INDEX IF NOT EXISTS shares_block_pow_idx ON shares (block, pow);
CREATE INDEX IF NOT EXISTS shares_created_at_idx ON shares (created_at);

CREATE TABLE IF NOT EXISTS blocks (
    id                  BIGSERIAL PRIMARY KEY,
    block               BIGINT NOT NULL,
    network_difficulty  DOUBLE PRECISION NOT NULL,
    miner               TEXT NOT NULL,
    worker              TEXT NOT NULL,
    nonce               TEXT NOT NULL,
    hash                TEXT,
    type                TEXT,
    uncle_index         INTEGER NOT NULL DEFAULT 0,
    reward              DOUBLE PRECISION NOT NULL DEFAULT 0,
    status              TEXT NOT NULL,
    created_at          TIMESTAMPTZ NOT NULL DEFAULT now()
);
CREATE INDEX IF NOT EXISTS blocks_status_idx ON blocks (status, block);

CREATE TABLE IF NOT EXISTS balances (
    wallet      TEXT PRIMARY KEY,
    amount      DOUBLE PRECISION NOT NULL DEFAULT 0,
    updated_at  TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS balance_changes (
    id          BIGSERIAL PRIMARY KEY,
    wallet      TEXT NOT NULL,
    amount      DOUBLE PRECISION NOT NULL,
    balance     DOUBLE PRECISION NOT NULL,
    usage       TEXT NOT NULL,
    type        TEXT NOT NULL,
    created_at  TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS hashrates (
    id            BIGSERIAL PRIMARY KEY,
    miner         TEXT NOT NULL,
    hashrate      DOUBLE PRECISION NOT NULL,
    hashrate_1h   DOUBLE PRECISION NOT NULL,
    hashrate_6h   DOUBLE PRECISION NOT NULL,
    hashrate_12h  DOUBLE PRECISION NOT NULL,
    hashrate_24h  DOUBLE PRECISION NOT NULL,
    created_at    TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS pools (
    id                  BIGSERIAL PRIMARY KEY,
    miners              INTEGER NOT NULL,
    workers             INTEGER NOT NULL,
    block               BIGINT NOT NULL,
    pool_hashrate       DOUBLE PRECISION NOT NULL,
    network_hashrate    DOUBLE PRECISION NOT NULL,
    network_difficulty  DOUBLE PRECISION NOT NULL,
    created_at          TIMESTAMPTZ NOT NULL DEFAULT now()
);
";
